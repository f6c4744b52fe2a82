//! Record Table
//!
//! Read-through lookup over a record map fronted by a [`BoundedCache`].
//! The record map, the cache and the lifecycle state sit behind one
//! `RwLock`, so cache population can never race with itself or with a
//! load/save of the records.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, RwLockWriteGuard};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cache::BoundedCache;
use crate::error::{DatabaseError, Result};
use crate::metrics::MetricsCollector;
use crate::storage::{simulate_latency, Lifecycle};

/// State guarded by the table lock.
#[derive(Debug)]
pub struct TableState {
    pub lifecycle: Lifecycle,
    pub records: BTreeMap<String, String>,
    pub cache: BoundedCache,
}

impl TableState {
    /// Fails with `AlreadyInitialized` unless still `Uninitialized`.
    pub fn ensure_uninitialized(&self) -> Result<()> {
        match self.lifecycle {
            Lifecycle::Uninitialized => Ok(()),
            _ => Err(DatabaseError::AlreadyInitialized),
        }
    }

    /// Fails with `NotReady` unless `Ready`.
    pub fn ensure_ready(&self) -> Result<()> {
        match self.lifecycle {
            Lifecycle::Ready => Ok(()),
            other => Err(DatabaseError::NotReady(other)),
        }
    }
}

/// Records plus cache for one backend instance.
#[derive(Debug)]
pub struct RecordTable {
    state: RwLock<TableState>,
    cache_enabled: bool,
    metrics: Arc<MetricsCollector>,
}

impl RecordTable {
    pub fn new(
        records: BTreeMap<String, String>,
        cache_size: usize,
        cache_enabled: bool,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            state: RwLock::new(TableState {
                lifecycle: Lifecycle::Uninitialized,
                records,
                cache: BoundedCache::new(cache_size),
            }),
            cache_enabled,
            metrics,
        }
    }

    /// Exclusive access for lifecycle transitions and load/save.
    pub async fn write(&self) -> RwLockWriteGuard<'_, TableState> {
        self.state.write().await
    }

    pub async fn lifecycle(&self) -> Lifecycle {
        self.state.read().await.lifecycle
    }

    pub async fn cache_len(&self) -> usize {
        self.state.read().await.cache.len()
    }

    pub async fn record_count(&self) -> usize {
        self.state.read().await.records.len()
    }

    /// Looks up `id`, consulting the cache first when enabled.
    ///
    /// A hit returns without touching the store. A miss waits `query_latency`
    /// (cancellable) and reads the store under the shared lock; the exclusive
    /// lock is only taken to cache the value while there is room.
    pub async fn lookup(
        &self,
        id: &str,
        query_latency: Duration,
        cancel: &CancellationToken,
    ) -> Result<String> {
        {
            let state = self.state.read().await;
            state.ensure_ready()?;

            if self.cache_enabled {
                if let Some(cached) = state.cache.get(id) {
                    debug!(component = "DATABASE", id, "Cache hit");
                    self.metrics.record_cache_hit();
                    return Ok(cached.to_string());
                }
                self.metrics.record_cache_miss();
            }
        }

        debug!(component = "DATABASE", id, "Fetching user from backing store");
        simulate_latency(query_latency, cancel).await?;
        self.metrics.record_db_query();

        let name = {
            let state = self.state.read().await;
            // Close may have run while we were waiting
            state.ensure_ready()?;
            let name = state
                .records
                .get(id)
                .cloned()
                .ok_or_else(|| DatabaseError::NotFound(id.to_string()))?;

            if !self.cache_enabled || state.cache.is_full() {
                return Ok(name);
            }
            name
        };

        let mut state = self.state.write().await;
        if state.lifecycle == Lifecycle::Ready && state.cache.try_insert(id, &name) {
            debug!(component = "DATABASE", id, "Cached user");
        }

        Ok(name)
    }
}
