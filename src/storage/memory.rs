//! In-Memory Backend
//!
//! Volatile store seeded with a fixed set of records at construction.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::{DatabaseError, Result};
use crate::metrics::MetricsCollector;
use crate::storage::{simulate_latency, Database, Latency, Lifecycle, RecordTable};

/// Default simulated cost of the in-memory backend.
pub const IN_MEMORY_LATENCY: Latency = Latency {
    initialize: Duration::from_millis(100),
    query: Duration::from_millis(50),
};

/// Records every in-memory backend starts with.
pub fn seed_records() -> BTreeMap<String, String> {
    [("1", "Alice"), ("2", "Bob"), ("3", "Charlie")]
        .into_iter()
        .map(|(id, name)| (id.to_string(), name.to_string()))
        .collect()
}

/// Seeded, volatile storage backend.
#[derive(Debug)]
pub struct InMemoryBackend {
    config: DatabaseConfig,
    cache_enabled: bool,
    latency: Latency,
    table: RecordTable,
}

impl InMemoryBackend {
    pub fn new(config: DatabaseConfig, cache_enabled: bool, metrics: Arc<MetricsCollector>) -> Self {
        let table = RecordTable::new(seed_records(), config.cache_size, cache_enabled, metrics);
        Self {
            config,
            cache_enabled,
            latency: IN_MEMORY_LATENCY,
            table,
        }
    }

    /// Overrides the simulated latency.
    pub fn with_latency(mut self, latency: Latency) -> Self {
        self.latency = latency;
        self
    }

    pub async fn lifecycle(&self) -> Lifecycle {
        self.table.lifecycle().await
    }

    /// Number of records currently cached.
    pub async fn cache_len(&self) -> usize {
        self.table.cache_len().await
    }
}

#[async_trait]
impl Database for InMemoryBackend {
    async fn initialize(&self, cancel: &CancellationToken) -> Result<()> {
        let mut state = self.table.write().await;
        state.ensure_uninitialized()?;

        info!(
            component = "DATABASE",
            "Initializing IN-MEMORY database with max connections: {}, timeout: {}s",
            self.config.max_connections,
            self.config.timeout_seconds
        );
        if self.cache_enabled {
            info!(
                component = "DATABASE",
                "Cache enabled with size: {}", self.config.cache_size
            );
        }

        simulate_latency(self.latency.initialize, cancel).await?;
        state.lifecycle = Lifecycle::Ready;
        Ok(())
    }

    async fn close(&self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(DatabaseError::Cancelled);
        }
        let mut state = self.table.write().await;
        state.ensure_ready()?;

        info!(component = "DATABASE", "Closing database connection...");
        state.lifecycle = Lifecycle::Closed;
        Ok(())
    }

    async fn get_user(&self, id: &str, cancel: &CancellationToken) -> Result<String> {
        self.table.lookup(id, self.latency.query, cancel).await
    }
}
