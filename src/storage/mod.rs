//! Storage Module
//!
//! The `Database` contract and its two backends. Both backends share the
//! read-through cache logic in [`RecordTable`], which keeps the record map,
//! the cache and the lifecycle state under a single lock.

mod memory;
mod persistent;
mod table;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::{Config, DatabaseType};
use crate::error::{DatabaseError, Result};
use crate::metrics::MetricsCollector;

pub use memory::{InMemoryBackend, IN_MEMORY_LATENCY};
pub use persistent::{PersistentBackend, PERSISTENT_LATENCY};
pub(crate) use table::RecordTable;

/// Storage contract shared by every backend.
///
/// Blocking calls honor `cancel`; a triggered token yields
/// [`DatabaseError::Cancelled`].
#[async_trait]
pub trait Database: Send + Sync {
    /// Backend-specific setup. Moves `Uninitialized` to `Ready`.
    async fn initialize(&self, cancel: &CancellationToken) -> Result<()>;

    /// Backend-specific teardown. Moves `Ready` to `Closed`.
    async fn close(&self, cancel: &CancellationToken) -> Result<()>;

    /// Returns the name stored under `id`.
    async fn get_user(&self, id: &str, cancel: &CancellationToken) -> Result<String>;
}

/// Backend lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Ready,
    Closed,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lifecycle::Uninitialized => "uninitialized",
            Lifecycle::Ready => "ready",
            Lifecycle::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Simulated cost of a backend's setup and per-query work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latency {
    pub initialize: Duration,
    pub query: Duration,
}

/// Blocks for `duration` unless `cancel` fires first.
///
/// An already-cancelled token always wins, even for a zero duration.
pub(crate) async fn simulate_latency(duration: Duration, cancel: &CancellationToken) -> Result<()> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DatabaseError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

/// Builds the backend selected by `config.database.type`.
pub fn create_database(config: &Config, metrics: Arc<MetricsCollector>) -> Arc<dyn Database> {
    match config.database.db_type {
        DatabaseType::Persistent => {
            info!(component = "APP", "Using persistent database");
            Arc::new(PersistentBackend::new(
                config.database.clone(),
                config.app.features.cache_enabled,
                metrics,
            ))
        }
        DatabaseType::InMemory => {
            info!(component = "APP", "Using in-memory database");
            Arc::new(InMemoryBackend::new(
                config.database.clone(),
                config.app.features.cache_enabled,
                metrics,
            ))
        }
    }
}
