//! Persistent Backend
//!
//! File-backed store. Records are loaded from a JSON file on `initialize`
//! (seeded and written out on first run) and flushed back on `close`.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::DatabaseConfig;
use crate::error::{DatabaseError, Result};
use crate::metrics::MetricsCollector;
use crate::storage::{memory, simulate_latency, Database, Latency, Lifecycle, RecordTable};

/// Default simulated cost of the persistent backend. Models disk I/O.
pub const PERSISTENT_LATENCY: Latency = Latency {
    initialize: Duration::from_millis(200),
    query: Duration::from_millis(100),
};

/// Records written to a fresh record file.
pub fn seed_records() -> BTreeMap<String, String> {
    let mut records = memory::seed_records();
    for (id, name) in [("4", "Diana"), ("5", "Edward"), ("6", "Fiona")] {
        records.insert(id.to_string(), name.to_string());
    }
    records
}

/// Reads the record file. `Ok(None)` means the file does not exist.
async fn load_records(path: &Path) -> Result<Option<BTreeMap<String, String>>> {
    let data = match tokio::fs::read(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(DatabaseError::LoadFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    };

    serde_json::from_slice(&data)
        .map(Some)
        .map_err(|e| DatabaseError::LoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Writes the full record map as pretty-printed JSON.
async fn save_records(path: &Path, records: &BTreeMap<String, String>) -> Result<()> {
    let save_failed = |reason: String| DatabaseError::SaveFailed {
        path: path.to_path_buf(),
        reason,
    };

    let data = serde_json::to_vec_pretty(records).map_err(|e| save_failed(e.to_string()))?;
    tokio::fs::write(path, data)
        .await
        .map_err(|e| save_failed(e.to_string()))
}

/// JSON-file-backed storage backend.
#[derive(Debug)]
pub struct PersistentBackend {
    config: DatabaseConfig,
    cache_enabled: bool,
    data_file: PathBuf,
    latency: Latency,
    table: RecordTable,
}

impl PersistentBackend {
    /// Creates a backend over `config.data_file`, or the well-known temp-dir file.
    pub fn new(config: DatabaseConfig, cache_enabled: bool, metrics: Arc<MetricsCollector>) -> Self {
        let data_file = config.data_file_path();
        let table = RecordTable::new(BTreeMap::new(), config.cache_size, cache_enabled, metrics);
        Self {
            config,
            cache_enabled,
            data_file,
            latency: PERSISTENT_LATENCY,
            table,
        }
    }

    /// Overrides the simulated latency.
    pub fn with_latency(mut self, latency: Latency) -> Self {
        self.latency = latency;
        self
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    pub async fn lifecycle(&self) -> Lifecycle {
        self.table.lifecycle().await
    }

    /// Number of records currently cached.
    pub async fn cache_len(&self) -> usize {
        self.table.cache_len().await
    }

    /// Number of records held in memory.
    pub async fn record_count(&self) -> usize {
        self.table.record_count().await
    }
}

#[async_trait]
impl Database for PersistentBackend {
    /// Loads the record file, seeding it when absent.
    ///
    /// An unreadable or corrupt file fails with `LoadFailed` and leaves the
    /// backend uninitialized.
    async fn initialize(&self, cancel: &CancellationToken) -> Result<()> {
        let mut state = self.table.write().await;
        state.ensure_uninitialized()?;

        info!(
            component = "DATABASE",
            "Initializing PERSISTENT database with file: {}",
            self.data_file.display()
        );
        info!(
            component = "DATABASE",
            "Max connections: {}, timeout: {}s",
            self.config.max_connections,
            self.config.timeout_seconds
        );
        if self.cache_enabled {
            info!(
                component = "DATABASE",
                "Cache enabled with size: {}", self.config.cache_size
            );
        }

        match load_records(&self.data_file).await? {
            Some(records) => {
                info!(
                    component = "DATABASE",
                    "Loaded {} records from disk",
                    records.len()
                );
                state.records = records;
            }
            None => {
                info!(
                    component = "DATABASE",
                    "No existing data found, creating initial dataset"
                );
                let records = seed_records();
                save_records(&self.data_file, &records).await?;
                state.records = records;
            }
        }

        simulate_latency(self.latency.initialize, cancel).await?;
        state.lifecycle = Lifecycle::Ready;
        Ok(())
    }

    /// Flushes all records to disk.
    ///
    /// Cancellation is only honored before the flush starts. A failed flush
    /// is returned, but the backend is closed regardless.
    async fn close(&self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(DatabaseError::Cancelled);
        }
        let mut state = self.table.write().await;
        state.ensure_ready()?;

        info!(
            component = "DATABASE",
            "Saving data before closing persistent database..."
        );
        let result = save_records(&self.data_file, &state.records).await;
        state.lifecycle = Lifecycle::Closed;

        match &result {
            Ok(()) => info!(component = "DATABASE", "Persistent database closed successfully"),
            Err(e) => error!(component = "DATABASE", "Error saving data: {}", e),
        }
        result
    }

    async fn get_user(&self, id: &str, cancel: &CancellationToken) -> Result<String> {
        self.table.lookup(id, self.latency.query, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tempfile::TempDir;

    const FAST: Latency = Latency {
        initialize: Duration::ZERO,
        query: Duration::ZERO,
    };

    fn config(dir: &TempDir, cache_size: usize) -> DatabaseConfig {
        DatabaseConfig {
            cache_size,
            data_file: Some(dir.path().join("users.json")),
            ..Default::default()
        }
    }

    fn backend(
        dir: &TempDir,
        cache_size: usize,
        cache_enabled: bool,
        metrics: Arc<MetricsCollector>,
    ) -> PersistentBackend {
        PersistentBackend::new(config(dir, cache_size), cache_enabled, metrics).with_latency(FAST)
    }

    #[tokio::test]
    async fn test_first_run_seeds_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = backend(&dir, 10, false, Arc::new(MetricsCollector::disabled()));
        let cancel = CancellationToken::new();

        db.initialize(&cancel).await.unwrap();

        assert_eq!(db.record_count().await, 6);
        assert_eq!(db.get_user("6", &cancel).await.unwrap(), "Fiona");

        let on_disk: BTreeMap<String, String> =
            serde_json::from_slice(&std::fs::read(db.data_file()).unwrap()).unwrap();
        assert_eq!(on_disk, seed_records());
    }

    #[tokio::test]
    async fn test_file_format_is_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let db = backend(&dir, 10, false, Arc::new(MetricsCollector::disabled()));
        db.initialize(&CancellationToken::new()).await.unwrap();

        let text = std::fs::read_to_string(db.data_file()).unwrap();
        assert!(text.starts_with("{\n  \"1\": \"Alice\",\n  \"2\": \"Bob\""));
    }

    #[tokio::test]
    async fn test_round_trip_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();
        let custom: BTreeMap<String, String> = [("42", "Zaphod"), ("7", "Trillian")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        std::fs::write(
            dir.path().join("users.json"),
            serde_json::to_vec_pretty(&custom).unwrap(),
        )
        .unwrap();

        let first = backend(&dir, 10, true, Arc::new(MetricsCollector::disabled()));
        first.initialize(&cancel).await.unwrap();
        assert_eq!(first.get_user("42", &cancel).await.unwrap(), "Zaphod");
        first.close(&cancel).await.unwrap();

        let second = backend(&dir, 10, true, Arc::new(MetricsCollector::disabled()));
        second.initialize(&cancel).await.unwrap();
        assert_eq!(second.record_count().await, 2);
        assert_eq!(second.get_user("7", &cancel).await.unwrap(), "Trillian");
        assert!(matches!(
            second.get_user("1", &cancel).await,
            Err(DatabaseError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_close_flushes_in_memory_records() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();

        let first = backend(&dir, 10, false, Arc::new(MetricsCollector::disabled()));
        first.initialize(&cancel).await.unwrap();
        // Clobber the file behind the backend's back; close must rewrite it
        std::fs::write(first.data_file(), b"{}").unwrap();
        first.close(&cancel).await.unwrap();

        let second = backend(&dir, 10, false, Arc::new(MetricsCollector::disabled()));
        second.initialize(&cancel).await.unwrap();
        assert_eq!(second.record_count().await, 6);
        assert_eq!(second.get_user("5", &cancel).await.unwrap(), "Edward");
    }

    #[tokio::test]
    async fn test_corrupt_file_fails_initialize() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("users.json"), b"{ \"1\": ").unwrap();

        let db = backend(&dir, 10, true, Arc::new(MetricsCollector::disabled()));
        let cancel = CancellationToken::new();

        let result = db.initialize(&cancel).await;
        assert!(matches!(result, Err(DatabaseError::LoadFailed { .. })));
        assert_eq!(db.lifecycle().await, Lifecycle::Uninitialized);
        assert!(matches!(
            db.get_user("1", &cancel).await,
            Err(DatabaseError::NotReady(Lifecycle::Uninitialized))
        ));
        // The corrupt file is left alone
        assert_eq!(std::fs::read(db.data_file()).unwrap(), b"{ \"1\": ");
    }

    #[tokio::test]
    async fn test_unreadable_path_fails_initialize() {
        let dir = tempfile::tempdir().unwrap();
        // A directory at the record path cannot be read as a file
        std::fs::create_dir(dir.path().join("users.json")).unwrap();

        let db = backend(&dir, 10, true, Arc::new(MetricsCollector::disabled()));
        let result = db.initialize(&CancellationToken::new()).await;
        assert!(matches!(result, Err(DatabaseError::LoadFailed { .. })));
    }

    #[tokio::test]
    async fn test_cache_size_one_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let metrics = Arc::new(MetricsCollector::new(true));
        let db = backend(&dir, 1, true, Arc::clone(&metrics));
        let cancel = CancellationToken::new();
        db.initialize(&cancel).await.unwrap();

        assert_eq!(db.get_user("1", &cancel).await.unwrap(), "Alice");
        let snapshot = metrics.snapshot().unwrap();
        assert_eq!((snapshot.cache_hits, snapshot.cache_misses), (0, 1));
        assert_eq!(db.cache_len().await, 1);

        assert_eq!(db.get_user("1", &cancel).await.unwrap(), "Alice");
        let snapshot = metrics.snapshot().unwrap();
        assert_eq!((snapshot.cache_hits, snapshot.cache_misses), (1, 1));

        assert_eq!(db.get_user("4", &cancel).await.unwrap(), "Diana");
        let snapshot = metrics.snapshot().unwrap();
        assert_eq!((snapshot.cache_hits, snapshot.cache_misses), (1, 2));
        assert_eq!(db.cache_len().await, 1);

        // "4" was not cached, so it misses again
        db.get_user("4", &cancel).await.unwrap();
        let snapshot = metrics.snapshot().unwrap();
        assert_eq!((snapshot.cache_hits, snapshot.cache_misses), (1, 3));
        assert_eq!(snapshot.db_queries, 3);
    }

    #[tokio::test]
    async fn test_close_failure_still_closes() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        std::fs::create_dir(&data_dir).unwrap();
        let config = DatabaseConfig {
            data_file: Some(data_dir.join("users.json")),
            ..Default::default()
        };
        let db = PersistentBackend::new(config, false, Arc::new(MetricsCollector::disabled()))
            .with_latency(FAST);
        let cancel = CancellationToken::new();
        db.initialize(&cancel).await.unwrap();

        // Pull the directory out from under the backend
        std::fs::remove_dir_all(&data_dir).unwrap();

        let result = db.close(&cancel).await;
        assert!(matches!(result, Err(DatabaseError::SaveFailed { .. })));
        assert_eq!(db.lifecycle().await, Lifecycle::Closed);
    }

    #[tokio::test]
    async fn test_initialize_twice() {
        let dir = tempfile::tempdir().unwrap();
        let db = backend(&dir, 10, true, Arc::new(MetricsCollector::disabled()));
        let cancel = CancellationToken::new();

        db.initialize(&cancel).await.unwrap();
        let result = db.initialize(&cancel).await;
        assert!(matches!(result, Err(DatabaseError::AlreadyInitialized)));
    }

    #[tokio::test]
    async fn test_slower_than_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let db = PersistentBackend::new(config(&dir, 10), false, Arc::new(MetricsCollector::disabled()));
        let cancel = CancellationToken::new();

        let start = Instant::now();
        db.initialize(&cancel).await.unwrap();
        assert!(start.elapsed() >= PERSISTENT_LATENCY.initialize);

        let start = Instant::now();
        db.get_user("1", &cancel).await.unwrap();
        assert!(start.elapsed() >= PERSISTENT_LATENCY.query);
        assert!(PERSISTENT_LATENCY.query > memory::IN_MEMORY_LATENCY.query);
    }

    #[tokio::test]
    async fn test_cancelled_close_keeps_ready() {
        let dir = tempfile::tempdir().unwrap();
        let db = backend(&dir, 10, true, Arc::new(MetricsCollector::disabled()));
        db.initialize(&CancellationToken::new()).await.unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = db.close(&cancel).await;
        assert!(matches!(result, Err(DatabaseError::Cancelled)));
        assert_eq!(db.lifecycle().await, Lifecycle::Ready);
    }
}
