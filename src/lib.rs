//! User Lookup - user-record lookup service over swappable storage
//!
//! Serves user records from an in-memory or JSON-file-backed `Database`,
//! fronted by a bounded read-through cache, feature-gated metrics and a
//! global rate limit.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod service;
pub mod storage;

pub use api::{create_router, serve_and_close, AppState};
pub use config::Config;
pub use error::{DatabaseError, LookupError};
pub use metrics::MetricsCollector;
pub use service::UserLookupService;
pub use storage::{create_database, Database, InMemoryBackend, PersistentBackend};
