//! Metrics Module
//!
//! Feature-gated counters for HTTP requests, database queries, cache
//! hits/misses and user lookups.

mod collector;
mod snapshot;

pub use collector::MetricsCollector;
pub use snapshot::{EndpointStats, MetricsSnapshot};

/// Report returned while metrics are disabled.
pub const METRICS_DISABLED: &str = "Metrics disabled";
