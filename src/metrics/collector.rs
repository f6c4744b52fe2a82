//! Metrics Collector
//!
//! Scalar counters are lock-free atomics. The per-endpoint map needs a mutex
//! for structural changes, and snapshots take the same mutex.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::metrics::{EndpointStats, MetricsSnapshot, METRICS_DISABLED};

/// Feature-gated application metrics.
///
/// The enabled flag is fixed at construction; while disabled every call is a no-op.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    enabled: bool,
    http_requests: Mutex<BTreeMap<String, EndpointStats>>,
    db_queries: AtomicU64,
    user_lookups: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl MetricsCollector {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }

    /// A collector that records nothing.
    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Records one HTTP request against `endpoint`.
    pub fn record_http_request(&self, endpoint: &str, latency: Duration) {
        if !self.enabled {
            return;
        }
        let mut endpoints = self.endpoints();
        match endpoints.get_mut(endpoint) {
            Some(stats) => stats.record(latency),
            None => {
                let mut stats = EndpointStats::default();
                stats.record(latency);
                endpoints.insert(endpoint.to_string(), stats);
            }
        }
    }

    pub fn record_db_query(&self) {
        self.bump(&self.db_queries);
    }

    pub fn record_user_lookup(&self) {
        self.bump(&self.user_lookups);
    }

    pub fn record_cache_hit(&self) {
        self.bump(&self.cache_hits);
    }

    pub fn record_cache_miss(&self) {
        self.bump(&self.cache_misses);
    }

    /// Copies the current counters, or `None` while disabled.
    pub fn snapshot(&self) -> Option<MetricsSnapshot> {
        if !self.enabled {
            return None;
        }
        let http_requests = self.endpoints().clone();
        Some(MetricsSnapshot {
            http_requests,
            db_queries: self.db_queries.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            user_lookups: self.user_lookups.load(Ordering::Relaxed),
        })
    }

    /// Text report for `/metrics`; `"Metrics disabled"` while disabled.
    pub fn report(&self) -> String {
        self.snapshot()
            .map(|snapshot| snapshot.render())
            .unwrap_or_else(|| METRICS_DISABLED.to_string())
    }

    fn bump(&self, counter: &AtomicU64) {
        if self.enabled {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    // Counters stay valid even if a recorder panicked mid-update.
    fn endpoints(&self) -> MutexGuard<'_, BTreeMap<String, EndpointStats>> {
        self.http_requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_disabled_is_noop() {
        let metrics = MetricsCollector::disabled();

        for _ in 0..1000 {
            metrics.record_db_query();
            metrics.record_cache_hit();
            metrics.record_cache_miss();
            metrics.record_user_lookup();
            metrics.record_http_request("/user", Duration::from_millis(5));
        }

        assert!(metrics.snapshot().is_none());
        assert_eq!(metrics.report(), "Metrics disabled");
    }

    #[test]
    fn test_enabled_counts() {
        let metrics = MetricsCollector::new(true);

        metrics.record_db_query();
        metrics.record_db_query();
        metrics.record_cache_hit();
        metrics.record_cache_miss();
        metrics.record_cache_miss();
        metrics.record_user_lookup();

        let snapshot = metrics.snapshot().unwrap();
        assert_eq!(snapshot.db_queries, 2);
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(snapshot.cache_misses, 2);
        assert_eq!(snapshot.user_lookups, 1);
    }

    #[test]
    fn test_http_requests_grouped_by_endpoint() {
        let metrics = MetricsCollector::new(true);

        metrics.record_http_request("/user", Duration::from_millis(10));
        metrics.record_http_request("/user", Duration::from_millis(20));
        metrics.record_http_request("/health", Duration::from_millis(1));

        let snapshot = metrics.snapshot().unwrap();
        let user = snapshot.http_requests["/user"];
        assert_eq!(user.requests, 2);
        assert_eq!(user.average_latency(), Duration::from_millis(15));
        assert_eq!(snapshot.http_requests["/health"].requests, 1);
    }

    #[test]
    fn test_report_sections() {
        let metrics = MetricsCollector::new(true);
        metrics.record_cache_hit();
        metrics.record_cache_miss();
        metrics.record_user_lookup();

        let report = metrics.report();
        assert!(report.starts_with("=== Application Metrics ==="));
        assert!(report.contains("Hit Rate: 50.0%"));
        assert!(report.contains("User Lookups: 1"));
    }

    #[test]
    fn test_concurrent_recording() {
        let metrics = Arc::new(MetricsCollector::new(true));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let metrics = Arc::clone(&metrics);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        metrics.record_db_query();
                        metrics.record_http_request(
                            &format!("/e{}", i % 2),
                            Duration::from_micros(1),
                        );
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = metrics.snapshot().unwrap();
        assert_eq!(snapshot.db_queries, 800);
        assert_eq!(snapshot.http_requests.len(), 2);
        assert_eq!(snapshot.http_requests["/e0"].requests, 400);
    }
}
