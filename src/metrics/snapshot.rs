//! Metrics Snapshot Module
//!
//! Point-in-time copy of the collector's counters and its text rendering.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::time::Duration;

// == Endpoint Stats ==
/// Request count and online latency mean for one endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EndpointStats {
    /// Number of requests observed
    pub requests: u64,
    /// Sum of observed latencies
    pub total_latency: Duration,
}

impl EndpointStats {
    /// Folds one observation into the running totals.
    pub fn record(&mut self, latency: Duration) {
        self.requests += 1;
        self.total_latency = self.total_latency.saturating_add(latency);
    }

    /// Mean latency, or zero when nothing was observed.
    pub fn average_latency(&self) -> Duration {
        match u32::try_from(self.requests) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.total_latency / n,
            Err(_) => Duration::from_secs_f64(
                self.total_latency.as_secs_f64() / self.requests as f64,
            ),
        }
    }
}

// == Metrics Snapshot ==
/// Aggregated counters at the time of the snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    /// Per-endpoint stats, ordered by endpoint
    pub http_requests: BTreeMap<String, EndpointStats>,
    pub db_queries: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub user_lookups: u64,
}

impl MetricsSnapshot {
    // == Hit Rate ==
    /// Cache hit rate as a percentage.
    ///
    /// Returns hits / (hits + misses) * 100, or 0.0 if there were no samples.
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64 * 100.0
        }
    }

    // == Render ==
    /// Renders the plain-text report served on `/metrics`.
    pub fn render(&self) -> String {
        let mut out = String::from("=== Application Metrics ===\n\n");

        out.push_str("HTTP Requests:\n");
        for (endpoint, stats) in &self.http_requests {
            let _ = writeln!(
                out,
                "  {}: {} requests (avg: {:?})",
                endpoint,
                stats.requests,
                stats.average_latency()
            );
        }

        let _ = write!(out, "\nDatabase:\n  Queries: {}\n", self.db_queries);
        let _ = write!(
            out,
            "\nCache:\n  Hits: {}\n  Misses: {}\n  Hit Rate: {:.1}%\n",
            self.cache_hits,
            self.cache_misses,
            self.hit_rate()
        );
        let _ = write!(out, "\nBusiness:\n  User Lookups: {}\n", self.user_lookups);

        out
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_no_samples() {
        let snapshot = MetricsSnapshot::default();
        assert_eq!(snapshot.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let snapshot = MetricsSnapshot {
            cache_hits: 3,
            cache_misses: 1,
            ..Default::default()
        };
        assert_eq!(snapshot.hit_rate(), 75.0);
    }

    #[test]
    fn test_average_latency() {
        let mut stats = EndpointStats::default();
        assert_eq!(stats.average_latency(), Duration::ZERO);

        stats.record(Duration::from_millis(10));
        stats.record(Duration::from_millis(30));
        assert_eq!(stats.requests, 2);
        assert_eq!(stats.average_latency(), Duration::from_millis(20));
    }

    #[test]
    fn test_render_empty() {
        let expected = "=== Application Metrics ===\n\n\
                        HTTP Requests:\n\
                        \nDatabase:\n  Queries: 0\n\
                        \nCache:\n  Hits: 0\n  Misses: 0\n  Hit Rate: 0.0%\n\
                        \nBusiness:\n  User Lookups: 0\n";
        assert_eq!(MetricsSnapshot::default().render(), expected);
    }

    #[test]
    fn test_render_endpoints_sorted() {
        let mut snapshot = MetricsSnapshot::default();
        let mut user = EndpointStats::default();
        user.record(Duration::from_millis(2));
        let mut health = EndpointStats::default();
        health.record(Duration::from_millis(1));
        snapshot.http_requests.insert("/user".to_string(), user);
        snapshot.http_requests.insert("/health".to_string(), health);

        let report = snapshot.render();
        let health_at = report.find("  /health: 1 requests (avg: 1ms)").unwrap();
        let user_at = report.find("  /user: 1 requests (avg: 2ms)").unwrap();
        assert!(health_at < user_at);
    }
}
