//! Per-cycle performance metrics
//!
//! Derived at the end of every fetch cycle and pushed to a caller-supplied
//! sink. Nothing here can fail: unavailable sources report 0.

use crate::cache::CacheStats;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;
use tracing::trace;

/// Metrics snapshot for one fetch cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    /// Wall-clock duration of the last network cycle
    pub load_time_ms: u64,
    /// Percentage; 100 after a cache hit, else the cache's own `hit_rate`
    pub cache_hit_rate: f64,
    /// Lifetime count of completed fetch cycles, including cache hits
    pub network_requests: u64,
    /// Resident set size of the process, best-effort
    pub memory_usage: u64,
    /// Time since the orchestrator was created
    pub render_time_ms: u64,
}

/// Receives every new metrics snapshot
pub trait MetricsSink: Send + Sync {
    fn report(&self, metrics: &PerformanceMetrics);
}

impl<F> MetricsSink for F
where
    F: Fn(&PerformanceMetrics) + Send + Sync,
{
    fn report(&self, metrics: &PerformanceMetrics) {
        self(metrics)
    }
}

#[derive(Debug)]
pub struct MetricsCollector {
    mounted_at: Instant,
    last: Mutex<PerformanceMetrics>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            mounted_at: Instant::now(),
            last: Mutex::new(PerformanceMetrics::default()),
        }
    }

    pub fn last(&self) -> PerformanceMetrics {
        self.last.lock().clone()
    }

    /// Cycle served from the cache: only the hit rate and request count move
    pub fn record_cache_hit(&self) -> PerformanceMetrics {
        let mut last = self.last.lock();
        last.cache_hit_rate = 100.0;
        last.network_requests += 1;
        trace!(requests = last.network_requests, "Metrics: cache hit");
        last.clone()
    }

    /// Cycle served by the provider; `started` is when the call began
    pub fn record_fetch(&self, started: Instant, cache: Option<CacheStats>) -> PerformanceMetrics {
        let now = Instant::now();
        let mut last = self.last.lock();

        *last = PerformanceMetrics {
            load_time_ms: now.duration_since(started).as_millis() as u64,
            cache_hit_rate: cache.map(|s| s.hit_rate).unwrap_or(0.0),
            network_requests: last.network_requests + 1,
            memory_usage: process_memory_bytes(),
            render_time_ms: now.duration_since(self.mounted_at).as_millis() as u64,
        };

        trace!(
            load_time_ms = last.load_time_ms,
            requests = last.network_requests,
            "Metrics: network fetch"
        );
        last.clone()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Resident memory of this process in bytes, or 0 if unknown
#[cfg(target_os = "linux")]
pub fn process_memory_bytes() -> u64 {
    const PAGE_SIZE: u64 = 4096;

    // statm: size resident shared text lib data dt (in pages)
    std::fs::read_to_string("/proc/self/statm")
        .ok()
        .and_then(|s| s.split_whitespace().nth(1)?.parse::<u64>().ok())
        .map(|pages| pages * PAGE_SIZE)
        .unwrap_or(0)
}

#[cfg(not(target_os = "linux"))]
pub fn process_memory_bytes() -> u64 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_record_fetch_timings() {
        let collector = MetricsCollector::new();
        tokio::time::advance(Duration::from_millis(500)).await;

        let started = Instant::now();
        tokio::time::advance(Duration::from_millis(120)).await;

        let stats = CacheStats {
            size: 2,
            max_size: 10,
            total_hits: 4,
            hit_rate: 50.0,
        };
        let m = collector.record_fetch(started, Some(stats));

        assert_eq!(m.load_time_ms, 120);
        assert_eq!(m.render_time_ms, 620);
        assert_eq!(m.cache_hit_rate, 50.0);
        assert_eq!(m.network_requests, 1);
        assert_eq!(collector.last(), m);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_hit_keeps_previous_timings() {
        let collector = MetricsCollector::new();
        let started = Instant::now();
        tokio::time::advance(Duration::from_millis(40)).await;
        collector.record_fetch(started, None);

        let m = collector.record_cache_hit();
        assert_eq!(m.cache_hit_rate, 100.0);
        assert_eq!(m.network_requests, 2);
        assert_eq!(m.load_time_ms, 40);
    }

    #[test]
    fn test_closure_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = Arc::clone(&seen);
            move |m: &PerformanceMetrics| seen.lock().push(m.network_requests)
        };

        sink.report(&PerformanceMetrics {
            network_requests: 7,
            ..Default::default()
        });
        assert_eq!(*seen.lock(), vec![7]);
    }
}
