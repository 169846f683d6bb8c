// Metrics module - Prometheus-compatible metrics tracking
// Counters and latency summaries for the request path, fetcher and cache

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Samples kept per latency series; older samples are dropped first
const MAX_SAMPLES: usize = 10_000;

/// Percentile statistics for latency measurements (milliseconds)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Histogram {
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

impl Histogram {
    fn empty() -> Self {
        Histogram {
            p50: 0.0,
            p90: 0.0,
            p95: 0.0,
            p99: 0.0,
        }
    }
}

/// Cache lookup outcome as seen by the fetcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
    /// Negative entry found; the store was not contacted
    NegativeHit,
}

/// Metrics struct tracks counters and latency samples for Prometheus export
/// Thread-safe via atomic operations and mutexes
pub struct Metrics {
    started_at: Instant,

    request_count: AtomicU64,
    status_counts: Mutex<HashMap<u16, u64>>,
    // Failed requests by error kind (grammar, not_found, store, ...)
    error_counts: Mutex<HashMap<String, u64>>,
    // Responses by content type
    format_counts: Mutex<HashMap<String, u64>>,

    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    cache_negative_hits: AtomicU64,
    cache_write_failures: AtomicU64,

    store_fetches: AtomicU64,
    // Object store errors by error code (NoSuchKey, AccessDenied, ...)
    store_errors: Mutex<HashMap<String, u64>>,

    // Stored in microseconds
    request_durations: Mutex<Vec<u64>>,
    transform_durations: Mutex<Vec<u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            started_at: Instant::now(),
            request_count: AtomicU64::new(0),
            status_counts: Mutex::new(HashMap::new()),
            error_counts: Mutex::new(HashMap::new()),
            format_counts: Mutex::new(HashMap::new()),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            cache_negative_hits: AtomicU64::new(0),
            cache_write_failures: AtomicU64::new(0),
            store_fetches: AtomicU64::new(0),
            store_errors: Mutex::new(HashMap::new()),
            request_durations: Mutex::new(Vec::new()),
            transform_durations: Mutex::new(Vec::new()),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn increment_request_count(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_status_count(&self, status_code: u16) {
        if let Ok(mut counts) = self.status_counts.lock() {
            *counts.entry(status_code).or_insert(0) += 1;
        }
    }

    pub fn increment_error_count(&self, kind: &str) {
        if let Ok(mut counts) = self.error_counts.lock() {
            *counts.entry(kind.to_string()).or_insert(0) += 1;
        }
    }

    pub fn increment_format_count(&self, content_type: &str) {
        if let Ok(mut counts) = self.format_counts.lock() {
            *counts.entry(content_type.to_string()).or_insert(0) += 1;
        }
    }

    pub fn record_cache_lookup(&self, outcome: CacheOutcome) {
        let counter = match outcome {
            CacheOutcome::Hit => &self.cache_hits,
            CacheOutcome::Miss => &self.cache_misses,
            CacheOutcome::NegativeHit => &self.cache_negative_hits,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cache_write_failure(&self) {
        self.cache_write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_store_fetch(&self) {
        self.store_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_store_error(&self, error_code: &str) {
        if let Ok(mut errors) = self.store_errors.lock() {
            *errors.entry(error_code.to_string()).or_insert(0) += 1;
        }
    }

    /// Record a full request duration in milliseconds
    pub fn record_request_duration(&self, duration_ms: f64) {
        push_sample(&self.request_durations, duration_ms);
    }

    /// Record the CPU-bound transform duration in milliseconds
    pub fn record_transform_duration(&self, duration_ms: f64) {
        push_sample(&self.transform_durations, duration_ms);
    }

    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn get_status_count(&self, status_code: u16) -> u64 {
        self.status_counts
            .lock()
            .ok()
            .and_then(|counts| counts.get(&status_code).copied())
            .unwrap_or(0)
    }

    pub fn get_error_count(&self, kind: &str) -> u64 {
        self.error_counts
            .lock()
            .ok()
            .and_then(|counts| counts.get(kind).copied())
            .unwrap_or(0)
    }

    pub fn get_cache_lookup_count(&self, outcome: CacheOutcome) -> u64 {
        match outcome {
            CacheOutcome::Hit => self.cache_hits.load(Ordering::Relaxed),
            CacheOutcome::Miss => self.cache_misses.load(Ordering::Relaxed),
            CacheOutcome::NegativeHit => self.cache_negative_hits.load(Ordering::Relaxed),
        }
    }

    pub fn get_store_fetch_count(&self) -> u64 {
        self.store_fetches.load(Ordering::Relaxed)
    }

    pub fn get_store_error_count(&self, error_code: &str) -> u64 {
        self.store_errors
            .lock()
            .ok()
            .and_then(|errors| errors.get(error_code).copied())
            .unwrap_or(0)
    }

    pub fn get_request_duration_histogram(&self) -> Histogram {
        self.request_durations
            .lock()
            .map(|samples| calculate_histogram(&samples))
            .unwrap_or_else(|_| Histogram::empty())
    }

    pub fn get_transform_duration_histogram(&self) -> Histogram {
        self.transform_durations
            .lock()
            .map(|samples| calculate_histogram(&samples))
            .unwrap_or_else(|_| Histogram::empty())
    }

    /// Export all metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        let mut output = String::new();

        output.push_str("# HELP http_requests_total Total number of HTTP requests received\n");
        output.push_str("# TYPE http_requests_total counter\n");
        output.push_str(&format!(
            "http_requests_total {}\n",
            self.request_count.load(Ordering::Relaxed)
        ));

        output.push_str("\n# HELP http_requests_by_status_total HTTP requests by status code\n");
        output.push_str("# TYPE http_requests_by_status_total counter\n");
        if let Ok(counts) = self.status_counts.lock() {
            for (status, count) in sorted(&counts) {
                output.push_str(&format!(
                    "http_requests_by_status_total{{status=\"{}\"}} {}\n",
                    status, count
                ));
            }
        }

        output.push_str("\n# HELP request_errors_total Failed requests by error kind\n");
        output.push_str("# TYPE request_errors_total counter\n");
        if let Ok(counts) = self.error_counts.lock() {
            for (kind, count) in sorted(&counts) {
                output.push_str(&format!(
                    "request_errors_total{{kind=\"{}\"}} {}\n",
                    kind, count
                ));
            }
        }

        output.push_str("\n# HELP images_served_total Transformed images by content type\n");
        output.push_str("# TYPE images_served_total counter\n");
        if let Ok(counts) = self.format_counts.lock() {
            for (content_type, count) in sorted(&counts) {
                output.push_str(&format!(
                    "images_served_total{{content_type=\"{}\"}} {}\n",
                    content_type, count
                ));
            }
        }

        output.push_str("\n# HELP cache_lookups_total Disk cache lookups by outcome\n");
        output.push_str("# TYPE cache_lookups_total counter\n");
        for (label, counter) in [
            ("hit", &self.cache_hits),
            ("miss", &self.cache_misses),
            ("negative_hit", &self.cache_negative_hits),
        ] {
            output.push_str(&format!(
                "cache_lookups_total{{outcome=\"{}\"}} {}\n",
                label,
                counter.load(Ordering::Relaxed)
            ));
        }

        output.push_str("\n# HELP cache_write_failures_total Disk cache writes that failed\n");
        output.push_str("# TYPE cache_write_failures_total counter\n");
        output.push_str(&format!(
            "cache_write_failures_total {}\n",
            self.cache_write_failures.load(Ordering::Relaxed)
        ));

        output.push_str("\n# HELP store_fetches_total Object store GET requests\n");
        output.push_str("# TYPE store_fetches_total counter\n");
        output.push_str(&format!(
            "store_fetches_total {}\n",
            self.store_fetches.load(Ordering::Relaxed)
        ));

        output.push_str("\n# HELP store_errors_total Object store errors by error code\n");
        output.push_str("# TYPE store_errors_total counter\n");
        if let Ok(errors) = self.store_errors.lock() {
            for (error_code, count) in sorted(&errors) {
                output.push_str(&format!(
                    "store_errors_total{{error_code=\"{}\"}} {}\n",
                    error_code, count
                ));
            }
        }

        push_summary(
            &mut output,
            "http_request_duration_seconds",
            "Request duration in seconds",
            self.get_request_duration_histogram(),
        );
        push_summary(
            &mut output,
            "transform_duration_seconds",
            "Image decode/transform/encode duration in seconds",
            self.get_transform_duration_histogram(),
        );

        output.push_str("\n# HELP uptime_seconds Service uptime in seconds\n");
        output.push_str("# TYPE uptime_seconds gauge\n");
        output.push_str(&format!("uptime_seconds {}\n", self.uptime_seconds()));

        output
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn push_sample(series: &Mutex<Vec<u64>>, duration_ms: f64) {
    let duration_us = (duration_ms * 1000.0) as u64;
    if let Ok(mut samples) = series.lock() {
        if samples.len() >= MAX_SAMPLES {
            samples.remove(0);
        }
        samples.push(duration_us);
    }
}

fn sorted<K: Ord + Clone, V: Copy>(map: &HashMap<K, V>) -> Vec<(K, V)> {
    let mut entries: Vec<(K, V)> = map.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}

fn push_summary(output: &mut String, name: &str, help: &str, histogram: Histogram) {
    output.push_str(&format!("\n# HELP {} {}\n", name, help));
    output.push_str(&format!("# TYPE {} summary\n", name));
    for (quantile, value_ms) in [
        ("0.5", histogram.p50),
        ("0.9", histogram.p90),
        ("0.95", histogram.p95),
        ("0.99", histogram.p99),
    ] {
        output.push_str(&format!(
            "{}{{quantile=\"{}\"}} {}\n",
            name,
            quantile,
            value_ms / 1000.0
        ));
    }
}

fn calculate_histogram(samples: &[u64]) -> Histogram {
    if samples.is_empty() {
        return Histogram::empty();
    }

    let mut sorted: Vec<u64> = samples.to_vec();
    sorted.sort_unstable();

    let p50_idx = (sorted.len() as f64 * 0.50) as usize;
    let p90_idx = (sorted.len() as f64 * 0.90) as usize;
    let p95_idx = (sorted.len() as f64 * 0.95) as usize;
    let p99_idx = (sorted.len() as f64 * 0.99) as usize;

    // Convert from microseconds to milliseconds
    Histogram {
        p50: sorted.get(p50_idx.saturating_sub(1)).copied().unwrap_or(0) as f64 / 1000.0,
        p90: sorted.get(p90_idx.saturating_sub(1)).copied().unwrap_or(0) as f64 / 1000.0,
        p95: sorted.get(p95_idx.saturating_sub(1)).copied().unwrap_or(0) as f64 / 1000.0,
        p99: sorted.get(p99_idx.saturating_sub(1)).copied().unwrap_or(0) as f64 / 1000.0,
    }
}
