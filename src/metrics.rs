// Client Prometheus metrics
//
// Provides metrics for client operations:
// - Operation counters by verb and outcome
// - Operation latency histograms
// - Bytes written to the store

use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Histogram,
    HistogramVec, IntCounter, IntCounterVec,
};
use std::sync::OnceLock;

/// Global metrics registry for the client
pub struct ClientMetrics {
    /// Operations by `operation` (save, load, ...) and `outcome` (ok, error)
    pub operations: IntCounterVec,

    /// Operation duration histogram (in seconds)
    pub operation_duration: HistogramVec,

    /// Total JSON bytes sent with SET commands
    pub bytes_written: IntCounter,
}

static METRICS: OnceLock<ClientMetrics> = OnceLock::new();

impl ClientMetrics {
    /// Initialize and return the global metrics instance
    ///
    /// Registration happens on first call; later calls return the same instance.
    pub fn global() -> &'static Self {
        METRICS.get_or_init(|| {
            let operations = register_int_counter_vec!(
                "redis_async_client_operations_total",
                "Total number of client operations by verb and outcome",
                &["operation", "outcome"]
            )
            .expect("Failed to register redis_async_client_operations_total metric");

            let operation_duration = register_histogram_vec!(
                "redis_async_client_operation_duration_seconds",
                "Duration of client operations in seconds",
                &["operation"],
                vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0] // 0.1ms to 1s
            )
            .expect("Failed to register redis_async_client_operation_duration_seconds metric");

            let bytes_written = register_int_counter!(
                "redis_async_client_bytes_written_total",
                "Total JSON bytes written to the store"
            )
            .expect("Failed to register redis_async_client_bytes_written_total metric");

            ClientMetrics {
                operations,
                operation_duration,
                bytes_written,
            }
        })
    }

    /// Start timing an operation
    ///
    /// # Example
    /// ```ignore
    /// let timer = metrics.start_operation_timer("load");
    /// // ... perform operation ...
    /// timer.observe_duration();
    /// ```
    pub fn start_operation_timer(&self, operation: &str) -> HistogramTimer {
        HistogramTimer {
            histogram: Some(self.operation_duration.with_label_values(&[operation])),
            start: std::time::Instant::now(),
        }
    }

    pub fn record_outcome(&self, operation: &str, success: bool) {
        let outcome = if success { "ok" } else { "error" };
        self.operations
            .with_label_values(&[operation, outcome])
            .inc();
    }
}

/// RAII timer for histogram metrics
///
/// Records the duration once, either explicitly or when dropped.
pub struct HistogramTimer {
    histogram: Option<Histogram>,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Manually observe and consume the timer
    pub fn observe_duration(mut self) {
        self.observe();
    }

    fn observe(&mut self) {
        if let Some(histogram) = self.histogram.take() {
            histogram.observe(self.start.elapsed().as_secs_f64());
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.observe();
    }
}
