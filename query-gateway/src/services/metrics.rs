//! Prometheus metrics for the query gateway.
//!
//! Provides HTTP, adapter and session metrics for observability.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::{Once, OnceLock};

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// HTTP metrics
pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

// Query metrics
pub static QUERIES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static ADAPTER_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static ADAPTER_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

// Session metrics
pub static SESSIONS_ACTIVE: OnceLock<IntGauge> = OnceLock::new();
pub static SESSIONS_EVICTED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Safe to call more than once, including concurrently.
pub fn init_metrics() {
    static INIT: Once = Once::new();
    INIT.call_once(register_metrics);
}

fn register_metrics() {
    let registry = Registry::new();

    let http_requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("Failed to create http_requests_total metric");

    let http_request_duration = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["method", "path"],
    )
    .expect("Failed to create http_request_duration_seconds metric");

    // outcome: ok, unavailable, error
    let queries_total = IntCounterVec::new(
        Opts::new("gateway_queries_total", "Total queries by outcome"),
        &["outcome"],
    )
    .expect("Failed to create gateway_queries_total metric");

    let adapter_latency = HistogramVec::new(
        HistogramOpts::new(
            "gateway_adapter_latency_seconds",
            "Retrieval-augmented generation latency in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["provider"],
    )
    .expect("Failed to create gateway_adapter_latency_seconds metric");

    let adapter_errors = IntCounterVec::new(
        Opts::new("gateway_adapter_errors_total", "Total adapter errors"),
        &["provider", "error_type"],
    )
    .expect("Failed to create gateway_adapter_errors_total metric");

    let sessions_active = IntGauge::new("gateway_sessions_active", "Sessions currently held")
        .expect("Failed to create gateway_sessions_active metric");

    // reason: capacity, idle
    let sessions_evicted = IntCounterVec::new(
        Opts::new("gateway_sessions_evicted_total", "Total evicted sessions"),
        &["reason"],
    )
    .expect("Failed to create gateway_sessions_evicted_total metric");

    registry
        .register(Box::new(http_requests_total.clone()))
        .expect("Failed to register http_requests_total");
    registry
        .register(Box::new(http_request_duration.clone()))
        .expect("Failed to register http_request_duration_seconds");
    registry
        .register(Box::new(queries_total.clone()))
        .expect("Failed to register gateway_queries_total");
    registry
        .register(Box::new(adapter_latency.clone()))
        .expect("Failed to register gateway_adapter_latency_seconds");
    registry
        .register(Box::new(adapter_errors.clone()))
        .expect("Failed to register gateway_adapter_errors_total");
    registry
        .register(Box::new(sessions_active.clone()))
        .expect("Failed to register gateway_sessions_active");
    registry
        .register(Box::new(sessions_evicted.clone()))
        .expect("Failed to register gateway_sessions_evicted_total");

    let _ = REGISTRY.set(registry);
    let _ = HTTP_REQUESTS_TOTAL.set(http_requests_total);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(http_request_duration);
    let _ = QUERIES_TOTAL.set(queries_total);
    let _ = ADAPTER_LATENCY_SECONDS.set(adapter_latency);
    let _ = ADAPTER_ERRORS_TOTAL.set(adapter_errors);
    let _ = SESSIONS_ACTIVE.set(sessions_active);
    let _ = SESSIONS_EVICTED_TOTAL.set(sessions_evicted);

    tracing::info!("Prometheus metrics initialized");
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

/// Record a completed HTTP request.
pub fn record_http_request(method: &str, path: &str, status: &str, duration_secs: f64) {
    if let Some(counter) = HTTP_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[method, path, status]).inc();
    }
    if let Some(histogram) = HTTP_REQUEST_DURATION_SECONDS.get() {
        histogram
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }
}

/// Record the outcome of a query.
pub fn record_query(outcome: &str) {
    if let Some(counter) = QUERIES_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

/// Record adapter latency.
pub fn record_adapter_latency(provider: &str, duration_secs: f64) {
    if let Some(histogram) = ADAPTER_LATENCY_SECONDS.get() {
        histogram
            .with_label_values(&[provider])
            .observe(duration_secs);
    }
}

/// Record an adapter error.
pub fn record_adapter_error(provider: &str, error_type: &str) {
    if let Some(counter) = ADAPTER_ERRORS_TOTAL.get() {
        counter.with_label_values(&[provider, error_type]).inc();
    }
}

/// Set the number of sessions currently held.
pub fn set_sessions_active(count: usize) {
    if let Some(gauge) = SESSIONS_ACTIVE.get() {
        gauge.set(count as i64);
    }
}

/// Record evicted sessions.
pub fn record_sessions_evicted(reason: &str, count: usize) {
    if count == 0 {
        return;
    }
    if let Some(counter) = SESSIONS_EVICTED_TOTAL.get() {
        counter.with_label_values(&[reason]).inc_by(count as u64);
    }
}
