//! Prometheus metrics for recsys-service
//!
//! `/get_statistics` is served from `StatsCollector`; these series exist for scraping.

use std::time::Duration;

use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "recsys_http_requests_total",
        "Total HTTP requests handled by recsys-service",
        &["method", "path", "status"]
    )
    .expect("failed to register recsys_http_requests_total")
});

static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "recsys_http_request_duration_seconds",
        "HTTP request latency for recsys-service",
        &["method", "path", "status"],
        vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("failed to register recsys_http_request_duration_seconds")
});

static OFFLINE_SERVED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "recsys_offline_served_total",
        "Offline recommendation requests by serving branch",
        &["branch"]
    )
    .expect("failed to register recsys_offline_served_total")
});

static TABLE_LOADS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "recsys_table_loads_total",
        "Offline table load attempts (success/error)",
        &["kind", "status"]
    )
    .expect("failed to register recsys_table_loads_total")
});

pub fn observe_http_request(method: &str, path: &str, status: u16, elapsed: Duration) {
    let status_label = status.to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status_label])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path, &status_label])
        .observe(elapsed.as_secs_f64());
}

/// Record which offline branch served a request (personal/default)
pub fn record_offline_served(branch: &str) {
    OFFLINE_SERVED_TOTAL.with_label_values(&[branch]).inc();
}

/// Record table load result (success/error)
pub fn record_table_load(kind: &str, status: &str) {
    TABLE_LOADS_TOTAL.with_label_values(&[kind, status]).inc();
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
