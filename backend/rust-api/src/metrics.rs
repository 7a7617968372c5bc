use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, Encoder, HistogramVec,
    IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Question bank
    pub static ref QUESTIONS_STORED: IntGauge = register_int_gauge!(
        "questions_stored",
        "Number of questions currently in the bank"
    )
    .unwrap();

    pub static ref QUESTION_BANK_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "question_bank_operations_total",
        "Question bank mutations by operation",
        &["operation"]
    )
    .unwrap();

    // Practice
    pub static ref BROWSER_SESSIONS_ACTIVE: IntGauge = register_int_gauge!(
        "browser_sessions_active",
        "Number of mounted practice pages"
    )
    .unwrap();

    pub static ref UPLOADS_ACTIVE: IntGauge = register_int_gauge!(
        "uploads_active",
        "Number of simulated uploads with a running timer"
    )
    .unwrap();

    pub static ref UPLOADS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "uploads_total",
        "Simulated uploads by outcome",
        &["outcome"]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}
