use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter, register_int_counter_vec,
    Encoder, Histogram, HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};
use std::time::Duration;

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
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .unwrap();

    // Database Metrics (MongoDB)
    pub static ref DB_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "db_operations_total",
        "Total number of database operations",
        &["operation", "collection", "status"]
    )
    .unwrap();

    pub static ref DB_OPERATION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "db_operation_duration_seconds",
        "Database operation duration in seconds",
        &["operation", "collection"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .unwrap();

    // LLM Metrics
    pub static ref LLM_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "llm_requests_total",
        "Total number of question generator calls",
        &["status"]
    )
    .unwrap();

    pub static ref LLM_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "llm_request_duration_seconds",
        "Question generator call duration in seconds",
        &["status"],
        vec![0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0]
    )
    .unwrap();

    // Business Metrics
    /// One increment per generation attempt, labelled with how it ended.
    /// `collision` is a lost race on the unique index; `storage_error` is any other write failure.
    pub static ref GENERATION_ATTEMPTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "question_generation_attempts_total",
        "Question generation attempts by outcome",
        &["outcome"]
    )
    .unwrap();

    pub static ref GENERATION_ATTEMPTS_PER_QUESTION: Histogram = register_histogram!(
        "question_generation_attempts_per_question",
        "Attempts needed to produce one accepted question",
        vec![1.0, 2.0, 3.0, 4.0, 5.0, 7.0, 10.0]
    )
    .unwrap();

    pub static ref GENERATION_EXHAUSTED_TOTAL: IntCounter = register_int_counter!(
        "question_generation_exhausted_total",
        "Requests that ran out of generation attempts"
    )
    .unwrap();

    pub static ref ANSWERS_SAVED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "answers_saved_total",
        "Answer results received",
        &["correct", "status"]
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

pub fn record_db_operation(operation: &str, collection: &str, status: &str, elapsed: Duration) {
    DB_OPERATIONS_TOTAL
        .with_label_values(&[operation, collection, status])
        .inc();

    DB_OPERATION_DURATION_SECONDS
        .with_label_values(&[operation, collection])
        .observe(elapsed.as_secs_f64());
}

/// Helper: track database operation with metrics
pub async fn track_db_operation<F, T>(
    operation: &str,
    collection: &str,
    future: F,
) -> Result<T, anyhow::Error>
where
    F: std::future::Future<Output = Result<T, anyhow::Error>>,
{
    let start = std::time::Instant::now();
    let result = future.await;
    let status = if result.is_ok() { "success" } else { "error" };
    record_db_operation(operation, collection, status, start.elapsed());
    result
}

pub fn record_generation_attempt(outcome: &str) {
    GENERATION_ATTEMPTS_TOTAL.with_label_values(&[outcome]).inc();
}
