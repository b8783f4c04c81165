use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::metrics::{HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS};

/// Records request count and latency per method, route and status.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = route_label(req.uri().path());

    let response = next.run(req).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method.as_str(), path, status.as_str()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method.as_str(), path])
        .observe(duration);

    response
}

/// Maps a request path onto a bounded label set. Anything that is not an
/// API route is a static asset and shares one label.
fn route_label(path: &str) -> &'static str {
    match path.trim_end_matches('/') {
        "/api/question" => "/api/question",
        "/api/save-result" => "/api/save-result",
        "/api/stats" => "/api/stats",
        "/health" => "/health",
        "/metrics" => "/metrics",
        p if p.starts_with("/api/") => "/api/unknown",
        _ => "/static",
    }
}
