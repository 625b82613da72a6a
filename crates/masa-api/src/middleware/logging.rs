use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Request logging middleware
///
/// Only the path is logged; chat bodies may carry contact details.
pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let duration_ms = start.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::warn!(%method, %path, %status, duration_ms, "Request failed");
    } else {
        tracing::info!(%method, %path, %status, duration_ms, "Request processed");
    }

    response
}
