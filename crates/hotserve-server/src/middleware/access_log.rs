//! Request logging middleware.
//!
//! Logs one line per request once its response head is ready. Failed
//! requests are logged at `warn` so they stand out in the terminal.

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

/// Log method, path, status and latency of every request.
pub(crate) async fn access_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    if status.is_client_error() || status.is_server_error() {
        tracing::warn!(%method, path = %path, status = status.as_u16(), elapsed_ms, "Request failed");
    } else {
        tracing::info!(%method, path = %path, status = status.as_u16(), elapsed_ms, "Request");
    }

    response
}
