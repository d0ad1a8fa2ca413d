//! HTTP middleware
//!
//! Cross-cutting concerns applied to every route.

use axum::{
    extract::Request,
    http::{Method, Uri},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, warn};

use super::responses::CACHE_STATUS_HEADER;

/// Request logging middleware
///
/// One line per request with status, timing and, for fingerprint
/// requests, whether the cache answered. Only the path is logged: source
/// URLs travel in the query and may carry credentials.
pub async fn request_logging_middleware(
    method: Method,
    uri: Uri,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let request_id = uuid::Uuid::new_v4();

    let response = next.run(request).await;

    let status = response.status();
    let cache = response
        .headers()
        .get(CACHE_STATUS_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("none");
    let duration_ms = start.elapsed().as_millis();

    if status.is_client_error() || status.is_server_error() {
        warn!(
            %request_id,
            %method,
            path = uri.path(),
            status = status.as_u16(),
            duration_ms,
            "HTTP request failed"
        );
    } else {
        info!(
            %request_id,
            %method,
            path = uri.path(),
            status = status.as_u16(),
            cache,
            duration_ms,
            "HTTP request served"
        );
    }

    response
}
