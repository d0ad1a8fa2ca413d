//! HTTP response types and utilities
//!
//! Every error leaves the service as `{"error": <category>, "details": <message>}`
//! with a status code chosen from its category.

use axum::{
    Json,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use tracing::{error, warn};

use crate::cache::CacheStats;
use crate::errors::{AppError, ErrorCategory};
use crate::services::FingerprintOutcome;

/// Header reporting whether a fingerprint came from the cache
pub const CACHE_STATUS_HEADER: &str = "x-cache";

/// Error body shared by all endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorCategory,
    pub details: String,
}

/// Health endpoint body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub uptime_seconds: i64,
    pub cache: CacheHealth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheHealth {
    pub entries: usize,
    pub capacity: Option<usize>,
    pub hits: u64,
    pub misses: u64,
}

impl From<CacheStats> for CacheHealth {
    fn from(stats: CacheStats) -> Self {
        Self {
            entries: stats.entries,
            capacity: stats.capacity,
            hits: stats.hits,
            misses: stats.misses,
        }
    }
}

/// Map an error category to its HTTP status
pub fn status_for(category: ErrorCategory) -> StatusCode {
    match category {
        ErrorCategory::InvalidSourceSpecification => StatusCode::BAD_REQUEST,
        ErrorCategory::FetchFailure => StatusCode::BAD_GATEWAY,
        ErrorCategory::DecodeFailure => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCategory::UnsupportedFormat => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        ErrorCategory::InternalFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(category: ErrorCategory, details: String) -> Response {
    (status_for(category), Json(ErrorResponse { error: category, details })).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let category = self.category();
        if category == ErrorCategory::InternalFailure {
            error!(category = %category, "Request failed: {}", self);
        } else {
            warn!(category = %category, "Request failed: {}", self);
        }
        error_response(category, self.details())
    }
}

impl IntoResponse for FingerprintOutcome {
    fn into_response(self) -> Response {
        let cache_status = if self.cache_hit { "hit" } else { "miss" };
        let mut response = Json(self.result).into_response();
        response
            .headers_mut()
            .insert(CACHE_STATUS_HEADER, HeaderValue::from_static(cache_status));
        response
    }
}

/// Last-resort conversion of a handler panic into an internal-failure response
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    error!("Request handler panicked: {}", message);
    error_response(
        ErrorCategory::InternalFailure,
        "Internal server error".to_string(),
    )
}
