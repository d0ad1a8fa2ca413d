//! Fingerprint endpoint
//!
//! `GET|POST /hash?url=<png url>` fingerprints a remote image.
//! `POST /hash` with a multipart `file` field (or a raw request body)
//! fingerprints uploaded bytes. The URL wins when both are present.

use axum::{
    extract::{FromRequest, Multipart, Query, Request, State, rejection::QueryRejection},
    http::header::CONTENT_TYPE,
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::debug;

use crate::errors::{AppResult, SourceError};
use crate::services::FingerprintOutcome;
use crate::sources::ImageSource;
use crate::web::AppState;

/// Multipart field carrying the uploaded image
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Default, Deserialize)]
pub struct HashQuery {
    pub url: Option<String>,
}

/// Fingerprint an image named by URL or uploaded in the request body
pub async fn compute_hash(
    State(state): State<AppState>,
    query: Result<Query<HashQuery>, QueryRejection>,
    request: Request,
) -> AppResult<FingerprintOutcome> {
    let Query(query) = query.map_err(|e| SourceError::input(e.body_text()))?;
    let has_url = query.url.as_deref().is_some_and(|u| !u.trim().is_empty());
    let upload = if has_url {
        None
    } else {
        read_upload(request, &state).await?
    };

    let source = ImageSource::from_request_parts(query.url, upload)?;
    state.fingerprint_service.fingerprint(source).await
}

/// Extract uploaded bytes from a multipart form or a raw body
async fn read_upload(request: Request, state: &AppState) -> AppResult<Option<Bytes>> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if !is_multipart {
        let body = Bytes::from_request(request, state)
            .await
            .map_err(|e| SourceError::input(format!("Failed to read request body: {}", e.body_text())))?;
        return Ok((!body.is_empty()).then_some(body));
    }

    let mut multipart = Multipart::from_request(request, state)
        .await
        .map_err(|e| SourceError::input(format!("Invalid multipart body: {}", e.body_text())))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| SourceError::input(format!("Failed to read upload: {}", e.body_text())))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let data = field.bytes().await.map_err(|e| {
                SourceError::input(format!("Failed to read uploaded file: {}", e.body_text()))
            })?;
            debug!(bytes = data.len(), "Received multipart upload");
            return Ok(Some(data));
        }
    }

    Ok(None)
}
