//! Error type definitions for the fingerprint service
//!
//! The hierarchy mirrors the two stages of a request: resolving the image
//! bytes ([`SourceError`]) and fingerprinting them ([`FingerprintError`]).
//! Every variant carries its detail as an owned string so errors can be
//! cloned and handed to every caller waiting on a shared computation.

use serde::Serialize;
use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Source resolution errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Fingerprint engine errors
    #[error("Fingerprint error: {0}")]
    Fingerprint(#[from] FingerprintError),

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Errors raised while turning a request into image bytes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Neither a URL nor an upload was supplied, or the URL is malformed
    #[error("Invalid source: {message}")]
    Input { message: String },

    /// The remote image could not be retrieved
    #[error("Fetch failed: {url} - {message}")]
    Fetch { url: String, message: String },
}

/// Errors raised by the fingerprint engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FingerprintError {
    /// The bytes are not a decodable image
    #[error("Image decode failed: {message}")]
    Decode { message: String },

    /// The bytes decoded, but not as a PNG
    #[error("Only PNG images are supported (got {format})")]
    UnsupportedFormat { format: String },

    /// Canonical PNG re-encoding of a decoded image failed
    #[error("Canonical PNG encoding failed: {message}")]
    Encode { message: String },
}

/// Human-readable error categories exposed to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    InvalidSourceSpecification,
    FetchFailure,
    DecodeFailure,
    UnsupportedFormat,
    InternalFailure,
}

impl ErrorCategory {
    /// Wire name of the category
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidSourceSpecification => "invalid-source-specification",
            Self::FetchFailure => "fetch-failure",
            Self::DecodeFailure => "decode-failure",
            Self::UnsupportedFormat => "unsupported-format",
            Self::InternalFailure => "internal-failure",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AppError {
    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Category reported to clients for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Source(SourceError::Input { .. }) => ErrorCategory::InvalidSourceSpecification,
            Self::Source(SourceError::Fetch { .. }) => ErrorCategory::FetchFailure,
            Self::Fingerprint(FingerprintError::Decode { .. }) => ErrorCategory::DecodeFailure,
            Self::Fingerprint(FingerprintError::UnsupportedFormat { .. }) => {
                ErrorCategory::UnsupportedFormat
            }
            // A decoded image that cannot be re-encoded is an invariant violation
            Self::Fingerprint(FingerprintError::Encode { .. }) => ErrorCategory::InternalFailure,
            Self::Internal { .. } => ErrorCategory::InternalFailure,
        }
    }

    /// Detail message without the category prefix
    pub fn details(&self) -> String {
        match self {
            Self::Source(err) => err.to_string(),
            Self::Fingerprint(err) => err.to_string(),
            Self::Internal { message } => message.clone(),
        }
    }
}

impl SourceError {
    /// Create an input error
    pub fn input<S: Into<String>>(message: S) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    /// Create a fetch error
    pub fn fetch<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }
}

impl FingerprintError {
    /// Create a decode error
    pub fn decode<S: Into<String>>(message: S) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create an encode error
    pub fn encode<S: Into<String>>(message: S) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }
}
