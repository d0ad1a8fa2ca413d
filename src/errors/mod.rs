//! Centralized error handling for the fingerprint service
//!
//! Every failure a request can run into is expressed as one of the typed
//! errors in [`types`], and rolls up into [`AppError`] at the service
//! boundary.
//!
//! # Error Categories
//!
//! - **Source Errors**: missing or malformed source specification, remote fetch failures
//! - **Fingerprint Errors**: undecodable bytes, non-PNG formats, canonical re-encode failures
//! - **Internal Errors**: anything unexpected, including panics caught at the boundary
//!
//! All errors are terminal for the request that produced them. None of them
//! is ever written to the cache.
//!
//! # Usage
//!
//! ```rust
//! use png_fingerprint::errors::{AppError, AppResult, ErrorCategory};
//!
//! fn example_function() -> AppResult<String> {
//!     Err(AppError::internal("worker went away"))
//! }
//!
//! let err = example_function().unwrap_err();
//! assert_eq!(err.category(), ErrorCategory::InternalFailure);
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for Source Results
pub type SourceResult<T> = Result<T, SourceError>;

/// Convenience type alias for Fingerprint Results
pub type EngineResult<T> = Result<T, FingerprintError>;
