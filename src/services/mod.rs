//! Service layer for business logic
//!
//! Services sit between the web handlers and the fingerprint engine. They own
//! the orchestration: deriving cache keys, consulting the cache, resolving
//! image bytes and running the engine off the async runtime.
//!
//! # Design Principles
//!
//! - **Dependency Injection**: the cache, fetcher and engine are passed in, never global
//! - **Error Handling**: every failure becomes an [`AppError`](crate::errors::AppError)
//! - **Logging**: cache hits, misses and computations are logged with the cache key

pub mod fingerprint_service;

pub use fingerprint_service::{FingerprintOutcome, FingerprintService};
