//! HTTP request handlers
//!
//! Handlers stay thin: they translate requests into service calls and let
//! the response types in [`super::responses`] render the outcome.

pub mod hash;
pub mod health;
