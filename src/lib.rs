pub mod cache;
pub mod config;
pub mod errors;
pub mod fingerprint;
pub mod services;
pub mod sources;
pub mod utils;
pub mod web;
