/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Web server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024; // 10MB

// Remote fetch defaults
pub const DEFAULT_FETCH_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_FETCH_CONNECT_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_FETCH_MAX_BYTES: usize = 10 * 1024 * 1024; // 10MB
pub const DEFAULT_USER_AGENT: &str = concat!("png-fingerprint/", env!("CARGO_PKG_VERSION"));

// Cache defaults
pub const DEFAULT_CACHE_MAX_ENTRIES: Option<usize> = None; // unbounded
pub const DEFAULT_COALESCE_IN_FLIGHT: bool = true;

// Configuration sources
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
pub const ENV_PREFIX: &str = "PNG_FINGERPRINT_";
