use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted request body, multipart framing included
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

/// Remote image retrieval settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Total time allowed for one fetch, body included
    #[serde(with = "duration_serde::duration", default = "default_fetch_timeout")]
    pub timeout: Duration,
    #[serde(with = "duration_serde::duration", default = "default_fetch_connect_timeout")]
    pub connect_timeout: Duration,
    /// Responses larger than this are rejected as fetch failures
    #[serde(default = "default_fetch_max_bytes")]
    pub max_bytes: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entry limit; absent or zero keeps the cache unbounded
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: Option<usize>,
    /// Let concurrent misses for one key share a single computation
    #[serde(default = "default_coalesce_in_flight")]
    pub coalesce_in_flight: bool,
}

// Web defaults
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

// Fetch defaults
fn default_fetch_timeout() -> Duration {
    Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECONDS)
}

fn default_fetch_connect_timeout() -> Duration {
    Duration::from_secs(DEFAULT_FETCH_CONNECT_TIMEOUT_SECONDS)
}

fn default_fetch_max_bytes() -> usize {
    DEFAULT_FETCH_MAX_BYTES
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

// Cache defaults
fn default_cache_max_entries() -> Option<usize> {
    DEFAULT_CACHE_MAX_ENTRIES
}

fn default_coalesce_in_flight() -> bool {
    DEFAULT_COALESCE_IN_FLIGHT
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: default_fetch_timeout(),
            connect_timeout: default_fetch_connect_timeout(),
            max_bytes: default_fetch_max_bytes(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_cache_max_entries(),
            coalesce_in_flight: default_coalesce_in_flight(),
        }
    }
}

impl Config {
    /// Load configuration with the file and environment layered over defaults
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if !Path::new(config_file).exists() {
            info!("Config file {} not found, using defaults and environment", config_file);
        }

        let config: Self = Self::figment(config_file)
            .extract()
            .with_context(|| format!("Failed to load configuration from {config_file}"))?;
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;
        Ok(config)
    }

    /// Provider stack: defaults, TOML file, `HOST`/`PORT`, then `PNG_FINGERPRINT_*`
    ///
    /// Prefixed variables nest with a double underscore, e.g.
    /// `PNG_FINGERPRINT_CACHE__MAX_ENTRIES=10000`.
    pub fn figment(config_file: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(config_file))
            .merge(
                Env::raw()
                    .only(&["host", "port"])
                    .map(|key| format!("web.{}", key.as_str().to_ascii_lowercase()).into()),
            )
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.web.max_upload_bytes == 0 {
            return Err("web.max_upload_bytes must be greater than zero".to_string());
        }
        if self.fetch.max_bytes == 0 {
            return Err("fetch.max_bytes must be greater than zero".to_string());
        }
        if self.fetch.timeout.is_zero() {
            return Err("fetch.timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}
