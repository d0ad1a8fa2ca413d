//! Cache key derivation
//!
//! Keys are tagged by origin so a URL can never collide with an upload:
//!
//! - `url:<url without query and fragment>`
//! - `sha256:<hex digest of the raw uploaded bytes>`

use sha2::{Digest, Sha256};
use std::fmt;

use crate::errors::SourceError;
use crate::utils::url::UrlUtils;

const URL_PREFIX: &str = "url:";
const UPLOAD_PREFIX: &str = "sha256:";

/// Identity of an image source
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for a remote image
    ///
    /// URLs that differ only in query string or fragment share a key, and
    /// the key is stable even if the remote content later changes.
    pub fn from_url(raw: &str) -> Result<Self, SourceError> {
        let parsed = UrlUtils::parse_source_url(raw)
            .map_err(|e| SourceError::input(format!("Invalid URL {e}")))?;
        Ok(Self(format!(
            "{URL_PREFIX}{}",
            UrlUtils::strip_query_and_fragment(&parsed)
        )))
    }

    /// Content-addressed key for uploaded bytes, computed before any decoding
    pub fn from_upload(bytes: &[u8]) -> Self {
        Self(format!("{UPLOAD_PREFIX}{}", hex::encode(Sha256::digest(bytes))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_url(&self) -> bool {
        self.0.starts_with(URL_PREFIX)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
