//! PNG fingerprint engine
//!
//! Turns raw image bytes into a [`FingerprintResult`] made of two SHA-256
//! digests:
//!
//! - **standard**: digest of the decoded image re-encoded as PNG. Any pixel
//!   change alters it, but incidental encoding differences between source
//!   files (compression level, chunk order, metadata) do not.
//! - **alpha-normalized**: digest of a [`NormalizedPixelBuffer`], where every
//!   fully transparent pixel has been canonicalized to `(0, 0, 0, 0)`.
//!
//! The engine is a pure function of its input. It holds no state and does
//! no I/O, so it is safe to call from any thread.

pub mod buffer;
pub mod engine;

use serde::{Deserialize, Serialize};

pub use buffer::NormalizedPixelBuffer;
pub use engine::{Fingerprinter, PngFingerprinter, fingerprint};

/// Number of hex characters kept for the compact identifier
pub const COMPACT_HASH_LEN: usize = 16;

/// Fingerprint of a single image
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FingerprintResult {
    /// Hex SHA-256 of the canonical PNG re-encoding
    pub standard_hash: String,
    /// Hex SHA-256 of the alpha-normalized pixel buffer
    pub alpha_normalized_hash: String,
    /// First 16 hex characters of `alpha_normalized_hash`
    pub alpha_normalized_compact: String,
}

impl FingerprintResult {
    /// Assemble a result, deriving the compact form from the alpha-normalized hash
    pub fn new(standard_hash: String, alpha_normalized_hash: String) -> Self {
        let alpha_normalized_compact = alpha_normalized_hash
            .chars()
            .take(COMPACT_HASH_LEN)
            .collect();
        Self {
            standard_hash,
            alpha_normalized_hash,
            alpha_normalized_compact,
        }
    }
}
