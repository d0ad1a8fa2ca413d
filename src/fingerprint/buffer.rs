//! Alpha-normalized pixel buffer
//!
//! Layout: an 8-byte big-endian `(width, height)` header followed by the
//! image's RGBA8 pixels in row-major order. Every pixel whose alpha is
//! exactly zero has its colour channels forced to zero, so garbage RGB
//! hidden under a fully transparent mask cannot change the digest.
//! Partially transparent pixels keep their colour.

use image::RgbaImage;
use sha2::{Digest, Sha256};

/// Size of the `(width, height)` header in bytes
pub const HEADER_LEN: usize = 8;

/// Bytes per RGBA8 pixel
pub const BYTES_PER_PIXEL: usize = 4;

/// Header-prefixed RGBA buffer with transparent pixels canonicalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPixelBuffer {
    bytes: Vec<u8>,
}

impl NormalizedPixelBuffer {
    /// Build the normalized buffer from a decoded RGBA image
    pub fn from_rgba(image: &RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let pixels = image.as_raw();

        let mut bytes = Vec::with_capacity(HEADER_LEN + pixels.len());
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(pixels);

        for pixel in bytes[HEADER_LEN..].chunks_exact_mut(BYTES_PER_PIXEL) {
            if pixel[3] == 0 {
                pixel[..3].fill(0);
            }
        }

        Self { bytes }
    }

    /// Full buffer, header included
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The 8-byte dimension header
    pub fn header(&self) -> &[u8] {
        &self.bytes[..HEADER_LEN]
    }

    /// Pixel payload following the header
    pub fn pixels(&self) -> &[u8] {
        &self.bytes[HEADER_LEN..]
    }

    /// Hex-encoded SHA-256 of the whole buffer
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }
}
