use std::io::Cursor;

use image::{DynamicImage, ImageError, ImageFormat, ImageReader};
use sha2::{Digest, Sha256};
use tracing::trace;

use super::{FingerprintResult, NormalizedPixelBuffer};
use crate::errors::{EngineResult, FingerprintError};

/// Seam between the service layer and the fingerprint engine
///
/// Implementations must be deterministic: identical bytes always yield an
/// identical result.
pub trait Fingerprinter: Send + Sync + 'static {
    fn fingerprint(&self, bytes: &[u8]) -> EngineResult<FingerprintResult>;
}

/// Production engine: PNG only, RGBA8 normalization, SHA-256 digests
#[derive(Debug, Clone, Copy, Default)]
pub struct PngFingerprinter;

impl Fingerprinter for PngFingerprinter {
    fn fingerprint(&self, bytes: &[u8]) -> EngineResult<FingerprintResult> {
        fingerprint(bytes)
    }
}

/// Compute the fingerprint of raw PNG bytes
pub fn fingerprint(bytes: &[u8]) -> EngineResult<FingerprintResult> {
    let image = decode_png(bytes)?;

    let rgba = image.to_rgba8();
    let alpha_normalized_hash = NormalizedPixelBuffer::from_rgba(&rgba).digest();

    // The standard hash covers the image as decoded, not the normalized copy
    let canonical = encode_png(&image)?;
    let standard_hash = sha256_hex(&canonical);

    trace!(
        width = rgba.width(),
        height = rgba.height(),
        canonical_len = canonical.len(),
        "Computed image fingerprint"
    );

    Ok(FingerprintResult::new(standard_hash, alpha_normalized_hash))
}

/// Decode the bytes, sniffing the format from content, and insist on PNG
///
/// Decoding happens before the format check: bytes that fail to decode are a
/// decode error whatever they claim to be, unless their signature names a
/// format this build has no decoder for.
fn decode_png(bytes: &[u8]) -> EngineResult<DynamicImage> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| FingerprintError::decode(e.to_string()))?;
    let format = reader.format();

    let image = reader.decode().map_err(|e| match (&e, format) {
        // Recognised by its signature but not compiled in: still a real image
        (ImageError::Unsupported(_), Some(other)) if other != ImageFormat::Png => {
            unsupported(other)
        }
        _ => FingerprintError::decode(e.to_string()),
    })?;

    match format {
        Some(ImageFormat::Png) => Ok(image),
        Some(other) => Err(unsupported(other)),
        None => Err(FingerprintError::UnsupportedFormat {
            format: "unknown".to_string(),
        }),
    }
}

fn unsupported(format: ImageFormat) -> FingerprintError {
    FingerprintError::UnsupportedFormat {
        format: format!("{format:?}").to_lowercase(),
    }
}

/// Canonical PNG re-encoding
fn encode_png(image: &DynamicImage) -> EngineResult<Vec<u8>> {
    let mut png_bytes = Vec::new();
    let mut cursor = Cursor::new(&mut png_bytes);

    image
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| FingerprintError::encode(e.to_string()))?;

    Ok(png_bytes)
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
