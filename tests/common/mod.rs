//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba, RgbaImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use png_fingerprint::{
    cache::FingerprintCache,
    config::Config,
    errors::{EngineResult, SourceError, SourceResult},
    fingerprint::{FingerprintResult, Fingerprinter, PngFingerprinter},
    services::FingerprintService,
    sources::ImageFetcher,
    web::{AppState, WebServer},
};

/// Encode an RGBA image as PNG
pub fn encode_png(image: RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");
    bytes
}

/// Small opaque gradient
pub fn sample_png() -> Vec<u8> {
    encode_png(ImageBuffer::from_fn(8, 8, |x, y| {
        Rgba([(x * 30) as u8, (y * 30) as u8, 90, 255])
    }))
}

pub fn sample_jpeg() -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(8, 8, image::Rgb([10, 20, 30])));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .expect("encode jpeg");
    bytes
}

/// In-memory fetcher serving fixed bodies keyed by the exact URL
#[derive(Default)]
pub struct FakeFetcher {
    bodies: HashMap<String, Bytes>,
    calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(mut self, url: &str, body: Vec<u8>) -> Self {
        self.bodies.insert(url.to_string(), Bytes::from(body));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> SourceResult<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| SourceError::fetch(url, "HTTP 404 Not Found"))
    }
}

/// Engine that panics on inputs starting with `boom`
pub struct TripwireEngine;

impl Fingerprinter for TripwireEngine {
    fn fingerprint(&self, bytes: &[u8]) -> EngineResult<FingerprintResult> {
        if bytes.starts_with(b"boom") {
            panic!("tripwire engine triggered");
        }
        PngFingerprinter.fingerprint(bytes)
    }
}

pub fn build_service(
    fetcher: Arc<dyn ImageFetcher>,
    engine: Arc<dyn Fingerprinter>,
) -> FingerprintService {
    FingerprintService::new(FingerprintCache::unbounded(), fetcher, engine)
}

/// Router wired with the given fetcher and engine
pub fn build_app(
    fetcher: Arc<dyn ImageFetcher>,
    engine: Arc<dyn Fingerprinter>,
) -> axum::Router {
    let service = build_service(fetcher, engine);
    WebServer::create_router(AppState::new(Config::default(), service))
}
