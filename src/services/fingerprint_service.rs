use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::cache::{CacheKey, FingerprintCache};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::fingerprint::{FingerprintResult, Fingerprinter, PngFingerprinter};
use crate::sources::{HttpImageFetcher, ImageFetcher, ImageSource};

/// Result of a fingerprint request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintOutcome {
    pub result: FingerprintResult,
    /// Whether the result was served from the cache
    pub cache_hit: bool,
}

/// Resolves image sources to fingerprints through the deduplication cache
#[derive(Clone)]
pub struct FingerprintService {
    cache: FingerprintCache,
    fetcher: Arc<dyn ImageFetcher>,
    engine: Arc<dyn Fingerprinter>,
    coalesce_in_flight: bool,
}

impl FingerprintService {
    pub fn new(
        cache: FingerprintCache,
        fetcher: Arc<dyn ImageFetcher>,
        engine: Arc<dyn Fingerprinter>,
    ) -> Self {
        Self {
            cache,
            fetcher,
            engine,
            coalesce_in_flight: true,
        }
    }

    /// Production wiring: reqwest fetcher, PNG engine, cache sized from config
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = HttpImageFetcher::from_config(&config.fetch)?;
        Ok(Self::new(
            FingerprintCache::from_config(&config.cache),
            Arc::new(fetcher),
            Arc::new(PngFingerprinter),
        )
        .with_coalescing(config.cache.coalesce_in_flight))
    }

    pub fn with_coalescing(mut self, enabled: bool) -> Self {
        self.coalesce_in_flight = enabled;
        self
    }

    pub fn cache(&self) -> &FingerprintCache {
        &self.cache
    }

    /// Fingerprint an image source, serving repeats from the cache
    ///
    /// Nothing is cached unless the whole computation succeeds.
    pub async fn fingerprint(&self, source: ImageSource) -> AppResult<FingerprintOutcome> {
        let key = source.cache_key()?;

        if let Some(result) = self.cache.lookup(&key).await {
            debug!(cache_key = %key, "Fingerprint cache hit");
            return Ok(FingerprintOutcome {
                result,
                cache_hit: true,
            });
        }

        debug!(cache_key = %key, source = source.kind(), "Fingerprint cache miss");

        let result = if self.coalesce_in_flight {
            let service = self.clone();
            let own_key = key.clone();
            self.cache
                .in_flight()
                .join_or_start(&key, move || async move {
                    service.compute_and_store(own_key, source).await
                })
                .await?
        } else {
            self.compute_and_store(key, source).await?
        };

        Ok(FingerprintOutcome {
            result,
            cache_hit: false,
        })
    }

    async fn compute_and_store(
        &self,
        key: CacheKey,
        source: ImageSource,
    ) -> AppResult<FingerprintResult> {
        let start = Instant::now();
        let bytes = match source {
            ImageSource::Url(url) => self.fetcher.fetch(&url).await?,
            ImageSource::Upload(bytes) => bytes,
        };
        let input_len = bytes.len();

        // Decoding and hashing are CPU bound; keep them off the async workers
        let engine = Arc::clone(&self.engine);
        let result = tokio::task::spawn_blocking(move || engine.fingerprint(&bytes))
            .await
            .map_err(|e| {
                error!(cache_key = %key, "Fingerprint worker failed: {}", e);
                if e.is_panic() {
                    AppError::internal("Fingerprint computation panicked")
                } else {
                    AppError::internal(format!("Fingerprint computation aborted: {e}"))
                }
            })??;

        self.cache.store(key.clone(), result.clone()).await;

        info!(
            cache_key = %key,
            input_bytes = input_len,
            compact = %result.alpha_normalized_compact,
            duration_ms = start.elapsed().as_millis(),
            "Computed fingerprint"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{EngineResult, ErrorCategory, FingerprintError, SourceError, SourceResult};
    use async_trait::async_trait;
    use bytes::Bytes;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba, RgbaImage};
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tracing_test::traced_test;

    /// Engine wrapper counting invocations
    struct CountingEngine {
        calls: AtomicUsize,
        delay: Duration,
        /// When set, every invocation waits here until its peers arrive
        gate: Option<Barrier>,
    }

    impl CountingEngine {
        fn new() -> Arc<Self> {
            Self::with_delay(Duration::ZERO)
        }

        fn with_delay(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay,
                gate: None,
            })
        }

        fn gated(parties: usize) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
                gate: Some(Barrier::new(parties)),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Fingerprinter for CountingEngine {
        fn fingerprint(&self, bytes: &[u8]) -> EngineResult<FingerprintResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.wait();
            }
            std::thread::sleep(self.delay);
            crate::fingerprint::fingerprint(bytes)
        }
    }

    struct PanickingEngine;

    impl Fingerprinter for PanickingEngine {
        fn fingerprint(&self, _bytes: &[u8]) -> EngineResult<FingerprintResult> {
            panic!("engine exploded");
        }
    }

    /// In-memory fetcher serving fixed bodies by URL
    #[derive(Default)]
    struct StaticFetcher {
        bodies: HashMap<String, Bytes>,
        calls: AtomicUsize,
    }

    impl StaticFetcher {
        fn with(url: &str, body: Vec<u8>) -> Arc<Self> {
            let mut bodies = HashMap::new();
            bodies.insert(url.to_string(), Bytes::from(body));
            Arc::new(Self {
                bodies,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ImageFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> SourceResult<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.bodies
                .get(url)
                .cloned()
                .ok_or_else(|| SourceError::fetch(url, "HTTP 404 Not Found"))
        }
    }

    fn sample_png() -> Vec<u8> {
        let img: RgbaImage = ImageBuffer::from_fn(4, 4, |x, y| Rgba([x as u8 * 60, y as u8 * 60, 7, 255]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn service(fetcher: Arc<dyn ImageFetcher>, engine: Arc<dyn Fingerprinter>) -> FingerprintService {
        FingerprintService::new(FingerprintCache::unbounded(), fetcher, engine)
    }

    #[tokio::test]
    #[traced_test]
    async fn test_repeated_upload_is_served_from_cache() {
        let engine = CountingEngine::new();
        let svc = service(Arc::new(StaticFetcher::default()), engine.clone());
        let png = Bytes::from(sample_png());

        let first = svc.fingerprint(ImageSource::Upload(png.clone())).await.unwrap();
        let second = svc.fingerprint(ImageSource::Upload(png)).await.unwrap();

        assert!(!first.cache_hit);
        assert!(second.cache_hit);
        assert_eq!(first.result, second.result);
        assert_eq!(engine.calls(), 1);
        assert!(logs_contain("Fingerprint cache hit"));
    }

    #[tokio::test]
    async fn test_url_variants_share_one_fetch() {
        let png = sample_png();
        let fetcher = StaticFetcher::with("http://x/img.png?a=1#frag", png);
        let engine = CountingEngine::new();
        let svc = service(fetcher.clone(), engine.clone());

        let first = svc
            .fingerprint(ImageSource::Url("http://x/img.png?a=1#frag".into()))
            .await
            .unwrap();
        // Different query, same key: never fetched
        let second = svc
            .fingerprint(ImageSource::Url("http://x/img.png?b=2".into()))
            .await
            .unwrap();

        assert!(second.cache_hit);
        assert_eq!(first.result, second.result);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(engine.calls(), 1);
    }

    #[tokio::test]
    async fn test_upload_and_url_results_agree() {
        let png = sample_png();
        let svc = service(
            StaticFetcher::with("http://x/skin.png", png.clone()),
            Arc::new(PngFingerprinter),
        );

        let from_url = svc
            .fingerprint(ImageSource::Url("http://x/skin.png".into()))
            .await
            .unwrap();
        let from_upload = svc
            .fingerprint(ImageSource::Upload(Bytes::from(png)))
            .await
            .unwrap();

        // Distinct keys, identical fingerprints
        assert!(!from_upload.cache_hit);
        assert_eq!(from_url.result, from_upload.result);
        assert_eq!(svc.cache().len().await, 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let engine = CountingEngine::new();
        let svc = service(Arc::new(StaticFetcher::default()), engine.clone());
        let garbage = Bytes::from_static(b"not an image at all");

        for _ in 0..2 {
            let err = svc
                .fingerprint(ImageSource::Upload(garbage.clone()))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Fingerprint(FingerprintError::Decode { .. })));
        }

        assert_eq!(engine.calls(), 2);
        assert!(svc.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_fetch_failure_skips_engine() {
        let engine = CountingEngine::new();
        let svc = service(Arc::new(StaticFetcher::default()), engine.clone());

        let err = svc
            .fingerprint(ImageSource::Url("http://x/missing.png".into()))
            .await
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::FetchFailure);
        assert_eq!(engine.calls(), 0);
        assert!(svc.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_invalid_url_fails_before_fetching() {
        let fetcher = Arc::new(StaticFetcher::default());
        let svc = service(fetcher.clone(), CountingEngine::new());

        let err = svc
            .fingerprint(ImageSource::Url("ftp://x/img.png".into()))
            .await
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::InvalidSourceSpecification);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_engine_panic_is_contained() {
        let svc = service(Arc::new(StaticFetcher::default()), Arc::new(PanickingEngine));

        let err = svc
            .fingerprint(ImageSource::Upload(Bytes::from(sample_png())))
            .await
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::InternalFailure);
        assert!(svc.cache().is_empty().await);
        assert!(svc.cache().in_flight().is_empty().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_are_coalesced() {
        let engine = CountingEngine::with_delay(Duration::from_millis(200));
        let svc = service(Arc::new(StaticFetcher::default()), engine.clone());
        let png = Bytes::from(sample_png());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let svc = svc.clone();
                let png = png.clone();
                tokio::spawn(async move { svc.fingerprint(ImageSource::Upload(png)).await })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap().unwrap().result);
        }

        assert!(results.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(engine.calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_without_coalescing_each_miss_computes() {
        // Both computations must be inside the engine at once to pass the gate
        let engine = CountingEngine::gated(2);
        let svc = service(Arc::new(StaticFetcher::default()), engine.clone()).with_coalescing(false);
        let png = Bytes::from(sample_png());

        let (a, b) = tokio::join!(
            svc.fingerprint(ImageSource::Upload(png.clone())),
            svc.fingerprint(ImageSource::Upload(png.clone()))
        );

        assert_eq!(a.unwrap().result, b.unwrap().result);
        assert_eq!(engine.calls(), 2);
        assert_eq!(svc.cache().len().await, 1);
    }
}
