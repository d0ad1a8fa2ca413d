//! Image sources
//!
//! A request names its image in one of two ways: a URL to fetch, or the
//! uploaded bytes themselves. Each modality derives its own cache key.

pub mod fetcher;

use bytes::Bytes;

pub use fetcher::{HttpImageFetcher, ImageFetcher};

use crate::cache::CacheKey;
use crate::errors::{SourceError, SourceResult};

/// Where the image bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Remote image, fetched with the URL exactly as given
    Url(String),
    /// Raw uploaded bytes
    Upload(Bytes),
}

impl ImageSource {
    /// Pick the source from the request's parts
    ///
    /// A non-empty URL takes precedence over an upload.
    pub fn from_request_parts(url: Option<String>, upload: Option<Bytes>) -> SourceResult<Self> {
        match (url.filter(|u| !u.trim().is_empty()), upload) {
            (Some(url), _) => Ok(Self::Url(url)),
            (None, Some(bytes)) => Ok(Self::Upload(bytes)),
            (None, None) => Err(SourceError::input(
                "Provide either a 'url' query parameter or a 'file' upload",
            )),
        }
    }

    /// Derive the cache key without touching the network
    pub fn cache_key(&self) -> SourceResult<CacheKey> {
        match self {
            Self::Url(url) => CacheKey::from_url(url),
            Self::Upload(bytes) => Ok(CacheKey::from_upload(bytes)),
        }
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Url(_) => "url",
            Self::Upload(_) => "upload",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_takes_precedence() {
        let source = ImageSource::from_request_parts(
            Some("http://x/a.png".to_string()),
            Some(Bytes::from_static(b"png")),
        )
        .unwrap();
        assert_eq!(source, ImageSource::Url("http://x/a.png".to_string()));
    }

    #[test]
    fn test_blank_url_falls_back_to_upload() {
        let source =
            ImageSource::from_request_parts(Some("  ".to_string()), Some(Bytes::from_static(b"png")))
                .unwrap();
        assert_eq!(source.kind(), "upload");
    }

    #[test]
    fn test_missing_source_is_an_input_error() {
        let err = ImageSource::from_request_parts(None, None).unwrap_err();
        assert!(matches!(err, SourceError::Input { .. }));
    }

    #[test]
    fn test_cache_keys_by_modality() {
        let url = ImageSource::Url("http://x/img.png?a=1#frag".to_string());
        assert_eq!(url.cache_key().unwrap().as_str(), "url:http://x/img.png");

        let upload = ImageSource::Upload(Bytes::from_static(b"abc"));
        assert_eq!(
            upload.cache_key().unwrap().as_str(),
            "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
