//! Session image memoizer.
//!
//! Images are keyed by their URL string and held in a bounded `moka` cache.
//! moka bounds a single weight, so each entry weighs at least
//! `max_bytes / max_entries`; that keeps both the entry limit and the byte
//! limit. Concurrent loads of the same URL are not collapsed.

use async_trait::async_trait;
use bytes::Bytes;
use moka::future::Cache;
use rd_core::config::ImageCacheConfig;
use rd_core::{ApiError, Error, Result};
use reqwest::StatusCode;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    WebP,
    Bmp,
}

impl ImageFormat {
    /// Identify an image payload from its leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(Self::Png),
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some(Self::Gif),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(Self::WebP),
            [b'B', b'M', ..] => Some(Self::Bmp),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub format: ImageFormat,
    pub bytes: Bytes,
}

impl DecodedImage {
    pub fn decode(bytes: Bytes) -> Option<Self> {
        let format = ImageFormat::sniff(&bytes)?;
        Some(Self { format, bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Network side of the memoizer.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Bytes>;
}

pub struct HttpImageFetcher {
    http: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(config: &ImageCacheConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build image client: {}", e)))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &Url) -> Result<Bytes> {
        let response = self.http.get(url.clone()).send().await?;
        if response.status() != StatusCode::OK {
            return Err(ApiError::InvalidResponse.into());
        }
        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(ApiError::NoData.into());
        }
        Ok(body)
    }
}

#[derive(Clone)]
pub struct ImageCache {
    cache: Cache<String, Arc<DecodedImage>>,
    fetcher: Arc<dyn ImageFetcher>,
}

impl fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageCache")
            .field("entries", &self.cache.entry_count())
            .field("bytes", &self.cache.weighted_size())
            .finish()
    }
}

impl ImageCache {
    pub fn new(config: &ImageCacheConfig) -> Result<Self> {
        Ok(Self::with_fetcher(config, Arc::new(HttpImageFetcher::new(config)?)))
    }

    pub fn with_fetcher(config: &ImageCacheConfig, fetcher: Arc<dyn ImageFetcher>) -> Self {
        let slot = config.max_bytes / config.max_entries.max(1);
        let cache = Cache::builder()
            .max_capacity(config.max_bytes)
            .weigher(move |_url: &String, image: &Arc<DecodedImage>| -> u32 {
                let weight = (image.len() as u64).max(slot);
                weight.try_into().unwrap_or(u32::MAX)
            })
            .build();
        Self { cache, fetcher }
    }

    /// Load an image, from memory if seen before, else from the network.
    ///
    /// `None` covers a missing or unparsable URL, a failed fetch and a
    /// payload that is not a recognised image.
    pub async fn load(&self, url: Option<&str>) -> Option<Arc<DecodedImage>> {
        let raw = url?;
        let parsed = Url::parse(raw).ok()?;

        if let Some(image) = self.cache.get(raw).await {
            return Some(image);
        }

        let bytes = match self.fetcher.fetch(&parsed).await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("🖼️ Image fetch failed for {}: {}", raw, e);
                return None;
            }
        };
        let Some(image) = DecodedImage::decode(bytes) else {
            debug!("🖼️ Undecodable image payload from {}", raw);
            return None;
        };

        let image = Arc::new(image);
        self.cache.insert(raw.to_string(), image.clone()).await;
        Some(image)
    }

    /// Drop every entry. In-flight loads still insert when they finish.
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn weighted_size(&self) -> u64 {
        self.cache.weighted_size()
    }

    /// Apply pending evictions so the counters are exact.
    pub async fn sync(&self) {
        self.cache.run_pending_tasks().await;
    }
}
