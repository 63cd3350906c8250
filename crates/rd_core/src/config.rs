use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::source::Page;
use crate::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";
pub const DEFAULT_COUNTRY: &str = "us";
pub const DEFAULT_DB_PATH: &str = "reader.db";

#[derive(Debug, Clone)]
pub struct NewsApiConfig {
    pub base_url: Url,
    pub api_key: String,
    pub country: String,
    pub page_size: u32,
    /// `None` leaves the transport default in place.
    pub timeout: Option<Duration>,
}

impl NewsApiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid base URL {}: {}", base_url, e)))?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for NewsApiConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            api_key: String::new(),
            country: DEFAULT_COUNTRY.to_string(),
            page_size: 20,
            timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub country: String,
    pub page: Page,
    pub search_debounce: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            country: DEFAULT_COUNTRY.to_string(),
            page: Page::default(),
            search_debounce: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageCacheConfig {
    pub max_entries: u64,
    pub max_bytes: u64,
    pub timeout: Option<Duration>,
}

impl Default for ImageCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 100,
            max_bytes: 50 * 1024 * 1024,
            timeout: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    #[default]
    Memory,
    Sqlite,
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(Error::Config(format!("Unknown storage backend: {}", other))),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::Sqlite => f.write_str("sqlite"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub kind: StorageKind,
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::default(),
            path: PathBuf::from(DEFAULT_DB_PATH),
        }
    }
}
