use async_trait::async_trait;
use crate::types::Article;
use crate::Result;

/// Paging parameters shared by both remote calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self { page: 1, page_size: 20 }
    }
}

/// Read-only remote news API.
#[async_trait]
pub trait NewsSource: Send + Sync {
    fn name(&self) -> &str;

    /// Top headlines for a two-letter country code.
    async fn fetch_top_headlines(&self, country: &str, page: Page) -> Result<Vec<Article>>;

    /// Free-text search across all articles.
    async fn search_articles(&self, query: &str, page: Page) -> Result<Vec<Article>>;
}
