//! Failure-absorbing front for an [`ArticleStore`].
//!
//! Persistence errors stop here: they are logged and turned into an empty
//! result or a no-op, so the reader keeps showing whatever it can.

use rd_core::{Article, ArticleStore, BookmarkedArticle, CachedArticle};
use std::fmt;
use std::sync::Arc;
use tracing::error;

#[derive(Clone)]
pub struct LocalStore {
    backend: Arc<dyn ArticleStore>,
}

impl fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalStore").finish_non_exhaustive()
    }
}

impl LocalStore {
    pub fn new(backend: Arc<dyn ArticleStore>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(crate::InMemoryStorage::new()))
    }

    pub async fn replace_cache(&self, articles: &[Article]) {
        if let Err(e) = self.backend.replace_cache(articles).await {
            error!("💥 Failed to cache {} articles: {}", articles.len(), e);
        }
    }

    pub async fn fetch_cache(&self) -> Vec<CachedArticle> {
        self.backend.fetch_cache().await.unwrap_or_else(|e| {
            error!("💥 Failed to fetch cached articles: {}", e);
            Vec::new()
        })
    }

    pub async fn search_cache(&self, query: &str) -> Vec<CachedArticle> {
        self.backend.search_cache(query).await.unwrap_or_else(|e| {
            error!("💥 Failed to search cached articles for {:?}: {}", query, e);
            Vec::new()
        })
    }

    pub async fn clear_cache(&self) {
        if let Err(e) = self.backend.clear_cache().await {
            error!("💥 Failed to clear cached articles: {}", e);
        }
    }

    pub async fn add_bookmark(&self, article: &Article) {
        if let Err(e) = self.backend.add_bookmark(article).await {
            error!("💥 Failed to add bookmark {}: {}", article.title, e);
        }
    }

    pub async fn remove_bookmark(&self, article_id: &str) {
        if let Err(e) = self.backend.remove_bookmark(article_id).await {
            error!("💥 Failed to remove bookmark {}: {}", article_id, e);
        }
    }

    pub async fn fetch_bookmarks(&self) -> Vec<BookmarkedArticle> {
        self.backend.fetch_bookmarks().await.unwrap_or_else(|e| {
            error!("💥 Failed to fetch bookmarks: {}", e);
            Vec::new()
        })
    }

    pub async fn search_bookmarks(&self, query: &str) -> Vec<BookmarkedArticle> {
        self.backend.search_bookmarks(query).await.unwrap_or_else(|e| {
            error!("💥 Failed to search bookmarks for {:?}: {}", query, e);
            Vec::new()
        })
    }

    pub async fn is_bookmarked(&self, article_id: &str) -> bool {
        self.backend.is_bookmarked(article_id).await.unwrap_or_else(|e| {
            error!("💥 Failed to check bookmark status: {}", e);
            false
        })
    }

    pub async fn clear_bookmarks(&self) {
        if let Err(e) = self.backend.clear_bookmarks().await {
            error!("💥 Failed to clear bookmarks: {}", e);
        }
    }
}
