use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rd_core::{Article, ArticleStore, BookmarkedArticle, CachedArticle, Result, StoredArticle};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct CacheRow {
    seq: u64,
    fields: StoredArticle,
    cached_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct BookmarkRow {
    seq: u64,
    article_id: String,
    fields: StoredArticle,
    bookmarked_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    cache: Vec<CacheRow>,
    bookmarks: Vec<BookmarkRow>,
    next_seq: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    pub fn replace_cache(&mut self, articles: &[Article]) {
        let cached_at = Utc::now();
        self.cache.clear();
        for article in articles {
            let seq = self.seq();
            self.cache.push(CacheRow { seq, fields: StoredArticle::from(article), cached_at });
        }
    }

    pub fn cache_rows(&self, query: Option<&str>) -> Vec<CachedArticle> {
        let mut rows = self.cache.clone();
        rows.sort_by(|a, b| b.cached_at.cmp(&a.cached_at).then(a.seq.cmp(&b.seq)));
        rows.into_iter()
            .filter_map(|row| CachedArticle::from_stored(row.fields, row.cached_at))
            .filter(|row| query.map_or(true, |q| row.article.matches_query(q)))
            .collect()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn add_bookmark(&mut self, article: &Article) {
        let article_id = article.id.to_string();
        if self.bookmarks.iter().any(|row| row.article_id == article_id) {
            return;
        }
        let seq = self.seq();
        self.bookmarks.push(BookmarkRow {
            seq,
            article_id,
            fields: StoredArticle::from(article),
            bookmarked_at: Utc::now(),
        });
    }

    pub fn remove_bookmark(&mut self, article_id: &str) {
        self.bookmarks.retain(|row| row.article_id != article_id);
    }

    pub fn bookmark_rows(&self, query: Option<&str>) -> Vec<BookmarkedArticle> {
        let mut rows = self.bookmarks.clone();
        rows.sort_by(|a, b| b.bookmarked_at.cmp(&a.bookmarked_at).then(b.seq.cmp(&a.seq)));
        rows.into_iter()
            .filter_map(|row| BookmarkedArticle::from_stored(row.article_id, row.fields, row.bookmarked_at))
            .filter(|row| query.map_or(true, |q| row.article.matches_query(q)))
            .collect()
    }

    pub fn is_bookmarked(&self, article_id: &str) -> bool {
        self.bookmarks.iter().any(|row| row.article_id == article_id)
    }

    pub fn clear_bookmarks(&mut self) {
        self.bookmarks.clear();
    }
}

/// Volatile backend; everything is lost when the process exits.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArticleStore for InMemoryStorage {
    async fn replace_cache(&self, articles: &[Article]) -> Result<()> {
        self.store.write().await.replace_cache(articles);
        Ok(())
    }

    async fn fetch_cache(&self) -> Result<Vec<CachedArticle>> {
        Ok(self.store.read().await.cache_rows(None))
    }

    async fn search_cache(&self, query: &str) -> Result<Vec<CachedArticle>> {
        Ok(self.store.read().await.cache_rows(Some(query)))
    }

    async fn clear_cache(&self) -> Result<()> {
        self.store.write().await.clear_cache();
        Ok(())
    }

    async fn add_bookmark(&self, article: &Article) -> Result<()> {
        self.store.write().await.add_bookmark(article);
        Ok(())
    }

    async fn remove_bookmark(&self, article_id: &str) -> Result<()> {
        self.store.write().await.remove_bookmark(article_id);
        Ok(())
    }

    async fn fetch_bookmarks(&self) -> Result<Vec<BookmarkedArticle>> {
        Ok(self.store.read().await.bookmark_rows(None))
    }

    async fn search_bookmarks(&self, query: &str) -> Result<Vec<BookmarkedArticle>> {
        Ok(self.store.read().await.bookmark_rows(Some(query)))
    }

    async fn is_bookmarked(&self, article_id: &str) -> Result<bool> {
        Ok(self.store.read().await.is_bookmarked(article_id))
    }

    async fn clear_bookmarks(&self) -> Result<()> {
        self.store.write().await.clear_bookmarks();
        Ok(())
    }
}
