use async_trait::async_trait;
use crate::records::{BookmarkedArticle, CachedArticle};
use crate::types::Article;
use crate::Result;

/// Persistence backend holding the article cache and the bookmark set.
///
/// The two collections are independent: clearing one never touches the other.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Discard every cache row and insert one row per article, as one unit.
    async fn replace_cache(&self, articles: &[Article]) -> Result<()>;

    /// All valid cache rows, most recently cached first.
    async fn fetch_cache(&self) -> Result<Vec<CachedArticle>>;

    /// Cache rows whose title or description contains `query`, ignoring case.
    async fn search_cache(&self, query: &str) -> Result<Vec<CachedArticle>>;

    async fn clear_cache(&self) -> Result<()>;

    /// Insert a bookmark row. A second row for the same article id is ignored.
    async fn add_bookmark(&self, article: &Article) -> Result<()>;

    /// Delete every bookmark row with this article id.
    async fn remove_bookmark(&self, article_id: &str) -> Result<()>;

    /// All valid bookmark rows, most recently bookmarked first.
    async fn fetch_bookmarks(&self) -> Result<Vec<BookmarkedArticle>>;

    async fn search_bookmarks(&self, query: &str) -> Result<Vec<BookmarkedArticle>>;

    async fn is_bookmarked(&self, article_id: &str) -> Result<bool>;

    async fn clear_bookmarks(&self) -> Result<()>;
}
