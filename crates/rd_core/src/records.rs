//! Persisted row types for the two local collections.
//!
//! Both collections store the article flattened into nullable columns.
//! [`StoredArticle`] is that column set; converting it back into an
//! [`Article`] is the validation boundary where rows missing a required
//! field are rejected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Article, ArticleId, ArticleSource};

/// Flattened article columns as they sit in storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredArticle {
    pub source_name: Option<String>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub url_to_image: Option<String>,
    pub published_at: Option<String>,
    pub content: Option<String>,
}

impl StoredArticle {
    /// Rebuild an article, or `None` if a required column is missing.
    ///
    /// The external source id is not persisted and comes back as `None`.
    pub fn into_article(self, id: ArticleId) -> Option<Article> {
        Some(Article {
            id,
            source: ArticleSource { id: None, name: self.source_name? },
            author: self.author,
            title: self.title?,
            description: self.description,
            url: self.url?,
            url_to_image: self.url_to_image,
            published_at: self.published_at.unwrap_or_default(),
            content: self.content,
        })
    }
}

impl From<&Article> for StoredArticle {
    fn from(article: &Article) -> Self {
        Self {
            source_name: Some(article.source.name.clone()),
            author: article.author.clone(),
            title: Some(article.title.clone()),
            description: article.description.clone(),
            url: Some(article.url.clone()),
            url_to_image: article.url_to_image.clone(),
            published_at: Some(article.published_at.clone()),
            content: article.content.clone(),
        }
    }
}

/// A row of the article cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedArticle {
    #[serde(flatten)]
    pub article: Article,
    pub cached_at: DateTime<Utc>,
}

impl CachedArticle {
    /// Validate a stored row. Every read hands out a fresh article id.
    pub fn from_stored(stored: StoredArticle, cached_at: DateTime<Utc>) -> Option<Self> {
        let article = stored.into_article(ArticleId::new())?;
        Some(Self { article, cached_at })
    }
}

/// A row of the bookmark collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkedArticle {
    pub article_id: String,
    #[serde(flatten)]
    pub article: Article,
    pub bookmarked_at: DateTime<Utc>,
}

impl BookmarkedArticle {
    pub fn new(article: &Article, bookmarked_at: DateTime<Utc>) -> Self {
        Self {
            article_id: article.id.to_string(),
            article: article.clone(),
            bookmarked_at,
        }
    }

    /// Validate a stored row, restoring the article id from `article_id`
    /// when it parses so that toggling a listed bookmark removes it.
    pub fn from_stored(
        article_id: String,
        stored: StoredArticle,
        bookmarked_at: DateTime<Utc>,
    ) -> Option<Self> {
        let id = article_id.parse().unwrap_or_default();
        let article = stored.into_article(id)?;
        Some(Self { article_id, article, bookmarked_at })
    }
}

pub fn into_articles<I, R>(rows: I) -> Vec<Article>
where
    I: IntoIterator<Item = R>,
    R: Into<Article>,
{
    rows.into_iter().map(Into::into).collect()
}

impl From<CachedArticle> for Article {
    fn from(row: CachedArticle) -> Self {
        row.article
    }
}

impl From<BookmarkedArticle> for Article {
    fn from(row: BookmarkedArticle) -> Self {
        row.article
    }
}
