pub mod config;
pub mod error;
pub mod records;
pub mod source;
pub mod storage;
pub mod types;

pub use error::{ApiError, Error, Result};
pub use records::{BookmarkedArticle, CachedArticle, StoredArticle};
pub use source::{NewsSource, Page};
pub use storage::ArticleStore;
pub use types::{Article, ArticleId, ArticleResponse, ArticleSource};
