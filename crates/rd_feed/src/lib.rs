pub mod debounce;
pub mod feed;
pub mod image;
pub mod reset;
pub mod shelf;

pub use feed::{ArticleFeed, FeedEvent, FeedState};
pub use image::{DecodedImage, HttpImageFetcher, ImageCache, ImageFetcher, ImageFormat};
pub use reset::clear_all_data;
pub use shelf::{BookmarkShelf, ShelfState};

pub mod prelude {
    pub use super::{ArticleFeed, BookmarkShelf, FeedEvent, FeedState, ImageCache, ShelfState};
    pub use rd_core::{Article, ArticleId, Error, Result};
    pub use rd_storage::LocalStore;
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{ArticleFeed, FeedState};
    use rd_core::{Article, ArticleId, ArticleSource};

    pub fn article(title: &str, description: Option<&str>) -> Article {
        Article {
            id: ArticleId::new(),
            source: ArticleSource { id: None, name: "Wire".to_string() },
            author: None,
            title: title.to_string(),
            description: description.map(str::to_string),
            url: format!("https://example.com/{}", title.len()),
            url_to_image: None,
            published_at: "2025-09-14T15:04:00Z".to_string(),
            content: None,
        }
    }

    pub fn titles(articles: &[Article]) -> Vec<&str> {
        articles.iter().map(|a| a.title.as_str()).collect()
    }

    /// Wait until the feed has no load or search in flight.
    pub async fn wait_idle(feed: &ArticleFeed) -> FeedState {
        let mut state = feed.watch();
        let idle = state.wait_for(|s| !s.is_loading).await.expect("feed actor stopped");
        idle.clone()
    }
}
