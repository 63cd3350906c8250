use rd_core::config::FeedConfig;
use rd_core::{ApiError, Article, ArticleId, ArticleSource};
use rd_feed::{ArticleFeed, BookmarkShelf, FeedState};
use rd_newsapi::{DummySource, Reply};
use rd_storage::{LocalStore, SQLiteStorage};
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn article(title: &str) -> Article {
    Article {
        id: ArticleId::new(),
        source: ArticleSource { id: Some("wire".to_string()), name: "Wire".to_string() },
        author: Some("Reporter".to_string()),
        title: title.to_string(),
        description: Some(format!("About {}", title)),
        url: format!("https://example.com/{}", title),
        url_to_image: None,
        published_at: "2025-09-14T15:04:00Z".to_string(),
        content: None,
    }
}

async fn open_store(path: &Path) -> LocalStore {
    LocalStore::new(Arc::new(SQLiteStorage::new_with_path(path).await.unwrap()))
}

async fn idle(feed: &ArticleFeed) -> FeedState {
    let mut state = feed.watch();
    let idle = state.wait_for(|s| !s.is_loading).await.unwrap();
    idle.clone()
}

#[tokio::test]
async fn test_cached_headlines_survive_restart_while_offline() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("reader.db");

    let online = Arc::new(DummySource::new());
    online.push_headlines(Reply::Articles(vec![article("alpha"), article("beta")]));
    let feed = ArticleFeed::spawn(online, open_store(&db).await, FeedConfig::default());
    feed.load().await;
    let state = idle(&feed).await;
    assert_eq!(state.articles.len(), 2);

    let beta = state.articles[1].clone();
    assert!(feed.toggle(&beta).await);
    drop(feed);

    let offline = Arc::new(DummySource::new());
    offline
        .push_headlines(Reply::Fail(ApiError::InvalidResponse))
        .push_search(Reply::Fail(ApiError::Network("offline".to_string())));
    let feed = ArticleFeed::spawn(offline, open_store(&db).await, FeedConfig::default());

    feed.load().await;
    let state = idle(&feed).await;
    assert_eq!(state.error_message.as_deref(), Some("Invalid response from server"));
    let titles: Vec<_> = state.articles.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["alpha", "beta"]);

    feed.search("BETA").await;
    let state = idle(&feed).await;
    assert_eq!(state.error_message.as_deref(), Some("Network error: offline"));
    assert_eq!(state.articles.len(), 1);
    assert_eq!(state.articles[0].title, "beta");

    let shelf = BookmarkShelf::spawn(open_store(&db).await, &FeedConfig::default());
    shelf.load().await;
    let bookmarks = shelf.state().bookmarks;
    assert_eq!(bookmarks.len(), 1);
    assert_eq!(bookmarks[0].id, beta.id);

    assert!(!feed.toggle(&bookmarks[0]).await);
    shelf.load().await;
    assert!(shelf.state().bookmarks.is_empty());
}
