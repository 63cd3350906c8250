use rd_storage::LocalStore;
use tracing::info;

use crate::image::ImageCache;

/// Wipe everything the reader keeps: cached headlines, bookmarks and images.
pub async fn clear_all_data(store: &LocalStore, images: &ImageCache) {
    store.clear_cache().await;
    store.clear_bookmarks().await;
    images.clear();
    info!("🧹 Cleared cached articles, bookmarks and images");
}
