use rd_core::config::{StorageConfig, StorageKind};
use rd_core::{ArticleStore, Result};
use std::sync::Arc;

pub mod backends;
pub mod local;

pub use backends::*;
pub use local::LocalStore;

/// Build the backend named in `config`.
pub async fn create_storage(config: &StorageConfig) -> Result<Arc<dyn ArticleStore>> {
    match config.kind {
        StorageKind::Memory => Ok(Arc::new(InMemoryStorage::new())),
        #[cfg(feature = "sqlite")]
        StorageKind::Sqlite => Ok(Arc::new(SQLiteStorage::new_with_path(&config.path).await?)),
        #[cfg(not(feature = "sqlite"))]
        StorageKind::Sqlite => Err(rd_core::Error::Config(
            "SQLite support was not compiled in (enable the `sqlite` feature)".to_string(),
        )),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, LocalStore};
}
