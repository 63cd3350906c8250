use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rd_core::{Article, ArticleStore, BookmarkedArticle, CachedArticle, Error, Result, StoredArticle};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        source_name TEXT,
        author TEXT,
        title TEXT,
        description_text TEXT,
        url TEXT,
        url_to_image TEXT,
        published_at TEXT,
        content TEXT,
        cached_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS bookmarks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        article_id TEXT NOT NULL UNIQUE,
        source_name TEXT,
        author TEXT,
        title TEXT,
        description_text TEXT,
        url TEXT,
        url_to_image TEXT,
        published_at TEXT,
        content TEXT,
        bookmarked_at INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_articles_cached_at ON articles (cached_at)",
    "CREATE INDEX IF NOT EXISTS idx_bookmarks_bookmarked_at ON bookmarks (bookmarked_at)",
    // Add future migrations here
];

fn db_error(context: &str) -> impl FnOnce(sqlx::Error) -> Error + '_ {
    move |e| Error::Database(format!("{}: {}", context, e))
}

fn stored_fields(row: &SqliteRow) -> std::result::Result<StoredArticle, sqlx::Error> {
    Ok(StoredArticle {
        source_name: row.try_get("source_name")?,
        author: row.try_get("author")?,
        title: row.try_get("title")?,
        description: row.try_get("description_text")?,
        url: row.try_get("url")?,
        url_to_image: row.try_get("url_to_image")?,
        published_at: row.try_get("published_at")?,
        content: row.try_get("content")?,
    })
}

fn timestamp(micros: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_micros(micros).single()
}

fn cache_row(row: &SqliteRow) -> Option<CachedArticle> {
    let fields = stored_fields(row).ok()?;
    let cached_at = timestamp(row.try_get("cached_at").ok()?)?;
    CachedArticle::from_stored(fields, cached_at)
}

fn bookmark_row(row: &SqliteRow) -> Option<BookmarkedArticle> {
    let fields = stored_fields(row).ok()?;
    let article_id: String = row.try_get("article_id").ok()?;
    let bookmarked_at = timestamp(row.try_get("bookmarked_at").ok()?)?;
    BookmarkedArticle::from_stored(article_id, fields, bookmarked_at)
}

/// Durable backend on a single SQLite file.
pub struct SQLiteStorage {
    pool: SqlitePool,
    db_path: Option<PathBuf>,
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(db_error("Failed to connect to database"))?;

        Self::migrate(pool, Some(db_path.to_path_buf())).await
    }

    /// Private database that lives as long as this value.
    pub async fn new_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(db_error("Invalid in-memory options"))?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(db_error("Failed to open in-memory database"))?;

        Self::migrate(pool, None).await
    }

    async fn migrate(pool: SqlitePool, db_path: Option<PathBuf>) -> Result<Self> {
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to run migration {}: {}", i, e)))?;
        }
        Ok(Self { pool, db_path })
    }

    pub fn get_db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    async fn load_cache(&self) -> Result<Vec<CachedArticle>> {
        let rows = sqlx::query("SELECT * FROM articles ORDER BY cached_at DESC, id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to fetch cached articles"))?;

        let total = rows.len();
        let valid: Vec<_> = rows.iter().filter_map(cache_row).collect();
        if valid.len() < total {
            debug!("Skipped {} invalid cache rows", total - valid.len());
        }
        Ok(valid)
    }

    async fn load_bookmarks(&self) -> Result<Vec<BookmarkedArticle>> {
        let rows = sqlx::query("SELECT * FROM bookmarks ORDER BY bookmarked_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to fetch bookmarks"))?;

        let total = rows.len();
        let valid: Vec<_> = rows.iter().filter_map(bookmark_row).collect();
        if valid.len() < total {
            debug!("Skipped {} invalid bookmark rows", total - valid.len());
        }
        Ok(valid)
    }
}

#[async_trait]
impl ArticleStore for SQLiteStorage {
    async fn replace_cache(&self, articles: &[Article]) -> Result<()> {
        let cached_at = Utc::now().timestamp_micros();
        let mut tx = self.pool.begin().await.map_err(db_error("Failed to begin transaction"))?;

        sqlx::query("DELETE FROM articles")
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to clear cached articles"))?;

        for article in articles {
            let fields = StoredArticle::from(article);
            sqlx::query(
                r#"
                INSERT INTO articles
                (source_name, author, title, description_text, url, url_to_image, published_at, content, cached_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(fields.source_name)
            .bind(fields.author)
            .bind(fields.title)
            .bind(fields.description)
            .bind(fields.url)
            .bind(fields.url_to_image)
            .bind(fields.published_at)
            .bind(fields.content)
            .bind(cached_at)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to cache article"))?;
        }

        tx.commit().await.map_err(db_error("Failed to commit cached articles"))?;
        Ok(())
    }

    async fn fetch_cache(&self) -> Result<Vec<CachedArticle>> {
        self.load_cache().await
    }

    async fn search_cache(&self, query: &str) -> Result<Vec<CachedArticle>> {
        let rows = self.load_cache().await?;
        Ok(rows.into_iter().filter(|row| row.article.matches_query(query)).collect())
    }

    async fn clear_cache(&self) -> Result<()> {
        sqlx::query("DELETE FROM articles")
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to clear cached articles"))?;
        Ok(())
    }

    async fn add_bookmark(&self, article: &Article) -> Result<()> {
        let fields = StoredArticle::from(article);
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO bookmarks
            (article_id, source_name, author, title, description_text, url, url_to_image, published_at, content, bookmarked_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(article.id.to_string())
        .bind(fields.source_name)
        .bind(fields.author)
        .bind(fields.title)
        .bind(fields.description)
        .bind(fields.url)
        .bind(fields.url_to_image)
        .bind(fields.published_at)
        .bind(fields.content)
        .bind(Utc::now().timestamp_micros())
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to add bookmark"))?;
        Ok(())
    }

    async fn remove_bookmark(&self, article_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM bookmarks WHERE article_id = ?")
            .bind(article_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to remove bookmark"))?;
        Ok(())
    }

    async fn fetch_bookmarks(&self) -> Result<Vec<BookmarkedArticle>> {
        self.load_bookmarks().await
    }

    async fn search_bookmarks(&self, query: &str) -> Result<Vec<BookmarkedArticle>> {
        let rows = self.load_bookmarks().await?;
        Ok(rows.into_iter().filter(|row| row.article.matches_query(query)).collect())
    }

    async fn is_bookmarked(&self, article_id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM bookmarks WHERE article_id = ? LIMIT 1")
            .bind(article_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to check bookmark"))?;
        Ok(row.is_some())
    }

    async fn clear_bookmarks(&self) -> Result<()> {
        sqlx::query("DELETE FROM bookmarks")
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to clear bookmarks"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::article;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_sqlite_cache_survives_reopen() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("reader.db");

        {
            let storage = SQLiteStorage::new_with_path(&db_path).await.unwrap();
            assert_eq!(storage.get_db_path(), Some(db_path.as_path()));
            storage
                .replace_cache(&[article("One", None), article("Two", Some("second"))])
                .await
                .unwrap();
        }

        let storage = SQLiteStorage::new_with_path(&db_path).await.unwrap();
        let titles: Vec<_> = storage
            .fetch_cache()
            .await
            .unwrap()
            .into_iter()
            .map(|row| row.article.title)
            .collect();
        assert_eq!(titles, vec!["One", "Two"]);
    }

    #[tokio::test]
    async fn test_replace_cache_is_not_a_merge() {
        let storage = SQLiteStorage::new_in_memory().await.unwrap();
        storage.replace_cache(&[article("Old", None), article("Older", None)]).await.unwrap();
        storage.replace_cache(&[article("New", None)]).await.unwrap();

        let rows = storage.fetch_cache().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].article.title, "New");
    }

    #[tokio::test]
    async fn test_invalid_rows_are_skipped() {
        let storage = SQLiteStorage::new_in_memory().await.unwrap();
        storage.replace_cache(&[article("Valid", None)]).await.unwrap();
        sqlx::query("INSERT INTO articles (source_name, title, url, cached_at) VALUES ('Wire', NULL, 'https://x', 0)")
            .execute(&storage.pool)
            .await
            .unwrap();

        let rows = storage.fetch_cache().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].article.title, "Valid");
    }

    #[tokio::test]
    async fn test_bookmark_uniqueness_and_removal() {
        let storage = SQLiteStorage::new_in_memory().await.unwrap();
        let a = article("Keep", Some("me"));
        let id = a.id.to_string();

        storage.add_bookmark(&a).await.unwrap();
        storage.add_bookmark(&a).await.unwrap();
        assert_eq!(storage.fetch_bookmarks().await.unwrap().len(), 1);
        assert!(storage.is_bookmarked(&id).await.unwrap());

        storage.remove_bookmark("never-bookmarked").await.unwrap();
        assert_eq!(storage.fetch_bookmarks().await.unwrap().len(), 1);

        storage.remove_bookmark(&id).await.unwrap();
        assert!(!storage.is_bookmarked(&id).await.unwrap());
        assert!(storage.fetch_bookmarks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_bookmarks_ignores_case() {
        let storage = SQLiteStorage::new_in_memory().await.unwrap();
        storage.add_bookmark(&article("Ferris the Crab", None)).await.unwrap();
        storage.add_bookmark(&article("Gophers", Some("a CRAB appears"))).await.unwrap();
        storage.add_bookmark(&article("Snakes", None)).await.unwrap();

        let hits = storage.search_bookmarks("crab").await.unwrap();
        let titles: Vec<_> = hits.into_iter().map(|row| row.article.title).collect();
        assert_eq!(titles, vec!["Gophers", "Ferris the Crab"]);
    }

    #[tokio::test]
    async fn test_clearing_one_collection_keeps_the_other() {
        let storage = SQLiteStorage::new_in_memory().await.unwrap();
        let a = article("Both", None);
        storage.replace_cache(&[a.clone()]).await.unwrap();
        storage.add_bookmark(&a).await.unwrap();

        storage.clear_cache().await.unwrap();
        assert!(storage.fetch_cache().await.unwrap().is_empty());
        assert_eq!(storage.fetch_bookmarks().await.unwrap().len(), 1);

        storage.replace_cache(&[a.clone()]).await.unwrap();
        storage.clear_bookmarks().await.unwrap();
        assert_eq!(storage.fetch_cache().await.unwrap().len(), 1);
        assert!(storage.fetch_bookmarks().await.unwrap().is_empty());
    }
}
