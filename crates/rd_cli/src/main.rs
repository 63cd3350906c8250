use anyhow::{bail, Context};
use clap::Parser;
use rd_core::config::{FeedConfig, ImageCacheConfig, NewsApiConfig, StorageConfig, StorageKind};
use rd_core::records::into_articles;
use rd_core::{Article, NewsSource};
use rd_feed::{clear_all_data, ArticleFeed, BookmarkShelf, FeedState, ImageCache};
use rd_newsapi::NewsApiClient;
use rd_storage::LocalStore;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

mod logging;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut current_number = String::new();
        let mut has_unit = false;

        for c in s.chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
            } else if let Ok(num) = current_number.parse::<u64>() {
                let scale = match c {
                    's' => 1,
                    'm' => 60,
                    'h' => 3600,
                    _ => return Err(format!("Invalid duration unit: {}", c)),
                };
                total_seconds = num
                    .checked_mul(scale)
                    .and_then(|secs| total_seconds.checked_add(secs))
                    .ok_or_else(|| "Duration is too large".to_string())?;
                current_number.clear();
                has_unit = true;
            } else if !c.is_whitespace() {
                return Err(format!("Invalid character in duration: {}", c));
            }
        }

        // A bare number means seconds
        if !current_number.is_empty() {
            let secs = current_number
                .parse::<u64>()
                .map_err(|_| "Invalid number in duration".to_string())?;
            total_seconds = total_seconds
                .checked_add(secs)
                .ok_or_else(|| "Duration is too large".to_string())?;
            has_unit = true;
        }

        if !has_unit {
            return Err("Duration must include a number".to_string());
        }

        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Offline-first news reader", long_about = None)]
pub struct Cli {
    /// Storage backend: sqlite or memory
    #[arg(long, default_value = "sqlite")]
    storage: StorageKind,
    /// SQLite database file
    #[arg(long, env = "READER_DB", default_value = rd_core::config::DEFAULT_DB_PATH)]
    db: PathBuf,
    #[arg(long, env = "NEWSAPI_KEY", default_value = "", hide_env_values = true)]
    api_key: String,
    #[arg(long, default_value = rd_core::config::DEFAULT_BASE_URL)]
    base_url: String,
    #[arg(long, default_value = rd_core::config::DEFAULT_COUNTRY)]
    country: String,
    /// Request timeout (e.g. 30s, 1m). Defaults to the transport's own.
    #[arg(long)]
    timeout: Option<HumanDuration>,
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Fetch top headlines, falling back to the cache when offline
    Headlines,
    /// Search remotely, falling back to the cache when offline
    Search { query: String },
    /// Show the cached headlines
    Cached {
        #[arg(long)]
        query: Option<String>,
    },
    /// Show bookmarks
    Bookmarks {
        #[arg(long)]
        query: Option<String>,
    },
    Bookmark {
        #[command(subcommand)]
        command: BookmarkCommands,
    },
    /// Fetch an image through the memoizer
    Image { url: String },
    /// Clear the article cache
    Clear {
        /// Also clear bookmarks and images
        #[arg(long)]
        all: bool,
    },
}

#[derive(clap::Subcommand, Debug)]
enum BookmarkCommands {
    /// Bookmark the n-th cached headline (1-based)
    Add { index: usize },
    /// Remove the n-th bookmark (1-based)
    Remove { index: usize },
}

fn pick(articles: &[Article], index: usize) -> anyhow::Result<&Article> {
    match index.checked_sub(1).and_then(|i| articles.get(i)) {
        Some(article) => Ok(article),
        None => bail!("No entry #{} (have {})", index, articles.len()),
    }
}

fn print_articles(articles: &[Article]) {
    if articles.is_empty() {
        println!("(nothing to show)");
        return;
    }
    for (i, article) in articles.iter().enumerate() {
        let date = article.formatted_date();
        if date.is_empty() {
            println!("{:>3}. {} | {}", i + 1, article.title, article.source.name);
        } else {
            println!("{:>3}. {} | {} | {}", i + 1, article.title, article.source.name, date);
        }
    }
}

async fn settle(feed: &ArticleFeed) -> anyhow::Result<FeedState> {
    let mut state = feed.watch();
    let idle = state
        .wait_for(|s| !s.is_loading)
        .await
        .context("Article feed stopped unexpectedly")?;
    Ok(idle.clone())
}

fn report(state: &FeedState) {
    if let Some(message) = &state.error_message {
        eprintln!("⚠️  {} (showing offline results)", message);
    }
    print_articles(&state.articles);
}

fn news_source(cli: &Cli) -> anyhow::Result<Arc<dyn NewsSource>> {
    if cli.api_key.is_empty() {
        warn!("🔑 No API key set (NEWSAPI_KEY); remote calls will be rejected");
    }
    let config = NewsApiConfig::new(cli.api_key.clone())
        .with_base_url(&cli.base_url)?
        .with_timeout(cli.timeout.map(|t| t.0));
    Ok(Arc::new(NewsApiClient::new(config)?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let storage_config = StorageConfig { kind: cli.storage, path: cli.db.clone() };
    let backend = rd_storage::create_storage(&storage_config)
        .await
        .with_context(|| format!("Failed to open {} storage", storage_config.kind))?;
    let store = LocalStore::new(backend);
    info!("💾 Storage ready (using {})", storage_config.kind);

    let feed_config = FeedConfig { country: cli.country.clone(), ..FeedConfig::default() };

    match &cli.command {
        Commands::Headlines => {
            let feed = ArticleFeed::spawn(news_source(&cli)?, store, feed_config);
            feed.load().await;
            report(&settle(&feed).await?);
        }
        Commands::Search { query } => {
            let feed = ArticleFeed::spawn(news_source(&cli)?, store, feed_config);
            feed.search(query.as_str()).await;
            report(&settle(&feed).await?);
        }
        Commands::Cached { query } => {
            let rows = match query {
                Some(query) => store.search_cache(query).await,
                None => store.fetch_cache().await,
            };
            let articles = into_articles(rows);
            print_articles(&articles);
        }
        Commands::Bookmarks { query } => {
            let shelf = BookmarkShelf::spawn(store, &feed_config);
            match query {
                Some(query) => shelf.search(query.as_str()).await,
                None => shelf.load().await,
            }
            print_articles(&shelf.state().bookmarks);
        }
        Commands::Bookmark { command: BookmarkCommands::Add { index } } => {
            let cached = into_articles(store.fetch_cache().await);
            let article = pick(&cached, *index)?;
            let feed = ArticleFeed::spawn(news_source(&cli)?, store, feed_config);
            if feed.toggle(article).await {
                println!("🔖 Bookmarked: {}", article.title);
            } else {
                println!("Could not bookmark: {}", article.title);
            }
        }
        Commands::Bookmark { command: BookmarkCommands::Remove { index } } => {
            let shelf = BookmarkShelf::spawn(store, &feed_config);
            shelf.load().await;
            let bookmarks = shelf.state().bookmarks;
            let article = pick(&bookmarks, *index)?;
            shelf.remove(article).await;
            println!("🗑️  Removed bookmark: {}", article.title);
        }
        Commands::Image { url } => {
            let config = ImageCacheConfig { timeout: cli.timeout.map(|t| t.0), ..ImageCacheConfig::default() };
            let images = ImageCache::new(&config)?;
            match images.load(Some(url.as_str())).await {
                Some(image) => println!("🖼️  {:?} image, {} bytes", image.format, image.len()),
                None => println!("No image"),
            }
        }
        Commands::Clear { all: true } => {
            let images = ImageCache::new(&ImageCacheConfig::default())?;
            clear_all_data(&store, &images).await;
            println!("🧹 Cached articles, bookmarks and images cleared");
        }
        Commands::Clear { all: false } => {
            store.clear_cache().await;
            println!("🧹 Article cache cleared");
        }
    }

    Ok(())
}
