//! Headline list coordinator.
//!
//! [`ArticleFeed`] is a handle to an actor task that owns the list state.
//! Every command is applied in arrival order on that one task; remote
//! calls run on spawned tasks and report back through a completion channel
//! stamped with the generation that issued them. Only a completion from the
//! current generation is published. A successful load is still written to
//! the cache when superseded, unless a later load has already been cached.

use rd_core::config::FeedConfig;
use rd_core::records::into_articles;
use rd_core::{Article, ArticleId, NewsSource, Result};
use rd_storage::LocalStore;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::debounce::debounce;

const EVENT_CAPACITY: usize = 64;

/// Snapshot of everything the list view renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedState {
    pub articles: Vec<Article>,
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub is_searching: bool,
}

/// Ordered record of published changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    Loading,
    Failed(String),
    Articles(Vec<Article>),
}

enum Command {
    Load(oneshot::Sender<()>),
    Search { query: String, ack: Option<oneshot::Sender<()>> },
    ClearSearch(oneshot::Sender<()>),
    Toggle { article: Article, reply: oneshot::Sender<bool> },
    IsBookmarked { id: ArticleId, reply: oneshot::Sender<bool> },
}

enum Completion {
    Loaded { generation: u64, ticket: u64, result: Result<Vec<Article>> },
    Searched { generation: u64, query: String, result: Result<Vec<Article>> },
}

#[derive(Clone)]
pub struct ArticleFeed {
    commands: mpsc::UnboundedSender<Command>,
    search_text: Arc<watch::Sender<String>>,
    state: watch::Receiver<FeedState>,
    events: broadcast::Sender<FeedEvent>,
}

impl ArticleFeed {
    /// Start the actor. The cached articles are published straight away.
    pub fn spawn(source: Arc<dyn NewsSource>, store: LocalStore, config: FeedConfig) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(FeedState::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (search_tx, search_rx) = watch::channel(String::new());

        let debounced = command_tx.clone();
        debounce(config.search_debounce, search_rx, move |query| {
            debounced.send(Command::Search { query, ack: None }).is_ok()
        });

        let actor = FeedActor {
            source,
            store,
            config,
            state: state_tx,
            events: events.clone(),
            completions: completion_tx,
            generation: 0,
            loads: 0,
            cached_load: 0,
        };
        tokio::spawn(actor.run(command_rx, completion_rx));

        Self {
            commands: command_tx,
            search_text: Arc::new(search_tx),
            state: state_rx,
            events,
        }
    }

    pub fn state(&self) -> FeedState {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<FeedState> {
        self.state.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.events.subscribe()
    }

    pub fn search_text(&self) -> String {
        self.search_text.borrow().clone()
    }

    /// Update the search box. The search runs once the text settles.
    pub fn set_search_text(&self, text: impl Into<String>) {
        self.search_text.send_replace(text.into());
    }

    /// Fetch headlines. Returns once the loading state is published.
    pub async fn load(&self) {
        self.request(Command::Load).await;
    }

    pub async fn refresh(&self) {
        self.load().await;
    }

    /// Search now, bypassing the debounce window.
    pub async fn search(&self, query: impl Into<String>) {
        let query = query.into();
        self.request(|ack| Command::Search { query, ack: Some(ack) }).await;
    }

    pub async fn clear_search(&self) {
        self.search_text.send_replace(String::new());
        self.request(Command::ClearSearch).await;
    }

    /// Flip the bookmark for `article`, returning whether it is now bookmarked.
    pub async fn toggle(&self, article: &Article) -> bool {
        let article = article.clone();
        self.ask(|reply| Command::Toggle { article, reply }).await
    }

    pub async fn is_bookmarked(&self, id: ArticleId) -> bool {
        self.ask(|reply| Command::IsBookmarked { id, reply }).await
    }

    async fn request(&self, command: impl FnOnce(oneshot::Sender<()>) -> Command) {
        let (ack, done) = oneshot::channel();
        if self.commands.send(command(ack)).is_ok() {
            let _ = done.await;
        }
    }

    async fn ask(&self, command: impl FnOnce(oneshot::Sender<bool>) -> Command) -> bool {
        let (reply, answer) = oneshot::channel();
        if self.commands.send(command(reply)).is_err() {
            return false;
        }
        answer.await.unwrap_or(false)
    }
}

struct FeedActor {
    source: Arc<dyn NewsSource>,
    store: LocalStore,
    config: FeedConfig,
    state: watch::Sender<FeedState>,
    events: broadcast::Sender<FeedEvent>,
    completions: mpsc::UnboundedSender<Completion>,
    generation: u64,
    /// Tickets of the last issued load and of the last one written to the cache.
    loads: u64,
    cached_load: u64,
}

impl FeedActor {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        self.show_cache().await;
        loop {
            tokio::select! {
                Some(completion) = completions.recv() => self.complete(completion).await,
                command = commands.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
            }
        }
        debug!("Article feed stopped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Load(ack) => {
                self.load();
                let _ = ack.send(());
            }
            Command::Search { query, ack } => {
                self.search(query).await;
                if let Some(ack) = ack {
                    let _ = ack.send(());
                }
            }
            Command::ClearSearch(ack) => {
                self.search(String::new()).await;
                let _ = ack.send(());
            }
            Command::Toggle { article, reply } => {
                let _ = reply.send(self.toggle(&article).await);
            }
            Command::IsBookmarked { id, reply } => {
                let _ = reply.send(self.store.is_bookmarked(&id.to_string()).await);
            }
        }
    }

    fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error_message = None;
        });
        self.emit(FeedEvent::Loading);
        self.generation
    }

    fn load(&mut self) {
        let generation = self.begin();
        self.loads += 1;
        let ticket = self.loads;
        info!("📡 Loading headlines from {}", self.source.name());

        let source = self.source.clone();
        let completions = self.completions.clone();
        let country = self.config.country.clone();
        let page = self.config.page;
        tokio::spawn(async move {
            let result = source.fetch_top_headlines(&country, page).await;
            let _ = completions.send(Completion::Loaded { generation, ticket, result });
        });
    }

    async fn search(&mut self, query: String) {
        if query.is_empty() {
            self.generation += 1;
            self.state.send_modify(|s| s.is_searching = false);
            let cached = into_articles(self.store.fetch_cache().await);
            self.finish(cached);
            return;
        }

        self.state.send_modify(|s| s.is_searching = true);
        let generation = self.begin();
        info!("🔍 Searching {} for {:?}", self.source.name(), query);

        let source = self.source.clone();
        let completions = self.completions.clone();
        let page = self.config.page;
        tokio::spawn(async move {
            let result = source.search_articles(&query, page).await;
            let _ = completions.send(Completion::Searched { generation, query, result });
        });
    }

    async fn complete(&mut self, completion: Completion) {
        match completion {
            Completion::Loaded { generation, ticket, result } => {
                self.loaded(generation, ticket, result).await
            }
            Completion::Searched { generation, .. } if generation != self.generation => {
                debug!("Dropping superseded search from generation {}", generation);
            }
            Completion::Searched { result: Ok(articles), query, .. } => {
                info!("✨ Found {} articles for {:?}", articles.len(), query);
                self.finish(articles);
            }
            Completion::Searched { result: Err(e), query, .. } => {
                warn!("⚠️ Remote search failed, searching cached articles: {}", e);
                self.fail(e.to_string());
                let local = into_articles(self.store.search_cache(&query).await);
                self.finish(local);
            }
        }
    }

    async fn loaded(&mut self, generation: u64, ticket: u64, result: Result<Vec<Article>>) {
        let current = generation == self.generation;
        match result {
            Ok(articles) => {
                let newest = ticket > self.cached_load;
                if newest {
                    info!("✨ Loaded {} headlines", articles.len());
                    self.store.replace_cache(&articles).await;
                    self.cached_load = ticket;
                }
                if current {
                    self.finish(articles);
                } else if newest && self.showing_cache() {
                    debug!("Showing headlines from superseded load {}", ticket);
                    self.show_cache().await;
                } else {
                    debug!("Not publishing superseded load {}", ticket);
                }
            }
            Err(e) if current => {
                warn!("⚠️ Headline fetch failed, showing cached articles: {}", e);
                self.fail(e.to_string());
                let cached = into_articles(self.store.fetch_cache().await);
                self.finish(cached);
            }
            Err(e) => {
                debug!("Dropping superseded load failure {}: {}", ticket, e);
            }
        }
    }

    /// The list is idle and not showing search results, so it mirrors the cache.
    fn showing_cache(&self) -> bool {
        let state = self.state.borrow();
        !state.is_loading && !state.is_searching
    }

    async fn toggle(&self, article: &Article) -> bool {
        let id = article.id.to_string();
        if self.store.is_bookmarked(&id).await {
            self.store.remove_bookmark(&id).await;
        } else {
            self.store.add_bookmark(article).await;
        }
        self.store.is_bookmarked(&id).await
    }

    async fn show_cache(&self) {
        let cached = into_articles(self.store.fetch_cache().await);
        self.state.send_modify(|s| s.articles = cached.clone());
        self.emit(FeedEvent::Articles(cached));
    }

    /// Publish the outcome of a load or search and leave the loading state.
    fn finish(&self, articles: Vec<Article>) {
        self.emit(FeedEvent::Articles(articles.clone()));
        self.state.send_modify(|s| {
            s.is_loading = false;
            s.articles = articles;
        });
    }

    fn fail(&self, message: String) {
        self.state.send_modify(|s| s.error_message = Some(message.clone()));
        self.emit(FeedEvent::Failed(message));
    }

    fn emit(&self, event: FeedEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
