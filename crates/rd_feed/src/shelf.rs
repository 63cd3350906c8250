//! Bookmark list coordinator. Purely local: no remote calls, ever.

use rd_core::config::FeedConfig;
use rd_core::records::into_articles;
use rd_core::Article;
use rd_storage::LocalStore;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

use crate::debounce::debounce;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShelfState {
    pub bookmarks: Vec<Article>,
    pub is_searching: bool,
}

enum Command {
    Load(oneshot::Sender<()>),
    Search { query: String, ack: Option<oneshot::Sender<()>> },
    Remove { article: Article, ack: oneshot::Sender<()> },
}

#[derive(Clone)]
pub struct BookmarkShelf {
    commands: mpsc::UnboundedSender<Command>,
    search_text: Arc<watch::Sender<String>>,
    state: watch::Receiver<ShelfState>,
}

impl BookmarkShelf {
    /// Start the actor. The current bookmarks are published straight away.
    pub fn spawn(store: LocalStore, config: &FeedConfig) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ShelfState::default());
        let (search_tx, search_rx) = watch::channel(String::new());

        let debounced = command_tx.clone();
        debounce(config.search_debounce, search_rx, move |query| {
            debounced.send(Command::Search { query, ack: None }).is_ok()
        });

        let actor = ShelfActor { store, state: state_tx, query: None };
        tokio::spawn(actor.run(command_rx));

        Self {
            commands: command_tx,
            search_text: Arc::new(search_tx),
            state: state_rx,
        }
    }

    pub fn state(&self) -> ShelfState {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<ShelfState> {
        self.state.clone()
    }

    pub fn set_search_text(&self, text: impl Into<String>) {
        self.search_text.send_replace(text.into());
    }

    /// Re-read the bookmark collection, keeping any active search.
    pub async fn load(&self) {
        self.request(Command::Load).await;
    }

    pub async fn search(&self, query: impl Into<String>) {
        let query = query.into();
        self.request(|ack| Command::Search { query, ack: Some(ack) }).await;
    }

    pub async fn clear_search(&self) {
        self.search_text.send_replace(String::new());
        self.search(String::new()).await;
    }

    pub async fn remove(&self, article: &Article) {
        let article = article.clone();
        self.request(|ack| Command::Remove { article, ack }).await;
    }

    async fn request(&self, command: impl FnOnce(oneshot::Sender<()>) -> Command) {
        let (ack, done) = oneshot::channel();
        if self.commands.send(command(ack)).is_ok() {
            let _ = done.await;
        }
    }
}

struct ShelfActor {
    store: LocalStore,
    state: watch::Sender<ShelfState>,
    query: Option<String>,
}

impl ShelfActor {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        self.refresh().await;
        while let Some(command) = commands.recv().await {
            match command {
                Command::Load(ack) => {
                    self.refresh().await;
                    let _ = ack.send(());
                }
                Command::Search { query, ack } => {
                    self.query = Some(query).filter(|q| !q.is_empty());
                    self.refresh().await;
                    if let Some(ack) = ack {
                        let _ = ack.send(());
                    }
                }
                Command::Remove { article, ack } => {
                    self.store.remove_bookmark(&article.id.to_string()).await;
                    self.refresh().await;
                    let _ = ack.send(());
                }
            }
        }
        debug!("Bookmark shelf stopped");
    }

    async fn refresh(&self) {
        let bookmarks = match &self.query {
            Some(query) => into_articles(self.store.search_bookmarks(query).await),
            None => into_articles(self.store.fetch_bookmarks().await),
        };
        let is_searching = self.query.is_some();
        self.state.send_modify(|s| {
            s.bookmarks = bookmarks;
            s.is_searching = is_searching;
        });
    }
}
