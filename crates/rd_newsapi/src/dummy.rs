use async_trait::async_trait;
use rd_core::{ApiError, Article, Error, NewsSource, Page, Result};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

/// Canned outcome for one remote call.
#[derive(Debug, Clone)]
pub enum Reply {
    Articles(Vec<Article>),
    Fail(ApiError),
}

impl Reply {
    fn into_result(self) -> Result<Vec<Article>> {
        match self {
            Reply::Articles(articles) => Ok(articles),
            Reply::Fail(err) => Err(Error::Api(err)),
        }
    }
}

#[derive(Default)]
struct Script {
    headlines: VecDeque<(Reply, Duration)>,
    searches: VecDeque<(Reply, Duration)>,
    queries: Vec<String>,
    headline_calls: usize,
}

/// Scripted source for offline runs and tests.
///
/// Replies are consumed in order; once a queue runs dry every call fails
/// with [`ApiError::NoData`].
#[derive(Default)]
pub struct DummySource {
    script: Mutex<Script>,
}

impl fmt::Debug for DummySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummySource").finish()
    }
}

impl DummySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_headlines(&self, reply: Reply) -> &Self {
        self.push_headlines_after(reply, Duration::ZERO)
    }

    pub fn push_headlines_after(&self, reply: Reply, delay: Duration) -> &Self {
        self.lock().headlines.push_back((reply, delay));
        self
    }

    pub fn push_search(&self, reply: Reply) -> &Self {
        self.push_search_after(reply, Duration::ZERO)
    }

    pub fn push_search_after(&self, reply: Reply, delay: Duration) -> &Self {
        self.lock().searches.push_back((reply, delay));
        self
    }

    /// Every query passed to `search_articles`, oldest first.
    pub fn search_queries(&self) -> Vec<String> {
        self.lock().queries.clone()
    }

    pub fn headline_calls(&self) -> usize {
        self.lock().headline_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

async fn play(next: Option<(Reply, Duration)>) -> Result<Vec<Article>> {
    let (reply, delay) = next.unwrap_or((Reply::Fail(ApiError::NoData), Duration::ZERO));
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    reply.into_result()
}

#[async_trait]
impl NewsSource for DummySource {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn fetch_top_headlines(&self, _country: &str, _page: Page) -> Result<Vec<Article>> {
        let next = {
            let mut script = self.lock();
            script.headline_calls += 1;
            script.headlines.pop_front()
        };
        play(next).await
    }

    async fn search_articles(&self, query: &str, _page: Page) -> Result<Vec<Article>> {
        let next = {
            let mut script = self.lock();
            script.queries.push(query.to_string());
            script.searches.pop_front()
        };
        play(next).await
    }
}
