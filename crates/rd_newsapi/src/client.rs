use async_trait::async_trait;
use rd_core::config::NewsApiConfig;
use rd_core::{ApiError, Article, ArticleResponse, Error, NewsSource, Page, Result};
use reqwest::StatusCode;
use tracing::{debug, warn};
use url::Url;

/// HTTP client for the newsapi.org v2 endpoints.
#[derive(Debug, Clone)]
pub struct NewsApiClient {
    http: reqwest::Client,
    config: NewsApiConfig,
}

impl NewsApiClient {
    pub fn new(config: NewsApiConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &NewsApiConfig {
        &self.config
    }

    fn endpoint(&self, name: &str, params: &[(&str, String)]) -> Result<Url> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl)?
            .pop_if_empty()
            .push(name);
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
            query.append_pair("apiKey", &self.config.api_key);
        }
        Ok(url)
    }

    async fn get_articles(&self, url: Url) -> Result<Vec<Article>> {
        debug!("🌐 GET {}{}", url.host_str().unwrap_or_default(), url.path());
        let response = self.http.get(url).send().await?;

        if response.status() != StatusCode::OK {
            warn!("News API answered {}", response.status());
            return Err(ApiError::InvalidResponse.into());
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(ApiError::NoData.into());
        }

        let decoded: ArticleResponse = serde_json::from_slice(&body).map_err(|e| {
            warn!("Failed to decode article list: {}", e);
            ApiError::Decoding
        })?;
        debug!(
            "📰 Received {} of {} articles (status {})",
            decoded.articles.len(),
            decoded.total_results,
            decoded.status
        );
        Ok(decoded.articles)
    }
}

#[async_trait]
impl NewsSource for NewsApiClient {
    fn name(&self) -> &str {
        "NewsAPI"
    }

    async fn fetch_top_headlines(&self, country: &str, page: Page) -> Result<Vec<Article>> {
        let url = self.endpoint(
            "top-headlines",
            &[
                ("country", country.to_string()),
                ("page", page.page.to_string()),
                ("pageSize", page.page_size.to_string()),
            ],
        )?;
        self.get_articles(url).await
    }

    async fn search_articles(&self, query: &str, page: Page) -> Result<Vec<Article>> {
        let url = self.endpoint(
            "everything",
            &[
                ("q", query.to_string()),
                ("page", page.page.to_string()),
                ("pageSize", page.page_size.to_string()),
            ],
        )?;
        self.get_articles(url).await
    }
}
