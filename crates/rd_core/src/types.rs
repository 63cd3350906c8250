use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Locally generated article identity.
///
/// Never derived from remote content: decoding the same story twice yields
/// two different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArticleId(Uuid);

impl ArticleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ArticleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for ArticleId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArticleSource {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(skip, default)]
    pub id: ArticleId,
    pub source: ArticleSource,
    #[serde(default)]
    pub author: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub url_to_image: Option<String>,
    pub published_at: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl Article {
    /// Parsed `published_at`, `None` when the timestamp is malformed.
    pub fn published_date(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.published_at)
            .ok()
            .map(|date| date.with_timezone(&Utc))
    }

    /// Medium date with short time in the local zone, empty when undated.
    pub fn formatted_date(&self) -> String {
        self.published_date()
            .map(|date| format_medium(&date.with_timezone(&Local)))
            .unwrap_or_default()
    }

    /// Case-insensitive substring match against the title or description.
    ///
    /// An empty query matches everything.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    }
}

pub fn format_medium<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    date.format("%b %-d, %Y at %-I:%M %p").to_string()
}

/// Body returned by both headline and search endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleResponse {
    pub status: String,
    pub total_results: u64,
    pub articles: Vec<Article>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, description: Option<&str>) -> Article {
        Article {
            id: ArticleId::new(),
            source: ArticleSource { id: None, name: "Wire".to_string() },
            author: None,
            title: title.to_string(),
            description: description.map(str::to_string),
            url: "https://example.com/a".to_string(),
            url_to_image: None,
            published_at: "2025-09-14T15:04:00Z".to_string(),
            content: None,
        }
    }

    #[test]
    fn test_decoded_articles_get_fresh_ids() {
        let body = r#"{
            "status": "ok",
            "totalResults": 1,
            "articles": [{
                "source": {"id": null, "name": "Wire"},
                "author": null,
                "title": "Rust 2.0",
                "description": "A story",
                "url": "https://example.com/rust",
                "urlToImage": null,
                "publishedAt": "2025-09-14T15:04:00Z",
                "content": null
            }]
        }"#;

        let first: ArticleResponse = serde_json::from_str(body).unwrap();
        let second: ArticleResponse = serde_json::from_str(body).unwrap();
        assert_eq!(first.total_results, 1);
        assert_eq!(first.articles[0].title, "Rust 2.0");
        assert_ne!(first.articles[0].id, second.articles[0].id);
    }

    #[test]
    fn test_missing_required_field_fails_to_decode() {
        let body = r#"{"source": {"name": "Wire"}, "url": "https://x", "publishedAt": ""}"#;
        assert!(serde_json::from_str::<Article>(body).is_err());
    }

    #[test]
    fn test_published_date_parsing() {
        let mut a = article("t", None);
        assert!(a.published_date().is_some());

        a.published_at = "yesterday".to_string();
        assert!(a.published_date().is_none());
        assert_eq!(a.formatted_date(), "");
    }

    #[test]
    fn test_format_medium() {
        let date = Utc.with_ymd_and_hms(2025, 9, 14, 15, 4, 0).unwrap();
        assert_eq!(format_medium(&date), "Sep 14, 2025 at 3:04 PM");
    }

    #[test]
    fn test_matches_query() {
        let a = article("Markets Rally", Some("Stocks climb on RUST news"));
        assert!(a.matches_query("rally"));
        assert!(a.matches_query("rust"));
        assert!(a.matches_query(""));
        assert!(!a.matches_query("bonds"));

        let b = article("Weather", None);
        assert!(!b.matches_query("rust"));
    }

    #[test]
    fn test_article_id_round_trips_through_string() {
        let id = ArticleId::new();
        let parsed: ArticleId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("nope".parse::<ArticleId>().is_err());
    }
}
