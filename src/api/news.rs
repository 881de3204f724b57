//! News search API client

use std::collections::HashMap;

use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::{HttpClient, join_url, status_error};
use crate::config::NewsConfig;
use crate::models::NewsArticle;
use crate::models::news::sort_newest_first;
use crate::{ErrorCode, ShelterFinderError};

const SERVICE: &str = "News API";

/// Title the news API substitutes for withdrawn articles
const REMOVED_MARKER: &str = "[Removed]";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsArticle>,
}

impl SearchResponse {
    fn into_articles(self) -> crate::Result<Vec<NewsArticle>> {
        if self.status != "ok" {
            let code = match self.code.as_deref() {
                Some("apiKeyInvalid" | "apiKeyMissing" | "apiKeyDisabled" | "apiKeyExhausted") => {
                    ErrorCode::ApiUnauthorized
                }
                Some("rateLimited") => ErrorCode::ApiRateLimit,
                _ => ErrorCode::ApiNetworkError,
            };
            return Err(ShelterFinderError::api_with_context(
                format!(
                    "{SERVICE} error: {}",
                    self.message.as_deref().unwrap_or("unknown error")
                ),
                code,
                HashMap::from([("code".to_string(), self.code.unwrap_or_default())]),
            ));
        }

        let mut articles: Vec<NewsArticle> = self
            .articles
            .into_iter()
            .filter(|a| a.title != REMOVED_MARKER)
            .collect();
        sort_newest_first(&mut articles);
        Ok(articles)
    }
}

/// HTTP client for the news search API
pub struct NewsClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
}

impl NewsClient {
    /// Create a client; fails when no API key is configured
    pub fn new(http: HttpClient, config: &NewsConfig) -> crate::Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            ShelterFinderError::config(
                "News API key is required. Set news.api_key or SHELTERFINDER_NEWS__API_KEY.",
            )
        })?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key,
        })
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}?q={}&apiKey={}",
            join_url(&self.base_url, "everything"),
            urlencoding::encode(query),
            urlencoding::encode(&self.api_key)
        )
    }

    /// Articles matching `query`, newest first
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> crate::Result<Vec<NewsArticle>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ShelterFinderError::validation("News query cannot be empty"));
        }

        let response = self.http.get(&self.search_url(query)).await?;
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ShelterFinderError::api_with_context(
                format!("Failed to read {SERVICE} response: {e}"),
                ErrorCode::ApiNetworkError,
                HashMap::new(),
            )
        })?;

        // Error statuses still carry a JSON body with the reason
        let parsed: SearchResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => return Err(status_error(status, SERVICE, &body)),
            Err(e) => {
                return Err(ShelterFinderError::api_with_context(
                    format!("Invalid data received from {SERVICE}"),
                    ErrorCode::ApiInvalidResponse,
                    HashMap::from([("error".to_string(), e.to_string())]),
                ));
            }
        };

        let articles = parsed.into_articles()?;
        info!("Found {} articles for '{}'", articles.len(), query);
        debug!(
            "Headlines: {:?}",
            articles.iter().map(NewsArticle::headline).collect::<Vec<_>>()
        );
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "status": "ok",
        "totalResults": 3,
        "articles": [
            {
                "source": {"id": null, "name": "Coastal Daily"},
                "author": null,
                "title": "Shelters open across the county",
                "description": "Evacuation centers are accepting residents.",
                "url": "https://news.example/shelters",
                "urlToImage": null,
                "publishedAt": "2024-09-26T12:00:00Z",
                "content": null
            },
            {
                "source": {"id": null, "name": "[Removed]"},
                "author": null,
                "title": "[Removed]",
                "description": "[Removed]",
                "url": "https://removed.com",
                "urlToImage": null,
                "publishedAt": "1970-01-01T00:00:00Z",
                "content": "[Removed]"
            },
            {
                "source": {"id": "wire", "name": "Wire"},
                "author": "Staff",
                "title": "Storm upgraded to category 4",
                "description": null,
                "url": "https://news.example/upgrade",
                "urlToImage": null,
                "publishedAt": "2024-09-27T16:05:00Z",
                "content": null
            }
        ]
    }"#;

    #[test]
    fn test_articles_sorted_and_removed_filtered() {
        let response: SearchResponse = serde_json::from_str(BODY).unwrap();
        let articles = response.into_articles().unwrap();
        let titles: Vec<_> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Storm upgraded to category 4", "Shelters open across the county"]
        );
    }

    #[test]
    fn test_error_response() {
        let body = r#"{"status": "error", "code": "apiKeyInvalid", "message": "Your API key is invalid or incorrect."}"#;
        let response: SearchResponse = serde_json::from_str(body).unwrap();
        let err = response.into_articles().unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ApiUnauthorized));
        assert!(err.to_string().contains("Your API key is invalid"));
    }

    #[test]
    fn test_rate_limited_response() {
        let body = r#"{"status": "error", "code": "rateLimited", "message": "Too many requests"}"#;
        let response: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            response.into_articles().unwrap_err().code(),
            Some(ErrorCode::ApiRateLimit)
        );
    }

    #[test]
    fn test_search_url_encodes_query() {
        let config = NewsConfig {
            api_key: Some("news-key-1234".to_string()),
            ..NewsConfig::default()
        };
        let client = NewsClient::new(HttpClient::new(5, 0).unwrap(), &config).unwrap();
        assert_eq!(
            client.search_url("hurricane helene"),
            "https://newsapi.org/v2/everything?q=hurricane%20helene&apiKey=news-key-1234"
        );
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let result = NewsClient::new(HttpClient::new(5, 0).unwrap(), &NewsConfig::default());
        assert!(matches!(result, Err(ShelterFinderError::Config { .. })));
    }
}
