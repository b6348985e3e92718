use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

/// Top-level response from the article search endpoint.
/// Missing `articles` or `results` means no articles.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleSearchResponse {
    #[serde(default)]
    pub articles: ArticlePage,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticlePage {
    #[serde(default)]
    pub results: Vec<NewsArticle>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
    /// ISO timestamp, e.g. `2025-04-01T08:30:00Z`
    pub date: String,
    pub source: NewsSource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsSource {
    pub title: String,
}

#[derive(Debug, Error)]
pub enum NewsApiError {
    /// Connect failure, timeout, or any other transport error
    #[error("news API request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("news API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("failed to parse news API response: {0}")]
    Decode(#[source] reqwest::Error),
}

pub struct NewsClient {
    client: Client,
    api_url: String,
    api_key: String,
    articles_count: u32,
}

impl NewsClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.news_request_timeout_secs))
            .build()
            .context("Failed to build news HTTP client")?;

        Ok(NewsClient {
            client,
            api_url: config.news_api_url.clone(),
            api_key: config.news_api_key.clone(),
            articles_count: config.news_articles_count,
        })
    }

    /// For testing: create a client against a mock server URL
    pub fn with_client(client: Client, api_url: String, api_key: String) -> Self {
        NewsClient {
            client,
            api_url,
            api_key,
            articles_count: 10,
        }
    }

    /// Fetch the most recent English articles mentioning `keyword`
    /// published between `start` and `end` (first page only).
    pub async fn search_articles(
        &self,
        keyword: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NewsArticle>, NewsApiError> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("keyword", keyword),
                ("lang", "eng"),
                ("publishedAtStart", &start.format("%Y-%m-%d").to_string()),
                ("publishedAtEnd", &end.format("%Y-%m-%d").to_string()),
                ("sortBy", "date"),
                ("resultType", "articles"),
                ("articlesPage", "1"),
                ("articlesCount", &self.articles_count.to_string()),
            ])
            .send()
            .await
            .map_err(NewsApiError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NewsApiError::Status { status, body });
        }

        let parsed: ArticleSearchResponse =
            response.json().await.map_err(NewsApiError::Decode)?;

        debug!(
            "News API returned {} articles for {}",
            parsed.articles.results.len(),
            keyword
        );
        Ok(parsed.articles.results)
    }
}
