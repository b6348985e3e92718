use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    // News API
    pub news_api_url: String,
    pub news_api_key: String,
    pub news_request_timeout_secs: u64,
    pub news_articles_count: u32,
    // Company directory
    pub directory_url: String,
    pub directory_request_timeout_secs: u64,
    // Word lists
    pub positive_words_path: String,
    pub negative_words_path: String,
    // Logging
    pub log_path: String,
    // Rating
    pub rating_concurrency: usize,
    // Dashboard
    pub dashboard_host: String,
    pub dashboard_port: u16,
    pub dashboard_password: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Don't fail if .env missing

        let config = Config {
            news_api_url: env::var("NEWS_API_URL").unwrap_or_else(|_| {
                "https://newsapi.ai/api/v1/article/getArticles".to_string()
            }),
            news_api_key: env::var("NEWS_API_KEY").unwrap_or_default(),
            news_request_timeout_secs: env::var("NEWS_REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("Failed to parse NEWS_REQUEST_TIMEOUT_SECS")?,
            news_articles_count: env::var("NEWS_ARTICLES_COUNT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Failed to parse NEWS_ARTICLES_COUNT")?,
            directory_url: env::var("DIRECTORY_URL")
                .unwrap_or_else(|_| "https://stin_backend.railway.internal".to_string()),
            directory_request_timeout_secs: env::var("DIRECTORY_REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("Failed to parse DIRECTORY_REQUEST_TIMEOUT_SECS")?,
            positive_words_path: env::var("POSITIVE_WORDS_PATH")
                .unwrap_or_else(|_| "positive_words.txt".to_string()),
            negative_words_path: env::var("NEGATIVE_WORDS_PATH")
                .unwrap_or_else(|_| "negative_words.txt".to_string()),
            log_path: env::var("LOG_PATH").unwrap_or_else(|_| "log.txt".to_string()),
            rating_concurrency: env::var("RATING_CONCURRENCY")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .context("Failed to parse RATING_CONCURRENCY")?,
            dashboard_host: env::var("DASHBOARD_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            dashboard_port: env::var("DASHBOARD_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .context("Failed to parse DASHBOARD_PORT")?,
            dashboard_password: env::var("DASHBOARD_PASSWORD").unwrap_or_default(),
        };

        if config.rating_concurrency == 0 {
            anyhow::bail!("RATING_CONCURRENCY must be at least 1");
        }

        Ok(config)
    }

    pub fn dashboard_addr(&self) -> String {
        format!("{}:{}", self.dashboard_host, self.dashboard_port)
    }

    /// Defaults without touching the environment, pointed at mock servers.
    #[cfg(test)]
    pub(crate) fn test_config(news_api_url: &str, directory_url: &str) -> Config {
        Config {
            news_api_url: news_api_url.to_string(),
            news_api_key: "test-key".to_string(),
            news_request_timeout_secs: 5,
            news_articles_count: 10,
            directory_url: directory_url.to_string(),
            directory_request_timeout_secs: 5,
            positive_words_path: "positive_words.txt".to_string(),
            negative_words_path: "negative_words.txt".to_string(),
            log_path: "log.txt".to_string(),
            rating_concurrency: 2,
            dashboard_host: "127.0.0.1".to_string(),
            dashboard_port: 8000,
            dashboard_password: String::new(),
        }
    }
}
