use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;

/// One entry from `GET /api/stocks`. Other fields are ignored.
#[derive(Debug, Clone, Deserialize)]
struct TrackedStock {
    #[serde(default)]
    name: Option<serde_json::Value>,
}

/// Client for the service that owns the list of tracked tickers.
pub struct CompanyDirectory {
    client: Client,
    base_url: String,
}

impl CompanyDirectory {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.directory_request_timeout_secs))
            .build()
            .context("Failed to build directory HTTP client")?;
        Ok(CompanyDirectory {
            client,
            base_url: config.directory_url.trim_end_matches('/').to_string(),
        })
    }

    /// For testing: create a directory client against a mock server URL
    pub fn with_client(client: Client, base_url: String) -> Self {
        CompanyDirectory {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch tracked ticker names. Entries without a string `name` are skipped.
    pub async fn fetch_companies(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/stocks", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach company directory")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Company directory returned {}: {}", status, body);
        }

        let stocks: Vec<TrackedStock> = response
            .json()
            .await
            .context("Failed to parse company directory response")?;

        let names: Vec<String> = stocks
            .into_iter()
            .filter_map(|s| match s.name {
                Some(serde_json::Value::String(name)) => Some(name),
                _ => None,
            })
            .collect();

        debug!("Company directory returned {} tickers", names.len());
        Ok(names)
    }

    /// Like `fetch_companies`, but any failure yields an empty list.
    pub async fn list_companies(&self) -> Vec<String> {
        match self.fetch_companies().await {
            Ok(names) => names,
            Err(e) => {
                warn!("External company fetch failed: {:#}", e);
                Vec::new()
            }
        }
    }
}
