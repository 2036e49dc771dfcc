use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::{FetchError, ScreenerProvider};
use crate::models::Config;

const BACKOFF_INITIAL: Duration = Duration::from_millis(500);
const BACKOFF_CAP: Duration = Duration::from_secs(8);

/// HTTP client for the bulk ETF screener endpoint.
pub struct ScreenerClient {
    client: Client,
    url: String,
    retry_attempts: u32,
}

impl ScreenerClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent("etf-explorer/0.1")
            .build()?;

        Ok(Self {
            client,
            url: config.screener_url.clone(),
            retry_attempts: config.retry_attempts.max(1),
        })
    }

    async fn fetch_once(&self) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::Retrieval {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Retrieval {
                url: self.url.clone(),
                reason: format!("status {status}"),
            });
        }

        response.json::<Value>().await.map_err(|e| FetchError::MalformedPayload {
            url: self.url.clone(),
            reason: e.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl ScreenerProvider for ScreenerClient {
    /// Fetch the raw screener document, retrying retrieval failures with
    /// capped exponential backoff.
    async fn fetch_screener(&self) -> Result<Value, FetchError> {
        let mut attempt = 0;
        let mut backoff = BACKOFF_INITIAL;

        loop {
            match self.fetch_once().await {
                Ok(payload) => {
                    debug!("screener fetch succeeded on attempt {}", attempt + 1);
                    return Ok(payload);
                }
                Err(e) if e.is_retryable() && attempt + 1 < self.retry_attempts => {
                    attempt += 1;
                    warn!("screener fetch attempt {} failed: {}. Retrying in {:?}", attempt, e, backoff);
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(BACKOFF_CAP);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
