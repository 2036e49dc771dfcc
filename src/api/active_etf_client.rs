use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{EnrichmentProvider, FetchError, PageRateLimiter};
use crate::models::Config;

const PAGE_BACKOFF: Duration = Duration::from_millis(500);

/// One page of the actively-managed feed. Only the ticker-bearing field
/// matters; the rest of each row is ignored.
#[derive(Debug, Deserialize)]
struct ActiveEtfPage {
    #[serde(default)]
    data: Vec<ActiveEtfRow>,
}

#[derive(Debug, Deserialize)]
struct ActiveEtfRow {
    // Source variants disagree on the field name.
    #[serde(alias = "ticker", alias = "symbol")]
    symbol: String,
}

/// HTTP client for the paginated actively-managed ETF feed.
///
/// This feed is an unreliable collaborator: the whole fetch is
/// best-effort and degrades to an empty mapping, so its failure modes
/// never leak into the pipeline's error taxonomy.
pub struct ActiveEtfClient {
    client: Client,
    url: String,
    page_size: u32,
    max_pages: u32,
    retry_attempts: u32,
    rate_limiter: PageRateLimiter,
}

impl ActiveEtfClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent("etf-explorer/0.1")
            .build()?;

        Ok(Self {
            client,
            url: config.active_etf_url.clone(),
            page_size: config.page_size.max(1),
            max_pages: config.max_pages.max(1),
            retry_attempts: config.retry_attempts.max(1),
            rate_limiter: PageRateLimiter::new(config.page_delay_ms),
        })
    }

    async fn fetch_page(&self, offset: u32) -> Result<Vec<String>, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("offset", offset.to_string()), ("limit", self.page_size.to_string())])
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
                reason: format!("status {status} at offset {offset}"),
            });
        }

        let page: ActiveEtfPage =
            response.json().await.map_err(|e| FetchError::MalformedPayload {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;

        Ok(page.data.into_iter().map(|row| row.symbol).collect())
    }

    /// Bounded retry around one page. A page that still fails after the
    /// last attempt is the caller's problem (it logs and skips).
    async fn fetch_page_with_retry(&self, offset: u32) -> Result<Vec<String>, FetchError> {
        let mut attempt = 0;
        loop {
            match self.fetch_page(offset).await {
                Ok(symbols) => return Ok(symbols),
                Err(e) if e.is_retryable() && attempt + 1 < self.retry_attempts => {
                    attempt += 1;
                    warn!("page at offset {} attempt {} failed: {}. Retrying...", offset, attempt, e);
                    tokio::time::sleep(PAGE_BACKOFF).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait::async_trait]
impl EnrichmentProvider for ActiveEtfClient {
    /// Walk the feed page by page, accumulating ticker symbols. Stops on
    /// the first empty page, with `max_pages` as a circuit breaker
    /// against unbounded pagination. Failed pages are logged and skipped;
    /// no partial state survives a failed page.
    async fn fetch_enrichment_tags(&self) -> HashMap<String, bool> {
        let mut tags = HashMap::new();

        for page in 0..self.max_pages {
            if page > 0 {
                self.rate_limiter.wait().await;
            }

            let offset = page * self.page_size;
            match self.fetch_page_with_retry(offset).await {
                Ok(symbols) => {
                    if symbols.is_empty() {
                        debug!("empty page at offset {}, pagination complete", offset);
                        break;
                    }
                    for symbol in symbols {
                        tags.insert(symbol.trim().to_uppercase(), true);
                    }
                }
                Err(e) => {
                    warn!("skipping page at offset {}: {}", offset, e);
                }
            }

            if page + 1 == self.max_pages {
                warn!("pagination stopped at page cap ({})", self.max_pages);
            }
        }

        info!("collected {} actively-managed tickers", tags.len());
        tags
    }
}
