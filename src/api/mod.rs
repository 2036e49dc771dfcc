use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

pub mod active_etf_client;
pub mod screener_client;
pub use active_etf_client::ActiveEtfClient;
pub use screener_client::ScreenerClient;

/// What can go wrong talking to a remote feed.
///
/// `Retrieval` covers network failures, timeouts and non-success HTTP
/// statuses; `MalformedPayload` means the body came back but is not the
/// JSON we expect. Field-level coercion failures are not errors at all
/// (see `utils`).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {reason}")]
    Retrieval { url: String, reason: String },
    #[error("payload from {url} is malformed: {reason}")]
    MalformedPayload { url: String, reason: String },
}

impl FetchError {
    /// Only retrieval failures are worth retrying; a malformed body will
    /// be malformed again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Retrieval { .. })
    }
}

/// Fixed-delay limiter used between page requests of the secondary feed,
/// so the pagination loop does not hammer the remote server.
pub struct PageRateLimiter {
    delay: Duration,
}

impl PageRateLimiter {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
        }
    }

    pub async fn wait(&self) {
        tokio::time::sleep(self.delay).await;
    }
}

/// The primary screener feed: one bulk JSON document keyed by ticker.
#[async_trait::async_trait]
pub trait ScreenerProvider: Send + Sync {
    async fn fetch_screener(&self) -> Result<Value, FetchError>;
}

/// The secondary actively-managed feed. Best-effort by contract: a total
/// failure surfaces as an empty mapping, never as an error.
#[async_trait::async_trait]
pub trait EnrichmentProvider: Send + Sync {
    async fn fetch_enrichment_tags(&self) -> HashMap<String, bool>;
}
