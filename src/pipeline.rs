//! One fetch → normalize → enrich cycle.
//!
//! Data flows strictly one way: remote JSON → flat record set → enriched
//! record set. Errors from the primary fetch are caught at this boundary
//! and converted into an empty result plus a logged diagnostic; they
//! never propagate to the caller.

use anyhow::Result;
use tracing::{error, info};

use crate::api::{ActiveEtfClient, EnrichmentProvider, ScreenerClient, ScreenerProvider};
use crate::enricher::enrich;
use crate::models::{Config, EnrichedRecord};
use crate::normalizer::normalize;

pub struct Pipeline<S, E> {
    screener: S,
    enrichment: E,
}

impl Pipeline<ScreenerClient, ActiveEtfClient> {
    /// Wire up the real HTTP clients from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Pipeline::new(ScreenerClient::new(config)?, ActiveEtfClient::new(config)?))
    }
}

impl<S, E> Pipeline<S, E>
where
    S: ScreenerProvider,
    E: EnrichmentProvider,
{
    pub fn new(screener: S, enrichment: E) -> Self {
        Self { screener, enrichment }
    }

    /// Run one full cycle. An empty Vec is the single "no data
    /// available" state, whether the feed was empty or the fetch failed.
    pub async fn run(&self) -> Vec<EnrichedRecord> {
        // The two feeds are independent, so fetch them concurrently. The
        // secondary is best-effort and resolves to an empty map on failure.
        let (payload, tags) = tokio::join!(
            self.screener.fetch_screener(),
            self.enrichment.fetch_enrichment_tags(),
        );

        let payload = match payload {
            Ok(payload) => payload,
            Err(e) => {
                error!("screener fetch failed: {}", e);
                return Vec::new();
            }
        };

        let records = normalize(&payload);
        if records.is_empty() {
            info!("screener returned no usable entries");
            return Vec::new();
        }

        let enriched = enrich(records, &tags);
        info!("pipeline produced {} records ({} actively managed)",
              enriched.len(),
              enriched.iter().filter(|r| r.actively_managed).count());
        enriched
    }
}
