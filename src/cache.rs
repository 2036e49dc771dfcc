//! Time-bounded memoization of the pipeline result.
//!
//! Callers within the TTL window share one cached table without
//! triggering a second fetch. The refresh runs while the single slot is
//! locked, so on expiry exactly one fetch is in flight and concurrent
//! callers wait for it instead of stampeding the remote feed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::api::{EnrichmentProvider, ScreenerProvider};
use crate::models::EnrichedRecord;
use crate::pipeline::Pipeline;

struct CacheEntry {
    records: Arc<Vec<EnrichedRecord>>,
    fetched_at: Instant,
}

pub struct EtfCache {
    ttl: Duration,
    slot: Mutex<Option<CacheEntry>>,
}

impl EtfCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Return the cached table while it is fresh; otherwise run one
    /// pipeline cycle and cache the result. This is the only entry point.
    pub async fn get_or_refresh<S, E>(&self, pipeline: &Pipeline<S, E>) -> Arc<Vec<EnrichedRecord>>
    where
        S: ScreenerProvider,
        E: EnrichmentProvider,
    {
        let mut slot = self.slot.lock().await;

        if let Some(entry) = slot.as_ref() {
            if entry.fetched_at.elapsed() < self.ttl {
                debug!("serving {} records from cache", entry.records.len());
                return Arc::clone(&entry.records);
            }
            info!("cache expired after {:?}, refreshing", self.ttl);
        }

        let records = Arc::new(pipeline.run().await);
        *slot = Some(CacheEntry {
            records: Arc::clone(&records),
            fetched_at: Instant::now(),
        });
        records
    }

    /// Drop the cached value; the next caller refetches.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FetchError;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingScreener {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl ScreenerProvider for CountingScreener {
        async fn fetch_screener(&self) -> Result<Value, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({ "data": { "data": { "SPY": { "issuer": "SSGA" } } } }))
        }
    }

    struct NoTags;

    #[async_trait::async_trait]
    impl EnrichmentProvider for NoTags {
        async fn fetch_enrichment_tags(&self) -> HashMap<String, bool> {
            HashMap::new()
        }
    }

    fn counting_pipeline() -> (Pipeline<CountingScreener, NoTags>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new(CountingScreener { calls: Arc::clone(&calls) }, NoTags);
        (pipeline, calls)
    }

    #[tokio::test]
    async fn test_second_call_within_ttl_is_cached() {
        let (pipeline, calls) = counting_pipeline();
        let cache = EtfCache::new(Duration::from_secs(3600));

        let first = cache.get_or_refresh(&pipeline).await;
        let second = cache.get_or_refresh(&pipeline).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_expired_entry_triggers_one_refetch() {
        let (pipeline, calls) = counting_pipeline();
        let cache = EtfCache::new(Duration::from_millis(10));

        cache.get_or_refresh(&pipeline).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        cache.get_or_refresh(&pipeline).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let (pipeline, calls) = counting_pipeline();
        let cache = EtfCache::new(Duration::from_secs(3600));

        cache.get_or_refresh(&pipeline).await;
        cache.invalidate().await;
        cache.get_or_refresh(&pipeline).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let (pipeline, calls) = counting_pipeline();
        let pipeline = Arc::new(pipeline);
        let cache = Arc::new(EtfCache::new(Duration::from_secs(3600)));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let pipeline = Arc::clone(&pipeline);
            handles.push(tokio::spawn(async move {
                cache.get_or_refresh(&pipeline).await.len()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 1);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
