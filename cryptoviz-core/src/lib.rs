//! Crypto Market Visualization Library
//!
//! Fetches the top cryptocurrencies by market cap, normalizes them and
//! derives the per-record attributes and links that bubble, network,
//! honeycomb and radial renderers draw. Can be embedded as a library or
//! driven by the `cryptoviz` binary.

pub mod market_data;
pub mod market_scanner;
pub mod layout;
pub mod feeds;
pub mod store;
pub mod metrics;
pub mod api;

// Re-export main types for easy access
pub use market_data::{resolve_change, MarketDataRecord, NormalizedBatch, Timeframe};
pub use market_scanner::{filter, FilterCriteria, MarketOverview};
pub use layout::{
    build_payload, derive_attributes, derive_links, AttributedRecord, ColorCategory, InvalidOffsetError,
    LayoutOptions, NetworkLink, VisualAttributes, VisualizationPayload, VisualizationStyle,
};
pub use feeds::{CoinGeckoFeed, FeedConfig, FetchError, MarketDataFeed};
pub use store::{CommitOutcome, MarketStatus, MarketStore, StoreEvent};
pub use metrics::MetricsCollector;
pub use api::{ApiConfig, ApiServer};

use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{info, warn};

use market_scanner::MarketAnalytics;

/// Main interface: one feed, one store, one metrics collector
pub struct CryptoVisualizer {
    feed: Arc<dyn MarketDataFeed>,
    store: Arc<MarketStore>,
    metrics_collector: Arc<MetricsCollector>,
    analytics: MarketAnalytics,
}

impl CryptoVisualizer {
    pub fn new(feed: Arc<dyn MarketDataFeed>) -> Self {
        Self::with_store(feed, Arc::new(MarketStore::default()))
    }

    pub fn with_store(feed: Arc<dyn MarketDataFeed>, store: Arc<MarketStore>) -> Self {
        Self {
            feed,
            store,
            metrics_collector: Arc::new(MetricsCollector::new()),
            analytics: MarketAnalytics::new(),
        }
    }

    /// Fetch a fresh batch and commit it unless a newer fetch was started
    /// meanwhile. Fetch errors of the latest request are returned; stale
    /// outcomes of either kind are dropped and only counted as stale.
    pub async fn refresh(&self) -> Result<CommitOutcome> {
        let request_id = self.store.begin_request();
        self.metrics_collector.record_fetch_started();
        let started = Instant::now();

        let result = self.feed.fetch_top_market_records().await;
        let elapsed = started.elapsed();

        match result {
            Ok(NormalizedBatch { records, skipped }) => {
                let received = records.len();
                if self.store.complete_request(request_id, Ok(records)) == CommitOutcome::Stale {
                    self.metrics_collector.record_stale_response();
                    return Ok(CommitOutcome::Stale);
                }
                self.metrics_collector.record_fetch_succeeded(elapsed, received, skipped);
                info!(
                    feed = self.feed.name(),
                    request_id,
                    records = received,
                    "✅ Market data refreshed"
                );
                Ok(CommitOutcome::Applied)
            }
            Err(e) => {
                if self.store.complete_request(request_id, Err(e.to_string())) == CommitOutcome::Stale {
                    self.metrics_collector.record_stale_response();
                    return Ok(CommitOutcome::Stale);
                }
                self.metrics_collector.record_fetch_failed(elapsed, &e);
                warn!(feed = self.feed.name(), kind = e.label(), "Market data fetch failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// Select a timeframe and refetch. Returns `None` when it was already selected.
    pub async fn set_timeframe(&self, timeframe: Timeframe) -> Result<Option<CommitOutcome>> {
        if !self.store.set_timeframe(timeframe) {
            return Ok(None);
        }
        self.refresh().await.map(Some)
    }

    /// Back to 24h, top 100 and no search; refetches only if the timeframe moved.
    pub async fn reset(&self) -> Result<Option<CommitOutcome>> {
        if !self.store.reset_selection() {
            return Ok(None);
        }
        self.refresh().await.map(Some)
    }

    pub fn set_criteria(&self, criteria: FilterCriteria) -> bool {
        self.store.set_criteria(criteria)
    }

    /// Records passing the current filter criteria
    pub fn visible_records(&self) -> Vec<MarketDataRecord> {
        filter(&self.store.records(), &self.store.criteria())
    }

    /// Payload for the stored timeframe and criteria
    pub fn payload(&self, style: VisualizationStyle, options: &LayoutOptions) -> VisualizationPayload {
        self.payload_with(style, self.store.timeframe(), &self.store.criteria(), options)
    }

    /// Payload for an explicit selection, leaving the stored one untouched
    pub fn payload_with(
        &self,
        style: VisualizationStyle,
        timeframe: Timeframe,
        criteria: &FilterCriteria,
        options: &LayoutOptions,
    ) -> VisualizationPayload {
        let payload = build_payload(&self.store.records(), style, timeframe, criteria, options);
        self.metrics_collector.record_payload(&payload);
        payload
    }

    pub fn overview(&self) -> MarketOverview {
        self.overview_for(self.store.timeframe())
    }

    pub fn overview_for(&self, timeframe: Timeframe) -> MarketOverview {
        self.analytics.calculate_overview(&self.store.records(), timeframe)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.store.subscribe()
    }

    pub fn store(&self) -> &Arc<MarketStore> {
        &self.store
    }

    pub fn metrics_collector(&self) -> &Arc<MetricsCollector> {
        &self.metrics_collector
    }

    pub fn feed_name(&self) -> &str {
        self.feed.name()
    }

    /// Start the HTTP API in a background task
    pub fn start_api(self: &Arc<Self>, config: ApiConfig) -> tokio::task::JoinHandle<()> {
        let api_server = ApiServer::new(self.clone(), config);
        tokio::spawn(async move {
            api_server.start().await;
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::time::Duration;

    /// Feed that replays scripted responses, each after an optional delay
    pub struct ScriptedFeed {
        responses: Mutex<VecDeque<(Duration, Result<NormalizedBatch, FetchError>)>>,
    }

    impl ScriptedFeed {
        pub fn new() -> Self {
            Self { responses: Mutex::new(VecDeque::new()) }
        }

        pub fn then(self, delay: Duration, result: Result<Vec<MarketDataRecord>, FetchError>) -> Self {
            let result = result.map(|records| NormalizedBatch { records, skipped: 0 });
            self.responses.lock().push_back((delay, result));
            self
        }

        pub fn returning(records: Vec<MarketDataRecord>) -> Self {
            Self::new().then(Duration::ZERO, Ok(records))
        }
    }

    #[async_trait]
    impl MarketDataFeed for ScriptedFeed {
        async fn fetch_top_market_records(&self) -> Result<NormalizedBatch, FetchError> {
            let next = self.responses.lock().pop_front();
            match next {
                Some((delay, result)) => {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    result
                }
                None => Err(FetchError::Unknown("no scripted response".to_string())),
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    pub fn sample_records() -> Vec<MarketDataRecord> {
        vec![
            MarketDataRecord::new("bitcoin", "btc", "Bitcoin", 1.2e12, 2.5).with_weekly_change(-1.0),
            MarketDataRecord::new("ethereum", "eth", "Ethereum", 4.0e11, -1.2).with_weekly_change(3.0),
            MarketDataRecord::new("solana", "sol", "Solana", 1.1e11, 0.0),
            MarketDataRecord::new("ethena", "ena", "Ethena", 1.0e9, 4.0),
            MarketDataRecord::new("ether-fi", "ethfi", "ether.fi", 1.05e9, -3.0),
        ]
    }
}
