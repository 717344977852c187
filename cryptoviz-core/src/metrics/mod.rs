//! Metrics collection for the fetch and layout pipeline
//!
//! Counters are exposed through the HTTP API so a dashboard can watch feed
//! health and how often each visualization is requested.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use parking_lot::RwLock;

use crate::feeds::FetchError;
use crate::layout::{VisualizationPayload, VisualizationStyle};

/// Feed health counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedMetrics {
    pub fetches_started: u64,
    pub fetches_succeeded: u64,
    pub fetches_failed: u64,
    pub stale_responses_discarded: u64,
    pub records_received: u64,
    pub records_skipped: u64,
    pub last_fetch_latency_ms: Option<u64>,
    pub last_error: Option<String>,
    pub last_success: Option<DateTime<Utc>>,
}

/// Layout counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutMetrics {
    pub payloads_built: u64,
    pub degenerate_inputs: u64,
    pub payloads_by_style: BTreeMap<String, u64>,
}

/// Comprehensive metrics container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizerMetrics {
    pub timestamp: DateTime<Utc>,
    pub feed: FeedMetrics,
    pub layout: LayoutMetrics,
}

/// Metrics collector shared by the facade and the API server
pub struct MetricsCollector {
    feed_metrics: Arc<RwLock<FeedMetrics>>,
    degenerate_inputs: Arc<RwLock<u64>>,
    payloads_by_style: DashMap<VisualizationStyle, u64>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            feed_metrics: Arc::new(RwLock::new(FeedMetrics::default())),
            degenerate_inputs: Arc::new(RwLock::new(0)),
            payloads_by_style: DashMap::new(),
        }
    }

    pub fn record_fetch_started(&self) {
        self.feed_metrics.write().fetches_started += 1;
    }

    /// Count a committed batch; stale batches go to `record_stale_response`
    pub fn record_fetch_succeeded(&self, latency: Duration, received: usize, skipped: usize) {
        let mut metrics = self.feed_metrics.write();
        metrics.fetches_succeeded += 1;
        metrics.records_received += received as u64;
        metrics.records_skipped += skipped as u64;
        metrics.last_fetch_latency_ms = Some(latency.as_millis() as u64);
        metrics.last_success = Some(Utc::now());
    }

    pub fn record_fetch_failed(&self, latency: Duration, error: &FetchError) {
        let mut metrics = self.feed_metrics.write();
        metrics.fetches_failed += 1;
        metrics.last_fetch_latency_ms = Some(latency.as_millis() as u64);
        metrics.last_error = Some(error.to_string());
    }

    pub fn record_stale_response(&self) {
        self.feed_metrics.write().stale_responses_discarded += 1;
    }

    /// Count a built payload and the nodes that fell back to default attributes
    pub fn record_payload(&self, payload: &VisualizationPayload) {
        *self.payloads_by_style.entry(payload.style).or_insert(0) += 1;

        let degenerate = payload
            .nodes
            .iter()
            .filter(|node| !node.record.has_positive_market_cap())
            .count() as u64;
        if degenerate > 0 {
            *self.degenerate_inputs.write() += degenerate;
        }
    }

    pub fn get_feed_metrics(&self) -> FeedMetrics {
        self.feed_metrics.read().clone()
    }

    pub fn get_all_metrics(&self) -> VisualizerMetrics {
        let payloads_by_style: BTreeMap<String, u64> = self
            .payloads_by_style
            .iter()
            .map(|entry| (entry.key().to_string(), *entry.value()))
            .collect();

        VisualizerMetrics {
            timestamp: Utc::now(),
            feed: self.get_feed_metrics(),
            layout: LayoutMetrics {
                payloads_built: payloads_by_style.values().sum(),
                degenerate_inputs: *self.degenerate_inputs.read(),
                payloads_by_style,
            },
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{build_payload, LayoutOptions};
    use crate::market_data::{MarketDataRecord, Timeframe};
    use crate::market_scanner::FilterCriteria;

    #[test]
    fn test_fetch_counters() {
        let metrics = MetricsCollector::new();
        metrics.record_fetch_started();
        metrics.record_fetch_succeeded(Duration::from_millis(120), 1, 2);
        metrics.record_fetch_started();
        metrics.record_fetch_failed(Duration::from_millis(40), &FetchError::RateLimited);
        metrics.record_stale_response();

        let feed = metrics.get_feed_metrics();
        assert_eq!(feed.fetches_started, 2);
        assert_eq!(feed.fetches_succeeded, 1);
        assert_eq!(feed.fetches_failed, 1);
        assert_eq!(feed.stale_responses_discarded, 1);
        assert_eq!(feed.records_received, 1);
        assert_eq!(feed.records_skipped, 2);
        assert_eq!(feed.last_fetch_latency_ms, Some(40));
        assert_eq!(feed.last_error.as_deref(), Some("Rate limit exceeded"));
        assert!(feed.last_success.is_some());
    }

    #[test]
    fn test_payload_counters() {
        let metrics = MetricsCollector::new();
        let records = vec![
            MarketDataRecord::new("bitcoin", "btc", "Bitcoin", 1e12, 1.0),
            MarketDataRecord::new("ghost", "gst", "Ghost", 0.0, 0.0),
        ];
        for style in [VisualizationStyle::Bubble, VisualizationStyle::Bubble, VisualizationStyle::Radial] {
            let payload = build_payload(&records, style, Timeframe::Day, &FilterCriteria::default(), &LayoutOptions::for_style(style));
            metrics.record_payload(&payload);
        }

        let all = metrics.get_all_metrics();
        assert_eq!(all.layout.payloads_built, 3);
        assert_eq!(all.layout.payloads_by_style["bubble"], 2);
        assert_eq!(all.layout.payloads_by_style["radial"], 1);
        assert_eq!(all.layout.degenerate_inputs, 3);
    }
}
