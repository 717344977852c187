//! Market data sources
//!
//! The core only depends on [`MarketDataFeed`]; transports are swappable.

pub mod errors;
pub mod coingecko;

pub use errors::FetchError;
pub use coingecko::CoinGeckoFeed;

use crate::market_data::NormalizedBatch;
use async_trait::async_trait;
use std::time::Duration;

/// Source of the top-N records by market cap, descending
#[async_trait]
pub trait MarketDataFeed: Send + Sync {
    async fn fetch_top_market_records(&self) -> Result<NormalizedBatch, FetchError>;
    fn name(&self) -> &str;
}

/// Feed configuration
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub vs_currency: String,
    pub per_page: usize,
    pub timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coingecko.com/api/v3".to_string(),
            api_key: None,
            vs_currency: "usd".to_string(),
            per_page: 100,
            timeout: Duration::from_secs(10),
        }
    }
}
