use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use std::time::Instant;
use tracing::{info, warn};
use url::Url;

use super::{FeedConfig, FetchError, MarketDataFeed};
use crate::market_data::{CoinGeckoNormalizer, MarketDataNormalizer, NormalizedBatch};

const DEMO_KEY_HEADER: &str = "x-cg-demo-api-key";

/// `/coins/markets` REST feed
#[derive(Debug, Clone)]
pub struct CoinGeckoFeed {
    client: Client,
    config: FeedConfig,
    normalizer: CoinGeckoNormalizer,
}

impl CoinGeckoFeed {
    pub fn new(config: FeedConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("cryptoviz/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            config,
            normalizer: CoinGeckoNormalizer::new(),
        })
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Top `per_page` coins by market cap with 24h/7d/30d changes
    pub fn markets_url(&self) -> Result<Url, FetchError> {
        let mut url = Url::parse(&format!(
            "{}/coins/markets",
            self.config.base_url.trim_end_matches('/')
        ))?;

        url.query_pairs_mut()
            .append_pair("vs_currency", &self.config.vs_currency)
            .append_pair("order", "market_cap_desc")
            .append_pair("per_page", &self.config.per_page.to_string())
            .append_pair("page", "1")
            .append_pair("sparkline", "false")
            .append_pair("price_change_percentage", "24h,7d,30d");

        Ok(url)
    }
}

#[async_trait]
impl MarketDataFeed for CoinGeckoFeed {
    async fn fetch_top_market_records(&self) -> Result<NormalizedBatch, FetchError> {
        let url = self.markets_url()?;
        let started = Instant::now();

        let mut request = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json");
        if let Some(key) = &self.config.api_key {
            request = request.header(DEMO_KEY_HEADER, key);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("CoinGecko rate limit hit");
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            return Err(FetchError::Http { status: status.as_u16() });
        }

        let body = response.bytes().await?;
        let batch = self.normalizer.normalize(&body)?;

        info!(
            records = batch.records.len(),
            skipped = batch.skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "📊 Fetched market records from {}",
            self.normalizer.source_name()
        );
        Ok(batch)
    }

    fn name(&self) -> &str {
        "coingecko"
    }
}
