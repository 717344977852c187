//! Provider-specific normalizers

use super::{MarketDataNormalizer, MarketDataRecord, NormalizedBatch};
use crate::feeds::FetchError;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Shape of one element of CoinGecko's `/coins/markets` response.
///
/// Every numeric field is optional because the API sends `null` for
/// freshly listed or delisted coins.
#[derive(Debug, Deserialize)]
struct CoinGeckoMarket {
    id: String,
    symbol: String,
    name: String,
    image: Option<String>,
    current_price: Option<f64>,
    market_cap: Option<f64>,
    total_volume: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    price_change_percentage_7d: Option<f64>,
    price_change_percentage_7d_in_currency: Option<f64>,
    price_change_percentage_30d: Option<f64>,
    price_change_percentage_30d_in_currency: Option<f64>,
}

/// CoinGecko markets normalizer
#[derive(Debug, Default, Clone)]
pub struct CoinGeckoNormalizer;

impl CoinGeckoNormalizer {
    pub fn new() -> Self {
        Self
    }

    fn to_record(market: CoinGeckoMarket) -> Option<MarketDataRecord> {
        let id = market.id.trim();
        let symbol = market.symbol.trim();
        let name = market.name.trim();
        if id.is_empty() || symbol.is_empty() || name.is_empty() {
            return None;
        }

        Some(MarketDataRecord {
            id: id.to_string(),
            symbol: symbol.to_uppercase(),
            name: name.to_string(),
            image_url: market.image.unwrap_or_default(),
            current_price: non_negative(market.current_price),
            market_cap: non_negative(market.market_cap),
            total_volume: non_negative(market.total_volume),
            price_change_pct_24h: market
                .price_change_percentage_24h
                .filter(|v| v.is_finite())
                .unwrap_or(0.0),
            price_change_pct_7d: finite(
                market
                    .price_change_percentage_7d_in_currency
                    .or(market.price_change_percentage_7d),
            ),
            price_change_pct_30d: finite(
                market
                    .price_change_percentage_30d_in_currency
                    .or(market.price_change_percentage_30d),
            ),
        })
    }
}

fn non_negative(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

impl MarketDataNormalizer for CoinGeckoNormalizer {
    fn normalize(&self, raw: &[u8]) -> Result<NormalizedBatch, FetchError> {
        let elements: Vec<serde_json::Value> = serde_json::from_slice(raw)?;

        let mut batch = NormalizedBatch {
            records: Vec::with_capacity(elements.len()),
            skipped: 0,
        };
        let mut seen_ids = HashSet::with_capacity(elements.len());

        for (index, element) in elements.into_iter().enumerate() {
            let market: CoinGeckoMarket = match serde_json::from_value(element) {
                Ok(market) => market,
                Err(e) => {
                    warn!(index, error = %e, "Skipping undecodable market record");
                    batch.skipped += 1;
                    continue;
                }
            };

            let Some(record) = Self::to_record(market) else {
                warn!(index, "Skipping market record with empty id, symbol or name");
                batch.skipped += 1;
                continue;
            };

            if !seen_ids.insert(record.id.clone()) {
                warn!(index, id = %record.id, "Skipping duplicate market record");
                batch.skipped += 1;
                continue;
            }

            batch.records.push(record);
        }

        debug!(
            records = batch.records.len(),
            skipped = batch.skipped,
            "Normalized {} payload",
            self.source_name()
        );
        Ok(batch)
    }

    fn source_name(&self) -> &str {
        "CoinGecko"
    }
}
