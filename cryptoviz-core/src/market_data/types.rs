//! Market data types

use serde::{Deserialize, Serialize};
use std::fmt;

/// One cryptocurrency's market snapshot
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketDataRecord {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image_url: String,
    pub current_price: f64,
    pub market_cap: f64,
    pub total_volume: f64,
    pub price_change_pct_24h: f64,
    pub price_change_pct_7d: Option<f64>,
    pub price_change_pct_30d: Option<f64>,
}

impl MarketDataRecord {
    pub fn new(
        id: impl Into<String>,
        symbol: impl Into<String>,
        name: impl Into<String>,
        market_cap: f64,
        price_change_pct_24h: f64,
    ) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into().to_uppercase(),
            name: name.into(),
            image_url: String::new(),
            current_price: 0.0,
            market_cap,
            total_volume: 0.0,
            price_change_pct_24h,
            price_change_pct_7d: None,
            price_change_pct_30d: None,
        }
    }

    pub fn with_price(mut self, current_price: f64) -> Self {
        self.current_price = current_price;
        self
    }

    pub fn with_volume(mut self, total_volume: f64) -> Self {
        self.total_volume = total_volume;
        self
    }

    pub fn with_weekly_change(mut self, pct: f64) -> Self {
        self.price_change_pct_7d = Some(pct);
        self
    }

    pub fn with_monthly_change(mut self, pct: f64) -> Self {
        self.price_change_pct_30d = Some(pct);
        self
    }

    /// True when the market cap can be used in sqrt/log scaling
    pub fn has_positive_market_cap(&self) -> bool {
        self.market_cap.is_finite() && self.market_cap > 0.0
    }
}

impl fmt::Display for MarketDataRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.symbol)
    }
}
