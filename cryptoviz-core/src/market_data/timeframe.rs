//! Timeframe selection and price-change resolution

use super::MarketDataRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Look-back window for percentage price change
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[default]
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unknown timeframe '{0}', expected one of 24h, 7d, 30d")]
pub struct ParseTimeframeError(pub String);

impl Timeframe {
    pub const ALL: [Timeframe; 3] = [Timeframe::Day, Timeframe::Week, Timeframe::Month];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Day => "24h",
            Timeframe::Week => "7d",
            Timeframe::Month => "30d",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = ParseTimeframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "24h" => Ok(Timeframe::Day),
            "7d" => Ok(Timeframe::Week),
            "30d" => Ok(Timeframe::Month),
            other => Err(ParseTimeframeError(other.to_string())),
        }
    }
}

/// Percentage change relevant to `timeframe`.
///
/// Absent 7d/30d fields resolve to `0` so they render as a neutral value.
pub fn resolve_change(record: &MarketDataRecord, timeframe: Timeframe) -> f64 {
    match timeframe {
        Timeframe::Day => record.price_change_pct_24h,
        Timeframe::Week => record.price_change_pct_7d.unwrap_or(0.0),
        Timeframe::Month => record.price_change_pct_30d.unwrap_or(0.0),
    }
}
