use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::market_data::{resolve_change, MarketDataRecord, Timeframe};

/// A single coin highlighted in the overview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mover {
    pub id: String,
    pub symbol: String,
    pub change_pct: f64,
}

/// Aggregate figures shown above the visualizations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketOverview {
    pub timeframe: Timeframe,
    pub record_count: usize,
    pub total_market_cap: f64,
    pub total_volume: f64,
    pub gainers: usize,
    pub losers: usize,
    pub average_change: f64,
    pub top_gainer: Option<Mover>,
    pub top_loser: Option<Mover>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct MarketAnalytics;

impl MarketAnalytics {
    pub fn new() -> Self {
        Self
    }

    pub fn calculate_overview(&self, records: &[MarketDataRecord], timeframe: Timeframe) -> MarketOverview {
        let changes: Vec<(&MarketDataRecord, f64)> = records
            .iter()
            .map(|r| (r, resolve_change(r, timeframe)))
            .filter(|(_, change)| change.is_finite())
            .collect();

        // same boundary as the color category: exactly zero counts as a loss
        let gainers = changes.iter().filter(|(_, c)| *c > 0.0).count();
        let losers = changes.len() - gainers;

        let average_change = if changes.is_empty() {
            0.0
        } else {
            changes.iter().map(|(_, c)| c).sum::<f64>() / changes.len() as f64
        };

        let top_gainer = changes
            .iter()
            .filter(|(_, c)| *c > 0.0)
            .max_by_key(|(_, c)| OrderedFloat(*c))
            .map(|(r, c)| Self::mover(r, *c));

        let top_loser = changes
            .iter()
            .filter(|(_, c)| *c < 0.0)
            .min_by_key(|(_, c)| OrderedFloat(*c))
            .map(|(r, c)| Self::mover(r, *c));

        MarketOverview {
            timeframe,
            record_count: records.len(),
            total_market_cap: records.iter().map(|r| r.market_cap).sum(),
            total_volume: records.iter().map(|r| r.total_volume).sum(),
            gainers,
            losers,
            average_change,
            top_gainer,
            top_loser,
            timestamp: Utc::now(),
        }
    }

    fn mover(record: &MarketDataRecord, change_pct: f64) -> Mover {
        Mover {
            id: record.id.clone(),
            symbol: record.symbol.clone(),
            change_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<MarketDataRecord> {
        vec![
            MarketDataRecord::new("bitcoin", "btc", "Bitcoin", 1.0e12, 2.0)
                .with_volume(3.0e10)
                .with_weekly_change(-1.0),
            MarketDataRecord::new("ethereum", "eth", "Ethereum", 4.0e11, -3.0)
                .with_volume(1.0e10)
                .with_weekly_change(5.0),
            MarketDataRecord::new("tether", "usdt", "Tether", 1.0e11, 0.0)
                .with_volume(5.0e10),
        ]
    }

    #[test]
    fn test_overview_totals_and_counts() {
        let overview = MarketAnalytics::new().calculate_overview(&sample(), Timeframe::Day);
        assert_eq!(overview.record_count, 3);
        assert_eq!(overview.total_market_cap, 1.5e12);
        assert_eq!(overview.total_volume, 9.0e10);
        assert_eq!(overview.gainers, 1);
        assert_eq!(overview.losers, 2);
        assert!((overview.average_change - (-1.0 / 3.0)).abs() < 1e-12);
        assert_eq!(overview.top_gainer.unwrap().id, "bitcoin");
        assert_eq!(overview.top_loser.unwrap().id, "ethereum");
    }

    #[test]
    fn test_overview_follows_timeframe() {
        let overview = MarketAnalytics::new().calculate_overview(&sample(), Timeframe::Week);
        // tether has no 7d figure and resolves to 0
        assert_eq!(overview.gainers, 1);
        assert_eq!(overview.top_gainer.unwrap().symbol, "ETH");
        assert_eq!(overview.top_loser.unwrap().symbol, "BTC");
    }

    #[test]
    fn test_empty_overview() {
        let overview = MarketAnalytics::new().calculate_overview(&[], Timeframe::Month);
        assert_eq!(overview.record_count, 0);
        assert_eq!(overview.total_market_cap, 0.0);
        assert_eq!(overview.average_change, 0.0);
        assert!(overview.top_gainer.is_none());
        assert!(overview.top_loser.is_none());
    }
}
