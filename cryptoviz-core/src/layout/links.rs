//! Edges between coins of similar size for the network view

use super::scale::checked_market_cap;
use crate::market_data::MarketDataRecord;
use serde::{Deserialize, Serialize};

/// Log-space market cap distance below which two coins are linked
pub const LINK_THRESHOLD: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkLink {
    pub source: usize,
    pub target: usize,
    pub strength: f64,
}

/// Link every unordered pair whose `|ln cap_i - ln cap_j| < 0.5`.
///
/// Indices refer to positions in `records`; `source < target` always holds.
/// Records without a positive market cap never get links. Quadratic in
/// the number of records, which stays at or below 100 here.
pub fn derive_links(records: &[MarketDataRecord]) -> Vec<NetworkLink> {
    let log_caps: Vec<Option<f64>> = records
        .iter()
        .map(|r| checked_market_cap(r.market_cap).ok().map(f64::ln))
        .collect();

    let mut links = Vec::new();
    for (i, left) in log_caps.iter().enumerate() {
        let Some(left) = left else { continue };
        for (offset, right) in log_caps[i + 1..].iter().enumerate() {
            let Some(right) = right else { continue };
            let diff = (left - right).abs();
            if diff < LINK_THRESHOLD {
                links.push(NetworkLink {
                    source: i,
                    target: i + 1 + offset,
                    strength: 1.0 - diff,
                });
            }
        }
    }
    links
}
