//! Radius and opacity scales shared by every visualization style

use crate::market_data::MarketDataRecord;
use thiserror::Error;

/// Market cap is divided by this before taking the square root for radii
pub const MARKET_CAP_UNIT: f64 = 1e8;

pub const MIN_OPACITY: f64 = 0.3;
pub const MAX_OPACITY: f64 = 1.0;

/// Input that would make sqrt/log undefined.
///
/// Raised by the guard below and always mapped to a default attribute by the
/// caller; it never escapes a batch.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum DegenerateInputError {
    #[error("market cap {0} is not positive")]
    NonPositiveMarketCap(f64),

    #[error("market cap is not a finite number")]
    NonFiniteMarketCap,
}

pub fn checked_market_cap(market_cap: f64) -> Result<f64, DegenerateInputError> {
    if !market_cap.is_finite() {
        Err(DegenerateInputError::NonFiniteMarketCap)
    } else if market_cap <= 0.0 {
        Err(DegenerateInputError::NonPositiveMarketCap(market_cap))
    } else {
        Ok(market_cap)
    }
}

/// `sqrt(market_cap / 1e8) + offset`, or just `offset` for degenerate caps
pub fn radius(market_cap: f64, offset: f64) -> f64 {
    match checked_market_cap(market_cap) {
        Ok(cap) => (cap / MARKET_CAP_UNIT).sqrt() + offset,
        Err(_) => offset,
    }
}

/// Logarithmic market-cap to opacity mapping over one batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpacityScale {
    domain: Option<(f64, f64)>,
}

impl OpacityScale {
    /// Domain is `[ln min, ln max]` of the batch's positive market caps
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a MarketDataRecord>) -> Self {
        let mut bounds: Option<(f64, f64)> = None;
        for cap in records
            .into_iter()
            .filter_map(|r| checked_market_cap(r.market_cap).ok())
        {
            let ln = cap.ln();
            bounds = Some(match bounds {
                Some((lo, hi)) => (lo.min(ln), hi.max(ln)),
                None => (ln, ln),
            });
        }
        Self { domain: bounds }
    }

    pub fn is_degenerate(&self) -> bool {
        match self.domain {
            Some((lo, hi)) => hi - lo <= f64::EPSILON,
            None => true,
        }
    }

    pub fn opacity(&self, market_cap: f64) -> f64 {
        let cap = match checked_market_cap(market_cap) {
            Ok(cap) => cap,
            Err(_) => return MIN_OPACITY,
        };
        match self.domain {
            Some((lo, hi)) if hi - lo > f64::EPSILON => {
                let t = ((cap.ln() - lo) / (hi - lo)).clamp(0.0, 1.0);
                MIN_OPACITY * (1.0 - t) + MAX_OPACITY * t
            }
            _ => MAX_OPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_cap(cap: f64) -> MarketDataRecord {
        MarketDataRecord::new(format!("c{}", cap), "c", "Coin", cap, 0.0)
    }

    #[test]
    fn test_radius_matches_formula() {
        assert_eq!(radius(1e8, 30.0), 31.0);
        assert_eq!(radius(4e10, 5.0), 25.0);
    }

    #[test]
    fn test_radius_is_monotone() {
        let caps = [0.0, 1.0, 1e6, 1e8, 5e9, 5e9, 1e11, 1.3e12];
        let radii: Vec<f64> = caps.iter().map(|c| radius(*c, 15.0)).collect();
        for pair in radii.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn test_degenerate_caps_use_offset() {
        for cap in [0.0, -1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let r = radius(cap, 30.0);
            assert_eq!(r, 30.0);
            assert!(!r.is_nan());
        }
        assert_eq!(checked_market_cap(-2.0), Err(DegenerateInputError::NonPositiveMarketCap(-2.0)));
        assert_eq!(checked_market_cap(f64::NAN), Err(DegenerateInputError::NonFiniteMarketCap));
    }

    #[test]
    fn test_opacity_spans_range() {
        let records = vec![with_cap(1e8), with_cap(1e10), with_cap(1e12)];
        let scale = OpacityScale::from_records(&records);
        assert!(!scale.is_degenerate());
        assert!((scale.opacity(1e8) - MIN_OPACITY).abs() < 1e-12);
        assert!((scale.opacity(1e12) - MAX_OPACITY).abs() < 1e-12);
        assert!((scale.opacity(1e10) - 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_opacity_degenerate_domain_is_constant() {
        let records = vec![with_cap(5e9), with_cap(5e9)];
        let scale = OpacityScale::from_records(&records);
        assert!(scale.is_degenerate());
        assert_eq!(scale.opacity(5e9), MAX_OPACITY);

        let empty = OpacityScale::from_records(std::iter::empty::<&MarketDataRecord>());
        assert!(empty.is_degenerate());
        assert_eq!(empty.opacity(1e9), MAX_OPACITY);
    }

    #[test]
    fn test_opacity_for_non_positive_cap_is_floor() {
        let records = vec![with_cap(0.0), with_cap(1e9), with_cap(1e11)];
        let scale = OpacityScale::from_records(&records);
        assert_eq!(scale.opacity(0.0), MIN_OPACITY);
        assert_eq!(scale.opacity(f64::NAN), MIN_OPACITY);
    }
}
