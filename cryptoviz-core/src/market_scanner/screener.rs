use serde::{Deserialize, Serialize};
use crate::market_data::MarketDataRecord;

/// Count limit and free-text search applied before layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub max_count: usize,
    pub search_term: String,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            max_count: 100,
            search_term: String::new(),
        }
    }
}

impl FilterCriteria {
    pub fn new(max_count: usize) -> Self {
        Self {
            max_count,
            search_term: String::new(),
        }
    }

    /// Build criteria from an untrusted signed count; anything `<= 0` keeps nothing.
    pub fn from_signed(max_count: i64, search_term: impl Into<String>) -> Self {
        Self {
            max_count: usize::try_from(max_count.max(0)).unwrap_or(usize::MAX),
            search_term: search_term.into(),
        }
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    /// Case-insensitive substring match against name or symbol.
    /// An empty term matches everything.
    pub fn matches(&self, record: &MarketDataRecord) -> bool {
        if self.search_term.is_empty() {
            return true;
        }
        let term = self.search_term.to_lowercase();
        record.name.to_lowercase().contains(&term) || record.symbol.to_lowercase().contains(&term)
    }
}

/// Reduce `records` to the display set.
///
/// Input must already be ordered by market cap descending: the first
/// `max_count` records are kept as-is and never re-sorted.
pub fn filter(records: &[MarketDataRecord], criteria: &FilterCriteria) -> Vec<MarketDataRecord> {
    let truncated = records.iter().take(criteria.max_count);

    if criteria.search_term.is_empty() {
        return truncated.cloned().collect();
    }

    truncated
        .filter(|record| criteria.matches(record))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(count: usize) -> Vec<MarketDataRecord> {
        (0..count)
            .map(|i| {
                let (symbol, name) = match i % 10 {
                    0 => (format!("eth{}", i), format!("Ether Fork {}", i)),
                    3 => (format!("weth{}", i), format!("Wrapped Token {}", i)),
                    7 => (format!("x{}", i), format!("Methane {}", i)),
                    _ => (format!("c{}", i), format!("Coin {}", i)),
                };
                MarketDataRecord::new(format!("id-{}", i), symbol, name, 1e12 / (i as f64 + 1.0), 0.0)
            })
            .collect()
    }

    #[test]
    fn test_truncates_preserving_order() {
        let records = batch(20);
        let out = filter(&records, &FilterCriteria::new(5));
        let ids: Vec<&str> = out.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["id-0", "id-1", "id-2", "id-3", "id-4"]);
    }

    #[test]
    fn test_zero_count_and_empty_input_yield_nothing() {
        assert!(filter(&batch(10), &FilterCriteria::new(0)).is_empty());
        assert!(filter(&[], &FilterCriteria::default()).is_empty());
        assert_eq!(FilterCriteria::from_signed(-3, "").max_count, 0);
        assert!(filter(&batch(10), &FilterCriteria::from_signed(-3, "")).is_empty());
    }

    #[test]
    fn test_length_never_exceeds_bounds() {
        let records = batch(30);
        for max_count in [0, 1, 7, 30, 31, 500] {
            for term in ["", "eth", "coin", "zzz"] {
                let criteria = FilterCriteria::new(max_count).with_search(term);
                let out = filter(&records, &criteria);
                assert!(out.len() <= max_count.min(records.len()));
            }
        }
    }

    #[test]
    fn test_output_is_order_preserving_subsequence() {
        let records = batch(50);
        let out = filter(&records, &FilterCriteria::new(40).with_search("eth"));
        let mut cursor = records.iter();
        for kept in &out {
            assert!(cursor.any(|r| r.id == kept.id), "{} out of order", kept.id);
        }
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let records = vec![MarketDataRecord::new("bitcoin", "btc", "Bitcoin", 1.2e12, 1.0)];
        let out = filter(&records, &FilterCriteria::new(1).with_search("BIT"));
        assert_eq!(out.len(), 1);
        let out = filter(&records, &FilterCriteria::new(1).with_search("bTc"));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_search_only_applies_to_truncated_set() {
        let mut records = batch(5);
        records.push(MarketDataRecord::new("late", "late", "Late Ethereum", 1.0, 0.0));
        let out = filter(&records, &FilterCriteria::new(5).with_search("late"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_top_hundred_then_search() {
        let records = batch(150);

        let top = filter(&records, &FilterCriteria::new(100));
        assert_eq!(top.len(), 100);
        assert_eq!(top.as_slice(), &records[..100]);

        let searched = filter(&top, &FilterCriteria::new(100).with_search("eth"));
        let expected = top
            .iter()
            .filter(|r| r.name.to_lowercase().contains("eth") || r.symbol.to_lowercase().contains("eth"))
            .count();
        assert_eq!(searched.len(), expected);
        assert!(!searched.is_empty());
        for record in &searched {
            assert!(
                record.name.to_lowercase().contains("eth") || record.symbol.to_lowercase().contains("eth"),
                "{} does not match",
                record
            );
        }
        // symbol-only and name-only matches both survive
        assert!(searched.iter().any(|r| r.symbol.starts_with("WETH")));
        assert!(searched.iter().any(|r| r.name.starts_with("Methane")));
    }

    #[test]
    fn test_matches_helper_agrees_with_filter() {
        let criteria = FilterCriteria::new(100).with_search("ETH");
        let records = batch(40);
        let via_filter = filter(&records, &criteria);
        let via_matches: Vec<_> = records.iter().filter(|r| criteria.matches(r)).cloned().collect();
        assert_eq!(via_filter, via_matches);
    }
}
