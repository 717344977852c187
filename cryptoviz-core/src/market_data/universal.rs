//! Universal market data types and traits

use super::MarketDataRecord;
use crate::feeds::FetchError;

/// Records that survived normalization plus the count of dropped entries
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NormalizedBatch {
    pub records: Vec<MarketDataRecord>,
    pub skipped: usize,
}

/// Trait for normalizing provider-specific payloads to `MarketDataRecord`s
pub trait MarketDataNormalizer: Send + Sync {
    fn normalize(&self, raw: &[u8]) -> Result<NormalizedBatch, FetchError>;
    fn source_name(&self) -> &str;
}
