//! Market data normalization and timeframe resolution

pub mod types;
pub mod timeframe;
pub mod universal;
pub mod normalizers;

pub use types::MarketDataRecord;
pub use timeframe::{resolve_change, ParseTimeframeError, Timeframe};
pub use universal::{MarketDataNormalizer, NormalizedBatch};
pub use normalizers::CoinGeckoNormalizer;
