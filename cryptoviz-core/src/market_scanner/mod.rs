//! Display-set selection and market-wide aggregates

pub mod screener;
pub mod analytics;

pub use screener::{filter, FilterCriteria};
pub use analytics::{MarketAnalytics, MarketOverview, Mover};
