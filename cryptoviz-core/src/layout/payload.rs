//! Renderer-facing dataset: filtered records, attributes and links

use super::{derive_attributes, derive_links, AttributedRecord, LayoutOptions, NetworkLink, VisualizationStyle};
use crate::market_data::{MarketDataRecord, Timeframe};
use crate::market_scanner::{filter, FilterCriteria};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything a renderer needs to draw one style
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VisualizationPayload {
    pub style: VisualizationStyle,
    pub timeframe: Timeframe,
    pub options: LayoutOptions,
    pub criteria: FilterCriteria,
    pub nodes: Vec<AttributedRecord>,
    /// Empty unless the style draws links
    pub links: Vec<NetworkLink>,
    pub generated_at: DateTime<Utc>,
}

/// Filter, derive attributes and, for the network style, link the result.
pub fn build_payload(
    records: &[MarketDataRecord],
    style: VisualizationStyle,
    timeframe: Timeframe,
    criteria: &FilterCriteria,
    options: &LayoutOptions,
) -> VisualizationPayload {
    let filtered = filter(records, criteria);
    let nodes = derive_attributes(&filtered, timeframe, options);
    let links = if style.has_links() {
        derive_links(&filtered[..nodes.len()])
    } else {
        Vec::new()
    };

    VisualizationPayload {
        style,
        timeframe,
        options: *options,
        criteria: criteria.clone(),
        nodes,
        links,
        generated_at: Utc::now(),
    }
}
