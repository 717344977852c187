//! Per-record visual attributes consumed by the renderers
//!
//! Every visualization style shares the same formulas; styles differ only
//! in the offsets added to the radius and in how many slots they show.

pub mod scale;
pub mod links;
pub mod payload;

pub use scale::{checked_market_cap, radius, DegenerateInputError, OpacityScale, MAX_OPACITY, MIN_OPACITY};
pub use links::{derive_links, NetworkLink, LINK_THRESHOLD};
pub use payload::{build_payload, VisualizationPayload};

use crate::market_data::{resolve_change, MarketDataRecord, Timeframe};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Visualization styles sharing one attributed dataset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationStyle {
    Bubble,
    Network,
    Honeycomb,
    Radial,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unknown visualization style '{0}', expected one of bubble, network, honeycomb, radial")]
pub struct ParseStyleError(pub String);

#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("radius offset {0} must be a finite, non-negative number")]
pub struct InvalidOffsetError(pub f64);

impl VisualizationStyle {
    pub const ALL: [VisualizationStyle; 4] = [
        VisualizationStyle::Bubble,
        VisualizationStyle::Network,
        VisualizationStyle::Honeycomb,
        VisualizationStyle::Radial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VisualizationStyle::Bubble => "bubble",
            VisualizationStyle::Network => "network",
            VisualizationStyle::Honeycomb => "honeycomb",
            VisualizationStyle::Radial => "radial",
        }
    }

    pub fn has_links(&self) -> bool {
        matches!(self, VisualizationStyle::Network)
    }
}

impl fmt::Display for VisualizationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisualizationStyle {
    type Err = ParseStyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bubble" => Ok(VisualizationStyle::Bubble),
            "network" => Ok(VisualizationStyle::Network),
            "honeycomb" => Ok(VisualizationStyle::Honeycomb),
            "radial" => Ok(VisualizationStyle::Radial),
            other => Err(ParseStyleError(other.to_string())),
        }
    }
}

/// Style-specific parameters for attribute derivation
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutOptions {
    /// Added to the drawn radius
    pub base_offset: f64,
    /// Added to the radius used for collision spacing
    pub collision_offset: f64,
    /// Only the first `max_slots` records are laid out
    pub max_slots: Option<usize>,
}

impl LayoutOptions {
    pub fn for_style(style: VisualizationStyle) -> Self {
        match style {
            VisualizationStyle::Bubble => Self {
                base_offset: 30.0,
                collision_offset: 30.0,
                max_slots: None,
            },
            VisualizationStyle::Network => Self {
                base_offset: 5.0,
                collision_offset: 15.0,
                max_slots: None,
            },
            VisualizationStyle::Honeycomb => Self {
                base_offset: 15.0,
                collision_offset: 15.0,
                max_slots: None,
            },
            VisualizationStyle::Radial => Self {
                base_offset: 15.0,
                collision_offset: 15.0,
                max_slots: Some(20),
            },
        }
    }

    pub fn with_base_offset(mut self, base_offset: f64) -> Result<Self, InvalidOffsetError> {
        self.base_offset = checked_offset(base_offset)?;
        Ok(self)
    }

    /// Both offsets must be finite and non-negative for radii to stay valid
    pub fn validate(&self) -> Result<(), InvalidOffsetError> {
        checked_offset(self.base_offset)?;
        checked_offset(self.collision_offset)?;
        Ok(())
    }

    pub fn with_max_slots(mut self, max_slots: Option<usize>) -> Self {
        self.max_slots = max_slots;
        self
    }
}

fn checked_offset(offset: f64) -> Result<f64, InvalidOffsetError> {
    if offset.is_finite() && offset >= 0.0 {
        Ok(offset)
    } else {
        Err(InvalidOffsetError(offset))
    }
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self::for_style(VisualizationStyle::Bubble)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorCategory {
    Gain,
    Loss,
}

impl ColorCategory {
    /// Strictly positive change is a gain; zero and NaN are losses.
    pub fn from_change(change_pct: f64) -> Self {
        if change_pct > 0.0 {
            ColorCategory::Gain
        } else {
            ColorCategory::Loss
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VisualAttributes {
    pub radius: f64,
    pub collision_radius: f64,
    pub color_category: ColorCategory,
    pub opacity: f64,
}

/// A record together with its resolved change and derived attributes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributedRecord {
    #[serde(flatten)]
    pub record: MarketDataRecord,
    pub change_pct: f64,
    #[serde(flatten)]
    pub attributes: VisualAttributes,
}

/// Derive visual attributes for an already filtered batch.
///
/// The opacity domain is computed over the records that remain after the
/// `max_slots` slice.
pub fn derive_attributes(
    records: &[MarketDataRecord],
    timeframe: Timeframe,
    options: &LayoutOptions,
) -> Vec<AttributedRecord> {
    let slots = options.max_slots.unwrap_or(records.len()).min(records.len());
    let batch = &records[..slots];
    let opacity_scale = OpacityScale::from_records(batch);

    batch
        .iter()
        .map(|record| {
            if let Err(e) = checked_market_cap(record.market_cap) {
                debug!(id = %record.id, error = %e, "Using default attributes");
            }
            let change_pct = resolve_change(record, timeframe);
            AttributedRecord {
                record: record.clone(),
                change_pct,
                attributes: VisualAttributes {
                    radius: radius(record.market_cap, options.base_offset),
                    collision_radius: radius(record.market_cap, options.collision_offset),
                    color_category: ColorCategory::from_change(change_pct),
                    opacity: opacity_scale.opacity(record.market_cap),
                },
            }
        })
        .collect()
}
