//! Per-dimension normalizers
//!
//! Each dimension maps its raw observation onto the 0-10 suitability scale.
//! A dimension never fails: missing input falls back to the neutral score,
//! invalid input falls back to the neutral score and records a
//! `DataQualityIssue`.

pub mod weather;
pub mod vegetation;
pub mod market;

pub use weather::{score_weather, RainfallBucket, WeatherResult};
pub use vegetation::{score_vegetation, soil_moisture_adjustment, VegetationHealth, VegetationResult};
pub use market::{score_market, PriceTrend, MarketResult};

use serde::{Deserialize, Serialize};

use crate::error::DataQualityIssue;
use crate::utils::normalization::clamp_score;

/// How a dimension score was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionStatus {
    /// Computed from valid input
    Measured,
    /// No input; neutral default
    Missing,
    /// Input failed validation; neutral default plus a data-quality note
    Invalid,
}

/// A 0-10 sub-score with provenance
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionScore {
    pub value: f64,
    pub status: DimensionStatus,
    pub issue: Option<DataQualityIssue>,
}

impl DimensionScore {
    pub fn measured(value: f64) -> Self {
        Self {
            value: clamp_score(value),
            status: DimensionStatus::Measured,
            issue: None,
        }
    }

    /// Computed from the valid part of the input; the rest is reported
    pub fn measured_with_issue(value: f64, issue: DataQualityIssue) -> Self {
        Self {
            value: clamp_score(value),
            status: DimensionStatus::Measured,
            issue: Some(issue),
        }
    }

    pub fn missing(neutral: f64) -> Self {
        Self {
            value: neutral,
            status: DimensionStatus::Missing,
            issue: None,
        }
    }

    pub fn invalid(neutral: f64, issue: DataQualityIssue) -> Self {
        Self {
            value: neutral,
            status: DimensionStatus::Invalid,
            issue: Some(issue),
        }
    }
}
