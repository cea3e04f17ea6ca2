//! Error types
//!
//! Two failure classes exist. A `ConfigError` is fatal and is raised before
//! any scoring happens. A `DataQualityIssue` never aborts a run: the affected
//! dimension falls back to the neutral score and the row carries a note.

use serde::Serialize;
use thiserror::Error;

/// Fatal configuration problems, detected at load/construction time
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("dimension weights must sum to 1.0, got {sum} (weather={weather}, vegetation={vegetation}, market={market})")]
    WeightSum {
        weather: f64,
        vegetation: f64,
        market: f64,
        sum: f64,
    },

    #[error("weight '{name}' must be a finite value in [0, 1], got {value}")]
    WeightOutOfRange { name: &'static str, value: f64 },

    #[error("rule table '{table}' is malformed: {reason}")]
    MalformedRules { table: String, reason: String },

    #[error("temperature curve '{curve}' is malformed: {reason}")]
    MalformedCurve { curve: String, reason: String },

    #[error("invalid setting '{name}': {reason}")]
    InvalidSetting { name: String, reason: String },

    #[error("crop '{crop}' has an invalid price range: {reason}")]
    InvalidPriceRange { crop: String, reason: String },

    #[error("crop '{0}' is configured more than once")]
    DuplicateCrop(String),
}

/// Per-row data-quality degradation
///
/// Serialized into the output as a human-readable note.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(into = "String")]
pub enum DataQualityIssue {
    #[error("prior price {prior} is not positive; price trend is undefined")]
    NonPositivePriorPrice { prior: f64 },

    #[error("current price {current} is not a positive finite value")]
    InvalidCurrentPrice { current: f64 },

    #[error("NDVI {value} lies outside [-1, 1]")]
    NdviOutOfRange { value: f64 },

    #[error("soil moisture {value}% lies outside [0, 100]")]
    SoilMoistureOutOfRange { value: f64 },

    #[error("temperature {value} is not a finite value")]
    InvalidTemperature { value: f64 },

    #[error("rainfall {value} mm/hr is negative or not finite")]
    InvalidRainfall { value: f64 },
}

impl From<DataQualityIssue> for String {
    fn from(issue: DataQualityIssue) -> Self {
        issue.to_string()
    }
}
