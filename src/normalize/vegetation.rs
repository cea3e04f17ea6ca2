//! VEGETATION SUITABILITY
//!
//! NDVI alone picks the health bucket (evaluated lowest threshold first):
//!   < 0.2 Bare/Very Poor, < 0.5 Sparse, < 0.7 Moderate, otherwise Dense/Healthy
//!
//! score = base_score(bucket) + soil_moisture_adjustment, clamped to [0, 10]
//!
//! The soil-moisture term is `+bonus` inside the optimal band and a penalty
//! growing linearly to `max_penalty` towards 0 % or 100 % outside it. An
//! out-of-range moisture reading drops the term and is reported as a
//! data-quality issue.

use serde::{Deserialize, Serialize};

use super::DimensionScore;
use crate::config::{SoilMoistureTerm, VegetationConfig};
use crate::error::DataQualityIssue;
use crate::observations::VegetationObservation;

/// NDVI health bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VegetationHealth {
    Bare,
    Sparse,
    Moderate,
    Dense,
}

impl VegetationHealth {
    pub fn display_text(&self) -> &'static str {
        match self {
            VegetationHealth::Bare => "Bare/Very Poor",
            VegetationHealth::Sparse => "Sparse",
            VegetationHealth::Moderate => "Moderate",
            VegetationHealth::Dense => "Dense/Healthy",
        }
    }
}

/// Result of the vegetation normalizer
#[derive(Debug, Clone)]
pub struct VegetationResult {
    pub score: DimensionScore,
    pub health: Option<VegetationHealth>,
    pub soil_moisture_pct: Option<f64>,
    pub ndvi_change: Option<f64>,
}

/// Normalize the district's latest vegetation reading
pub fn score_vegetation(
    observation: Option<&VegetationObservation>,
    config: &VegetationConfig,
    neutral: f64,
) -> VegetationResult {
    let Some(obs) = observation else {
        return VegetationResult {
            score: DimensionScore::missing(neutral),
            health: None,
            soil_moisture_pct: None,
            ndvi_change: None,
        };
    };

    let ndvi_valid = obs.ndvi_value.filter(|v| v.is_finite() && (-1.0..=1.0).contains(v));
    let health = ndvi_valid.and_then(|v| config.health.classify(v).copied());
    let moisture_valid = obs
        .soil_moisture_pct
        .filter(|m| m.is_finite() && (0.0..=100.0).contains(m));

    let result = |score| VegetationResult {
        score,
        health,
        soil_moisture_pct: moisture_valid,
        ndvi_change: obs.ndvi_change(),
    };

    let Some(ndvi) = obs.ndvi_value else {
        return result(DimensionScore::missing(neutral));
    };
    if ndvi_valid.is_none() {
        return result(DimensionScore::invalid(
            neutral,
            DataQualityIssue::NdviOutOfRange { value: ndvi },
        ));
    }
    let Some(health) = health else {
        return result(DimensionScore::missing(neutral));
    };

    let base = config.base_scores.for_health(health);

    // Bad moisture only loses its own term; the NDVI bucket still scores
    if let (Some(m), None) = (obs.soil_moisture_pct, moisture_valid) {
        return result(DimensionScore::measured_with_issue(
            base,
            DataQualityIssue::SoilMoistureOutOfRange { value: m },
        ));
    }

    let adjustment = moisture_valid
        .map(|m| soil_moisture_adjustment(m, &config.soil_moisture))
        .unwrap_or(0.0);

    result(DimensionScore::measured(base + adjustment))
}

/// Bounded soil-moisture term, in [-max_penalty, bonus]
pub fn soil_moisture_adjustment(moisture_pct: f64, term: &SoilMoistureTerm) -> f64 {
    if moisture_pct < term.optimal_min {
        let deficit = (term.optimal_min - moisture_pct) / term.optimal_min;
        -term.max_penalty * deficit.min(1.0)
    } else if moisture_pct > term.optimal_max {
        let excess = (moisture_pct - term.optimal_max) / (100.0 - term.optimal_max);
        -term.max_penalty * excess.min(1.0)
    } else {
        term.bonus
    }
}
