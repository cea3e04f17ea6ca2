//! MARKET SUITABILITY
//!
//! level = linear map of the current price from the crop's acceptable range
//!         [price_min, price_max] onto [level_floor, level_ceiling]
//! trend = percent change × trend_sensitivity, capped at ±max_trend_adjustment
//! score = level + trend, clamped to [0, 10]
//!
//! Crops without a configured range use the neutral level. A prior price of
//! zero or below is a data-quality problem even without a current price: the
//! percent change would divide by it.

use serde::{Deserialize, Serialize};

use super::DimensionScore;
use crate::config::{MarketConfig, PriceRange};
use crate::error::DataQualityIssue;
use crate::observations::PriceObservation;
use crate::utils::normalization::{clamp_score, linear_scale};

/// Direction of the price over the comparison window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTrend {
    Falling,
    Stable,
    Rising,
    /// Change undefined (missing or invalid prior price)
    Unknown,
}

impl PriceTrend {
    pub fn display_text(&self) -> &'static str {
        match self {
            PriceTrend::Falling => "Falling",
            PriceTrend::Stable => "Stable",
            PriceTrend::Rising => "Rising",
            PriceTrend::Unknown => "Unknown",
        }
    }
}

/// Result of the market normalizer
#[derive(Debug, Clone)]
pub struct MarketResult {
    pub score: DimensionScore,
    /// currency/kg, passed through for presentation
    pub price_current: Option<f64>,
    pub price_change_pct: Option<f64>,
    pub trend: PriceTrend,
}

/// Normalize the latest price row of one crop in one district
pub fn score_market(
    observation: Option<&PriceObservation>,
    price_range: Option<PriceRange>,
    config: &MarketConfig,
    neutral: f64,
) -> MarketResult {
    let Some(obs) = observation else {
        return MarketResult {
            score: DimensionScore::missing(neutral),
            price_current: None,
            price_change_pct: None,
            trend: PriceTrend::Unknown,
        };
    };

    let current_valid = obs.price_current.filter(|p| p.is_finite() && *p > 0.0);

    // Change and trend are only shown next to a usable current price
    let price_change_pct = current_valid.and(obs.price_change_pct());
    let trend = price_change_pct
        .and_then(|change| config.trend.classify(change).copied())
        .unwrap_or(PriceTrend::Unknown);

    let result = |score| MarketResult {
        score,
        price_current: current_valid,
        price_change_pct,
        trend,
    };

    if let Some(current) = obs.price_current.filter(|_| current_valid.is_none()) {
        return result(DimensionScore::invalid(
            neutral,
            DataQualityIssue::InvalidCurrentPrice { current },
        ));
    }
    if let Some(prior) = obs.price_prior.filter(|p| !p.is_finite() || *p <= 0.0) {
        return result(DimensionScore::invalid(
            neutral,
            DataQualityIssue::NonPositivePriorPrice { prior },
        ));
    }
    let Some(current) = current_valid else {
        return result(DimensionScore::missing(neutral));
    };

    let level = price_range
        .map(|range| {
            clamp_score(linear_scale(
                current,
                range.min,
                range.max,
                config.level_floor,
                config.level_ceiling,
            ))
        })
        .unwrap_or(neutral);

    let trend_adjustment = price_change_pct
        .map(|change| {
            (change * config.trend_sensitivity)
                .clamp(-config.max_trend_adjustment, config.max_trend_adjustment)
        })
        .unwrap_or(0.0);

    result(DimensionScore::measured(level + trend_adjustment))
}
