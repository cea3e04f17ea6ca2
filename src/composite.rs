//! Composite Scorer
//!
//! overall = w_weather × weather + w_vegetation × vegetation + w_market × market
//!
//! Weights are validated to sum to 1.0 when the scorer is built. The overall
//! score is clamped to [0, 10] and kept at full precision; categorization and
//! ranking both use the full-precision value, presentation rounds to one
//! decimal.

use serde::{Deserialize, Serialize};

use crate::config::DimensionWeights;
use crate::error::ConfigError;
use crate::utils::normalization::{clamp_score, round_to};
use crate::utils::rules::RuleCascade;

/// Recommendation category of an overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    HighlyRecommended,
    Recommended,
    Consider,
    NotRecommended,
}

impl Category {
    pub fn display_text(&self) -> &'static str {
        match self {
            Category::HighlyRecommended => "Highly Recommended",
            Category::Recommended => "Recommended",
            Category::Consider => "Consider",
            Category::NotRecommended => "Not Recommended",
        }
    }
}

/// The three 0-10 sub-scores of one (district, crop)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubScores {
    pub weather: f64,
    pub vegetation: f64,
    pub market: f64,
}

/// Output of the composite step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeScore {
    /// Full precision, in [0, 10]
    pub overall: f64,
    pub category: Category,
}

impl CompositeScore {
    /// Overall score rounded for presentation
    pub fn overall_display(&self) -> f64 {
        round_to(self.overall, 1)
    }
}

/// Weighted sum clamped to [0, 10]
pub fn weighted_overall(scores: &SubScores, weights: &DimensionWeights) -> f64 {
    clamp_score(
        weights.weather * scores.weather
            + weights.vegetation * scores.vegetation
            + weights.market * scores.market,
    )
}

/// Combines sub-scores with validated weights
#[derive(Debug, Clone)]
pub struct CompositeScorer {
    weights: DimensionWeights,
    categories: RuleCascade<Category>,
}

impl CompositeScorer {
    /// Fails fast on weights not summing to 1.0 or a malformed category table
    pub fn new(
        weights: DimensionWeights,
        categories: RuleCascade<Category>,
    ) -> Result<Self, ConfigError> {
        weights.validate()?;
        categories.validate("categories")?;
        Ok(Self { weights, categories })
    }

    pub fn score(&self, scores: &SubScores) -> CompositeScore {
        let overall = weighted_overall(scores, &self.weights);
        CompositeScore {
            overall,
            category: self.categorize(overall),
        }
    }

    pub fn categorize(&self, overall: f64) -> Category {
        self.categories
            .classify(overall)
            .copied()
            .unwrap_or(Category::NotRecommended)
    }
}
