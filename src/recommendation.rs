//! Recommendation row
//!
//! One `CropSuitabilityScore` per (district, crop): the three sub-scores,
//! the composite, the category, the dense rank and the descriptive fields
//! the presentation layer shows next to them.

use serde::Serialize;

use crate::composite::{Category, CompositeScore};
use crate::error::DataQualityIssue;
use crate::normalize::{
    DimensionStatus, MarketResult, PriceTrend, RainfallBucket, VegetationHealth, VegetationResult,
    WeatherResult,
};
use crate::ranker::RankKey;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropSuitabilityScore {
    pub district: String,
    pub crop: String,

    // Sub-scores (0-10)
    pub weather_score: f64,
    pub vegetation_score: f64,
    pub market_score: f64,

    /// Full precision, used for ranking and categorization
    pub overall_score: f64,
    /// Rounded to one decimal
    pub overall_score_display: f64,
    pub category: Category,
    /// Dense rank within the district, 1 = best
    pub rank: u32,

    pub weather_status: DimensionStatus,
    pub vegetation_status: DimensionStatus,
    pub market_status: DimensionStatus,
    pub data_quality_flag: bool,
    pub data_quality_notes: Vec<DataQualityIssue>,

    // Pass-through
    pub temperature_celsius: Option<f64>,
    pub rainfall_bucket: Option<RainfallBucket>,
    pub vegetation_health: Option<VegetationHealth>,
    pub soil_moisture_pct: Option<f64>,
    pub ndvi_change: Option<f64>,
    pub price_current: Option<f64>,
    pub price_change_pct: Option<f64>,
    pub price_trend: PriceTrend,
}

impl CropSuitabilityScore {
    /// Assemble an unranked row (`rank == 0`) from the normalizer outputs
    pub fn new(
        district: &str,
        crop: &str,
        weather: WeatherResult,
        vegetation: VegetationResult,
        market: MarketResult,
        composite: CompositeScore,
    ) -> Self {
        let data_quality_notes: Vec<DataQualityIssue> = [
            weather.score.issue,
            vegetation.score.issue,
            market.score.issue,
        ]
        .into_iter()
        .flatten()
        .collect();

        Self {
            district: district.to_string(),
            crop: crop.to_string(),
            weather_score: weather.score.value,
            vegetation_score: vegetation.score.value,
            market_score: market.score.value,
            overall_score: composite.overall,
            overall_score_display: composite.overall_display(),
            category: composite.category,
            rank: 0,
            weather_status: weather.score.status,
            vegetation_status: vegetation.score.status,
            market_status: market.score.status,
            data_quality_flag: !data_quality_notes.is_empty(),
            data_quality_notes,
            temperature_celsius: weather.temperature,
            rainfall_bucket: weather.rainfall_bucket,
            vegetation_health: vegetation.health,
            soil_moisture_pct: vegetation.soil_moisture_pct,
            ndvi_change: vegetation.ndvi_change,
            price_current: market.price_current,
            price_change_pct: market.price_change_pct,
            price_trend: market.trend,
        }
    }

    pub fn rank_key(&self) -> RankKey<'_> {
        RankKey {
            overall: self.overall_score,
            market: self.market_score,
            crop: &self.crop,
        }
    }

    /// Dimensions that fell back to the neutral score for lack of input
    pub fn missing_dimensions(&self) -> Vec<&'static str> {
        [
            ("weather", self.weather_status),
            ("vegetation", self.vegetation_status),
            ("market", self.market_status),
        ]
        .into_iter()
        .filter(|(_, status)| *status == DimensionStatus::Missing)
        .map(|(name, _)| name)
        .collect()
    }
}
