//! Scoring configuration
//!
//! Every tunable of the engine lives here: dimension weights, the weather
//! curve, the vegetation and market parameters, the classification cascades
//! and the district/crop catalogue. The structure is passed into
//! `CropScorer::new` and validated before any scoring.
//!
//! `ScoringConfig::default()` is the built-in catalogue for the Ugandan
//! districts and crops; a JSON file may override any part of it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::composite::Category;
use crate::error::ConfigError;
use crate::normalize::market::PriceTrend;
use crate::normalize::vegetation::VegetationHealth;
use crate::normalize::weather::RainfallBucket;
use crate::utils::normalization::{CurvePoint, ScoreCurve, SCORE_MAX, SCORE_MIN};
use crate::utils::rules::{Rule, RuleCascade};

/// Tolerance for the weight-sum check
pub const WEIGHT_SUM_EPSILON: f64 = 1e-9;

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: DimensionWeights,
    /// Score used for missing or invalid dimensions
    pub neutral_score: f64,
    pub weather: WeatherConfig,
    pub vegetation: VegetationConfig,
    pub market: MarketConfig,
    /// Overall score → recommendation category
    pub categories: RuleCascade<Category>,
    /// Districts accepted from the feeds (empty = accept all)
    pub districts: Vec<String>,
    /// Crop catalogue; every listed crop is scored in each district with data
    pub crops: Vec<CropProfile>,
}

/// Composite weights, must sum to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionWeights {
    pub weather: f64,
    pub vegetation: f64,
    pub market: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// °C → 0-10 base score
    pub temperature_curve: ScoreCurve,
    /// mm/hr → bucket and score multiplier
    pub rainfall: RuleCascade<RainfallClass>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RainfallClass {
    pub bucket: RainfallBucket,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VegetationConfig {
    /// NDVI → health bucket
    pub health: RuleCascade<VegetationHealth>,
    pub base_scores: HealthBaseScores,
    pub soil_moisture: SoilMoistureTerm,
}

/// Base vegetation score per health bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthBaseScores {
    pub bare: f64,
    pub sparse: f64,
    pub moderate: f64,
    pub dense: f64,
}

impl HealthBaseScores {
    pub fn for_health(&self, health: VegetationHealth) -> f64 {
        match health {
            VegetationHealth::Bare => self.bare,
            VegetationHealth::Sparse => self.sparse,
            VegetationHealth::Moderate => self.moderate,
            VegetationHealth::Dense => self.dense,
        }
    }
}

/// Bounded soil-moisture adjustment to the vegetation score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilMoistureTerm {
    /// % lower edge of the optimal band
    pub optimal_min: f64,
    /// % upper edge of the optimal band
    pub optimal_max: f64,
    /// Added inside the band
    pub bonus: f64,
    /// Largest subtraction, reached at 0 % or 100 %
    pub max_penalty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Level score at the bottom of a crop's acceptable price range
    pub level_floor: f64,
    /// Level score at the top of a crop's acceptable price range
    pub level_ceiling: f64,
    /// Score points per percent of price change
    pub trend_sensitivity: f64,
    /// Cap on the trend adjustment, both directions
    pub max_trend_adjustment: f64,
    /// Percent change → trend label
    pub trend: RuleCascade<PriceTrend>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropProfile {
    pub name: String,
    /// Acceptable price range, currency/kg
    #[serde(default)]
    pub price_range: Option<PriceRange>,
    /// Crop-specific replacement for `weather.temperature_curve`
    #[serde(default)]
    pub temperature_curve: Option<ScoreCurve>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl DimensionWeights {
    pub fn sum(&self) -> f64 {
        self.weather + self.vegetation + self.market
    }

    /// Each weight in [0, 1] and the sum within `WEIGHT_SUM_EPSILON` of 1.0
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("weather", self.weather),
            ("vegetation", self.vegetation),
            ("market", self.market),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::WeightOutOfRange { name, value });
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(ConfigError::WeightSum {
                weather: self.weather,
                vegetation: self.vegetation,
                market: self.market,
                sum,
            });
        }

        Ok(())
    }
}

impl Default for DimensionWeights {
    fn default() -> Self {
        Self {
            weather: 0.40,
            vegetation: 0.35,
            market: 0.25,
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            temperature_curve: ScoreCurve::new(vec![
                CurvePoint::new(5.0, 0.0),
                CurvePoint::new(12.0, 3.0),
                CurvePoint::new(18.0, 8.0),
                CurvePoint::new(22.0, 10.0),
                CurvePoint::new(28.0, 10.0),
                CurvePoint::new(32.0, 7.0),
                CurvePoint::new(38.0, 2.0),
                CurvePoint::new(42.0, 0.0),
            ]),
            rainfall: RuleCascade::new(vec![
                Rule::below(0.1, RainfallClass { bucket: RainfallBucket::NoRain, multiplier: 0.9 }),
                Rule::below(2.5, RainfallClass { bucket: RainfallBucket::Light, multiplier: 1.0 }),
                Rule::below(7.6, RainfallClass { bucket: RainfallBucket::Moderate, multiplier: 0.95 }),
                Rule::otherwise(RainfallClass { bucket: RainfallBucket::Heavy, multiplier: 0.75 }),
            ]),
        }
    }
}

impl Default for VegetationConfig {
    fn default() -> Self {
        Self {
            health: RuleCascade::new(vec![
                Rule::below(0.2, VegetationHealth::Bare),
                Rule::below(0.5, VegetationHealth::Sparse),
                Rule::below(0.7, VegetationHealth::Moderate),
                Rule::otherwise(VegetationHealth::Dense),
            ]),
            base_scores: HealthBaseScores {
                bare: 1.0,
                sparse: 4.0,
                moderate: 7.0,
                dense: 9.0,
            },
            soil_moisture: SoilMoistureTerm {
                optimal_min: 20.0,
                optimal_max: 40.0,
                bonus: 1.0,
                max_penalty: 2.0,
            },
        }
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            level_floor: 2.0,
            level_ceiling: 8.0,
            trend_sensitivity: 0.2,
            max_trend_adjustment: 2.0,
            trend: RuleCascade::new(vec![
                Rule::below(-2.0, PriceTrend::Falling),
                Rule::below(2.0, PriceTrend::Stable),
                Rule::otherwise(PriceTrend::Rising),
            ]),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let crop = |name: &str, min: f64, max: f64| CropProfile {
            name: name.to_string(),
            price_range: Some(PriceRange { min, max }),
            temperature_curve: None,
        };

        // UGX/kg ranges observed in the market feed
        let mut coffee = crop("Coffee", 3000.0, 5000.0);
        coffee.temperature_curve = Some(ScoreCurve::new(vec![
            CurvePoint::new(8.0, 0.0),
            CurvePoint::new(15.0, 7.0),
            CurvePoint::new(18.0, 10.0),
            CurvePoint::new(24.0, 10.0),
            CurvePoint::new(28.0, 5.0),
            CurvePoint::new(32.0, 0.0),
        ]));
        let mut cassava = crop("Cassava", 500.0, 1000.0);
        cassava.temperature_curve = Some(ScoreCurve::new(vec![
            CurvePoint::new(10.0, 0.0),
            CurvePoint::new(18.0, 6.0),
            CurvePoint::new(25.0, 10.0),
            CurvePoint::new(32.0, 10.0),
            CurvePoint::new(38.0, 5.0),
            CurvePoint::new(42.0, 1.0),
        ]));

        Self {
            weights: DimensionWeights::default(),
            neutral_score: 5.0,
            weather: WeatherConfig::default(),
            vegetation: VegetationConfig::default(),
            market: MarketConfig::default(),
            categories: RuleCascade::new(vec![
                Rule::at_least(8.0, Category::HighlyRecommended),
                Rule::at_least(6.0, Category::Recommended),
                Rule::at_least(4.0, Category::Consider),
                Rule::otherwise(Category::NotRecommended),
            ]),
            districts: ["Kampala", "Mbale", "Gulu", "Mbarara"]
                .iter()
                .map(|d| d.to_string())
                .collect(),
            crops: vec![
                crop("Maize", 800.0, 1500.0),
                crop("Beans", 2000.0, 3500.0),
                cassava,
                crop("Sweet Potato", 600.0, 1200.0),
                coffee,
                crop("Banana (Matoke)", 300.0, 800.0),
            ],
        }
    }
}

impl ScoringConfig {
    /// Load configuration from a JSON file and validate it
    ///
    /// Missing sections fall back to the built-in defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scoring config: {:?}", path))?;

        let config = Self::from_json_str(&contents)
            .with_context(|| format!("Invalid scoring config: {:?}", path))?;

        Ok(config)
    }

    /// Parse and validate configuration JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ScoringConfig =
            serde_json::from_str(json).with_context(|| "Failed to parse scoring config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject malformed weights, tables and ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;

        check_score_setting("neutral_score", self.neutral_score)?;

        // Weather
        self.weather.temperature_curve.validate("weather.temperature_curve")?;
        self.weather.rainfall.validate("weather.rainfall")?;
        for (idx, rule) in self.weather.rainfall.rules().iter().enumerate() {
            let multiplier = rule.then.multiplier;
            if !multiplier.is_finite() || multiplier < 0.0 {
                return Err(ConfigError::MalformedRules {
                    table: "weather.rainfall".to_string(),
                    reason: format!("rule {} multiplier {} must be finite and >= 0", idx, multiplier),
                });
            }
        }

        // Vegetation
        self.vegetation.health.validate("vegetation.health")?;
        let base = &self.vegetation.base_scores;
        for (name, value) in [
            ("vegetation.base_scores.bare", base.bare),
            ("vegetation.base_scores.sparse", base.sparse),
            ("vegetation.base_scores.moderate", base.moderate),
            ("vegetation.base_scores.dense", base.dense),
        ] {
            check_score_setting(name, value)?;
        }

        let soil = &self.vegetation.soil_moisture;
        let band_ok = soil.optimal_min.is_finite()
            && soil.optimal_max.is_finite()
            && 0.0 <= soil.optimal_min
            && soil.optimal_min < soil.optimal_max
            && soil.optimal_max <= 100.0;
        if !band_ok {
            return Err(ConfigError::InvalidSetting {
                name: "vegetation.soil_moisture".to_string(),
                reason: format!(
                    "optimal band [{}, {}] must satisfy 0 <= min < max <= 100",
                    soil.optimal_min, soil.optimal_max
                ),
            });
        }
        check_non_negative("vegetation.soil_moisture.bonus", soil.bonus)?;
        check_non_negative("vegetation.soil_moisture.max_penalty", soil.max_penalty)?;

        // Market
        check_score_setting("market.level_floor", self.market.level_floor)?;
        check_score_setting("market.level_ceiling", self.market.level_ceiling)?;
        check_non_negative("market.trend_sensitivity", self.market.trend_sensitivity)?;
        check_non_negative("market.max_trend_adjustment", self.market.max_trend_adjustment)?;
        self.market.trend.validate("market.trend")?;

        self.categories.validate("categories")?;

        // Crop catalogue
        let mut seen = HashSet::new();
        for crop in &self.crops {
            if !seen.insert(crop.name.as_str()) {
                return Err(ConfigError::DuplicateCrop(crop.name.clone()));
            }
            if let Some(range) = crop.price_range {
                let valid = range.min.is_finite()
                    && range.max.is_finite()
                    && range.min > 0.0
                    && range.min < range.max;
                if !valid {
                    return Err(ConfigError::InvalidPriceRange {
                        crop: crop.name.clone(),
                        reason: format!("[{}, {}] must satisfy 0 < min < max", range.min, range.max),
                    });
                }
            }
            if let Some(curve) = &crop.temperature_curve {
                curve.validate(&format!("crops.{}.temperature_curve", crop.name))?;
            }
        }

        Ok(())
    }

    /// Whether rows for `district` take part in a run
    pub fn accepts_district(&self, district: &str) -> bool {
        self.districts.is_empty() || self.districts.iter().any(|d| d == district)
    }
}

fn check_score_setting(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (SCORE_MIN..=SCORE_MAX).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidSetting {
            name: name.to_string(),
            reason: format!("{} must lie in [0, 10]", value),
        })
    }
}

fn check_non_negative(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidSetting {
            name: name.to_string(),
            reason: format!("{} must be finite and >= 0", value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_default_config_is_valid() {
        let config = ScoringConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.crops.len(), 6);
        assert_eq!(config.districts.len(), 4);
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut config = ScoringConfig::default();
        config.weights.weather = 0.5;

        match config.validate() {
            Err(ConfigError::WeightSum { sum, .. }) => assert!((sum - 1.1).abs() < 1e-9),
            other => panic!("expected WeightSum error, got {:?}", other),
        }
    }

    #[test]
    fn test_randomized_weight_sets() {
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..500 {
            let weather: f64 = rng.gen_range(0.0..1.0);
            let vegetation: f64 = rng.gen_range(0.0..1.0);
            let market: f64 = rng.gen_range(0.0..1.0);
            let weights = DimensionWeights { weather, vegetation, market };
            let sums_to_one = (weather + vegetation + market - 1.0).abs() <= WEIGHT_SUM_EPSILON;
            assert_eq!(weights.validate().is_ok(), sums_to_one);
        }

        // Normalized random sets always pass
        for _ in 0..500 {
            let raw: [f64; 3] = [rng.gen_range(0.01..1.0), rng.gen_range(0.01..1.0), rng.gen_range(0.01..1.0)];
            let total: f64 = raw.iter().sum();
            let weights = DimensionWeights {
                weather: raw[0] / total,
                vegetation: raw[1] / total,
                market: raw[2] / total,
            };
            assert!(weights.validate().is_ok(), "{:?}", weights);
        }
    }

    #[test]
    fn test_negative_weight_rejected_even_if_sum_is_one() {
        let weights = DimensionWeights {
            weather: 1.2,
            vegetation: -0.2,
            market: 0.0,
        };
        assert!(matches!(
            weights.validate(),
            Err(ConfigError::WeightOutOfRange { name: "weather", .. })
        ));
    }

    #[test]
    fn test_malformed_tables_rejected() {
        let mut config = ScoringConfig::default();
        config.categories = RuleCascade::new(vec![
            Rule::at_least(4.0, Category::Consider),
            Rule::at_least(8.0, Category::HighlyRecommended),
            Rule::otherwise(Category::NotRecommended),
        ]);
        assert!(matches!(config.validate(), Err(ConfigError::MalformedRules { .. })));

        let mut config = ScoringConfig::default();
        config.vegetation.soil_moisture.optimal_min = 50.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSetting { .. })));

        let mut config = ScoringConfig::default();
        config.crops[0].price_range = Some(PriceRange { min: 0.0, max: 100.0 });
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPriceRange { .. })));

        let mut config = ScoringConfig::default();
        config.crops.push(config.crops[0].clone());
        assert!(matches!(config.validate(), Err(ConfigError::DuplicateCrop(_))));
    }

    #[test]
    fn test_partial_json_overrides_defaults() {
        let json = r#"{
            "weights": { "weather": 0.5, "vegetation": 0.3, "market": 0.2 },
            "districts": []
        }"#;

        let config = ScoringConfig::from_json_str(json).unwrap();
        assert_eq!(config.weights.weather, 0.5);
        assert!(config.accepts_district("Jinja"));
        assert_eq!(config.crops.len(), 6);
    }

    #[test]
    fn test_json_rejects_bad_weights() {
        let json = r#"{ "weights": { "weather": 0.5, "vegetation": 0.5, "market": 0.5 } }"#;
        let err = ScoringConfig::from_json_str(json).unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }

    #[test]
    fn test_json_round_trip() {
        let config = ScoringConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let back = ScoringConfig::from_json_str(&json).unwrap();
        assert_eq!(back.districts, config.districts);
        assert_eq!(back.crops.len(), config.crops.len());
        assert_eq!(back.categories.rules().len(), 4);
        assert!((back.weights.sum() - 1.0).abs() < 1e-9);
        assert!(back.crops.iter().any(|c| c.name == "Coffee" && c.temperature_curve.is_some()));
    }
}
