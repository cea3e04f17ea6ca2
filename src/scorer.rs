//! Crop Scorer - Main coordinator for a recommendation run
//!
//! Wires the per-dimension normalizers, the composite scorer and the ranker
//! together. One run consumes a `FeedSnapshot` and returns every
//! (district, crop) row, ordered by district name, then rank, then crop.
//!
//! Includes both sequential and parallel (Rayon) implementations. Districts
//! are independent, so the parallel run fans out per district; ranking inside
//! a district stays sequential because it needs the district's full crop set.

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

use crate::composite::{CompositeScorer, SubScores};
use crate::config::{CropProfile, ScoringConfig};
use crate::error::ConfigError;
use crate::normalize::{score_market, score_vegetation, score_weather};
use crate::observations::{DistrictInputs, FeedSnapshot};
use crate::ranker::rank_dense;
use crate::recommendation::CropSuitabilityScore;

/// Main crop scorer
#[derive(Debug, Clone)]
pub struct CropScorer {
    config: ScoringConfig,
    composite: CompositeScorer,
    /// crop name → index into `config.crops`
    crop_index: FxHashMap<String, usize>,
}

impl CropScorer {
    /// Validate the configuration and build the scorer
    ///
    /// Any `ConfigError` aborts here, before a single row is scored.
    pub fn new(config: ScoringConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let composite = CompositeScorer::new(config.weights, config.categories.clone())?;

        let crop_index = config
            .crops
            .iter()
            .enumerate()
            .map(|(idx, crop)| (crop.name.clone(), idx))
            .collect();

        tracing::info!(
            weather = config.weights.weather,
            vegetation = config.weights.vegetation,
            market = config.weights.market,
            crops = config.crops.len(),
            districts = config.districts.len(),
            "Crop scorer initialized"
        );

        Ok(Self {
            config,
            composite,
            crop_index,
        })
    }

    fn crop_profile(&self, crop: &str) -> Option<&CropProfile> {
        self.crop_index.get(crop).map(|&idx| &self.config.crops[idx])
    }

    /// Latest inputs per accepted district, in district-name order
    fn district_inputs<'a>(&self, snapshot: &'a FeedSnapshot) -> Vec<(&'a str, DistrictInputs<'a>)> {
        snapshot
            .latest_by_district()
            .into_iter()
            .filter(|(district, _)| {
                let accepted = self.config.accepts_district(district);
                if !accepted {
                    tracing::warn!(district = *district, "Skipping district outside the configured catalogue");
                }
                accepted
            })
            .collect()
    }

    /// Score a full snapshot
    pub fn score_snapshot(&self, snapshot: &FeedSnapshot) -> Vec<CropSuitabilityScore> {
        let districts = self.district_inputs(snapshot);
        tracing::info!(districts = districts.len(), "Scoring snapshot");

        let rows: Vec<CropSuitabilityScore> = districts
            .iter()
            .flat_map(|(district, inputs)| self.score_district(district, inputs))
            .collect();

        log_run_summary(&rows);
        rows
    }

    /// Score a full snapshot IN PARALLEL using Rayon
    ///
    /// Output is identical to `score_snapshot`: the collect preserves the
    /// district order.
    pub fn score_snapshot_parallel(&self, snapshot: &FeedSnapshot) -> Vec<CropSuitabilityScore> {
        let districts = self.district_inputs(snapshot);
        tracing::info!(districts = districts.len(), "Scoring snapshot (parallel)");

        let per_district: Vec<Vec<CropSuitabilityScore>> = districts
            .par_iter()
            .map(|(district, inputs)| self.score_district(district, inputs))
            .collect();

        let rows: Vec<CropSuitabilityScore> = per_district.into_iter().flatten().collect();

        log_run_summary(&rows);
        rows
    }

    /// Score and rank every candidate crop of one district
    ///
    /// Returns an empty vector for a district without any data.
    pub fn score_district(
        &self,
        district: &str,
        inputs: &DistrictInputs<'_>,
    ) -> Vec<CropSuitabilityScore> {
        let crops = self.candidate_crops(inputs);
        if crops.is_empty() {
            tracing::debug!(district, "No crops with score data; district omitted");
            return Vec::new();
        }

        let mut rows: Vec<CropSuitabilityScore> = crops
            .into_iter()
            .map(|crop| self.score_crop(district, crop, inputs))
            .collect();

        rank_dense(&mut rows, CropSuitabilityScore::rank_key, |row, rank| row.rank = rank);

        if let Some(best) = rows.first() {
            tracing::debug!(
                district,
                crops = rows.len(),
                best = %best.crop,
                overall = best.overall_score,
                "District ranked"
            );
        }

        rows
    }

    /// Crops with at least one dimension of data in the district
    ///
    /// District-level feeds (weather, vegetation) make every catalogue crop a
    /// candidate; a price row makes its own crop a candidate.
    fn candidate_crops<'a>(&'a self, inputs: &'a DistrictInputs<'a>) -> BTreeSet<&'a str> {
        let mut crops: BTreeSet<&'a str> = inputs.prices.keys().copied().collect();
        if inputs.weather.is_some() || inputs.vegetation.is_some() {
            crops.extend(self.config.crops.iter().map(|c| c.name.as_str()));
        }
        crops
    }

    fn score_crop(
        &self,
        district: &str,
        crop: &str,
        inputs: &DistrictInputs<'_>,
    ) -> CropSuitabilityScore {
        let neutral = self.config.neutral_score;
        let profile = self.crop_profile(crop);

        let temperature_curve = profile
            .and_then(|p| p.temperature_curve.as_ref())
            .unwrap_or(&self.config.weather.temperature_curve);

        let weather = score_weather(inputs.weather, temperature_curve, &self.config.weather, neutral);
        let vegetation = score_vegetation(inputs.vegetation, &self.config.vegetation, neutral);
        let market = score_market(
            inputs.prices.get(crop).copied(),
            profile.and_then(|p| p.price_range),
            &self.config.market,
            neutral,
        );

        let composite = self.composite.score(&SubScores {
            weather: weather.score.value,
            vegetation: vegetation.score.value,
            market: market.score.value,
        });

        let row = CropSuitabilityScore::new(district, crop, weather, vegetation, market, composite);

        for issue in &row.data_quality_notes {
            tracing::warn!(district, crop, %issue, "Data quality issue");
        }

        row
    }
}

fn log_run_summary(rows: &[CropSuitabilityScore]) {
    let flagged = rows.iter().filter(|r| r.data_quality_flag).count();
    let districts: BTreeSet<&str> = rows.iter().map(|r| r.district.as_str()).collect();
    tracing::info!(
        rows = rows.len(),
        districts = districts.len(),
        flagged,
        "Scoring run complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::Category;
    use crate::normalize::DimensionStatus;
    use crate::observations::{PriceObservation, VegetationObservation, WeatherObservation};
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn weather(district: &str) -> WeatherObservation {
        WeatherObservation {
            district: district.to_string(),
            timestamp: ts(),
            temperature: Some(24.0),
            humidity: Some(70.0),
            rainfall: Some(1.0),
            condition: Some("Clouds".to_string()),
        }
    }

    fn vegetation(district: &str, ndvi: f64) -> VegetationObservation {
        VegetationObservation {
            district: district.to_string(),
            timestamp: ts(),
            ndvi_value: Some(ndvi),
            ndvi_prior: Some(ndvi),
            soil_moisture_pct: Some(30.0),
        }
    }

    fn price(district: &str, crop: &str, current: f64, prior: f64) -> PriceObservation {
        PriceObservation {
            district: district.to_string(),
            crop: crop.to_string(),
            timestamp: ts(),
            price_current: Some(current),
            price_prior: Some(prior),
        }
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let mut config = ScoringConfig::default();
        config.weights.market = 0.5;
        assert!(matches!(CropScorer::new(config), Err(ConfigError::WeightSum { .. })));
    }

    #[test]
    fn test_district_level_feeds_score_every_catalogue_crop() {
        let scorer = CropScorer::new(ScoringConfig::default()).unwrap();
        let snapshot = FeedSnapshot::new(vec![weather("Gulu")], vec![vegetation("Gulu", 0.75)], vec![]);

        let rows = scorer.score_snapshot(&snapshot);
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(|r| r.market_status == DimensionStatus::Missing));
        assert!(rows.iter().all(|r| r.market_score == 5.0));
        assert!(rows.iter().all(|r| !r.data_quality_flag));

        let ranks: Vec<u32> = rows.iter().map(|r| r.rank).collect();
        assert_eq!(ranks[0], 1);
        assert!(ranks.windows(2).all(|w| w[1] == w[0] || w[1] == w[0] + 1));
    }

    #[test]
    fn test_price_only_district_scores_priced_crops() {
        let scorer = CropScorer::new(ScoringConfig::default()).unwrap();
        let snapshot = FeedSnapshot::new(
            vec![],
            vec![],
            vec![price("Mbale", "Beans", 3000.0, 2900.0), price("Mbale", "Maize", 900.0, 1000.0)],
        );

        let rows = scorer.score_snapshot(&snapshot);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.weather_status == DimensionStatus::Missing));
        assert!(rows.iter().all(|r| r.vegetation_status == DimensionStatus::Missing));
        assert_eq!(rows[0].crop, "Beans");
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[1].rank, 2);
    }

    #[test]
    fn test_zero_prior_price_row_is_flagged_not_dropped() {
        let scorer = CropScorer::new(ScoringConfig::default()).unwrap();
        let snapshot = FeedSnapshot::new(
            vec![weather("Kampala")],
            vec![vegetation("Kampala", 0.6)],
            vec![price("Kampala", "Maize", 1200.0, 0.0)],
        );

        let rows = scorer.score_snapshot(&snapshot);
        let maize = rows.iter().find(|r| r.crop == "Maize").unwrap();
        assert_eq!(maize.market_status, DimensionStatus::Invalid);
        assert_eq!(maize.market_score, 5.0);
        assert!(maize.data_quality_flag);
        assert_eq!(maize.data_quality_notes.len(), 1);
        assert_eq!(rows.iter().filter(|r| r.data_quality_flag).count(), 1);
    }

    #[test]
    fn test_unknown_district_skipped_when_catalogue_set() {
        let scorer = CropScorer::new(ScoringConfig::default()).unwrap();
        let snapshot = FeedSnapshot::new(vec![weather("Jinja"), weather("Gulu")], vec![], vec![]);
        let rows = scorer.score_snapshot(&snapshot);
        assert!(rows.iter().all(|r| r.district == "Gulu"));

        let mut open = ScoringConfig::default();
        open.districts.clear();
        let scorer = CropScorer::new(open).unwrap();
        let rows = scorer.score_snapshot(&snapshot);
        assert!(rows.iter().any(|r| r.district == "Jinja"));
    }

    #[test]
    fn test_crop_temperature_curve_override() {
        let scorer = CropScorer::new(ScoringConfig::default()).unwrap();
        let mut hot = weather("Gulu");
        hot.temperature = Some(30.0);
        let snapshot = FeedSnapshot::new(vec![hot], vec![], vec![]);

        let rows = scorer.score_snapshot(&snapshot);
        let cassava = rows.iter().find(|r| r.crop == "Cassava").unwrap();
        let coffee = rows.iter().find(|r| r.crop == "Coffee").unwrap();
        assert!(cassava.weather_score > coffee.weather_score);
        assert_eq!(coffee.category, scorer.composite.categorize(coffee.overall_score));
        assert_eq!(cassava.rank, 1);
        assert_ne!(coffee.category, Category::HighlyRecommended);
    }

    #[test]
    fn test_empty_snapshot() {
        let scorer = CropScorer::new(ScoringConfig::default()).unwrap();
        assert!(scorer.score_snapshot(&FeedSnapshot::default()).is_empty());
        assert!(scorer.score_snapshot_parallel(&FeedSnapshot::default()).is_empty());
    }
}
