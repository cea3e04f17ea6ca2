//! WEATHER SUITABILITY
//!
//! score = temperature_curve(temperature) × rainfall_multiplier(bucket)
//!
//! The temperature curve is the crop's own curve when configured, otherwise
//! the shared one. A missing temperature contributes the neutral score, a
//! missing rainfall a multiplier of 1.0. With both missing the dimension is
//! missing.

use serde::{Deserialize, Serialize};

use super::DimensionScore;
use crate::config::WeatherConfig;
use crate::error::DataQualityIssue;
use crate::observations::WeatherObservation;
use crate::utils::normalization::ScoreCurve;

/// Rain-rate class (mm/hr)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RainfallBucket {
    NoRain,
    Light,
    Moderate,
    Heavy,
}

impl RainfallBucket {
    pub fn display_text(&self) -> &'static str {
        match self {
            RainfallBucket::NoRain => "No Rain",
            RainfallBucket::Light => "Light",
            RainfallBucket::Moderate => "Moderate",
            RainfallBucket::Heavy => "Heavy",
        }
    }
}

/// Result of the weather normalizer
#[derive(Debug, Clone)]
pub struct WeatherResult {
    pub score: DimensionScore,
    /// °C, passed through for presentation
    pub temperature: Option<f64>,
    pub rainfall_bucket: Option<RainfallBucket>,
}

/// Normalize the district's latest weather for one crop
pub fn score_weather(
    observation: Option<&WeatherObservation>,
    temperature_curve: &ScoreCurve,
    config: &WeatherConfig,
    neutral: f64,
) -> WeatherResult {
    let Some(obs) = observation else {
        return WeatherResult {
            score: DimensionScore::missing(neutral),
            temperature: None,
            rainfall_bucket: None,
        };
    };

    let rainfall_valid = obs.rainfall.map(|r| r.is_finite() && r >= 0.0);
    let rainfall_class = match (obs.rainfall, rainfall_valid) {
        (Some(r), Some(true)) => config.rainfall.classify(r).copied(),
        _ => None,
    };

    let result = |score| WeatherResult {
        score,
        temperature: obs.temperature.filter(|t| t.is_finite()),
        rainfall_bucket: rainfall_class.map(|c| c.bucket),
    };

    if let Some(t) = obs.temperature.filter(|t| !t.is_finite()) {
        return result(DimensionScore::invalid(
            neutral,
            DataQualityIssue::InvalidTemperature { value: t },
        ));
    }
    if let (Some(r), Some(false)) = (obs.rainfall, rainfall_valid) {
        return result(DimensionScore::invalid(
            neutral,
            DataQualityIssue::InvalidRainfall { value: r },
        ));
    }

    if obs.temperature.is_none() && rainfall_class.is_none() {
        return result(DimensionScore::missing(neutral));
    }

    let base = obs
        .temperature
        .map(|t| temperature_curve.evaluate(t))
        .unwrap_or(neutral);
    let multiplier = rainfall_class.map(|c| c.multiplier).unwrap_or(1.0);

    result(DimensionScore::measured(base * multiplier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::DimensionStatus;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn observation(temperature: Option<f64>, rainfall: Option<f64>) -> WeatherObservation {
        WeatherObservation {
            district: "Kampala".to_string(),
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            temperature,
            humidity: Some(65.0),
            rainfall,
            condition: Some("Rain".to_string()),
        }
    }

    fn run(temperature: Option<f64>, rainfall: Option<f64>) -> WeatherResult {
        let config = WeatherConfig::default();
        let obs = observation(temperature, rainfall);
        score_weather(Some(&obs), &config.temperature_curve, &config, 5.0)
    }

    #[test]
    fn test_optimal_temperature_light_rain() {
        let result = run(Some(25.0), Some(1.0));
        assert_relative_eq!(result.score.value, 10.0, epsilon = 1e-9);
        assert_eq!(result.rainfall_bucket, Some(RainfallBucket::Light));
        assert_eq!(result.score.status, DimensionStatus::Measured);
    }

    #[test]
    fn test_heavy_rain_reduces_score() {
        let result = run(Some(25.0), Some(12.0));
        assert_relative_eq!(result.score.value, 7.5, epsilon = 1e-9);
        assert_eq!(result.rainfall_bucket, Some(RainfallBucket::Heavy));
    }

    #[test]
    fn test_rainfall_bucket_boundaries() {
        assert_eq!(run(Some(25.0), Some(0.0)).rainfall_bucket, Some(RainfallBucket::NoRain));
        assert_eq!(run(Some(25.0), Some(0.1)).rainfall_bucket, Some(RainfallBucket::Light));
        assert_eq!(run(Some(25.0), Some(2.5)).rainfall_bucket, Some(RainfallBucket::Moderate));
        assert_eq!(run(Some(25.0), Some(7.6)).rainfall_bucket, Some(RainfallBucket::Heavy));
    }

    #[test]
    fn test_missing_inputs_default_to_neutral() {
        let config = WeatherConfig::default();
        let none = score_weather(None, &config.temperature_curve, &config, 5.0);
        assert_eq!(none.score.value, 5.0);
        assert_eq!(none.score.status, DimensionStatus::Missing);

        let both_missing = run(None, None);
        assert_eq!(both_missing.score.status, DimensionStatus::Missing);
        assert_eq!(both_missing.score.value, 5.0);

        // Rainfall alone scales the neutral base
        let rain_only = run(None, Some(12.0));
        assert_relative_eq!(rain_only.score.value, 3.75, epsilon = 1e-9);
        assert_eq!(rain_only.score.status, DimensionStatus::Measured);

        // Temperature alone keeps multiplier 1.0
        let temp_only = run(Some(25.0), None);
        assert_relative_eq!(temp_only.score.value, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_inputs_flagged() {
        let negative_rain = run(Some(25.0), Some(-3.0));
        assert_eq!(negative_rain.score.status, DimensionStatus::Invalid);
        assert_eq!(negative_rain.score.value, 5.0);
        assert_eq!(
            negative_rain.score.issue,
            Some(DataQualityIssue::InvalidRainfall { value: -3.0 })
        );

        let nan_temp = run(Some(f64::NAN), Some(1.0));
        assert_eq!(nan_temp.score.status, DimensionStatus::Invalid);
        assert_eq!(nan_temp.temperature, None);
    }

    #[test]
    fn test_always_within_scale() {
        for t in [-40.0, 0.0, 15.0, 30.0, 60.0] {
            for r in [0.0, 1.0, 5.0, 50.0] {
                let v = run(Some(t), Some(r)).score.value;
                assert!((0.0..=10.0).contains(&v), "t={} r={} → {}", t, r, v);
            }
        }
    }
}
