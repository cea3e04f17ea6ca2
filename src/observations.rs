//! Raw feed rows and the per-run snapshot
//!
//! One run consumes a `FeedSnapshot`: three parallel tables of timestamped
//! observations as handed over by the feed adapters. Numeric fields are
//! `Option<f64>` because any cell may be missing upstream.

use chrono::NaiveDateTime;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::Hash;

/// Current conditions for a district
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub district: String,
    pub timestamp: NaiveDateTime,
    /// °C
    pub temperature: Option<f64>,
    /// %
    pub humidity: Option<f64>,
    /// mm/hr
    pub rainfall: Option<f64>,
    /// Qualitative condition ("Rain", "Clouds", ...)
    pub condition: Option<String>,
}

/// Satellite vegetation reading for a district
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VegetationObservation {
    pub district: String,
    pub timestamp: NaiveDateTime,
    /// NDVI, valid range -1..1
    pub ndvi_value: Option<f64>,
    /// NDVI N days prior
    pub ndvi_prior: Option<f64>,
    pub soil_moisture_pct: Option<f64>,
}

impl VegetationObservation {
    /// NDVI change against the prior reading
    pub fn ndvi_change(&self) -> Option<f64> {
        match (self.ndvi_value, self.ndvi_prior) {
            (Some(now), Some(prior)) if now.is_finite() && prior.is_finite() => Some(now - prior),
            _ => None,
        }
    }
}

/// Market price for a crop in a district
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub district: String,
    pub crop: String,
    pub timestamp: NaiveDateTime,
    /// currency/kg
    pub price_current: Option<f64>,
    /// currency/kg, N days prior
    pub price_prior: Option<f64>,
}

impl PriceObservation {
    /// (current - prior) / prior × 100
    ///
    /// `None` whenever either side is missing, non-finite, or the prior is
    /// not positive. Never divides by zero.
    pub fn price_change_pct(&self) -> Option<f64> {
        let current = self.price_current.filter(|v| v.is_finite())?;
        let prior = self.price_prior.filter(|v| v.is_finite() && *v > 0.0)?;
        Some((current - prior) / prior * 100.0)
    }
}

/// One run's input: the three raw tables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedSnapshot {
    pub weather: Vec<WeatherObservation>,
    pub vegetation: Vec<VegetationObservation>,
    pub prices: Vec<PriceObservation>,
}

/// Latest observations, grouped per district
#[derive(Debug, Default)]
pub struct DistrictInputs<'a> {
    pub weather: Option<&'a WeatherObservation>,
    pub vegetation: Option<&'a VegetationObservation>,
    /// crop → latest price row
    pub prices: BTreeMap<&'a str, &'a PriceObservation>,
}

impl<'a> DistrictInputs<'a> {
    pub fn is_empty(&self) -> bool {
        self.weather.is_none() && self.vegetation.is_none() && self.prices.is_empty()
    }
}

impl FeedSnapshot {
    pub fn new(
        weather: Vec<WeatherObservation>,
        vegetation: Vec<VegetationObservation>,
        prices: Vec<PriceObservation>,
    ) -> Self {
        Self { weather, vegetation, prices }
    }

    /// Reduce the snapshot to the latest row per key, grouped by district
    ///
    /// Districts come back in ascending name order, which fixes the output
    /// order of a run.
    pub fn latest_by_district(&self) -> BTreeMap<&str, DistrictInputs<'_>> {
        let mut districts: BTreeMap<&str, DistrictInputs<'_>> = BTreeMap::new();

        for (district, row) in latest_wins(&self.weather, |w| w.district.as_str(), |w| w.timestamp) {
            districts.entry(district).or_default().weather = Some(row);
        }

        for (district, row) in latest_wins(&self.vegetation, |v| v.district.as_str(), |v| v.timestamp) {
            districts.entry(district).or_default().vegetation = Some(row);
        }

        let prices = latest_wins(
            &self.prices,
            |p| (p.district.as_str(), p.crop.as_str()),
            |p| p.timestamp,
        );
        for ((district, crop), row) in prices {
            districts.entry(district).or_default().prices.insert(crop, row);
        }

        districts
    }
}

/// Keep the row with the greatest timestamp per key
///
/// On equal timestamps the row appearing later in `rows` wins.
fn latest_wins<'a, T, K, FK, FT>(rows: &'a [T], key: FK, timestamp: FT) -> FxHashMap<K, &'a T>
where
    K: Eq + Hash,
    FK: Fn(&'a T) -> K,
    FT: Fn(&T) -> NaiveDateTime,
{
    let mut latest: FxHashMap<K, &'a T> = FxHashMap::default();
    for row in rows {
        let replace = match latest.get(&key(row)) {
            Some(existing) => timestamp(row) >= timestamp(*existing),
            None => true,
        };
        if replace {
            latest.insert(key(row), row);
        }
    }
    latest
}
