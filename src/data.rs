//! Feed snapshot loading
//!
//! Reads the three feed tables exported by the ingest adapters using Polars
//! and converts them into typed observation rows.
//!
//! Directory layout:
//!   weather.csv     district, timestamp, temperature, humidity, rainfall, condition
//!   vegetation.csv  district, timestamp, ndvi_value, ndvi_prior, soil_moisture_pct
//!   prices.csv      district, crop, timestamp, price_current, price_prior
//!
//! Null cells become missing values. Rows without a district, crop or
//! timestamp cannot take part in latest-wins selection and are skipped with a
//! warning. A timestamp or a numeric cell that does not parse is an error.

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::path::Path;

use crate::observations::{FeedSnapshot, PriceObservation, VegetationObservation, WeatherObservation};
use crate::utils::frames::{float_column, require_columns, string_column};

pub const WEATHER_FILE: &str = "weather.csv";
pub const VEGETATION_FILE: &str = "vegetation.csv";
pub const PRICES_FILE: &str = "prices.csv";

pub const WEATHER_COLUMNS: [&str; 6] = ["district", "timestamp", "temperature", "humidity", "rainfall", "condition"];
pub const VEGETATION_COLUMNS: [&str; 5] = ["district", "timestamp", "ndvi_value", "ndvi_prior", "soil_moisture_pct"];
pub const PRICE_COLUMNS: [&str; 5] = ["district", "crop", "timestamp", "price_current", "price_prior"];

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Load all three feeds from `dir`
pub fn load_snapshot(dir: &Path) -> Result<FeedSnapshot> {
    tracing::info!(dir = %dir.display(), "Loading feed snapshot");

    let weather = weather_from_frame(&read_csv(&dir.join(WEATHER_FILE))?)?;
    let vegetation = vegetation_from_frame(&read_csv(&dir.join(VEGETATION_FILE))?)?;
    let prices = prices_from_frame(&read_csv(&dir.join(PRICES_FILE))?)?;

    tracing::info!(
        weather = weather.len(),
        vegetation = vegetation.len(),
        prices = prices.len(),
        "Feed snapshot loaded"
    );

    Ok(FeedSnapshot::new(weather, vegetation, prices))
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to create CSV reader: {}", path.display()))?
        .finish()
        .with_context(|| format!("Failed to load feed CSV: {}", path.display()))
}

/// Parse an ISO-8601 feed timestamp
///
/// Accepts a `T` or space separator, optional fractional seconds, and bare
/// dates (midnight).
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(ts);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| anyhow!("Unrecognized timestamp '{}'", raw))
}

/// District and timestamp of row `idx`, or `None` when either is null
fn row_key(
    district: &StringChunked,
    timestamp: &StringChunked,
    idx: usize,
    context: &str,
) -> Result<Option<(String, NaiveDateTime)>> {
    let (Some(name), Some(raw_ts)) = (district.get(idx), timestamp.get(idx)) else {
        tracing::warn!(feed = context, row = idx, "Row without district or timestamp skipped");
        return Ok(None);
    };
    let ts = parse_timestamp(raw_ts).with_context(|| format!("{}: row {}", context, idx))?;
    Ok(Some((name.trim().to_string(), ts)))
}

/// Convert a weather frame into observations
pub fn weather_from_frame(df: &DataFrame) -> Result<Vec<WeatherObservation>> {
    let context = "weather feed";
    require_columns(df, &WEATHER_COLUMNS, context)?;

    let district = string_column(df, "district", context)?;
    let timestamp = string_column(df, "timestamp", context)?;
    let temperature = float_column(df, "temperature", context)?;
    let humidity = float_column(df, "humidity", context)?;
    let rainfall = float_column(df, "rainfall", context)?;
    let condition = string_column(df, "condition", context)?;

    let mut rows = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let Some((district, timestamp)) = row_key(&district, &timestamp, idx, context)? else {
            continue;
        };
        rows.push(WeatherObservation {
            district,
            timestamp,
            temperature: temperature.get(idx),
            humidity: humidity.get(idx),
            rainfall: rainfall.get(idx),
            condition: condition.get(idx).map(|c| c.to_string()),
        });
    }

    Ok(rows)
}

/// Convert a vegetation frame into observations
pub fn vegetation_from_frame(df: &DataFrame) -> Result<Vec<VegetationObservation>> {
    let context = "vegetation feed";
    require_columns(df, &VEGETATION_COLUMNS, context)?;

    let district = string_column(df, "district", context)?;
    let timestamp = string_column(df, "timestamp", context)?;
    let ndvi_value = float_column(df, "ndvi_value", context)?;
    let ndvi_prior = float_column(df, "ndvi_prior", context)?;
    let soil_moisture = float_column(df, "soil_moisture_pct", context)?;

    let mut rows = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let Some((district, timestamp)) = row_key(&district, &timestamp, idx, context)? else {
            continue;
        };
        rows.push(VegetationObservation {
            district,
            timestamp,
            ndvi_value: ndvi_value.get(idx),
            ndvi_prior: ndvi_prior.get(idx),
            soil_moisture_pct: soil_moisture.get(idx),
        });
    }

    Ok(rows)
}

/// Convert a price frame into observations
pub fn prices_from_frame(df: &DataFrame) -> Result<Vec<PriceObservation>> {
    let context = "price feed";
    require_columns(df, &PRICE_COLUMNS, context)?;

    let district = string_column(df, "district", context)?;
    let crop = string_column(df, "crop", context)?;
    let timestamp = string_column(df, "timestamp", context)?;
    let price_current = float_column(df, "price_current", context)?;
    let price_prior = float_column(df, "price_prior", context)?;

    let mut rows = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let Some((district, timestamp)) = row_key(&district, &timestamp, idx, context)? else {
            continue;
        };
        let Some(crop) = crop.get(idx) else {
            tracing::warn!(feed = context, row = idx, "Price row without crop skipped");
            continue;
        };
        rows.push(PriceObservation {
            district,
            crop: crop.trim().to_string(),
            timestamp,
            price_current: price_current.get(idx),
            price_prior: price_prior.get(idx),
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_timestamp_variants() {
        let t = parse_timestamp("2024-03-01T08:00:00").unwrap();
        assert_eq!(t.hour(), 8);

        let spaced = parse_timestamp("2024-03-01 08:00:00").unwrap();
        assert_eq!(spaced, t);

        let fractional = parse_timestamp("2024-03-01T08:00:00.250").unwrap();
        assert!(fractional > t);

        let date_only = parse_timestamp("2024-03-01").unwrap();
        assert_eq!(date_only.hour(), 0);

        assert!(parse_timestamp("01/03/2024").is_err());
    }

    #[test]
    fn test_weather_from_frame() {
        let df = df![
            "district" => &["Kampala", "Gulu"],
            "timestamp" => &["2024-03-01T08:00:00", "2024-03-01T09:00:00"],
            "temperature" => &[Some(24.5), None],
            "humidity" => &[Some(70.0), Some(55.0)],
            "rainfall" => &[Some(0.4), Some(0.0)],
            "condition" => &[Some("Clouds"), None],
        ]
        .unwrap();

        let rows = weather_from_frame(&df).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].district, "Kampala");
        assert_eq!(rows[0].temperature, Some(24.5));
        assert_eq!(rows[0].condition.as_deref(), Some("Clouds"));
        assert_eq!(rows[1].temperature, None);
        assert_eq!(rows[1].condition, None);
    }

    #[test]
    fn test_vegetation_from_frame() {
        let df = df![
            "district" => &["Mbale"],
            "timestamp" => &["2024-03-01 06:00:00"],
            "ndvi_value" => &[0.62],
            "ndvi_prior" => &[0.58],
            "soil_moisture_pct" => &[31.0],
        ]
        .unwrap();

        let rows = vegetation_from_frame(&df).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ndvi_value, Some(0.62));
        assert!((rows[0].ndvi_change().unwrap() - 0.04).abs() < 1e-9);
    }

    #[test]
    fn test_prices_from_integer_columns() {
        let df = df![
            "district" => &["Kampala", "Kampala"],
            "crop" => &["Maize", "Beans"],
            "timestamp" => &["2024-03-01T06:00:00", "2024-03-01T06:00:00"],
            "price_current" => &[1200i64, 3000],
            "price_prior" => &[0i64, 2900],
        ]
        .unwrap();

        let rows = prices_from_frame(&df).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].price_current, Some(1200.0));
        assert_eq!(rows[0].price_prior, Some(0.0));
        assert_eq!(rows[0].price_change_pct(), None);
        assert_eq!(rows[1].crop, "Beans");
    }

    #[test]
    fn test_rows_without_key_are_skipped() {
        let df = df![
            "district" => &[Some("Kampala"), None],
            "crop" => &[None, Some("Maize")],
            "timestamp" => &["2024-03-01T06:00:00", "2024-03-01T06:00:00"],
            "price_current" => &[1200.0, 900.0],
            "price_prior" => &[1100.0, 950.0],
        ]
        .unwrap();

        assert!(prices_from_frame(&df).unwrap().is_empty());
    }

    #[test]
    fn test_garbage_price_cell_is_error() {
        let df = df![
            "district" => &["Kampala", "Kampala"],
            "crop" => &["Maize", "Beans"],
            "timestamp" => &["2024-03-01T08:00:00", "2024-03-01T08:00:00"],
            "price_current" => &[Some("1150"), Some("abc")],
            "price_prior" => &[None, Some("2000")],
        ]
        .unwrap();

        let err = format!("{:#}", prices_from_frame(&df).unwrap_err());
        assert!(err.contains("price_current"));
        assert!(err.contains("abc"));
    }

    #[test]
    fn test_missing_column_is_error() {
        let df = df![
            "district" => &["Kampala"],
            "timestamp" => &["2024-03-01T06:00:00"],
        ]
        .unwrap();

        let err = weather_from_frame(&df).unwrap_err().to_string();
        assert!(err.contains("temperature"));
    }

    #[test]
    fn test_bad_timestamp_is_error() {
        let df = df![
            "district" => &["Kampala"],
            "timestamp" => &["yesterday"],
            "ndvi_value" => &[0.5],
            "ndvi_prior" => &[0.5],
            "soil_moisture_pct" => &[30.0],
        ]
        .unwrap();

        let err = format!("{:#}", vegetation_from_frame(&df).unwrap_err());
        assert!(err.contains("yesterday"));
    }

    #[test]
    fn test_missing_directory_is_error() {
        let result = load_snapshot(Path::new("/nonexistent/feed/snapshot"));
        assert!(result.is_err());
    }
}
