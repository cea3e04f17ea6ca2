//! Output materialization
//!
//! Turns scored rows into the shapes the presentation layer consumes: a
//! polars `DataFrame` (one row per district and crop), a CSV file, and JSON.
//! Enum fields are written as their display labels in the frame and CSV, and
//! as snake_case identifiers in JSON.

use anyhow::{Context, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

use crate::recommendation::CropSuitabilityScore;

/// Separator between data-quality notes in a single cell
pub const NOTE_SEPARATOR: &str = "; ";

/// Column order of the materialized frame
pub const OUTPUT_COLUMNS: [&str; 22] = [
    "district",
    "crop",
    "rank",
    "overall_score",
    "overall_score_display",
    "category",
    "weather_score",
    "vegetation_score",
    "market_score",
    "weather_status",
    "vegetation_status",
    "market_status",
    "data_quality_flag",
    "data_quality_notes",
    "temperature_celsius",
    "rainfall_category",
    "vegetation_health",
    "soil_moisture_pct",
    "ndvi_change",
    "price_current",
    "price_change_pct",
    "price_trend",
];

fn status_label(status: crate::normalize::DimensionStatus) -> &'static str {
    use crate::normalize::DimensionStatus::*;
    match status {
        Measured => "measured",
        Missing => "missing",
        Invalid => "invalid",
    }
}

/// Build a `DataFrame` with one row per score, in the given order
pub fn to_dataframe(rows: &[CropSuitabilityScore]) -> Result<DataFrame> {
    let notes: Vec<Option<String>> = rows
        .iter()
        .map(|r| {
            (!r.data_quality_notes.is_empty()).then(|| {
                r.data_quality_notes
                    .iter()
                    .map(|issue| issue.to_string())
                    .collect::<Vec<_>>()
                    .join(NOTE_SEPARATOR)
            })
        })
        .collect();

    let df = df! {
        "district" => rows.iter().map(|r| r.district.as_str()).collect::<Vec<_>>(),
        "crop" => rows.iter().map(|r| r.crop.as_str()).collect::<Vec<_>>(),
        "rank" => rows.iter().map(|r| r.rank).collect::<Vec<u32>>(),
        "overall_score" => rows.iter().map(|r| r.overall_score).collect::<Vec<f64>>(),
        "overall_score_display" => rows.iter().map(|r| r.overall_score_display).collect::<Vec<f64>>(),
        "category" => rows.iter().map(|r| r.category.display_text()).collect::<Vec<_>>(),
        "weather_score" => rows.iter().map(|r| r.weather_score).collect::<Vec<f64>>(),
        "vegetation_score" => rows.iter().map(|r| r.vegetation_score).collect::<Vec<f64>>(),
        "market_score" => rows.iter().map(|r| r.market_score).collect::<Vec<f64>>(),
        "weather_status" => rows.iter().map(|r| status_label(r.weather_status)).collect::<Vec<_>>(),
        "vegetation_status" => rows.iter().map(|r| status_label(r.vegetation_status)).collect::<Vec<_>>(),
        "market_status" => rows.iter().map(|r| status_label(r.market_status)).collect::<Vec<_>>(),
        "data_quality_flag" => rows.iter().map(|r| r.data_quality_flag).collect::<Vec<bool>>(),
        "data_quality_notes" => notes,
        "temperature_celsius" => rows.iter().map(|r| r.temperature_celsius).collect::<Vec<Option<f64>>>(),
        "rainfall_category" => rows.iter().map(|r| r.rainfall_bucket.map(|b| b.display_text())).collect::<Vec<_>>(),
        "vegetation_health" => rows.iter().map(|r| r.vegetation_health.map(|h| h.display_text())).collect::<Vec<_>>(),
        "soil_moisture_pct" => rows.iter().map(|r| r.soil_moisture_pct).collect::<Vec<Option<f64>>>(),
        "ndvi_change" => rows.iter().map(|r| r.ndvi_change).collect::<Vec<Option<f64>>>(),
        "price_current" => rows.iter().map(|r| r.price_current).collect::<Vec<Option<f64>>>(),
        "price_change_pct" => rows.iter().map(|r| r.price_change_pct).collect::<Vec<Option<f64>>>(),
        "price_trend" => rows.iter().map(|r| r.price_trend.display_text()).collect::<Vec<_>>(),
    }
    .with_context(|| "Failed to build recommendations DataFrame")?;

    Ok(df)
}

/// Write the materialized frame to a CSV file with a header row
pub fn write_csv(rows: &[CropSuitabilityScore], path: &Path) -> Result<()> {
    let mut df = to_dataframe(rows)?;
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create output CSV: {}", path.display()))?;

    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("Failed to write output CSV: {}", path.display()))?;

    tracing::info!(rows = rows.len(), path = %path.display(), "Recommendations written");
    Ok(())
}

/// JSON formatter for recommendation rows
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format rows as pretty-printed JSON
    pub fn format(rows: &[CropSuitabilityScore]) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(rows)
    }

    /// Format rows as compact JSON (no whitespace)
    pub fn format_compact(rows: &[CropSuitabilityScore]) -> Result<String, serde_json::Error> {
        serde_json::to_string(rows)
    }
}
