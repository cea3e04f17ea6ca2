//! DataFrame column helpers with validation
//!
//! Feed frames arrive with whatever dtypes CSV inference picked (an
//! all-integer price column comes back as i64, an all-null column as str).
//! These helpers check the expected columns are present and hand back owned,
//! casted chunked arrays. Text that does not parse as a number is rejected
//! rather than read as a missing value.

use anyhow::{anyhow, Context, Result};
use polars::prelude::*;
use std::collections::HashSet;

/// Check every required column is present in `df`
///
/// # Errors
/// Names the first missing column along with the available ones, prefixed
/// with `context` (e.g., "weather feed").
pub fn require_columns(df: &DataFrame, columns: &[&str], context: &str) -> Result<()> {
    let actual_cols: HashSet<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    for &expected in columns {
        if !actual_cols.contains(expected) {
            let mut available: Vec<&String> = actual_cols.iter().collect();
            available.sort();
            return Err(anyhow!(
                "{}: Missing expected column '{}'. Available columns: {:?}",
                context,
                expected,
                available
            ));
        }
    }

    Ok(())
}

/// Column as strings, whatever its stored dtype
pub fn string_column(df: &DataFrame, name: &str, context: &str) -> Result<StringChunked> {
    let column = df
        .column(name)
        .with_context(|| format!("{}: Missing {} column", context, name))?
        .cast(&DataType::String)
        .with_context(|| format!("{}: Column '{}' cannot be read as text", context, name))?;

    Ok(column.str()?.clone())
}

/// Column as f64; null cells stay null
///
/// # Errors
/// A non-null cell that does not parse as a number is an error naming the
/// row and the raw text. Only genuinely empty cells become missing values.
pub fn float_column(df: &DataFrame, name: &str, context: &str) -> Result<Float64Chunked> {
    let source = df
        .column(name)
        .with_context(|| format!("{}: Missing {} column", context, name))?;
    let values = source
        .cast(&DataType::Float64)
        .with_context(|| format!("{}: Column '{}' is not numeric", context, name))?
        .f64()?
        .clone();

    if values.null_count() > source.null_count() {
        let raw = string_column(df, name, context)?;
        let bad_row = (0..values.len()).find(|&idx| values.get(idx).is_none() && raw.get(idx).is_some());
        if let Some(idx) = bad_row {
            return Err(anyhow!(
                "{}: Column '{}' row {}: '{}' is not a number",
                context,
                name,
                idx,
                raw.get(idx).unwrap_or_default()
            ));
        }
    }

    Ok(values)
}
