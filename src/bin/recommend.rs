// Recommendation runner
//
// Purpose: Score one feed snapshot and report per-district rankings
// Usage: FEED_DIR=data cargo run --release --bin recommend

use anyhow::Context;
use planting_advisor::{load_snapshot, write_csv, CropScorer, CropSuitabilityScore, ScoringConfig};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    // Default log level: info for our crate, warn for others
                    "planting_advisor=info,recommend=info,warn".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Configuration from environment variables
    let feed_dir = PathBuf::from(std::env::var("FEED_DIR").unwrap_or_else(|_| "data".to_string()));
    let config_path = std::env::var("SCORING_CONFIG").ok().map(PathBuf::from);
    let output_csv = std::env::var("OUTPUT_CSV").ok().map(PathBuf::from);
    let parallel = std::env::var("PARALLEL")
        .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
        .unwrap_or(true);

    tracing::info!("Configuration:");
    tracing::info!("  FEED_DIR: {}", feed_dir.display());
    tracing::info!(
        "  SCORING_CONFIG: {}",
        config_path.as_ref().map_or("<built-in>".to_string(), |p| p.display().to_string())
    );
    tracing::info!("  PARALLEL: {}", parallel);

    let config = match &config_path {
        Some(path) => ScoringConfig::load(path)?,
        None => ScoringConfig::default(),
    };
    let scorer = CropScorer::new(config).context("Invalid scoring configuration")?;

    let snapshot = load_snapshot(&feed_dir)?;

    let start = Instant::now();
    let rows = if parallel {
        scorer.score_snapshot_parallel(&snapshot)
    } else {
        scorer.score_snapshot(&snapshot)
    };
    tracing::info!("Scored {} rows in {:.2?}", rows.len(), start.elapsed());

    log_district_summary(&rows);

    if let Some(path) = output_csv {
        write_csv(&rows, &path)?;
    }

    Ok(())
}

fn log_district_summary(rows: &[CropSuitabilityScore]) {
    let mut by_district: BTreeMap<&str, Vec<&CropSuitabilityScore>> = BTreeMap::new();
    for row in rows {
        by_district.entry(row.district.as_str()).or_default().push(row);
    }

    for (district, district_rows) in by_district {
        let top: Vec<String> = district_rows
            .iter()
            .filter(|r| r.rank == 1)
            .map(|r| r.crop.clone())
            .collect();
        let best = district_rows.first().map_or(0.0, |r| r.overall_score_display);
        let flagged = district_rows.iter().filter(|r| r.data_quality_flag).count();

        tracing::info!(
            "{}: {} crops, top {} ({:.1}, {}), {} flagged",
            district,
            district_rows.len(),
            top.join(" / "),
            best,
            district_rows[0].category.display_text(),
            flagged
        );
    }
}
