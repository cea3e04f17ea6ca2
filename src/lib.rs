//! Planting Advisor
//!
//! Normalization and ranking engine for per-district crop planting
//! recommendations. Heterogeneous feeds (weather, satellite vegetation,
//! market prices) are normalized onto a shared 0-10 scale, combined into a
//! weighted composite, categorized and densely ranked per district.
//!
//! Module layout:
//! - `observations/`: Feed rows and latest-wins snapshot reduction
//! - `data/`: Snapshot loading with Polars
//! - `normalize/`: Weather, vegetation and market normalizers
//! - `composite/`: Weighted overall score and category
//! - `ranker/`: Deterministic dense ranking
//! - `scorer/`: Run coordinator (sequential and Rayon)
//! - `output/`: DataFrame, CSV and JSON materialization
//! - `config/`: Scoring configuration (weights, curves, thresholds, crops)

pub mod utils;
pub mod error;
pub mod config;
pub mod observations;
pub mod data;
pub mod normalize;
pub mod composite;
pub mod ranker;
pub mod recommendation;
pub mod scorer;
pub mod output;

// Re-export commonly used types
pub use config::{CropProfile, DimensionWeights, PriceRange, ScoringConfig};
pub use error::{ConfigError, DataQualityIssue};
pub use observations::{FeedSnapshot, PriceObservation, VegetationObservation, WeatherObservation};
pub use data::load_snapshot;
pub use normalize::{DimensionStatus, PriceTrend, RainfallBucket, VegetationHealth};
pub use composite::{Category, CompositeScorer, SubScores};
pub use ranker::{rank_dense, RankKey};
pub use recommendation::CropSuitabilityScore;
pub use scorer::CropScorer;
pub use output::{to_dataframe, write_csv, JsonFormatter};
