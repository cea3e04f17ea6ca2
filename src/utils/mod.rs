//! Utility modules shared across the scoring pipeline
//!
//! - Normalization: Piecewise-linear curves and 0-10 scale helpers
//! - Rules: Ordered threshold cascades for classification tables
//! - Frames: DataFrame column validation and casting

pub mod normalization;
pub mod rules;
pub mod frames;

// Re-export commonly used types
pub use normalization::{clamp_score, linear_scale, round_to, CurvePoint, ScoreCurve};
pub use rules::{Bound, Rule, RuleCascade};
pub use frames::{float_column, require_columns, string_column};
