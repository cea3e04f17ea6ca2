//! Normalization Utilities
//!
//! Maps raw measurements onto the 0-10 suitability scale. Curves are
//! piecewise-linear: find the bracketing points, interpolate, and hold the
//! end values flat outside the covered range.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 10.0;

/// A single `(x, score)` knot of a curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub x: f64,
    pub score: f64,
}

impl CurvePoint {
    pub const fn new(x: f64, score: f64) -> Self {
        Self { x, score }
    }
}

/// Piecewise-linear curve over sorted knots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreCurve {
    points: Vec<CurvePoint>,
}

impl ScoreCurve {
    pub fn new(points: Vec<CurvePoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    /// Require ≥2 finite knots, strictly ascending x, scores in [0, 10]
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let malformed = |reason: String| ConfigError::MalformedCurve {
            curve: name.to_string(),
            reason,
        };

        if self.points.len() < 2 {
            return Err(malformed(format!(
                "needs at least 2 points, got {}",
                self.points.len()
            )));
        }

        for (idx, point) in self.points.iter().enumerate() {
            if !point.x.is_finite() || !point.score.is_finite() {
                return Err(malformed(format!("point {} is not finite", idx)));
            }
            if !(SCORE_MIN..=SCORE_MAX).contains(&point.score) {
                return Err(malformed(format!(
                    "point {} score {} outside [0, 10]",
                    idx, point.score
                )));
            }
        }

        if let Some(idx) = self.points.windows(2).position(|w| w[1].x <= w[0].x) {
            return Err(malformed(format!(
                "x values must be strictly ascending (points {} and {})",
                idx,
                idx + 1
            )));
        }

        Ok(())
    }

    /// Interpolated score at `x`
    ///
    /// Algorithm:
    /// 1. Below the first knot / above the last knot: hold the end score
    /// 2. Find bracketing knots [xi, xi+1] with xi <= x <= xi+1
    /// 3. score = si + fraction × (si+1 - si)
    pub fn evaluate(&self, x: f64) -> f64 {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return (SCORE_MIN + SCORE_MAX) / 2.0;
        };

        if x <= first.x {
            return first.score;
        }
        if x >= last.x {
            return last.score;
        }

        for pair in self.points.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if lo.x <= x && x <= hi.x {
                return linear_scale(x, lo.x, hi.x, lo.score, hi.score);
            }
        }

        // Unreachable for validated curves
        last.score
    }
}

/// Map `x` linearly from [x0, x1] to [y0, y1] (no clamping)
pub fn linear_scale(x: f64, x0: f64, x1: f64, y0: f64, y1: f64) -> f64 {
    let span = x1 - x0;
    let fraction = if span > 0.0 { (x - x0) / span } else { 0.0 };
    y0 + fraction * (y1 - y0)
}

/// Clamp into [0, 10]; NaN collapses to the lower bound
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        return SCORE_MIN;
    }
    value.clamp(SCORE_MIN, SCORE_MAX)
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
