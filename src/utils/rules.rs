//! Ordered Rule Evaluator
//!
//! Threshold cascades (vegetation health, rainfall bucket, price trend,
//! recommendation category) are expressed as an ordered list of
//! `(bound, label)` pairs. The first rule whose bound matches wins.
//!
//! Two cascade shapes are accepted:
//! - ascending `below` thresholds, evaluated lowest first
//!   (`ndvi < 0.2 → Bare`, `ndvi < 0.5 → Sparse`, ...)
//! - descending `at_least` thresholds, evaluated highest first
//!   (`score >= 8 → Highly Recommended`, ...)
//!
//! Both must end with a single catch-all `any` rule.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Predicate half of a rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    /// value < threshold (exclusive upper bound)
    Below(f64),
    /// value >= threshold (inclusive lower bound)
    AtLeast(f64),
    /// Always matches
    Any,
}

impl Bound {
    pub fn matches(&self, value: f64) -> bool {
        match *self {
            Bound::Below(threshold) => value < threshold,
            Bound::AtLeast(threshold) => value >= threshold,
            Bound::Any => true,
        }
    }
}

/// A single `(bound, label)` pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule<L> {
    pub when: Bound,
    pub then: L,
}

impl<L> Rule<L> {
    pub fn below(threshold: f64, then: L) -> Self {
        Self { when: Bound::Below(threshold), then }
    }

    pub fn at_least(threshold: f64, then: L) -> Self {
        Self { when: Bound::AtLeast(threshold), then }
    }

    pub fn otherwise(then: L) -> Self {
        Self { when: Bound::Any, then }
    }
}

/// Ordered list of rules, first match wins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleCascade<L> {
    rules: Vec<Rule<L>>,
}

impl<L> RuleCascade<L> {
    pub fn new(rules: Vec<Rule<L>>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule<L>] {
        &self.rules
    }

    /// Label of the first matching rule
    ///
    /// Only `None` for a cascade that failed `validate` (no catch-all).
    pub fn classify(&self, value: f64) -> Option<&L> {
        self.rules
            .iter()
            .find(|rule| rule.when.matches(value))
            .map(|rule| &rule.then)
    }

    /// Check the cascade shape described in the module docs
    pub fn validate(&self, table: &str) -> Result<(), ConfigError> {
        let malformed = |reason: String| ConfigError::MalformedRules {
            table: table.to_string(),
            reason,
        };

        let Some((last, thresholds)) = self.rules.split_last() else {
            return Err(malformed("no rules".to_string()));
        };

        if last.when != Bound::Any {
            return Err(malformed("last rule must be a catch-all 'any'".to_string()));
        }

        let mut previous: Option<Bound> = None;
        for (idx, rule) in thresholds.iter().enumerate() {
            let ordered = match (previous, rule.when) {
                (_, Bound::Any) => {
                    return Err(malformed(format!(
                        "rule {} is a catch-all before the end of the table",
                        idx
                    )));
                }
                (_, Bound::Below(t)) | (_, Bound::AtLeast(t)) if !t.is_finite() => {
                    return Err(malformed(format!("rule {} has a non-finite threshold", idx)));
                }
                (None, _) => true,
                (Some(Bound::Below(prev)), Bound::Below(t)) => t > prev,
                (Some(Bound::AtLeast(prev)), Bound::AtLeast(t)) => t < prev,
                _ => {
                    return Err(malformed(format!(
                        "rule {} mixes 'below' and 'at_least' thresholds",
                        idx
                    )));
                }
            };

            if !ordered {
                return Err(malformed(format!(
                    "rule {} threshold is out of order (below: ascending, at_least: descending)",
                    idx
                )));
            }
            previous = Some(rule.when);
        }

        Ok(())
    }
}
