//! Ranker
//!
//! Orders the crops of one district and assigns dense ranks.
//!
//! Total order over the composite key:
//!   1. overall score, descending
//!   2. market score, descending
//!   3. crop name, ascending
//!
//! One linear pass over the sorted rows then assigns ranks. The rank grows
//! by one whenever the (overall, market) pair changes, so exact ties share a
//! rank and the next distinct score follows without a gap. The crop name
//! only fixes the row order inside a tie.

use std::cmp::Ordering;

/// Composite ranking key of one row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankKey<'a> {
    pub overall: f64,
    pub market: f64,
    pub crop: &'a str,
}

impl<'a> RankKey<'a> {
    /// Total order: best row first
    pub fn compare(&self, other: &RankKey<'_>) -> Ordering {
        other
            .overall
            .total_cmp(&self.overall)
            .then_with(|| other.market.total_cmp(&self.market))
            .then_with(|| self.crop.cmp(other.crop))
    }

    /// Whether two rows share a rank
    pub fn ties_with(&self, other: &RankKey<'_>) -> bool {
        self.overall.total_cmp(&other.overall) == Ordering::Equal
            && self.market.total_cmp(&other.market) == Ordering::Equal
    }
}

/// Sort `rows` best-first and write dense ranks starting at 1
///
/// Must run on the complete row set of a single district.
pub fn rank_dense<T>(
    rows: &mut [T],
    key: impl for<'r> Fn(&'r T) -> RankKey<'r>,
    mut set_rank: impl FnMut(&mut T, u32),
) {
    rows.sort_by(|a, b| key(a).compare(&key(b)));

    let mut rank = 0u32;
    for idx in 0..rows.len() {
        let starts_new_rank = idx == 0 || !key(&rows[idx - 1]).ties_with(&key(&rows[idx]));
        if starts_new_rank {
            rank += 1;
        }
        set_rank(&mut rows[idx], rank);
    }
}
