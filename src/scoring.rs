//! Lexical overlap scoring and score fusion.

use std::collections::HashSet;

use crate::error::{Error, Result};

/// Default weight for the semantic side of the fusion (semantic-dominant).
pub const DEFAULT_SEMANTIC_WEIGHT: f64 = 0.7;

/// Fixed boost applied to raw overlap. Partial-overlap scores otherwise
/// cluster too low relative to human judgments of a good match; the
/// boost plus the clamp at 100 define the full nonlinearity.
const OVERLAP_BOOST: f64 = 1.2;

/// Keyword-overlap score in `[0, 100]`.
///
/// An empty target can never be matched and scores 0. Otherwise:
/// `min(100, |target ∩ candidate| / |target| * 100 * 1.2)`.
pub fn keyword_score(target: &HashSet<String>, candidate: &HashSet<String>) -> f64 {
    if target.is_empty() {
        return 0.0;
    }
    let overlap = target.intersection(candidate).count() as f64 / target.len() as f64;
    (overlap * 100.0 * OVERLAP_BOOST).min(100.0)
}

/// Blend lexical and semantic scores: `lexical*(1-w) + semantic*w`.
///
/// `weight` must lie in `[0, 1]`; out-of-range values are rejected with
/// [`Error::InvalidWeight`] rather than clamped.
pub fn fuse(lexical: f64, semantic: f64, weight: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&weight) {
        return Err(Error::InvalidWeight(weight));
    }
    Ok(lexical * (1.0 - weight) + semantic * weight)
}
