//! Composite combiner.

use crate::config::ScoreWeights;
use crate::scores::{bound, SubScores};

/// Weighted sum of the five sub-scores.
///
/// With validated weights (non-negative, summing to one) and sub-scores in
/// range, the result is already in `[0, 100]`; the final clamp only absorbs
/// rounding at the edges.
pub fn combine(scores: &SubScores, weights: &ScoreWeights) -> f64 {
    bound(
        weights.volatility * scores.volatility
            + weights.trend * scores.trend
            + weights.volume * scores.volume
            + weights.correlation * scores.correlation
            + weights.market_stress * scores.market_stress,
    )
}
