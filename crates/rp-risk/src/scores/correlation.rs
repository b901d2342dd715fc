//! Correlation: distance of the mean pairwise return correlation from a
//! baseline.
//!
//! Both a breakdown (low or negative correlation) and contagion (everything
//! moving together) register as risk.

use super::bound;
use crate::config::ScoreCalibration;
use crate::normalizer::NormalizedDataset;
use crate::stats;

/// Mean Pearson correlation over all asset pairs where it is defined.
///
/// `None` for a single-asset basket or when no pair qualifies.
pub fn mean_pairwise(data: &NormalizedDataset) -> Option<f64> {
    let series = data.series();
    let mut correlations = Vec::new();
    for (i, a) in series.iter().enumerate() {
        for b in &series[i + 1..] {
            if let Some(rho) = stats::pearson(&a.returns, &b.returns) {
                correlations.push(rho);
            }
        }
    }
    if correlations.is_empty() {
        return None;
    }
    Some(stats::mean(&correlations))
}

pub fn score(data: &NormalizedDataset, calibration: &ScoreCalibration) -> f64 {
    match mean_pairwise(data) {
        Some(rho) => bound((rho - calibration.correlation_baseline).abs() * calibration.correlation_scale),
        None => 0.0,
    }
}
