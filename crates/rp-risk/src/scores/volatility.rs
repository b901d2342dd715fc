//! Volatility: mean per-asset standard deviation of returns.

use super::bound;
use crate::config::ScoreCalibration;
use crate::normalizer::NormalizedDataset;
use crate::stats;

pub fn score(data: &NormalizedDataset, calibration: &ScoreCalibration) -> f64 {
    let sigmas: Vec<f64> = data
        .series()
        .iter()
        .map(|s| stats::std_dev(&s.returns))
        .collect();
    bound(stats::mean(&sigmas) * calibration.volatility_scale)
}
