//! Volume: mean per-asset coefficient of variation of traded volume.

use super::bound;
use crate::config::ScoreCalibration;
use crate::normalizer::NormalizedDataset;
use crate::stats;

pub fn score(data: &NormalizedDataset, calibration: &ScoreCalibration) -> f64 {
    let cvs: Vec<f64> = data
        .series()
        .iter()
        .map(|s| stats::coefficient_of_variation(&s.volumes))
        .collect();
    bound(stats::mean(&cvs) * calibration.volume_scale)
}
