//! Trend: steepness of a least-squares price fit weighted by its r².
//!
//! Direction is ignored; a sustained fall scores the same as a sustained
//! rise of equal slope.

use super::bound;
use crate::config::ScoreCalibration;
use crate::normalizer::{NormalizedDataset, NormalizedSeries};
use crate::stats;

/// `|slope / mean_price| * r2` for one asset.
pub fn intensity(series: &NormalizedSeries) -> f64 {
    let Some(fit) = stats::linear_fit(&series.prices) else {
        return 0.0;
    };
    let mean_price = stats::mean(&series.prices);
    if mean_price <= 0.0 {
        return 0.0;
    }
    (fit.slope / mean_price).abs() * fit.r_squared
}

pub fn score(data: &NormalizedDataset, calibration: &ScoreCalibration) -> f64 {
    let intensities: Vec<f64> = data.series().iter().map(intensity).collect();
    bound(stats::mean(&intensities) * calibration.trend_scale)
}
