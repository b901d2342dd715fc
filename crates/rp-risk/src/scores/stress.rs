//! Market stress: concurrency of extremes.
//!
//! Each component is taken from the worst asset in the basket, so one asset
//! in crisis surfaces even when the rest is calm. This score deliberately
//! does not reuse any other sub-score.

use super::bound;
use crate::config::ScoreCalibration;
use crate::normalizer::{NormalizedDataset, NormalizedSeries};

/// Extremes observed for a single asset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StressComponents {
    /// Largest single-step absolute return.
    pub max_move: f64,
    /// Sign reversals between consecutive returns per sample in the window.
    pub reversal_rate: f64,
    /// Largest `volume_i / volume_{i-1}`.
    pub max_vol_spike: f64,
}

impl StressComponents {
    pub fn of(series: &NormalizedSeries) -> Self {
        let max_move = series.returns.iter().fold(0.0_f64, |acc, r| acc.max(r.abs()));

        let reversals = series
            .returns
            .windows(2)
            .filter(|w| w[0] * w[1] < 0.0)
            .count();
        let reversal_rate = if series.prices.is_empty() {
            0.0
        } else {
            reversals as f64 / series.prices.len() as f64
        };

        let max_vol_spike = series
            .volumes
            .windows(2)
            .map(|w| w[1] / w[0])
            .fold(0.0_f64, f64::max);

        Self {
            max_move,
            reversal_rate,
            max_vol_spike,
        }
    }

    /// Component-wise maximum.
    pub fn worst(self, other: Self) -> Self {
        Self {
            max_move: self.max_move.max(other.max_move),
            reversal_rate: self.reversal_rate.max(other.reversal_rate),
            max_vol_spike: self.max_vol_spike.max(other.max_vol_spike),
        }
    }
}

/// Worst-offender components across the basket.
pub fn basket_components(data: &NormalizedDataset) -> StressComponents {
    data.series()
        .iter()
        .map(StressComponents::of)
        .fold(StressComponents::default(), StressComponents::worst)
}

pub fn score(data: &NormalizedDataset, calibration: &ScoreCalibration) -> f64 {
    let c = basket_components(data);
    bound(
        c.max_move * calibration.stress_move_scale
            + c.reversal_rate * calibration.stress_reversal_scale
            + (c.max_vol_spike - 1.0).max(0.0) * calibration.stress_volume_scale,
    )
}
