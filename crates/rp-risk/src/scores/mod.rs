//! The five sub-score calculators.
//!
//! Each calculator is a pure function of a [`NormalizedDataset`] and the
//! [`ScoreCalibration`], returning a score in `[0, MAX_SCORE]`. They share no
//! state and can run in any order or in parallel.

pub mod correlation;
pub mod stress;
pub mod trend;
pub mod volatility;
pub mod volume;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ScoreCalibration;
use crate::normalizer::NormalizedDataset;

/// Upper bound of every sub-score and of the composite.
pub const MAX_SCORE: f64 = 100.0;

/// Clamp a raw scaled statistic into the score range.
///
/// NaN only arises from numerically degenerate input and is scored as
/// maximal risk.
pub(crate) fn bound(raw: f64) -> f64 {
    if raw.is_nan() {
        return MAX_SCORE;
    }
    raw.clamp(0.0, MAX_SCORE)
}

/// Identifies one of the five risk dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubScoreKind {
    Volatility,
    Trend,
    Volume,
    Correlation,
    MarketStress,
}

impl SubScoreKind {
    pub const ALL: [SubScoreKind; 5] = [
        SubScoreKind::Volatility,
        SubScoreKind::Trend,
        SubScoreKind::Volume,
        SubScoreKind::Correlation,
        SubScoreKind::MarketStress,
    ];

    /// Run this calculator alone.
    pub fn compute(&self, data: &NormalizedDataset, calibration: &ScoreCalibration) -> f64 {
        match self {
            SubScoreKind::Volatility => volatility::score(data, calibration),
            SubScoreKind::Trend => trend::score(data, calibration),
            SubScoreKind::Volume => volume::score(data, calibration),
            SubScoreKind::Correlation => correlation::score(data, calibration),
            SubScoreKind::MarketStress => stress::score(data, calibration),
        }
    }
}

impl fmt::Display for SubScoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubScoreKind::Volatility => "Volatility",
            SubScoreKind::Trend => "Trend",
            SubScoreKind::Volume => "Volume",
            SubScoreKind::Correlation => "Correlation",
            SubScoreKind::MarketStress => "Market Stress",
        };
        write!(f, "{}", s)
    }
}

/// The five sub-scores of one assessment.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SubScores {
    pub volatility: f64,
    pub trend: f64,
    pub volume: f64,
    pub correlation: f64,
    pub market_stress: f64,
}

impl SubScores {
    pub fn new(volatility: f64, trend: f64, volume: f64, correlation: f64, market_stress: f64) -> Self {
        Self {
            volatility,
            trend,
            volume,
            correlation,
            market_stress,
        }
    }

    pub fn get(&self, kind: SubScoreKind) -> f64 {
        match kind {
            SubScoreKind::Volatility => self.volatility,
            SubScoreKind::Trend => self.trend,
            SubScoreKind::Volume => self.volume,
            SubScoreKind::Correlation => self.correlation,
            SubScoreKind::MarketStress => self.market_stress,
        }
    }

    /// `(kind, score)` pairs in [`SubScoreKind::ALL`] order.
    pub fn breakdown(&self) -> [(SubScoreKind, f64); 5] {
        SubScoreKind::ALL.map(|kind| (kind, self.get(kind)))
    }

    /// Compute all five scores, fanning the calculators out over the rayon
    /// pool and joining before returning.
    pub fn compute(data: &NormalizedDataset, calibration: &ScoreCalibration) -> Self {
        let ((volatility, trend), ((volume, correlation), market_stress)) = rayon::join(
            || {
                rayon::join(
                    || volatility::score(data, calibration),
                    || trend::score(data, calibration),
                )
            },
            || {
                rayon::join(
                    || {
                        rayon::join(
                            || volume::score(data, calibration),
                            || correlation::score(data, calibration),
                        )
                    },
                    || stress::score(data, calibration),
                )
            },
        );

        Self {
            volatility,
            trend,
            volume,
            correlation,
            market_stress,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn bound_clamps_and_handles_nan() {
        assert_eq!(bound(-3.0), 0.0);
        assert_eq!(bound(42.5), 42.5);
        assert_eq!(bound(1e9), MAX_SCORE);
        assert_eq!(bound(f64::INFINITY), MAX_SCORE);
        assert_eq!(bound(f64::NAN), MAX_SCORE);
    }

    #[test]
    fn parallel_compute_matches_individual_calculators() {
        let data = dataset(vec![
            series("ETH", &[2000.0, 2100.0, 2050.0, 2200.0, 2150.0], &[1000.0, 1100.0, 1050.0, 1200.0, 1150.0]),
            series("LINK", &[15.0, 16.0, 15.5, 17.0, 16.5], &[800.0, 850.0, 825.0, 900.0, 875.0]),
        ]);
        let calibration = ScoreCalibration::default();
        let scores = SubScores::compute(&data, &calibration);

        for (kind, value) in scores.breakdown() {
            assert_eq!(value.to_bits(), kind.compute(&data, &calibration).to_bits(), "{kind}");
        }
    }

    #[test]
    fn random_datasets_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(0x0bad_5eed);
        let calibration = ScoreCalibration::default();

        for _ in 0..200 {
            let assets = rng.random_range(1..5);
            let len = rng.random_range(2..40);
            let basket = (0..assets)
                .map(|a| {
                    let mut price: f64 = rng.random_range(0.01..50_000.0);
                    let mut prices = Vec::with_capacity(len);
                    let mut volumes = Vec::with_capacity(len);
                    for _ in 0..len {
                        prices.push(price);
                        volumes.push(rng.random_range(0.001..1e7));
                        price *= 1.0 + rng.random_range(-0.9..3.0);
                    }
                    series(&format!("A{a}"), &prices, &volumes)
                })
                .collect();
            let data = dataset(basket);

            for (kind, value) in SubScores::compute(&data, &calibration).breakdown() {
                assert!((0.0..=MAX_SCORE).contains(&value), "{kind} = {value}");
            }
        }
    }

    #[test]
    fn display_names() {
        assert_eq!(SubScoreKind::MarketStress.to_string(), "Market Stress");
        assert_eq!(SubScoreKind::Volatility.to_string(), "Volatility");
    }
}
