//! Scoring configuration.
//!
//! Every struct has a `Default` carrying the calibrated values and
//! deserializes with `#[serde(default)]`, so a JSON file only needs the keys
//! it overrides.

use rp_types::{config_error, Resolution, RiskResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tolerance for the weights-sum-to-one check.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Largest history a single symbol may request.
pub const MAX_LOOKBACK_BARS: usize = 100_000;

/// Weights applied to each sub-score by the composite combiner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub volatility: f64,
    pub trend: f64,
    pub volume: f64,
    pub correlation: f64,
    pub market_stress: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            volatility: 0.25,
            trend: 0.20,
            volume: 0.15,
            correlation: 0.20,
            market_stress: 0.20,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.volatility + self.trend + self.volume + self.correlation + self.market_stress
    }

    pub fn validate(&self) -> RiskResult<()> {
        let weights = [
            ("volatility", self.volatility),
            ("trend", self.trend),
            ("volume", self.volume),
            ("correlation", self.correlation),
            ("market_stress", self.market_stress),
        ];
        if let Some((name, w)) = weights.iter().find(|(_, w)| !w.is_finite() || *w < 0.0) {
            return Err(config_error!("weight '{}' must be finite and non-negative, got {}", name, w));
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(config_error!("weights must sum to 1.0, got {}", sum));
        }
        Ok(())
    }
}

/// Scaling constants mapping raw statistics onto the 0–100 score range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreCalibration {
    /// Multiplier on mean return standard deviation (0.10 ⇒ 100).
    pub volatility_scale: f64,
    /// Multiplier on mean `|slope_pct| * r2`.
    pub trend_scale: f64,
    /// Multiplier on mean volume coefficient of variation.
    pub volume_scale: f64,
    /// Mean pairwise correlation regarded as normal for a basket.
    pub correlation_baseline: f64,
    /// Multiplier on the distance from the correlation baseline.
    pub correlation_scale: f64,
    /// Multiplier on the largest single-step absolute return.
    pub stress_move_scale: f64,
    /// Multiplier on the return sign-reversal rate.
    pub stress_reversal_scale: f64,
    /// Multiplier on the volume spike ratio in excess of 1.
    pub stress_volume_scale: f64,
}

impl Default for ScoreCalibration {
    fn default() -> Self {
        Self {
            volatility_scale: 1000.0,
            trend_scale: 2000.0,
            volume_scale: 150.0,
            correlation_baseline: 0.3,
            correlation_scale: 140.0,
            stress_move_scale: 300.0,
            stress_reversal_scale: 40.0,
            stress_volume_scale: 30.0,
        }
    }
}

impl ScoreCalibration {
    pub fn validate(&self) -> RiskResult<()> {
        let scales = [
            ("volatility_scale", self.volatility_scale),
            ("trend_scale", self.trend_scale),
            ("volume_scale", self.volume_scale),
            ("correlation_scale", self.correlation_scale),
            ("stress_move_scale", self.stress_move_scale),
            ("stress_reversal_scale", self.stress_reversal_scale),
            ("stress_volume_scale", self.stress_volume_scale),
        ];
        if let Some((name, s)) = scales.iter().find(|(_, s)| !s.is_finite() || *s < 0.0) {
            return Err(config_error!("'{}' must be finite and non-negative, got {}", name, s));
        }
        if !(-1.0..=1.0).contains(&self.correlation_baseline) {
            return Err(config_error!(
                "correlation_baseline must lie in [-1, 1], got {}",
                self.correlation_baseline
            ));
        }
        Ok(())
    }
}

/// Composite boundaries for each risk level and the per-factor trigger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationThresholds {
    /// Lowest composite classified as Medium Risk.
    pub medium: f64,
    /// Lowest composite classified as High Risk.
    pub high: f64,
    /// Lowest composite classified as Critical Risk.
    pub critical: f64,
    /// A sub-score strictly above this emits its risk factor.
    pub factor_trigger: f64,
}

impl Default for ClassificationThresholds {
    fn default() -> Self {
        Self {
            medium: 35.0,
            high: 60.0,
            critical: 85.0,
            factor_trigger: 70.0,
        }
    }
}

impl ClassificationThresholds {
    pub fn validate(&self) -> RiskResult<()> {
        let ordered = 0.0 <= self.medium
            && self.medium <= self.high
            && self.high <= self.critical
            && self.critical <= 100.0;
        if !ordered {
            return Err(config_error!(
                "thresholds must satisfy 0 <= medium <= high <= critical <= 100, got {} / {} / {}",
                self.medium,
                self.high,
                self.critical
            ));
        }
        if !(0.0..=100.0).contains(&self.factor_trigger) {
            return Err(config_error!(
                "factor_trigger must lie in [0, 100], got {}",
                self.factor_trigger
            ));
        }
        Ok(())
    }
}

/// How the analyzer asks the market data collaborator for series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub resolution: Resolution,
    /// Samples requested per symbol.
    pub lookback_bars: usize,
    /// Upper bound on the whole basket fetch.
    pub fetch_timeout_ms: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::Day,
            lookback_bars: 30,
            fetch_timeout_ms: 10_000,
        }
    }
}

impl DataConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn validate(&self) -> RiskResult<()> {
        if self.lookback_bars < 2 {
            return Err(config_error!(
                "lookback_bars must be at least 2, got {}",
                self.lookback_bars
            ));
        }
        if self.lookback_bars > MAX_LOOKBACK_BARS {
            return Err(config_error!(
                "lookback_bars must be at most {}, got {}",
                MAX_LOOKBACK_BARS,
                self.lookback_bars
            ));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(config_error!("fetch_timeout_ms must be positive"));
        }
        Ok(())
    }
}

/// Top-level configuration for the risk engine and analyzer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskScoreConfig {
    pub weights: ScoreWeights,
    pub calibration: ScoreCalibration,
    pub thresholds: ClassificationThresholds,
    pub data: DataConfig,
}

impl RiskScoreConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> RiskResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| config_error!("failed to parse risk configuration: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> RiskResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| config_error!("failed to read {}: {}", path.display(), e))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> RiskResult<()> {
        self.weights.validate()?;
        self.calibration.validate()?;
        self.thresholds.validate()?;
        self.data.validate()
    }
}
