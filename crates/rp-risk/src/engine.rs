//! Synchronous scoring pipeline.
//!
//! [`RiskEngine`] is a stateless service value: fixed configuration plus
//! pure functions. Cloning it is cheap and any number of clones may score
//! different datasets concurrently.

use rp_types::{MarketDataset, RiskResult};
use tracing::debug;

use crate::classifier::{classify, Classification};
use crate::composite::combine;
use crate::config::RiskScoreConfig;
use crate::metrics::RiskMetrics;
use crate::normalizer::{normalize, NormalizedDataset};
use crate::scores::{SubScoreKind, SubScores};

#[derive(Debug, Clone, Default)]
pub struct RiskEngine {
    config: RiskScoreConfig,
}

impl RiskEngine {
    /// Create an engine after validating the configuration.
    pub fn new(config: RiskScoreConfig) -> RiskResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RiskScoreConfig {
        &self.config
    }

    /// Full pipeline: normalize, score, combine, classify.
    pub fn assess(&self, dataset: &MarketDataset) -> RiskResult<RiskMetrics> {
        let data = normalize(dataset)?;
        Ok(self.assess_normalized(&data))
    }

    /// Score an already normalized dataset.
    pub fn assess_normalized(&self, data: &NormalizedDataset) -> RiskMetrics {
        let scores = self.sub_scores(data);
        let composite = self.combine(&scores);
        let classification = self.classify(&scores, composite);

        debug!(
            volatility = scores.volatility,
            trend = scores.trend,
            volume = scores.volume,
            correlation = scores.correlation,
            market_stress = scores.market_stress,
            composite,
            level = %classification.level,
            "risk sub-scores computed"
        );

        RiskMetrics::new(data.symbols(), data.window_len(), scores, composite, classification)
    }

    /// All five sub-scores, computed in parallel.
    pub fn sub_scores(&self, data: &NormalizedDataset) -> SubScores {
        SubScores::compute(data, &self.config.calibration)
    }

    /// A single sub-score of a raw dataset.
    pub fn sub_score(&self, kind: SubScoreKind, dataset: &MarketDataset) -> RiskResult<f64> {
        let data = normalize(dataset)?;
        Ok(kind.compute(&data, &self.config.calibration))
    }

    pub fn volatility_score(&self, dataset: &MarketDataset) -> RiskResult<f64> {
        self.sub_score(SubScoreKind::Volatility, dataset)
    }

    pub fn trend_score(&self, dataset: &MarketDataset) -> RiskResult<f64> {
        self.sub_score(SubScoreKind::Trend, dataset)
    }

    pub fn volume_score(&self, dataset: &MarketDataset) -> RiskResult<f64> {
        self.sub_score(SubScoreKind::Volume, dataset)
    }

    pub fn correlation_score(&self, dataset: &MarketDataset) -> RiskResult<f64> {
        self.sub_score(SubScoreKind::Correlation, dataset)
    }

    pub fn market_stress_score(&self, dataset: &MarketDataset) -> RiskResult<f64> {
        self.sub_score(SubScoreKind::MarketStress, dataset)
    }

    pub fn combine(&self, scores: &SubScores) -> f64 {
        combine(scores, &self.config.weights)
    }

    pub fn classify(&self, scores: &SubScores, composite: f64) -> Classification {
        classify(scores, composite, &self.config.thresholds)
    }
}
