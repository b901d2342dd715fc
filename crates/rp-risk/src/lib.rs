//! Composite market-risk scoring for RiskPulse.
//!
//! Provides:
//! - Normalization of raw per-asset price/volume series
//! - Five independent sub-scores (volatility, trend, volume, correlation, market stress)
//! - Weighted composite score and risk level classification with triggered factors
//! - An async analyzer that fetches a basket from a market data provider and scores it

pub mod analyzer;
pub mod classifier;
pub mod composite;
pub mod config;
pub mod engine;
pub mod metrics;
pub mod normalizer;
pub mod scores;
pub mod stats;

pub use analyzer::RiskScoreAnalyzer;
pub use classifier::{classify, Classification, RiskFactor, RiskLevel};
pub use composite::combine;
pub use config::{ClassificationThresholds, DataConfig, RiskScoreConfig, ScoreCalibration, ScoreWeights};
pub use engine::RiskEngine;
pub use metrics::RiskMetrics;
pub use normalizer::{normalize, NormalizedDataset, NormalizedSeries};
pub use scores::{SubScoreKind, SubScores, MAX_SCORE};
