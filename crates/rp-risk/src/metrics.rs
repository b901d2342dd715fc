//! Assessment result.
//!
//! [`RiskMetrics`] carries no wall-clock time or random identifiers, so two
//! assessments of the same dataset compare equal bit for bit.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::classifier::{Classification, RiskFactor, RiskLevel};
use crate::scores::{SubScoreKind, SubScores};

/// Composite market-risk assessment of one basket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Scored symbols in sorted order.
    pub symbols: Vec<String>,
    /// Samples per asset in the common trailing window.
    pub window_len: usize,

    // --- sub-scores, each in [0, 100] ---
    pub volatility_score: f64,
    pub trend_score: f64,
    pub volume_score: f64,
    pub correlation_score: f64,
    pub market_stress_score: f64,

    // --- combined ---
    pub composite_risk_score: f64,
    pub risk_level: RiskLevel,
    pub risk_factors: BTreeSet<RiskFactor>,
}

impl RiskMetrics {
    pub fn new(
        symbols: Vec<String>,
        window_len: usize,
        scores: SubScores,
        composite: f64,
        classification: Classification,
    ) -> Self {
        Self {
            symbols,
            window_len,
            volatility_score: scores.volatility,
            trend_score: scores.trend,
            volume_score: scores.volume,
            correlation_score: scores.correlation,
            market_stress_score: scores.market_stress,
            composite_risk_score: composite,
            risk_level: classification.level,
            risk_factors: classification.factors,
        }
    }

    pub fn sub_scores(&self) -> SubScores {
        SubScores::new(
            self.volatility_score,
            self.trend_score,
            self.volume_score,
            self.correlation_score,
            self.market_stress_score,
        )
    }

    /// `(kind, score)` pairs in a fixed order.
    pub fn breakdown(&self) -> [(SubScoreKind, f64); 5] {
        self.sub_scores().breakdown()
    }

    pub fn has_factor(&self, factor: RiskFactor) -> bool {
        self.risk_factors.contains(&factor)
    }
}

impl fmt::Display for RiskMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Composite Risk Score: {:.1}/100 ({})",
            self.composite_risk_score, self.risk_level
        )?;
        let factors: Vec<String> = self.risk_factors.iter().map(ToString::to_string).collect();
        if factors.is_empty() {
            writeln!(f, "Risk Factors: none")?;
        } else {
            writeln!(f, "Risk Factors: {}", factors.join(", "))?;
        }
        for (kind, score) in self.breakdown() {
            writeln!(f, "  {}: {:.1}/100", kind, score)?;
        }
        Ok(())
    }
}
