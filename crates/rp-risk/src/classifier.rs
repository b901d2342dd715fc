//! Risk classifier: composite → level, sub-scores → named factors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::config::ClassificationThresholds;
use crate::scores::{SubScoreKind, SubScores};

/// Discrete risk level derived from the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "Medium Risk")]
    Medium,
    #[serde(rename = "High Risk")]
    High,
    #[serde(rename = "Critical Risk")]
    Critical,
}

impl RiskLevel {
    pub fn from_composite(composite: f64, thresholds: &ClassificationThresholds) -> Self {
        if composite >= thresholds.critical {
            RiskLevel::Critical
        } else if composite >= thresholds.high {
            RiskLevel::High
        } else if composite >= thresholds.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "Low Risk",
            RiskLevel::Medium => "Medium Risk",
            RiskLevel::High => "High Risk",
            RiskLevel::Critical => "Critical Risk",
        };
        write!(f, "{}", s)
    }
}

/// Named driver of an elevated score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskFactor {
    #[serde(rename = "High Volatility")]
    HighVolatility,
    #[serde(rename = "Strong Directional Trend")]
    StrongDirectionalTrend,
    #[serde(rename = "Abnormal Volume")]
    AbnormalVolume,
    #[serde(rename = "Correlation Breakdown")]
    CorrelationBreakdown,
    #[serde(rename = "Market Stress Event")]
    MarketStressEvent,
    /// Critical composite with no single dimension above the trigger.
    #[serde(rename = "Broad-Based Elevated Risk")]
    BroadBasedElevatedRisk,
}

impl RiskFactor {
    pub fn for_sub_score(kind: SubScoreKind) -> Self {
        match kind {
            SubScoreKind::Volatility => RiskFactor::HighVolatility,
            SubScoreKind::Trend => RiskFactor::StrongDirectionalTrend,
            SubScoreKind::Volume => RiskFactor::AbnormalVolume,
            SubScoreKind::Correlation => RiskFactor::CorrelationBreakdown,
            SubScoreKind::MarketStress => RiskFactor::MarketStressEvent,
        }
    }
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskFactor::HighVolatility => "High Volatility",
            RiskFactor::StrongDirectionalTrend => "Strong Directional Trend",
            RiskFactor::AbnormalVolume => "Abnormal Volume",
            RiskFactor::CorrelationBreakdown => "Correlation Breakdown",
            RiskFactor::MarketStressEvent => "Market Stress Event",
            RiskFactor::BroadBasedElevatedRisk => "Broad-Based Elevated Risk",
        };
        write!(f, "{}", s)
    }
}

/// Level plus contributing factors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub level: RiskLevel,
    pub factors: BTreeSet<RiskFactor>,
}

pub fn classify(
    scores: &SubScores,
    composite: f64,
    thresholds: &ClassificationThresholds,
) -> Classification {
    let level = RiskLevel::from_composite(composite, thresholds);

    let mut factors: BTreeSet<RiskFactor> = scores
        .breakdown()
        .into_iter()
        .filter(|(_, score)| *score > thresholds.factor_trigger)
        .map(|(kind, _)| RiskFactor::for_sub_score(kind))
        .collect();

    if factors.is_empty() && composite >= thresholds.critical {
        factors.insert(RiskFactor::BroadBasedElevatedRisk);
    }

    Classification { level, factors }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::combine;
    use crate::config::ScoreWeights;

    fn run(v: f64, t: f64, vol: f64, c: f64, s: f64) -> (f64, Classification) {
        let scores = SubScores::new(v, t, vol, c, s);
        let composite = combine(&scores, &ScoreWeights::default());
        let thresholds = ClassificationThresholds::default();
        (composite, classify(&scores, composite, &thresholds))
    }

    #[test]
    fn low_risk_case() {
        let (composite, c) = run(20.0, 30.0, 25.0, 35.0, 40.0);
        assert!((composite - 29.75).abs() < 1e-9);
        assert_eq!(c.level, RiskLevel::Low);
        assert!(c.factors.is_empty());
    }

    #[test]
    fn medium_risk_case() {
        let (composite, c) = run(45.0, 55.0, 50.0, 60.0, 65.0);
        assert!((composite - 54.75).abs() < 1e-9);
        assert_eq!(c.level, RiskLevel::Medium);
        assert!(c.factors.is_empty());
    }

    #[test]
    fn high_risk_case() {
        let (composite, c) = run(70.0, 75.0, 80.0, 85.0, 90.0);
        assert!((composite - 79.5).abs() < 1e-9);
        assert_eq!(c.level, RiskLevel::High);
        let expected: BTreeSet<_> = [
            RiskFactor::StrongDirectionalTrend,
            RiskFactor::AbnormalVolume,
            RiskFactor::CorrelationBreakdown,
            RiskFactor::MarketStressEvent,
        ]
        .into_iter()
        .collect();
        assert_eq!(c.factors, expected);
        // volatility == 70 is not strictly above the trigger
        assert!(!c.factors.contains(&RiskFactor::HighVolatility));
    }

    #[test]
    fn trigger_is_strict() {
        let thresholds = ClassificationThresholds::default();
        let at = classify(&SubScores::new(70.0, 0.0, 0.0, 0.0, 0.0), 17.5, &thresholds);
        let above = classify(&SubScores::new(70.000001, 0.0, 0.0, 0.0, 0.0), 17.5, &thresholds);
        assert!(at.factors.is_empty());
        assert_eq!(
            above.factors.into_iter().collect::<Vec<_>>(),
            vec![RiskFactor::HighVolatility]
        );
    }

    #[test]
    fn critical_risk_case() {
        let (composite, c) = run(85.0, 90.0, 95.0, 88.0, 92.0);
        assert!((composite - 89.5).abs() < 1e-9);
        assert_eq!(c.level, RiskLevel::Critical);
        assert_eq!(c.factors.len(), 5);
        assert!(!c.factors.contains(&RiskFactor::BroadBasedElevatedRisk));
    }

    #[test]
    fn level_boundaries() {
        let t = ClassificationThresholds::default();
        assert_eq!(RiskLevel::from_composite(34.999, &t), RiskLevel::Low);
        assert_eq!(RiskLevel::from_composite(35.0, &t), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_composite(59.999, &t), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_composite(60.0, &t), RiskLevel::High);
        assert_eq!(RiskLevel::from_composite(84.999, &t), RiskLevel::High);
        assert_eq!(RiskLevel::from_composite(85.0, &t), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_composite(100.0, &t), RiskLevel::Critical);
    }

    #[test]
    fn broad_based_when_no_single_driver() {
        let thresholds = ClassificationThresholds::default();
        let scores = SubScores::new(70.0, 70.0, 70.0, 70.0, 70.0);
        let c = classify(&scores, 86.0, &thresholds);
        assert_eq!(c.level, RiskLevel::Critical);
        assert_eq!(
            c.factors.into_iter().collect::<Vec<_>>(),
            vec![RiskFactor::BroadBasedElevatedRisk]
        );
    }

    #[test]
    fn names_match_serialized_form() {
        assert_eq!(RiskLevel::Critical.to_string(), "Critical Risk");
        assert_eq!(
            serde_json::to_string(&RiskLevel::Medium).unwrap(),
            "\"Medium Risk\""
        );
        for factor in [
            RiskFactor::HighVolatility,
            RiskFactor::StrongDirectionalTrend,
            RiskFactor::AbnormalVolume,
            RiskFactor::CorrelationBreakdown,
            RiskFactor::MarketStressEvent,
            RiskFactor::BroadBasedElevatedRisk,
        ] {
            assert_eq!(
                serde_json::to_string(&factor).unwrap(),
                format!("\"{}\"", factor)
            );
        }
    }
}
