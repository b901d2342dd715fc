//! Orchestrator: fetch market data, score it, return the assessment.
//!
//! The market data fetch is the only suspension point. Scoring runs on the
//! blocking pool so a large basket never stalls the async runtime, and the
//! [`RiskMetrics`] value only exists once every stage has succeeded.

use std::sync::Arc;
use std::time::Duration;

use rp_data::{MarketDataFetcher, MarketDataProvider};
use rp_types::{DataError, MarketDataset, RiskError, RiskResult};
use tracing::{info, warn};

use crate::config::RiskScoreConfig;
use crate::engine::RiskEngine;
use crate::metrics::RiskMetrics;

/// Async risk analyzer over a market data collaborator.
///
/// Holds no per-call state; share it freely between tasks scoring
/// unrelated baskets.
#[derive(Debug, Clone)]
pub struct RiskScoreAnalyzer {
    engine: RiskEngine,
    fetcher: MarketDataFetcher,
    fetch_timeout: Duration,
}

impl RiskScoreAnalyzer {
    pub fn new(config: RiskScoreConfig, provider: Arc<dyn MarketDataProvider>) -> RiskResult<Self> {
        let fetcher = MarketDataFetcher::new(provider, config.data.resolution, config.data.lookback_bars);
        let fetch_timeout = config.data.fetch_timeout();
        let engine = RiskEngine::new(config)?;
        Ok(Self {
            engine,
            fetcher,
            fetch_timeout,
        })
    }

    /// Analyzer with the default configuration.
    pub fn with_provider(provider: Arc<dyn MarketDataProvider>) -> RiskResult<Self> {
        Self::new(RiskScoreConfig::default(), provider)
    }

    pub fn engine(&self) -> &RiskEngine {
        &self.engine
    }

    /// Fetch market data for `symbols` and compute the composite assessment.
    ///
    /// Collaborator failures and timeouts surface as
    /// [`RiskError::DataUnavailable`]; they are never scored as zero risk.
    pub async fn calculate_comprehensive_risk_score<S: AsRef<str>>(
        &self,
        symbols: &[S],
    ) -> RiskResult<RiskMetrics> {
        if symbols.is_empty() {
            return Err(RiskError::NoSymbols);
        }
        let requested: Vec<&str> = symbols.iter().map(AsRef::as_ref).collect();
        info!(
            symbols = ?requested,
            provider = self.fetcher.provider().name(),
            resolution = %self.fetcher.resolution(),
            lookback = self.fetcher.lookback(),
            "calculating risk score"
        );

        let dataset = self.fetch(&requested).await?;
        let metrics = self.assess_dataset(dataset).await?;

        info!(
            symbols = ?metrics.symbols,
            composite = metrics.composite_risk_score,
            level = %metrics.risk_level,
            factors = metrics.risk_factors.len(),
            "risk score calculated"
        );
        Ok(metrics)
    }

    /// Score a dataset the caller already holds, off the async threads.
    pub async fn assess_dataset(&self, dataset: MarketDataset) -> RiskResult<RiskMetrics> {
        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || engine.assess(&dataset))
            .await
            .map_err(|e| RiskError::Internal(format!("scoring task failed: {}", e)))?
    }

    async fn fetch(&self, symbols: &[&str]) -> RiskResult<MarketDataset> {
        match tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch_dataset(symbols)).await {
            Ok(Ok(dataset)) => Ok(dataset),
            Ok(Err(e)) => {
                warn!(error = %e, "market data unavailable");
                Err(RiskError::DataUnavailable(e))
            }
            Err(_) => {
                let timeout_ms = self.fetch_timeout.as_millis() as u64;
                warn!(timeout_ms, "market data fetch timed out");
                Err(RiskError::DataUnavailable(DataError::Timeout { timeout_ms }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration as ChronoDuration, Utc};
    use rp_data::{CsvDataProvider, MarketRegime, SampleDataProvider, StaticDataProvider};
    use rp_types::{AssetSeries, Bar, DataResult, Resolution, SampleField};
    use std::path::Path;

    fn anchor() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn static_provider(series: Vec<AssetSeries>) -> Arc<dyn MarketDataProvider> {
        Arc::new(StaticDataProvider::new(series.into_iter().collect()))
    }

    fn linear(symbol: &str, start: f64, step: f64, n: usize) -> AssetSeries {
        let timestamps: Vec<_> = (0..n as i64).map(|i| anchor() + ChronoDuration::days(i)).collect();
        let prices: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
        AssetSeries::from_columns(symbol, &timestamps, &prices, &vec![1_000.0; n])
    }

    /// Writes `{symbol}_1h.csv` with one hourly row per close.
    fn write_hourly_csv(dir: &Path, symbol: &str, closes: &[&str]) {
        let mut csv = String::from("Timestamp,Open,High,Low,Close,Volume\n");
        for (hour, close) in closes.iter().enumerate() {
            csv.push_str(&format!(
                "2024-03-01 {:02}:00:00,1,1,1,{},{}\n",
                hour,
                close,
                100 + hour * 10
            ));
        }
        std::fs::write(dir.join(format!("{}_1h.csv", symbol)), csv).unwrap();
    }

    /// Never answers within any reasonable timeout.
    #[derive(Debug)]
    struct StalledProvider;

    #[async_trait]
    impl MarketDataProvider for StalledProvider {
        fn supports_symbol(&self, _symbol: &str, _resolution: Resolution) -> bool {
            true
        }

        async fn fetch_bars(
            &self,
            _symbol: &str,
            _resolution: Resolution,
            _limit: usize,
        ) -> DataResult<Vec<Bar>> {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "stalled"
        }

        fn config(&self) -> serde_json::Value {
            serde_json::json!({ "type": "stalled" })
        }
    }

    /// Fails every request, like an exchange API outage.
    #[derive(Debug)]
    struct FailingProvider;

    #[async_trait]
    impl MarketDataProvider for FailingProvider {
        fn supports_symbol(&self, _symbol: &str, _resolution: Resolution) -> bool {
            true
        }

        async fn fetch_bars(
            &self,
            _symbol: &str,
            _resolution: Resolution,
            _limit: usize,
        ) -> DataResult<Vec<Bar>> {
            Err(DataError::LoadingFailed {
                message: "HTTP error: 503 Service Unavailable".into(),
            })
        }

        fn name(&self) -> &str {
            "failing"
        }

        fn config(&self) -> serde_json::Value {
            serde_json::json!({ "type": "failing" })
        }
    }

    #[tokio::test]
    async fn scores_static_basket() {
        let analyzer = RiskScoreAnalyzer::with_provider(static_provider(vec![
            linear("ETH", 2000.0, 100.0, 12),
            linear("LINK", 15.0, 0.75, 12),
        ]))
        .unwrap();

        let metrics = analyzer
            .calculate_comprehensive_risk_score(&["ETH", "LINK"])
            .await
            .unwrap();

        assert_eq!(metrics.symbols, vec!["ETH", "LINK"]);
        assert_eq!(metrics.window_len, 12);
        // Both climb 1/20 of their start price per step: identical returns,
        // slope / mean = 1/51 for each
        assert!((metrics.trend_score - 2000.0 / 51.0 * 2.0).abs() < 1e-6);
        assert!(metrics.correlation_score > 90.0);
    }

    #[tokio::test]
    async fn repeated_calls_are_bit_identical() {
        let analyzer = RiskScoreAnalyzer::with_provider(Arc::new(
            SampleDataProvider::with_regime(MarketRegime::Volatile).with_anchor(anchor()),
        ))
        .unwrap();

        let first = analyzer
            .calculate_comprehensive_risk_score(&["ETH", "USDC", "LINK"])
            .await
            .unwrap();
        let second = analyzer
            .calculate_comprehensive_risk_score(&["LINK", "ETH", "USDC"])
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first.composite_risk_score.to_bits(),
            second.composite_risk_score.to_bits()
        );
    }

    #[tokio::test]
    async fn crisis_scores_above_calm() {
        let symbols = ["ETH", "USDC", "LINK"];
        let calm = RiskScoreAnalyzer::with_provider(Arc::new(
            SampleDataProvider::with_regime(MarketRegime::Calm).with_anchor(anchor()),
        ))
        .unwrap();
        let crisis = RiskScoreAnalyzer::with_provider(Arc::new(
            SampleDataProvider::with_regime(MarketRegime::Crisis).with_anchor(anchor()),
        ))
        .unwrap();

        let calm = calm.calculate_comprehensive_risk_score(&symbols).await.unwrap();
        let crisis = crisis.calculate_comprehensive_risk_score(&symbols).await.unwrap();

        assert!(crisis.volatility_score > calm.volatility_score);
        assert!(crisis.composite_risk_score > calm.composite_risk_score);
        assert!(crisis.risk_level >= calm.risk_level);
    }

    #[tokio::test]
    async fn empty_basket_rejected() {
        let analyzer = RiskScoreAnalyzer::with_provider(Arc::new(SampleDataProvider::new())).unwrap();
        let symbols: [&str; 0] = [];
        let err = analyzer
            .calculate_comprehensive_risk_score(&symbols)
            .await
            .unwrap_err();
        assert!(matches!(err, RiskError::NoSymbols));
    }

    #[tokio::test]
    async fn collaborator_failure_is_propagated() {
        let analyzer = RiskScoreAnalyzer::with_provider(Arc::new(FailingProvider)).unwrap();
        let err = analyzer
            .calculate_comprehensive_risk_score(&["ETH"])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RiskError::DataUnavailable(DataError::LoadingFailed { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_symbol_is_data_unavailable() {
        let analyzer = RiskScoreAnalyzer::with_provider(Arc::new(SampleDataProvider::new())).unwrap();
        let err = analyzer
            .calculate_comprehensive_risk_score(&["ETH", "NOPE"])
            .await
            .unwrap_err();
        assert_eq!(err.symbol(), Some("NOPE"));
    }

    #[tokio::test]
    async fn hourly_csv_basket_uses_configured_resolution() {
        let dir = tempfile::tempdir().unwrap();
        write_hourly_csv(dir.path(), "ETH", &["2000", "2040", "2010", "2080", "2100"]);
        write_hourly_csv(dir.path(), "LINK", &["15", "15.3", "15.1", "15.6", "15.8"]);

        let mut config = RiskScoreConfig::default();
        config.data.resolution = Resolution::Hour;
        let hourly = RiskScoreAnalyzer::new(config, Arc::new(CsvDataProvider::new(dir.path()))).unwrap();
        let metrics = hourly
            .calculate_comprehensive_risk_score(&["ETH", "LINK"])
            .await
            .unwrap();
        assert_eq!(metrics.symbols, vec!["ETH", "LINK"]);
        assert_eq!(metrics.window_len, 5);

        // No daily files in the directory
        let daily = RiskScoreAnalyzer::with_provider(Arc::new(CsvDataProvider::new(dir.path()))).unwrap();
        let err = daily
            .calculate_comprehensive_risk_score(&["ETH"])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RiskError::DataUnavailable(DataError::SymbolNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn non_finite_csv_cell_is_an_invalid_sample() {
        let dir = tempfile::tempdir().unwrap();
        write_hourly_csv(dir.path(), "ETH", &["2000", "2040", "NaN", "2080"]);

        let mut config = RiskScoreConfig::default();
        config.data.resolution = Resolution::Hour;
        let analyzer = RiskScoreAnalyzer::new(config, Arc::new(CsvDataProvider::new(dir.path()))).unwrap();
        match analyzer
            .calculate_comprehensive_risk_score(&["ETH"])
            .await
            .unwrap_err()
        {
            RiskError::InvalidSample {
                symbol,
                index,
                field,
                value,
            } => {
                assert_eq!(symbol, "ETH");
                assert_eq!(index, 2);
                assert_eq!(field, SampleField::Price);
                assert!(value.is_nan());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_fetch_times_out() {
        let mut config = RiskScoreConfig::default();
        config.data.fetch_timeout_ms = 250;
        let analyzer = RiskScoreAnalyzer::new(config, Arc::new(StalledProvider)).unwrap();

        let err = analyzer
            .calculate_comprehensive_risk_score(&["ETH", "LINK"])
            .await
            .unwrap_err();
        match err {
            RiskError::DataUnavailable(DataError::Timeout { timeout_ms }) => assert_eq!(timeout_ms, 250),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn insufficient_series_produces_no_metrics() {
        let analyzer = RiskScoreAnalyzer::with_provider(static_provider(vec![
            linear("ETH", 2000.0, 10.0, 5),
            linear("SOL", 100.0, 1.0, 1),
        ]))
        .unwrap();
        let err = analyzer
            .calculate_comprehensive_risk_score(&["ETH", "SOL"])
            .await
            .unwrap_err();
        assert!(matches!(err, RiskError::InsufficientData { .. }));
    }

    #[tokio::test]
    async fn concurrent_baskets_do_not_interfere() {
        let analyzer = Arc::new(
            RiskScoreAnalyzer::with_provider(static_provider(vec![
                linear("ETH", 2000.0, 100.0, 12),
                linear("LINK", 15.0, 0.75, 12),
                linear("USDC", 1.0, 0.0, 12),
            ]))
            .unwrap(),
        );

        let (a, b) = tokio::join!(
            analyzer.calculate_comprehensive_risk_score(&["ETH", "LINK"]),
            analyzer.calculate_comprehensive_risk_score(&["USDC"]),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(a, analyzer.calculate_comprehensive_risk_score(&["ETH", "LINK"]).await.unwrap());
        assert_eq!(b.symbols, vec!["USDC"]);
        assert_eq!(b.composite_risk_score, 0.0);
    }
}
