use std::sync::Arc;

use rp_data::{CsvDataProvider, MarketDataProvider, MarketRegime, SampleDataProvider};
use rp_risk::{RiskScoreAnalyzer, RiskScoreConfig};
use tracing_subscriber::EnvFilter;

const DEFAULT_BASKET: [&str; 3] = ["ETH", "USDC", "LINK"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let mut symbols: Vec<String> = std::env::args().skip(1).collect();
    if symbols.is_empty() {
        symbols = DEFAULT_BASKET.iter().map(|s| s.to_string()).collect();
    }

    let config = match std::env::var("RISKPULSE_CONFIG") {
        Ok(path) => RiskScoreConfig::from_path(&path)?,
        Err(_) => RiskScoreConfig::default(),
    };

    let provider: Arc<dyn MarketDataProvider> = match std::env::var("RISKPULSE_CSV_DIR") {
        Ok(dir) => Arc::new(CsvDataProvider::new(dir)),
        Err(_) => {
            let regime: MarketRegime = std::env::var("RISKPULSE_REGIME")
                .unwrap_or_else(|_| "calm".to_string())
                .parse()?;
            Arc::new(SampleDataProvider::with_regime(regime))
        }
    };

    let analyzer = RiskScoreAnalyzer::new(config, provider)?;
    let metrics = analyzer.calculate_comprehensive_risk_score(&symbols).await?;

    eprint!("{metrics}");
    println!("{}", serde_json::to_string_pretty(&metrics)?);
    Ok(())
}
