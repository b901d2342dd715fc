pub mod providers;

pub use providers::*;

use rp_types::{DataError, DataResult, MarketDataset, Resolution};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Assembles a [`MarketDataset`] for a basket of symbols from one provider.
///
/// Each symbol is fetched on its own task; the first failure aborts the
/// remaining fetches.
#[derive(Debug, Clone)]
pub struct MarketDataFetcher {
    provider: Arc<dyn MarketDataProvider>,
    resolution: Resolution,
    lookback: usize,
}

impl MarketDataFetcher {
    pub fn new(provider: Arc<dyn MarketDataProvider>, resolution: Resolution, lookback: usize) -> Self {
        Self {
            provider,
            resolution,
            lookback,
        }
    }

    pub fn provider(&self) -> &Arc<dyn MarketDataProvider> {
        &self.provider
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    /// Fetch `lookback` samples for every distinct symbol.
    pub async fn fetch_dataset<S: AsRef<str>>(&self, symbols: &[S]) -> DataResult<MarketDataset> {
        let unique: BTreeSet<String> = symbols.iter().map(|s| s.as_ref().to_string()).collect();

        debug!(
            provider = self.provider.name(),
            symbols = unique.len(),
            lookback = self.lookback,
            resolution = %self.resolution,
            "fetching market data"
        );

        if let Some(symbol) = unique
            .iter()
            .find(|s| !self.provider.supports_symbol(s, self.resolution))
        {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.clone(),
            });
        }

        let mut tasks = JoinSet::new();
        for symbol in unique {
            let provider = Arc::clone(&self.provider);
            let resolution = self.resolution;
            let lookback = self.lookback;
            tasks.spawn(async move { provider.fetch_series(&symbol, resolution, lookback).await });
        }

        let mut dataset = MarketDataset::new();
        while let Some(joined) = tasks.join_next().await {
            let series = joined
                .map_err(|e| DataError::LoadingFailed {
                    message: format!("fetch task failed: {}", e),
                })?
                .inspect_err(|e| warn!(provider = self.provider.name(), error = %e, "market data fetch failed"))?;
            dataset.insert(series);
        }

        Ok(dataset)
    }
}
