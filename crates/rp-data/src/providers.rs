use async_trait::async_trait;
use chrono::{DateTime, Utc};
use csv::ReaderBuilder;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rp_types::{AssetSeries, Bar, DataError, DataResult, MarketDataset, Resolution, Sample};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Trait for market data collaborators (CSV, APIs, in-memory fixtures, ...)
#[async_trait]
pub trait MarketDataProvider: Send + Sync + std::fmt::Debug {
    /// Check if this provider can serve `symbol` at `resolution`
    fn supports_symbol(&self, symbol: &str, resolution: Resolution) -> bool;

    /// Fetch the most recent `limit` bars for `symbol`, oldest first
    async fn fetch_bars(
        &self,
        symbol: &str,
        resolution: Resolution,
        limit: usize,
    ) -> DataResult<Vec<Bar>>;

    /// Fetch the most recent `limit` samples as an [`AssetSeries`].
    ///
    /// The default goes through [`fetch_bars`](Self::fetch_bars) and uses
    /// close prices.
    async fn fetch_series(
        &self,
        symbol: &str,
        resolution: Resolution,
        limit: usize,
    ) -> DataResult<AssetSeries> {
        let bars = self.fetch_bars(symbol, resolution, limit).await?;
        AssetSeries::from_bars(symbol, &bars)
    }

    /// Get provider name
    fn name(&self) -> &str;

    /// Get provider configuration
    fn config(&self) -> serde_json::Value;
}

/// CSV data provider for loading local CSV files
#[derive(Debug)]
pub struct CsvDataProvider {
    pub name: String,
    pub data_directory: PathBuf,
    pub file_pattern: String,
}

#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Date", alias = "date", alias = "Timestamp")]
    timestamp: String,
    #[serde(alias = "Open", alias = "open")]
    open: f64,
    #[serde(alias = "High", alias = "high")]
    high: f64,
    #[serde(alias = "Low", alias = "low")]
    low: f64,
    #[serde(alias = "Close", alias = "close")]
    close: f64,
    #[serde(alias = "Volume", alias = "volume")]
    volume: f64,
}

fn parse_timestamp(raw: &str) -> DataResult<DateTime<Utc>> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.and_utc())
        })
        .or_else(|_| {
            chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(|d| d.and_time(chrono::NaiveTime::default()).and_utc())
        })
        .map_err(|e| DataError::ParseError {
            message: format!("Date parsing error for '{}': {}", raw, e),
        })
}

fn to_decimal(value: f64, field: &str) -> DataResult<Decimal> {
    Decimal::from_f64_retain(value).ok_or_else(|| DataError::ParseError {
        message: format!("{} value {} is not representable", field, value),
    })
}

impl CsvDataProvider {
    pub fn new<P: AsRef<Path>>(data_directory: P) -> Self {
        Self {
            name: "CSV Provider".to_string(),
            data_directory: data_directory.as_ref().to_path_buf(),
            file_pattern: "{symbol}_{resolution}.csv".to_string(),
        }
    }

    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.file_pattern = pattern.to_string();
        self
    }

    fn get_file_path(&self, symbol: &str, resolution: Resolution) -> PathBuf {
        let filename = self
            .file_pattern
            .replace("{symbol}", symbol)
            .replace("{resolution}", &resolution.to_string());

        self.data_directory.join(filename)
    }

    /// The trailing `limit` rows of the symbol's file, oldest first.
    async fn read_rows(
        &self,
        symbol: &str,
        resolution: Resolution,
        limit: usize,
    ) -> DataResult<Vec<(DateTime<Utc>, CsvRecord)>> {
        let file_path = self.get_file_path(symbol, resolution);

        if !file_path.exists() {
            return Err(DataError::SourceNotFound(
                file_path.to_string_lossy().to_string(),
            ));
        }

        let contents = tokio::fs::read(&file_path).await?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(contents.as_slice());

        let mut rows = Vec::new();
        for result in reader.deserialize() {
            let record: CsvRecord = result.map_err(|e| DataError::ParseError {
                message: format!("CSV parsing error: {}", e),
            })?;
            rows.push((parse_timestamp(&record.timestamp)?, record));
        }

        rows.sort_by(|a, b| a.0.cmp(&b.0));
        let skip = rows.len().saturating_sub(limit);
        rows.drain(..skip);

        tracing::debug!(symbol, rows = rows.len(), path = %file_path.display(), "loaded CSV rows");
        Ok(rows)
    }
}

#[async_trait]
impl MarketDataProvider for CsvDataProvider {
    fn supports_symbol(&self, symbol: &str, resolution: Resolution) -> bool {
        self.get_file_path(symbol, resolution).exists()
    }

    async fn fetch_bars(
        &self,
        symbol: &str,
        resolution: Resolution,
        limit: usize,
    ) -> DataResult<Vec<Bar>> {
        self.read_rows(symbol, resolution, limit)
            .await?
            .into_iter()
            .map(|(timestamp, record)| -> DataResult<Bar> {
                Ok(Bar::new(
                    symbol,
                    timestamp,
                    to_decimal(record.open, "open")?,
                    to_decimal(record.high, "high")?,
                    to_decimal(record.low, "low")?,
                    to_decimal(record.close, "close")?,
                    to_decimal(record.volume, "volume")?,
                    resolution,
                ))
            })
            .collect()
    }

    /// Reads close and volume as-is, so a `NaN` or `inf` cell reaches the
    /// caller's validation instead of failing the decimal conversion.
    async fn fetch_series(
        &self,
        symbol: &str,
        resolution: Resolution,
        limit: usize,
    ) -> DataResult<AssetSeries> {
        let samples = self
            .read_rows(symbol, resolution, limit)
            .await?
            .into_iter()
            .map(|(timestamp, record)| Sample::new(timestamp, record.close, record.volume))
            .collect();
        Ok(AssetSeries::new(symbol, samples))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "csv",
            "directory": self.data_directory,
            "pattern": self.file_pattern
        })
    }
}

/// Market conditions the sample provider can synthesize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketRegime {
    /// Stable prices, low volatility, loosely linked assets
    Calm,
    /// Large price swings without a clear direction
    Volatile,
    /// Sustained decline across the basket
    Bear,
    /// Extreme moves, decoupled assets and volume spikes
    Crisis,
}

impl FromStr for MarketRegime {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "calm" | "low_risk" => Ok(MarketRegime::Calm),
            "volatile" => Ok(MarketRegime::Volatile),
            "bear" => Ok(MarketRegime::Bear),
            "crisis" => Ok(MarketRegime::Crisis),
            other => Err(DataError::ParseError {
                message: format!("Unknown market regime: {}", other),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RegimeParams {
    /// Per-step drift of the price path
    drift: f64,
    /// Per-step return dispersion
    volatility: f64,
    /// Share of each return driven by the basket-wide factor
    market_beta: f64,
    /// Per-step volume dispersion around the base volume
    volume_noise: f64,
    /// Probability of a shock step
    shock_probability: f64,
    /// Magnitude of a shock step (return and volume multiplier)
    shock_size: f64,
}

impl MarketRegime {
    fn params(&self) -> RegimeParams {
        match self {
            MarketRegime::Calm => RegimeParams {
                drift: 0.0,
                volatility: 0.004,
                market_beta: 0.55,
                volume_noise: 0.04,
                shock_probability: 0.0,
                shock_size: 0.0,
            },
            MarketRegime::Volatile => RegimeParams {
                drift: 0.0,
                volatility: 0.05,
                market_beta: 0.5,
                volume_noise: 0.3,
                shock_probability: 0.05,
                shock_size: 0.08,
            },
            MarketRegime::Bear => RegimeParams {
                drift: -0.02,
                volatility: 0.008,
                market_beta: 0.7,
                volume_noise: 0.15,
                shock_probability: 0.0,
                shock_size: 0.0,
            },
            MarketRegime::Crisis => RegimeParams {
                drift: -0.015,
                volatility: 0.07,
                market_beta: 0.0,
                volume_noise: 0.6,
                shock_probability: 0.2,
                shock_size: 0.18,
            },
        }
    }

    fn seed(&self) -> u64 {
        match self {
            MarketRegime::Calm => 0x5eed_0001,
            MarketRegime::Volatile => 0x5eed_0002,
            MarketRegime::Bear => 0x5eed_0003,
            MarketRegime::Crisis => 0x5eed_0004,
        }
    }
}

/// FNV-1a, so per-symbol seeds are stable across runs and platforms.
fn symbol_seed(symbol: &str) -> u64 {
    symbol.bytes().fold(0xcbf2_9ce4_8422_2325u64, |hash, b| {
        (hash ^ b as u64).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

/// Uniform draw scaled to unit variance.
fn unit_noise(rng: &mut StdRng) -> f64 {
    rng.random_range(-1.0..1.0) * 3f64.sqrt()
}

/// Sample data provider for testing and demo purposes.
///
/// Paths are deterministic for a given `(regime, symbol, limit)`.
#[derive(Debug)]
pub struct SampleDataProvider {
    pub name: String,
    pub regime: MarketRegime,
    /// Timestamp of the most recent generated bar
    pub anchor: DateTime<Utc>,
}

impl SampleDataProvider {
    pub fn new() -> Self {
        Self::with_regime(MarketRegime::Calm)
    }

    pub fn with_regime(regime: MarketRegime) -> Self {
        Self {
            name: "Sample Data Provider".to_string(),
            regime,
            anchor: Utc::now(),
        }
    }

    pub fn with_anchor(mut self, anchor: DateTime<Utc>) -> Self {
        self.anchor = anchor;
        self
    }

    fn base_price(symbol: &str) -> Option<f64> {
        match symbol {
            "BTC" | "BTC-USD" => Some(45_000.0),
            "ETH" | "ETH-USD" => Some(2_000.0),
            "SOL" => Some(100.0),
            "LINK" => Some(15.0),
            "USDC" | "USDT" | "DAI" => Some(1.0),
            "AAPL" => Some(150.0),
            "MSFT" => Some(300.0),
            "SPY" => Some(400.0),
            _ => None,
        }
    }

    fn base_volume(symbol: &str) -> f64 {
        match symbol {
            "BTC" | "BTC-USD" => 1_000.0,
            "USDC" | "USDT" | "DAI" => 5_000.0,
            "AAPL" => 80_000_000.0,
            "SPY" => 50_000_000.0,
            _ => 1_000.0,
        }
    }

    fn is_stablecoin(symbol: &str) -> bool {
        matches!(symbol, "USDC" | "USDT" | "DAI")
    }
}

impl Default for SampleDataProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for SampleDataProvider {
    fn supports_symbol(&self, symbol: &str, _resolution: Resolution) -> bool {
        Self::base_price(symbol).is_some()
    }

    async fn fetch_bars(
        &self,
        symbol: &str,
        resolution: Resolution,
        limit: usize,
    ) -> DataResult<Vec<Bar>> {
        let Some(mut price) = Self::base_price(symbol) else {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        };

        let params = self.regime.params();
        // Stablecoins hold their peg except during a crisis
        let (drift, volatility) = if Self::is_stablecoin(symbol) && self.regime != MarketRegime::Crisis {
            (0.0, params.volatility * 0.1)
        } else {
            (params.drift, params.volatility)
        };

        // The market factor is shared across symbols; the idiosyncratic
        // stream is per symbol.
        let mut market_rng = StdRng::seed_from_u64(self.regime.seed());
        let mut asset_rng = StdRng::seed_from_u64(self.regime.seed() ^ symbol_seed(symbol));

        let base_volume = Self::base_volume(symbol);
        let step = resolution.to_duration();
        let start = i32::try_from(limit.saturating_sub(1))
            .ok()
            .and_then(|steps| step.checked_mul(steps))
            .and_then(|span| self.anchor.checked_sub_signed(span))
            .ok_or_else(|| DataError::LoadingFailed {
                message: format!("{} bars of {} reach past the supported date range", limit, resolution),
            })?;
        let beta = params.market_beta;
        let idio_weight = (1.0 - beta * beta).sqrt();

        let mut bars = Vec::with_capacity(limit);
        let mut prev_price = price;
        for i in 0..limit {
            let timestamp = start + step * i as i32;
            let mut volume = base_volume * (1.0 + params.volume_noise * unit_noise(&mut asset_rng)).max(0.05);

            if i > 0 {
                let market = unit_noise(&mut market_rng);
                let idio = unit_noise(&mut asset_rng);
                let mut ret = drift + volatility * (beta * market + idio_weight * idio);

                if params.shock_probability > 0.0
                    && asset_rng.random_bool(params.shock_probability)
                {
                    let direction = if asset_rng.random_bool(0.5) { 1.0 } else { -1.0 };
                    ret += direction * params.shock_size;
                    volume *= 1.0 + params.shock_size * 20.0;
                }

                // Keep prices strictly positive
                price *= (1.0 + ret).max(0.05);
            }

            let open = to_decimal(prev_price, "open")?;
            let close = to_decimal(price, "close")?;
            let spread = to_decimal(price * volatility, "spread")?;
            bars.push(Bar::new(
                symbol,
                timestamp,
                open,
                open.max(close) + spread,
                (open.min(close) - spread).max(Decimal::ZERO),
                close,
                to_decimal(volume, "volume")?,
                resolution,
            ));
            prev_price = price;
        }

        Ok(bars)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "sample",
            "regime": self.regime,
            "supported_symbols": ["BTC", "ETH", "SOL", "LINK", "USDC", "USDT", "DAI", "AAPL", "MSFT", "SPY"]
        })
    }
}

/// Serves a fixed, preloaded dataset.
///
/// Useful when the caller already holds the series, and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticDataProvider {
    pub name: String,
    dataset: MarketDataset,
}

impl StaticDataProvider {
    pub fn new(dataset: MarketDataset) -> Self {
        Self {
            name: "Static Provider".to_string(),
            dataset,
        }
    }

    fn lookup(&self, symbol: &str) -> DataResult<&AssetSeries> {
        self.dataset.get(symbol).ok_or_else(|| DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        })
    }
}

#[async_trait]
impl MarketDataProvider for StaticDataProvider {
    fn supports_symbol(&self, symbol: &str, _resolution: Resolution) -> bool {
        self.dataset.get(symbol).is_some()
    }

    async fn fetch_bars(
        &self,
        symbol: &str,
        resolution: Resolution,
        limit: usize,
    ) -> DataResult<Vec<Bar>> {
        let series = self.lookup(symbol)?;
        let skip = series.len().saturating_sub(limit);
        series.samples[skip..]
            .iter()
            .map(|s| -> DataResult<Bar> {
                let price = to_decimal(s.price, "price")?;
                Ok(Bar::new(
                    symbol,
                    s.timestamp,
                    price,
                    price,
                    price,
                    price,
                    to_decimal(s.volume, "volume")?,
                    resolution,
                ))
            })
            .collect()
    }

    /// Returns the stored samples untouched, avoiding a decimal round trip.
    async fn fetch_series(
        &self,
        symbol: &str,
        _resolution: Resolution,
        limit: usize,
    ) -> DataResult<AssetSeries> {
        let series = self.lookup(symbol)?;
        let skip = series.len().saturating_sub(limit);
        Ok(AssetSeries::new(symbol, series.samples[skip..].to_vec()))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "static",
            "symbols": self.dataset.symbols().collect::<Vec<_>>()
        })
    }
}
