use chrono::{DateTime, Utc};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::{DataError, DataResult};

/// Time resolution for market data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    Minute,
    FiveMinute,
    FifteenMinute,
    Hour,
    FourHour,
    Day,
    Week,
}

impl Resolution {
    pub fn to_seconds(&self) -> u64 {
        match self {
            Resolution::Minute => 60,
            Resolution::FiveMinute => 300,
            Resolution::FifteenMinute => 900,
            Resolution::Hour => 3600,
            Resolution::FourHour => 14400,
            Resolution::Day => 86400,
            Resolution::Week => 604800,
        }
    }

    pub fn to_duration(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.to_seconds() as i64)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Resolution::Minute => "1m",
            Resolution::FiveMinute => "5m",
            Resolution::FifteenMinute => "15m",
            Resolution::Hour => "1h",
            Resolution::FourHour => "4h",
            Resolution::Day => "1d",
            Resolution::Week => "1w",
        };
        write!(f, "{}", s)
    }
}

/// OHLCV bar as delivered by a market data provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub resolution: Resolution,
}

impl Bar {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: &str,
        timestamp: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
        resolution: Resolution,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            resolution,
        }
    }
}

/// A single `(timestamp, price, volume)` observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub volume: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, price: f64, volume: f64) -> Self {
        Self {
            timestamp,
            price,
            volume,
        }
    }
}

/// Price/volume history for one asset, oldest first.
///
/// Construction does not validate; the risk engine's normalizer rejects
/// series that break the ordering or positivity invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSeries {
    pub symbol: String,
    pub samples: Vec<Sample>,
}

impl AssetSeries {
    pub fn new(symbol: &str, samples: Vec<Sample>) -> Self {
        Self {
            symbol: symbol.to_string(),
            samples,
        }
    }

    /// Build a series from parallel price/volume/timestamp vectors.
    ///
    /// Extra trailing elements in the longer vectors are ignored.
    pub fn from_columns(
        symbol: &str,
        timestamps: &[DateTime<Utc>],
        prices: &[f64],
        volumes: &[f64],
    ) -> Self {
        let samples = timestamps
            .iter()
            .zip(prices)
            .zip(volumes)
            .map(|((&ts, &price), &volume)| Sample::new(ts, price, volume))
            .collect();
        Self::new(symbol, samples)
    }

    /// Convert provider bars using the close price and bar volume.
    pub fn from_bars(symbol: &str, bars: &[Bar]) -> DataResult<Self> {
        let samples = bars
            .iter()
            .map(|bar| -> DataResult<Sample> {
                let price = bar.close.to_f64().ok_or_else(|| DataError::ParseError {
                    message: format!("close {} for {} is not representable", bar.close, symbol),
                })?;
                let volume = bar.volume.to_f64().ok_or_else(|| DataError::ParseError {
                    message: format!("volume {} for {} is not representable", bar.volume, symbol),
                })?;
                Ok(Sample::new(bar.timestamp, price, volume))
            })
            .collect::<DataResult<Vec<_>>>()?;
        Ok(Self::new(symbol, samples))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.price)
    }

    pub fn volumes(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.volume)
    }
}

/// Symbol-keyed collection of asset series.
///
/// Keys are kept sorted so that every pass over the dataset visits assets
/// in the same order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketDataset {
    series: BTreeMap<String, AssetSeries>,
}

impl MarketDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a series, replacing (and returning) any previous one for the
    /// same symbol.
    pub fn insert(&mut self, series: AssetSeries) -> Option<AssetSeries> {
        self.series.insert(series.symbol.clone(), series)
    }

    pub fn with_series(mut self, series: AssetSeries) -> Self {
        self.insert(series);
        self
    }

    pub fn get(&self, symbol: &str) -> Option<&AssetSeries> {
        self.series.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Values<'_, String, AssetSeries> {
        self.series.values()
    }

    /// Length of the shortest series, i.e. the common trailing window.
    pub fn overlap_len(&self) -> usize {
        self.series.values().map(AssetSeries::len).min().unwrap_or(0)
    }
}

impl FromIterator<AssetSeries> for MarketDataset {
    fn from_iter<I: IntoIterator<Item = AssetSeries>>(iter: I) -> Self {
        let mut dataset = MarketDataset::new();
        for series in iter {
            dataset.insert(series);
        }
        dataset
    }
}

impl<'a> IntoIterator for &'a MarketDataset {
    type Item = &'a AssetSeries;
    type IntoIter = btree_map::Values<'a, String, AssetSeries>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.values()
    }
}
