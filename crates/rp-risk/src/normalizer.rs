//! Series normalization.
//!
//! Validates every asset series, puts it in chronological order, trims all
//! assets to the common trailing window and derives per-step returns.

use rp_types::{AssetSeries, MarketDataset, RiskError, RiskResult, Sample, SampleField};

/// Fewest samples any asset may carry.
pub const MIN_SAMPLES: usize = 2;

/// One asset trimmed to the common window.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSeries {
    pub symbol: String,
    pub prices: Vec<f64>,
    pub volumes: Vec<f64>,
    /// `(p_i - p_{i-1}) / p_{i-1}`; one shorter than `prices`.
    pub returns: Vec<f64>,
}

/// Validated, aligned input shared by all sub-score calculators.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDataset {
    series: Vec<NormalizedSeries>,
    window_len: usize,
}

impl NormalizedDataset {
    /// Assets in symbol order.
    pub fn series(&self) -> &[NormalizedSeries] {
        &self.series
    }

    /// Samples per asset in the common trailing window.
    pub fn window_len(&self) -> usize {
        self.window_len
    }

    pub fn symbols(&self) -> Vec<String> {
        self.series.iter().map(|s| s.symbol.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

fn invalid(symbol: &str, index: usize, field: SampleField, value: f64) -> RiskError {
    RiskError::InvalidSample {
        symbol: symbol.to_string(),
        index,
        field,
        value,
    }
}

fn valid_quantity(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Validate one series and return its samples in strictly increasing
/// timestamp order.
fn validated_samples(series: &AssetSeries) -> RiskResult<Vec<Sample>> {
    let symbol = series.symbol.as_str();
    if series.len() < MIN_SAMPLES {
        return Err(RiskError::InsufficientData {
            symbol: symbol.to_string(),
            samples: series.len(),
            required: MIN_SAMPLES,
        });
    }

    for (index, sample) in series.samples.iter().enumerate() {
        if !valid_quantity(sample.price) {
            return Err(invalid(symbol, index, SampleField::Price, sample.price));
        }
        if !valid_quantity(sample.volume) {
            return Err(invalid(symbol, index, SampleField::Volume, sample.volume));
        }
    }

    let mut samples = series.samples.clone();
    samples.sort_by_key(|s| s.timestamp);

    if let Some(index) = samples
        .windows(2)
        .position(|w| w[0].timestamp == w[1].timestamp)
    {
        let duplicate = samples[index + 1].timestamp;
        return Err(invalid(
            symbol,
            index + 1,
            SampleField::Timestamp,
            duplicate.timestamp() as f64,
        ));
    }

    Ok(samples)
}

/// Normalize a dataset for scoring.
///
/// Fails on the first asset (in symbol order) that is too short or carries
/// an invalid sample; no partial output is produced.
pub fn normalize(dataset: &MarketDataset) -> RiskResult<NormalizedDataset> {
    if dataset.is_empty() {
        return Err(RiskError::NoSymbols);
    }

    let mut validated = Vec::with_capacity(dataset.len());
    for series in dataset {
        validated.push((series.symbol.as_str(), validated_samples(series)?));
    }

    // Validation keeps every sample, so the raw overlap is the final window
    let window_len = dataset.overlap_len();

    let series = validated
        .into_iter()
        .map(|(symbol, samples)| {
            let window = &samples[samples.len() - window_len..];
            let prices: Vec<f64> = window.iter().map(|s| s.price).collect();
            let returns = prices.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect();
            NormalizedSeries {
                symbol: symbol.to_string(),
                volumes: window.iter().map(|s| s.volume).collect(),
                prices,
                returns,
            }
        })
        .collect();

    Ok(NormalizedDataset { series, window_len })
}
