//! Descriptive statistics shared by the sub-score calculators.
//!
//! Standard deviations are population (ddof = 0) throughout.

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance; 0 for an empty slice.
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Coefficient of variation (`std_dev / mean`); 0 when the mean is not positive.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if m <= 0.0 {
        return 0.0;
    }
    std_dev(values) / m
}

/// True when a spread measure is indistinguishable from rounding noise
/// relative to the magnitude of the data it was computed from.
fn negligible(spread: f64, magnitude: f64) -> bool {
    spread <= f64::EPSILON * magnitude.max(f64::MIN_POSITIVE)
}

/// Pearson correlation over the common prefix of `a` and `b`.
///
/// `None` when fewer than two paired observations exist or either side has
/// no variance.
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n < 2 {
        return None;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let (mean_a, mean_b) = (mean(a), mean(b));

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    let mut mag_a = 0.0;
    let mut mag_b = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        let (dx, dy) = (x - mean_a, y - mean_b);
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
        mag_a += x * x;
        mag_b += y * y;
    }

    if negligible(var_a, mag_a) || negligible(var_b, mag_b) {
        return None;
    }
    Some((cov / (var_a.sqrt() * var_b.sqrt())).clamp(-1.0, 1.0))
}

/// Ordinary least squares fit of `values` against their index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    /// Coefficient of determination in [0, 1]; 0 for a flat series.
    pub r_squared: f64,
}

pub fn linear_fit(values: &[f64]) -> Option<LinearFit> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    let mut magnitude = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        let dy = y - y_mean;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
        magnitude += y * y;
    }

    let slope = sxy / sxx;
    let r_squared = if negligible(syy, magnitude) {
        0.0
    } else {
        // Explained / total sum of squares
        ((slope * sxy) / syy).clamp(0.0, 1.0)
    };

    Some(LinearFit { slope, r_squared })
}
