//! Statistical utilities for benchmark aggregation
//!
//! All policy constants live here rather than inline in the runner: samples
//! are cleaned with IQR outlier rejection when enough of them exist, and fall
//! back to the median below that threshold where quartile estimates are too
//! noisy to trust. Percentiles use the nearest-rank rule
//! `ceil(p/100 * n) - 1` over the ascending-sorted series.

/// Minimum kept-sample count before IQR outlier rejection is applied.
/// Below this the central tendency is the median instead of the mean.
pub const OUTLIER_MIN_SAMPLES: usize = 7;

/// Multiplier on the interquartile range for the rejection bounds.
pub const IQR_MULTIPLIER: f64 = 1.5;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted = sorted_copy(values);
    let len = sorted.len();
    if len % 2 == 0 {
        (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
    } else {
        sorted[len / 2]
    }
}

/// First and third quartiles via linear interpolation over the sorted series.
pub fn quartiles(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let sorted = sorted_copy(values);
    (
        interpolated(&sorted, 0.25),
        interpolated(&sorted, 0.75),
    )
}

/// Inclusive bounds outside which a sample counts as an outlier.
pub fn iqr_bounds(values: &[f64]) -> (f64, f64) {
    let (q1, q3) = quartiles(values);
    let iqr = q3 - q1;
    (q1 - IQR_MULTIPLIER * iqr, q3 + IQR_MULTIPLIER * iqr)
}

/// Drops samples outside the IQR bounds. The input is returned unchanged
/// when it is too small for the bounds to be meaningful.
pub fn reject_outliers(values: &[f64]) -> Vec<f64> {
    if values.len() < OUTLIER_MIN_SAMPLES {
        return values.to_vec();
    }
    let (lo, hi) = iqr_bounds(values);
    values
        .iter()
        .copied()
        .filter(|v| *v >= lo && *v <= hi)
        .collect()
}

/// Central tendency under the documented policy: mean over the
/// outlier-rejected set at `OUTLIER_MIN_SAMPLES` or more kept samples,
/// median below. Non-finite samples are excluded up front so they cannot
/// corrupt either statistic.
pub fn central_tendency(values: &[f64]) -> f64 {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.len() >= OUTLIER_MIN_SAMPLES {
        mean(&reject_outliers(&finite))
    } else {
        median(&finite)
    }
}

/// Nearest-rank percentile: index `ceil(p/100 * n) - 1` into the
/// ascending-sorted series, clamped to the valid range.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted = sorted_copy(values);
    let n = sorted.len();
    let rank = (p / 100.0 * n as f64).ceil() as usize;
    let index = rank.saturating_sub(1).min(n - 1);
    sorted[index]
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted
}

fn interpolated(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = (n - 1) as f64 * q;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}
