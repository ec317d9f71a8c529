//! Descriptive statistics over post-warm-up benchmark samples
//!
//! Percentiles use linear interpolation between nearest ranks, matching the
//! numpy default so quartiles line up with the historical analysis output.

use crate::collect::VariantSeries;
use crate::variant::Variant;
use serde::Serialize;
use tracing::warn;

/// Per-variant aggregate over the post-warm-up series
#[derive(Debug, Clone, Serialize)]
pub struct VariantStats {
    pub variant: Variant,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    /// Number of retained (post-warm-up) samples
    pub count: usize,
}

/// Summarize every series with at least 2 samples, in input order.
///
/// Series below the 2-sample floor carry no post-warm-up data and are
/// skipped with a log message.
pub fn summarize_all(series: &[VariantSeries]) -> Vec<VariantStats> {
    series
        .iter()
        .filter_map(|s| {
            let values = s.post_warmup();
            if values.is_empty() {
                warn!(variant = %s.variant, "too few samples for statistics, skipping");
                return None;
            }
            Some(summarize(s.variant, &values))
        })
        .collect()
}

/// Compute the aggregate for one non-empty value slice
pub fn summarize(variant: Variant, values: &[f64]) -> VariantStats {
    let mean = mean(values);
    let q1 = percentile(values, 25.0);
    let q3 = percentile(values, 75.0);

    VariantStats {
        variant,
        mean,
        median: percentile(values, 50.0),
        std_dev: sample_std_dev(values, mean),
        min: min(values),
        max: max(values),
        q1,
        q3,
        iqr: q3 - q1,
        count: values.len(),
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n − 1 denominator); zero for a single value
pub fn sample_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance =
        values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

pub fn min(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .unwrap_or(0.0)
}

pub fn max(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .unwrap_or(0.0)
}

/// Interpolated percentile over an unsorted slice
pub fn percentile(values: &[f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    if values.len() == 1 {
        return values[0];
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = (pct / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let fraction = rank - lower as f64;

    sorted[lower] + fraction * (sorted[upper] - sorted[lower])
}
