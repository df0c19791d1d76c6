//! Descriptive statistics battery for one numeric column.
//!
//! Conventions (kept deterministic across platforms):
//!
//! - non-finite values are treated as missing and dropped first
//! - quantiles use linear interpolation between closest ranks
//!   (`pos = p * (n - 1)`)
//! - the mode is the smallest value among the most frequent ones
//! - variance / standard deviation use the `n - 1` denominator
//! - skewness and excess kurtosis are bias-corrected when `n` allows it
//!   (`n > 2` and `n > 3` respectively) and fall back to the plain moment
//!   ratio otherwise; both are undefined for a zero-spread column
//! - every reported value is rounded to 2 decimals

use crate::domain::DescriptiveStats;
use crate::stats::{is_constant, round2, sample_variance};

/// Compute the battery, or `None` when no finite value remains.
pub fn compute_stats(values: &[f64]) -> Option<DescriptiveStats> {
    let mut data: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if data.is_empty() {
        return None;
    }
    data.sort_by(f64::total_cmp);

    let n = data.len();
    let mean = data.iter().sum::<f64>() / n as f64;
    let var = sample_variance(&data);
    let std = var.map(f64::sqrt);

    let min = data[0];
    let max = data[n - 1];
    let q1 = quantile_sorted(&data, 0.25);
    let median = quantile_sorted(&data, 0.5);
    let q3 = quantile_sorted(&data, 0.75);

    let cv = match std {
        Some(s) if s != 0.0 && mean != 0.0 => Some(s / mean * 100.0),
        _ => None,
    };

    let mad = data.iter().map(|v| (v - mean).abs()).sum::<f64>() / n as f64;

    Some(DescriptiveStats {
        count: n,
        mean: round2(mean),
        median: round2(median),
        mode: round2(mode_sorted(&data)),
        std: std.map(round2),
        var: var.map(round2),
        min: round2(min),
        max: round2(max),
        range: round2(max - min),
        q1: round2(q1),
        q3: round2(q3),
        iqr: round2(q3 - q1),
        cv: cv.map(round2),
        mad: round2(mad),
        skew: skewness(&data, mean).map(round2),
        kurt: excess_kurtosis(&data, mean).map(round2),
    })
}

/// Linear-interpolation quantile of an ascending, non-empty slice.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = p.clamp(0.0, 1.0) * (n as f64 - 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Most frequent value of an ascending, non-empty slice; ties go to the smallest.
pub fn mode_sorted(sorted: &[f64]) -> f64 {
    let mut best = sorted[0];
    let mut best_count = 0usize;

    let mut i = 0;
    while i < sorted.len() {
        let v = sorted[i];
        let mut j = i;
        while j < sorted.len() && sorted[j] == v {
            j += 1;
        }
        // Strictly greater: the first (smallest) run wins ties.
        if j - i > best_count {
            best = v;
            best_count = j - i;
        }
        i = j;
    }
    best
}

/// Central moment of order `k` (biased, `1/n`).
fn central_moment(data: &[f64], mean: f64, k: i32) -> f64 {
    data.iter().map(|v| (v - mean).powi(k)).sum::<f64>() / data.len() as f64
}

fn skewness(data: &[f64], mean: f64) -> Option<f64> {
    if is_constant(data) {
        return None;
    }
    let n = data.len() as f64;
    let m2 = central_moment(data, mean, 2);
    let m3 = central_moment(data, mean, 3);
    let g1 = m3 / m2.powf(1.5);
    if data.len() > 2 {
        Some(g1 * (n * (n - 1.0)).sqrt() / (n - 2.0))
    } else {
        Some(g1)
    }
}

fn excess_kurtosis(data: &[f64], mean: f64) -> Option<f64> {
    if is_constant(data) {
        return None;
    }
    let n = data.len() as f64;
    let m2 = central_moment(data, mean, 2);
    let m4 = central_moment(data, mean, 4);
    let ratio = m4 / (m2 * m2);
    if data.len() > 3 {
        Some(((n * n - 1.0) * ratio - 3.0 * (n - 1.0).powi(2)) / ((n - 2.0) * (n - 3.0)))
    } else {
        Some(ratio - 3.0)
    }
}
