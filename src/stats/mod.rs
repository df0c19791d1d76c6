//! Statistics: descriptive battery, Welch comparison, Pearson correlation.
//!
//! Shared moment helpers live here so every stage agrees on what "constant"
//! means: a column whose minimum equals its maximum has exactly zero variance,
//! regardless of floating-point residue in the mean.

pub mod correlation;
pub mod descriptive;
pub mod welch;

pub use correlation::*;
pub use descriptive::*;
pub use welch::*;

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance (n - 1 denominator); `None` below two values.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    if is_constant(values) {
        return Some(0.0);
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some(ss / (values.len() as f64 - 1.0))
}

/// Sample standard deviation; `None` below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}

/// True when every value is identical (vacuously true for empty input).
pub fn is_constant(values: &[f64]) -> bool {
    match values.split_first() {
        Some((first, rest)) => rest.iter().all(|v| v == first),
        None => true,
    }
}

/// Round half away from zero to 2 decimals.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variance_needs_two_values() {
        assert_eq!(sample_variance(&[]), None);
        assert_eq!(sample_variance(&[3.0]), None);
        assert_eq!(sample_variance(&[1.0, 3.0]), Some(2.0));
    }

    #[test]
    fn constant_columns_have_exact_zero_variance() {
        assert_eq!(sample_variance(&[0.1, 0.1, 0.1]), Some(0.0));
        assert_eq!(sample_std(&[5000.0; 4]), Some(0.0));
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(-2.346), -2.35);
        assert_eq!(round2(2.0), 2.0);
    }
}
