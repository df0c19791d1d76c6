//! Dry-vs-wet price comparison (Welch's unequal-variance t-test).
//!
//! Days are split on rainfall: exactly `0 mm` is dry, `> 0 mm` is wet.
//! Degenerate inputs are reported through `ComparisonReason`, never as errors.
//! Guards run in order and the first match wins:
//!
//! 1. overall price spread is zero or undefined → `ConstantPrice`
//! 2. either group has at most one day → `InsufficientGroupSize`
//! 3. both groups have zero spread → `ZeroVarianceBothGroups`
//! 4. otherwise the test runs → `Completed` (or `IndeterminateResult` when
//!    no p-value can be derived)

use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::debug;

use crate::domain::{AlignedRecord, ComparisonReason, ComparisonResult};
use crate::stats::{mean, sample_std, sample_variance};

/// Raw Welch test output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WelchTest {
    pub statistic: f64,
    pub degrees_of_freedom: f64,
    /// Two-sided p-value; `None` when the t distribution is undefined.
    pub p_value: Option<f64>,
}

/// Welch's t-test of `mean(a) - mean(b)`. Needs at least two values per side.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Option<WelchTest> {
    let (na, nb) = (a.len() as f64, b.len() as f64);
    let va = sample_variance(a)? / na;
    let vb = sample_variance(b)? / nb;
    let se2 = va + vb;

    let statistic = (mean(a)? - mean(b)?) / se2.sqrt();
    let degrees_of_freedom = se2 * se2 / (va * va / (na - 1.0) + vb * vb / (nb - 1.0));

    let p_value = if statistic.is_finite() {
        StudentsT::new(0.0, 1.0, degrees_of_freedom)
            .ok()
            .map(|dist| (2.0 * dist.sf(statistic.abs())).min(1.0))
            .filter(|p| p.is_finite())
    } else {
        None
    };

    Some(WelchTest {
        statistic,
        degrees_of_freedom,
        p_value,
    })
}

/// Compare prices on dry days against prices on wet days.
pub fn compare_wet_vs_dry(cleaned: &[AlignedRecord]) -> ComparisonResult {
    let all: Vec<f64> = cleaned.iter().map(|r| r.price).collect();
    let dry: Vec<f64> = cleaned.iter().filter(|r| r.is_dry()).map(|r| r.price).collect();
    let wet: Vec<f64> = cleaned.iter().filter(|r| r.is_wet()).map(|r| r.price).collect();

    let mut result = ComparisonResult {
        statistic: None,
        p_value: None,
        reason: ComparisonReason::Completed,
        dry_count: dry.len(),
        wet_count: wet.len(),
        dry_mean: mean(&dry),
        wet_mean: mean(&wet),
        degrees_of_freedom: None,
    };

    result.reason = match guard(&all, &dry, &wet) {
        Some(reason) => reason,
        None => match welch_t_test(&dry, &wet) {
            Some(test) => {
                result.statistic = test.statistic.is_finite().then_some(test.statistic);
                result.degrees_of_freedom = Some(test.degrees_of_freedom);
                result.p_value = test.p_value;
                if test.p_value.is_some() {
                    ComparisonReason::Completed
                } else {
                    ComparisonReason::IndeterminateResult
                }
            }
            // Unreachable after the guards: both groups hold at least two values.
            None => ComparisonReason::IndeterminateResult,
        },
    };

    debug!(
        dry = result.dry_count,
        wet = result.wet_count,
        reason = ?result.reason,
        statistic = ?result.statistic,
        p_value = ?result.p_value,
        "Wet/dry comparison finished"
    );
    result
}

/// First matching degeneracy, if any.
fn guard(all: &[f64], dry: &[f64], wet: &[f64]) -> Option<ComparisonReason> {
    let overall_std = sample_std(all);
    if overall_std.is_none_or(|s| s == 0.0 || !s.is_finite()) {
        return Some(ComparisonReason::ConstantPrice);
    }
    if dry.len() <= 1 || wet.len() <= 1 {
        return Some(ComparisonReason::InsufficientGroupSize);
    }
    if sample_std(dry) == Some(0.0) && sample_std(wet) == Some(0.0) {
        return Some(ComparisonReason::ZeroVarianceBothGroups);
    }
    None
}
