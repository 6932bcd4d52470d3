//! Property tests for summaries, correlation and the correlation matrix.
//!
//! Values are drawn from modest ranges so that sums of squares stay well inside
//! f64 precision; the invariants themselves are scale-free.

use assay::correlation::{ranks, RankMethod};
use assay::{correlate, correlation_matrix, describe, pearson, CorrelationOptions, Method};
use proptest::prelude::*;

fn column(len: std::ops::RangeInclusive<usize>) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1e3..1e3_f64, len)
}

/// `k` named columns of identical length `n`.
fn columns(k: usize, n: usize) -> impl Strategy<Value = Vec<(String, Vec<f64>)>> {
    prop::collection::vec(prop::collection::vec(-50.0..50.0_f64, n..=n), k..=k).prop_map(
        |cols| {
            cols.into_iter()
                .enumerate()
                .map(|(i, c)| (format!("v{i}"), c))
                .collect()
        },
    )
}

fn spread(xs: &[f64]) -> f64 {
    let lo = xs.iter().cloned().fold(f64::INFINITY, f64::min);
    let hi = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    hi - lo
}

proptest! {
    // ====================================================================
    // Descriptive summaries
    // ====================================================================

    /// Outliers are exactly the values outside the Tukey fences, in input order.
    #[test]
    fn outliers_are_exactly_values_outside_fences(xs in column(1..=60)) {
        let s = describe(&xs).unwrap();
        let (lo, hi) = s.fences();
        let expected: Vec<f64> = xs.iter().cloned().filter(|&v| v < lo || v > hi).collect();
        prop_assert_eq!(&s.outliers, &expected);
    }

    /// Quartiles and median sit between min and max, in order.
    #[test]
    fn quartiles_are_ordered(xs in column(1..=60)) {
        let s = describe(&xs).unwrap();
        prop_assert!(s.min <= s.q25 && s.q25 <= s.median);
        prop_assert!(s.median <= s.q75 && s.q75 <= s.max);
        prop_assert!(s.iqr >= 0.0);
        prop_assert!(s.variance >= 0.0);
    }

    /// Non-finite entries never change the summary.
    #[test]
    fn non_finite_values_are_ignored(xs in column(1..=30)) {
        let mut noisy = xs.clone();
        noisy.push(f64::NAN);
        noisy.insert(0, f64::INFINITY);
        prop_assert_eq!(describe(&noisy).unwrap(), describe(&xs).unwrap());
    }

    // ====================================================================
    // Correlation
    // ====================================================================

    /// Any non-constant column is perfectly correlated with itself.
    #[test]
    fn pearson_of_self_is_one(xs in column(3..=40)) {
        prop_assume!(spread(&xs) > 1e-6);
        let r = pearson(&xs, &xs).unwrap();
        prop_assert!((r - 1.0).abs() < 1e-9, "r = {r}");
    }

    /// Coefficients stay in [-1, 1] and p-values in [0, 1].
    #[test]
    fn coefficients_and_p_values_in_range(
        (x, y) in (3usize..=40).prop_flat_map(|n| (
            prop::collection::vec(-1e3..1e3_f64, n..=n),
            prop::collection::vec(-1e3..1e3_f64, n..=n),
        )),
    ) {
        let r = correlate(&x, &y, &[Method::Pearson, Method::Spearman], &CorrelationOptions::default())
            .unwrap();
        for (c, p) in [(r.pearson, r.pearson_p), (r.spearman, r.spearman_p)] {
            if let (Some(c), Some(p)) = (c, p) {
                prop_assert!((-1.0 - 1e-12..=1.0 + 1e-12).contains(&c), "coefficient {c}");
                prop_assert!((0.0..=1.0).contains(&p), "p-value {p}");
            }
        }
        if let Some(r2) = r.r_squared {
            prop_assert!(r2 <= 1.0 + 1e-9, "r^2 = {r2}");
        }
    }

    /// Average ranks always sum to n(n+1)/2, ties or not.
    #[test]
    fn average_ranks_preserve_rank_sum(
        xs in prop::collection::vec((0i32..6).prop_map(f64::from), 1..=40),
    ) {
        let n = xs.len() as f64;
        let sum: f64 = ranks(&xs, RankMethod::Average).iter().sum();
        prop_assert!((sum - n * (n + 1.0) / 2.0).abs() < 1e-9);
    }

    // ====================================================================
    // Correlation matrix
    // ====================================================================

    /// Symmetric, unit diagonal, every entry in [-1, 1].
    #[test]
    fn matrix_is_symmetric_with_unit_diagonal(cols in (2usize..=5, 3usize..=12)
        .prop_flat_map(|(k, n)| columns(k, n)))
    {
        let m = correlation_matrix(&cols);
        prop_assert_eq!(m.len(), cols.len());
        for i in 0..m.len() {
            prop_assert_eq!(m.at(i, i), 1.0);
            for j in 0..m.len() {
                prop_assert_eq!(m.at(i, j), m.at(j, i));
                prop_assert!(m.at(i, j).abs() <= 1.0 + 1e-12);
            }
        }
    }
}
