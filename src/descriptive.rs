//! Per-column descriptive statistics.

use std::cmp::Ordering;

use crate::{Result, StatsError};

/// Summary of one numeric column.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Summary {
    /// Number of finite values summarised.
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n - 1).
    pub std_dev: f64,
    /// Sample variance (n - 1). Zero for a single value.
    pub variance: f64,
    /// Mean of `((x - mean) / std_dev)^3` (biased).
    pub skewness: f64,
    /// Mean of `((x - mean) / std_dev)^4`, minus 3 (biased).
    pub kurtosis: f64,
    pub min: f64,
    pub max: f64,
    pub q25: f64,
    pub q75: f64,
    pub iqr: f64,
    /// Values outside `[q25 - 1.5 * iqr, q75 + 1.5 * iqr]`, in input order.
    pub outliers: Vec<f64>,
    /// `|skewness| < 1 && |kurtosis| < 3`.
    ///
    /// A shape heuristic for flagging obviously skewed or heavy-tailed columns,
    /// not a normality test. It carries no significance level.
    pub roughly_normal: bool,
}

impl Summary {
    /// Tukey fences used for outlier detection.
    pub fn fences(&self) -> (f64, f64) {
        (self.q25 - 1.5 * self.iqr, self.q75 + 1.5 * self.iqr)
    }
}

/// Summarise the finite values of `values`.
///
/// NaN and infinite entries are ignored. Returns [`StatsError::EmptyInput`]
/// when nothing finite remains.
///
/// ```
/// let s = assay::describe(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0, f64::NAN]).unwrap();
/// assert_eq!(s.count, 8);
/// assert_eq!(s.mean, 5.0);
/// assert_eq!(s.median, 4.5);
/// ```
pub fn describe(values: &[f64]) -> Result<Summary> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return Err(StatsError::EmptyInput);
    }

    let n = finite.len() as f64;
    let mean = finite.iter().sum::<f64>() / n;
    let sum_sq: f64 = finite.iter().map(|&v| (v - mean) * (v - mean)).sum();
    let variance = if finite.len() > 1 { sum_sq / (n - 1.0) } else { 0.0 };
    let std_dev = variance.sqrt();

    // z-scores use the sample sd; the moments average over n.
    let (skewness, kurtosis) = if std_dev > 0.0 {
        let (m3, m4) = finite.iter().fold((0.0, 0.0), |(m3, m4), &v| {
            let z = (v - mean) / std_dev;
            (m3 + z.powi(3), m4 + z.powi(4))
        });
        (m3 / n, m4 / n - 3.0)
    } else {
        (0.0, 0.0)
    };

    let mut sorted = finite.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let median = quantile_sorted(&sorted, 0.5);
    let q25 = quantile_sorted(&sorted, 0.25);
    let q75 = quantile_sorted(&sorted, 0.75);
    let iqr = q75 - q25;

    let (lo, hi) = (q25 - 1.5 * iqr, q75 + 1.5 * iqr);
    let outliers = finite.iter().copied().filter(|&v| v < lo || v > hi).collect();

    Ok(Summary {
        count: finite.len(),
        mean,
        median,
        std_dev,
        variance,
        skewness,
        kurtosis,
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        q25,
        q75,
        iqr,
        outliers,
        roughly_normal: skewness.abs() < 1.0 && kurtosis.abs() < 3.0,
    })
}

/// Quantile of ascending `sorted` by linear interpolation between order
/// statistics (`h = (n - 1) * q`).
///
/// `sorted` must be non-empty and `q` in `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    debug_assert!((0.0..=1.0).contains(&q));
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}
