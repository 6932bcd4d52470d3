//! Pairwise correlation, significance and simple linear regression.
//!
//! Inputs are paired by index and any pair with a non-finite member is
//! dropped before anything is computed, so `x` and `y` never drift out of
//! alignment.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::distribution::{legacy_bucket_p_value, student_t_two_sided};
use crate::{Result, StatsError};

/// Minimum number of finite pairs for any correlation or regression.
pub const MIN_PAIRS: usize = 3;

/// Correlation methods a caller may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Method {
    Pearson,
    Spearman,
    /// Accepted as a name but not implemented; requesting it is an error.
    Kendall,
}

impl Method {
    pub fn is_supported(self) -> bool {
        !matches!(self, Method::Kendall)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Pearson => "pearson",
            Method::Spearman => "spearman",
            Method::Kendall => "kendall",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pearson" => Ok(Method::Pearson),
            "spearman" => Ok(Method::Spearman),
            "kendall" => Ok(Method::Kendall),
            other => Err(StatsError::InvalidParameter {
                name: "method",
                reason: format!("unknown correlation method `{other}`"),
            }),
        }
    }
}

/// How a correlation coefficient is turned into a p-value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PValueMethod {
    /// Two-sided Student's t tail with `n - 2` degrees of freedom.
    #[default]
    StudentT,
    /// Legacy bucketed approximation (0.0001 / 0.001 / 0.01 / 0.05 / 0.1 / 0.5).
    LegacyBuckets,
}

/// Rank assignment for Spearman correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RankMethod {
    /// Tied values share the mean of the positions they occupy.
    #[default]
    Average,
    /// 1-based position in a stable sort; ties are not averaged (legacy).
    Ordinal,
}

/// Options shared by every correlation computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CorrelationOptions {
    pub p_value: PValueMethod,
    pub ranks: RankMethod,
}

impl CorrelationOptions {
    pub fn with_p_value(mut self, p_value: PValueMethod) -> Self {
        self.p_value = p_value;
        self
    }

    pub fn with_ranks(mut self, ranks: RankMethod) -> Self {
        self.ranks = ranks;
        self
    }

    /// Bucketed p-values and ordinal ranks, matching earlier releases.
    pub fn legacy() -> Self {
        Self {
            p_value: PValueMethod::LegacyBuckets,
            ranks: RankMethod::Ordinal,
        }
    }
}

/// Outcome of correlating one pair of variables.
///
/// Fields that were not requested or are undefined for the data (e.g. Pearson
/// on a constant column) are `None`, never zero.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CorrelationResult {
    /// Finite pairs used.
    pub n: usize,
    pub pearson: Option<f64>,
    pub pearson_p: Option<f64>,
    pub spearman: Option<f64>,
    pub spearman_p: Option<f64>,
    pub r_squared: Option<f64>,
    pub slope: Option<f64>,
    pub intercept: Option<f64>,
    /// Set instead of the statistics when the pair could not be evaluated.
    pub error: Option<String>,
}

impl CorrelationResult {
    /// A result carrying only the failure reason.
    pub fn failed(err: &StatsError) -> Self {
        Self {
            error: Some(err.to_string()),
            ..Self::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// `(coefficient, p-value)` for `method`, when both were computed.
    pub fn coefficient(&self, method: Method) -> Option<(f64, f64)> {
        match method {
            Method::Pearson => self.pearson.zip(self.pearson_p),
            Method::Spearman => self.spearman.zip(self.spearman_p),
            Method::Kendall => None,
        }
    }

    /// Whether any of `methods` reaches `|r| >= threshold` with `p <= p_threshold`.
    pub fn meets(&self, methods: &[Method], threshold: f64, p_threshold: f64) -> bool {
        methods.iter().any(|&m| {
            self.coefficient(m)
                .is_some_and(|(r, p)| r.abs() >= threshold && p <= p_threshold)
        })
    }
}

/// Correlate `x` against `y` with the requested methods.
///
/// Pairs are formed by index; a pair is dropped when either side is not
/// finite. OLS regression of `y` on `x` is always fitted.
///
/// ```
/// use assay::{correlate, CorrelationOptions, Method};
///
/// let x = [1.0, 2.0, 3.0, 4.0];
/// let y = [2.0, 4.0, 6.0, 8.0];
/// let r = correlate(&x, &y, &[Method::Pearson], &CorrelationOptions::default()).unwrap();
/// assert!((r.pearson.unwrap() - 1.0).abs() < 1e-12);
/// assert!((r.slope.unwrap() - 2.0).abs() < 1e-12);
/// ```
pub fn correlate(
    x: &[f64],
    y: &[f64],
    methods: &[Method],
    options: &CorrelationOptions,
) -> Result<CorrelationResult> {
    if let Some(&m) = methods.iter().find(|m| !m.is_supported()) {
        return Err(StatsError::UnsupportedMethod(m));
    }

    let (xs, ys) = finite_pairs(x, y);
    let n = xs.len();
    if n < MIN_PAIRS {
        return Err(StatsError::InsufficientData { valid_pairs: n });
    }

    let mut result = CorrelationResult {
        n,
        ..CorrelationResult::default()
    };

    if methods.contains(&Method::Pearson) {
        result.pearson = pearson_coefficient(&xs, &ys);
        result.pearson_p = result.pearson.map(|r| p_value(r, n, options.p_value));
    }
    if methods.contains(&Method::Spearman) {
        let rx = ranks(&xs, options.ranks);
        let ry = ranks(&ys, options.ranks);
        result.spearman = pearson_coefficient(&rx, &ry);
        result.spearman_p = result.spearman.map(|r| p_value(r, n, options.p_value));
    }

    if let Some(fit) = linear_fit(&xs, &ys) {
        result.slope = Some(fit.slope);
        result.intercept = Some(fit.intercept);
        result.r_squared = fit.r_squared;
    }

    Ok(result)
}

/// Pearson correlation over pairwise-complete observations.
///
/// `None` with fewer than three finite pairs or when either side is constant.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let (xs, ys) = finite_pairs(x, y);
    if xs.len() < MIN_PAIRS {
        return None;
    }
    pearson_coefficient(&xs, &ys)
}

/// Ordinary least squares fit of `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// `None` when `y` is constant.
    pub r_squared: Option<f64>,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit a least squares line through already-cleaned pairs.
///
/// `None` for fewer than three points or constant `x`.
pub fn linear_fit(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    debug_assert_eq!(xs.len(), ys.len());
    let n = xs.len();
    if n < MIN_PAIRS {
        return None;
    }
    let mx = mean(xs);
    let my = mean(ys);
    let (sxx, sxy) = xs
        .iter()
        .zip(ys)
        .fold((0.0, 0.0), |(sxx, sxy), (&x, &y)| {
            (sxx + (x - mx) * (x - mx), sxy + (x - mx) * (y - my))
        });
    if sxx <= 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    let intercept = my - slope * mx;

    let ss_tot: f64 = ys.iter().map(|&y| (y - my) * (y - my)).sum();
    let r_squared = (ss_tot > 0.0).then(|| {
        let ss_res: f64 = xs
            .iter()
            .zip(ys)
            .map(|(&x, &y)| {
                let e = y - (slope * x + intercept);
                e * e
            })
            .sum();
        1.0 - ss_res / ss_tot
    });

    Some(LinearFit {
        slope,
        intercept,
        r_squared,
    })
}

/// Ranks of `values` (1-based).
pub fn ranks(values: &[f64], method: RankMethod) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    // `sort_by` is stable, so equal values keep input order.
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

    let mut out = vec![0.0; n];
    match method {
        RankMethod::Ordinal => {
            for (pos, &i) in order.iter().enumerate() {
                out[i] = (pos + 1) as f64;
            }
        }
        RankMethod::Average => {
            let mut start = 0;
            while start < n {
                let mut end = start + 1;
                while end < n && values[order[end]] == values[order[start]] {
                    end += 1;
                }
                // Positions start+1 ..= end share their mean.
                let avg = (start + 1 + end) as f64 / 2.0;
                for &i in &order[start..end] {
                    out[i] = avg;
                }
                start = end;
            }
        }
    }
    out
}

/// p-value for a coefficient `r` over `n` pairs.
///
/// NaN when `n < 3`: there are no degrees of freedom left.
pub fn p_value(r: f64, n: usize, method: PValueMethod) -> f64 {
    if n < MIN_PAIRS {
        return f64::NAN;
    }
    let t = t_statistic(r, n);
    match method {
        PValueMethod::StudentT => student_t_two_sided(t, (n - 2) as f64),
        PValueMethod::LegacyBuckets => legacy_bucket_p_value(t),
    }
}

/// `t = r * sqrt((n - 2) / (1 - r^2))`; infinite for `|r| = 1`, NaN for
/// `n < 3`.
pub fn t_statistic(r: f64, n: usize) -> f64 {
    if n < MIN_PAIRS {
        return f64::NAN;
    }
    let r = r.clamp(-1.0, 1.0);
    let denom = 1.0 - r * r;
    if denom <= f64::EPSILON {
        return f64::INFINITY.copysign(r);
    }
    r * ((n as f64 - 2.0) / denom).sqrt()
}

fn finite_pairs(x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
    x.iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(&a, &b)| (a, b))
        .unzip()
}

fn mean(v: &[f64]) -> f64 {
    v.iter().sum::<f64>() / v.len() as f64
}

fn pearson_coefficient(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let mx = mean(xs);
    let my = mean(ys);
    let (sxy, sxx, syy) = xs.iter().zip(ys).fold((0.0, 0.0, 0.0), |acc, (&x, &y)| {
        let (dx, dy) = (x - mx, y - my);
        (acc.0 + dx * dy, acc.1 + dx * dx, acc.2 + dy * dy)
    });
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}
