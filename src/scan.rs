//! Every-pair correlation screening and the correlation matrix.
//!
//! Pairs are independent and only read the dataset, so with the `parallel`
//! feature the scan fans out over rayon's pool. Large column lists grow as
//! `O(n^2)` pairs; callers that need to bound the work can shard
//! [`column_pairs`] themselves and call [`correlate`] per pair.

use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use crate::correlation::{correlate, pearson, CorrelationOptions, CorrelationResult, Method};
use crate::dataset::Dataset;
use crate::{Result, StatsError};

/// Thresholds and methods for a combinatorial scan.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanConfig {
    /// Minimum `|r|` for a pair to survive.
    pub threshold: f64,
    /// Maximum p-value for a pair to survive.
    pub p_threshold: f64,
    pub methods: Vec<Method>,
    pub options: CorrelationOptions,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            p_threshold: 0.05,
            methods: vec![Method::Pearson],
            options: CorrelationOptions::default(),
        }
    }
}

impl ScanConfig {
    pub fn new(threshold: f64, p_threshold: f64) -> Self {
        Self {
            threshold,
            p_threshold,
            ..Self::default()
        }
    }

    pub fn with_methods(mut self, methods: Vec<Method>) -> Self {
        self.methods = methods;
        self
    }

    pub fn with_options(mut self, options: CorrelationOptions) -> Self {
        self.options = options;
        self
    }

    /// Check thresholds and methods before any pair is evaluated.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(StatsError::InvalidParameter {
                name: "threshold",
                reason: format!("must be within [0, 1], got {}", self.threshold),
            });
        }
        if !(0.0..=1.0).contains(&self.p_threshold) {
            return Err(StatsError::InvalidParameter {
                name: "p_threshold",
                reason: format!("must be within [0, 1], got {}", self.p_threshold),
            });
        }
        if self.methods.is_empty() {
            return Err(StatsError::InvalidParameter {
                name: "methods",
                reason: "at least one correlation method is required".to_string(),
            });
        }
        if let Some(&m) = self.methods.iter().find(|m| !m.is_supported()) {
            return Err(StatsError::UnsupportedMethod(m));
        }
        Ok(())
    }
}

/// One evaluated column pair.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PairScan {
    pub x: String,
    pub y: String,
    pub result: CorrelationResult,
    /// Whether any requested method met both thresholds.
    pub meets_criteria: bool,
}

/// Unordered pairs of distinct columns, in `(i, j)` order with `i < j`.
pub fn column_pairs<S: AsRef<str>>(columns: &[S]) -> Vec<(&str, &str)> {
    let mut pairs = Vec::with_capacity(columns.len() * columns.len().saturating_sub(1) / 2);
    for (i, a) in columns.iter().enumerate() {
        for b in &columns[i + 1..] {
            pairs.push((a.as_ref(), b.as_ref()));
        }
    }
    pairs
}

/// Evaluate every column pair and report whether it meets the thresholds.
///
/// Each pair keeps only the rows where both columns are finite. A pair that
/// cannot be evaluated carries its reason in `result.error` instead of
/// failing the scan.
pub fn evaluate_pairs<S: AsRef<str> + Sync>(
    dataset: &Dataset,
    columns: &[S],
    config: &ScanConfig,
) -> Result<Vec<PairScan>> {
    config.validate()?;
    let pairs = column_pairs(columns);

    let eval = |&(a, b): &(&str, &str)| {
        let (xs, ys) = dataset.paired(a, b);
        let result = correlate(&xs, &ys, &config.methods, &config.options)
            .unwrap_or_else(|e| CorrelationResult::failed(&e));
        let meets_criteria = result.meets(&config.methods, config.threshold, config.p_threshold);
        PairScan {
            x: a.to_string(),
            y: b.to_string(),
            result,
            meets_criteria,
        }
    };

    #[cfg(feature = "parallel")]
    let scanned: Vec<PairScan> = pairs.par_iter().map(eval).collect();
    #[cfg(not(feature = "parallel"))]
    let scanned: Vec<PairScan> = pairs.iter().map(eval).collect();

    Ok(scanned)
}

/// Pairs meeting the thresholds, in column-pair order.
///
/// ```
/// use assay::{scan_pairs, Dataset, ScanConfig, Value};
///
/// let data = Dataset::from_pairs((1..=4).map(|i| {
///     vec![("A", Value::from(i as f64)), ("B", Value::from(2.0 * i as f64))]
/// }));
/// let hits = scan_pairs(&data, &["A", "B"], &ScanConfig::new(0.99, 0.05)).unwrap();
/// assert_eq!(hits.len(), 1);
/// assert_eq!((hits[0].x.as_str(), hits[0].y.as_str()), ("A", "B"));
/// ```
pub fn scan_pairs<S: AsRef<str> + Sync>(
    dataset: &Dataset,
    columns: &[S],
    config: &ScanConfig,
) -> Result<Vec<PairScan>> {
    let all = evaluate_pairs(dataset, columns, config)?;
    let total = all.len();
    let failed = all.iter().filter(|p| p.result.is_error()).count();
    let hits: Vec<PairScan> = all.into_iter().filter(|p| p.meets_criteria).collect();
    debug!(
        pairs = total,
        failed,
        survivors = hits.len(),
        threshold = config.threshold,
        p_threshold = config.p_threshold,
        "correlation scan complete"
    );
    Ok(hits)
}

/// Symmetric matrix of Pearson coefficients keyed by variable name.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CorrelationMatrix {
    names: Vec<String>,
    /// Row-major `names.len()^2` coefficients.
    values: Vec<f64>,
}

impl CorrelationMatrix {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Coefficient by position. Panics when out of bounds.
    pub fn at(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.names.len() + j]
    }

    /// Coefficient by name.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        Some(self.at(self.index_of(a)?, self.index_of(b)?))
    }

    /// Nested `name -> name -> r` view.
    pub fn to_nested(&self) -> BTreeMap<String, BTreeMap<String, f64>> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let row = self
                    .names
                    .iter()
                    .enumerate()
                    .map(|(j, b)| (b.clone(), self.at(i, j)))
                    .collect();
                (a.clone(), row)
            })
            .collect()
    }

    /// Build from the named columns of a dataset.
    pub fn from_dataset<S: AsRef<str>>(dataset: &Dataset, variables: &[S]) -> Self {
        let columns: Vec<(&str, Vec<f64>)> = variables
            .iter()
            .map(|v| (v.as_ref(), dataset.column(v.as_ref())))
            .collect();
        correlation_matrix(&columns)
    }
}

/// Pearson correlation for every pair of aligned columns.
///
/// The diagonal is 1. Off-diagonal entries use the rows where both columns
/// are finite and are 0 when the coefficient is undefined (fewer than three
/// pairs, or a constant column). No significance filtering happens here.
pub fn correlation_matrix<S, V>(columns: &[(S, V)]) -> CorrelationMatrix
where
    S: AsRef<str>,
    V: AsRef<[f64]>,
{
    let m = columns.len();
    let mut values = vec![0.0; m * m];
    for i in 0..m {
        values[i * m + i] = 1.0;
        for j in (i + 1)..m {
            let r = pearson(columns[i].1.as_ref(), columns[j].1.as_ref()).unwrap_or(0.0);
            values[i * m + j] = r;
            values[j * m + i] = r;
        }
    }
    CorrelationMatrix {
        names: columns.iter().map(|(n, _)| n.as_ref().to_string()).collect(),
        values,
    }
}
