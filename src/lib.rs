//! Statistical screening and dimensionality reduction for tabular geochemistry data.
//!
//! The engine works on a [`Dataset`]: an ordered list of rows, each mapping a
//! column name to a raw cell value (number, numeric-looking text, free text, or
//! missing). Everything is an in-memory batch computation; nothing here does I/O.
//!
//! - [`descriptive`]: per-column summaries with IQR outliers.
//! - [`correlation`]: Pearson/Spearman correlation, significance, OLS regression.
//! - [`scan`]: every-pair screening and the correlation matrix.
//! - [`grouping`]: pre-PCA variable group suggestions.
//! - [`pca`]: principal component analysis with k-means labels on (PC1, PC2).
//! - [`kmeans`]: k-means++ clustering and elbow-based choice of k.
//!
//! ```
//! use assay::{Dataset, Pca, Value, EXCLUDED};
//!
//! let rows = vec![
//!     vec![("SiO2", Value::from(48.1)), ("MgO", Value::from(9.2))],
//!     vec![("SiO2", Value::from(52.4)), ("MgO", Value::from(6.8))],
//!     vec![("SiO2", Value::from(" 55.0 ")), ("MgO", Value::from(5.1))],
//!     vec![("SiO2", Value::from(61.3)), ("MgO", Value::Missing)],
//!     vec![("SiO2", Value::from(66.7)), ("MgO", Value::from(1.9))],
//! ];
//! let data = Dataset::from_pairs(rows);
//!
//! let result = Pca::new().with_seed(7).fit(&data, &["SiO2", "MgO"]).unwrap();
//! assert_eq!(result.clusters.len(), 5);
//! assert_eq!(result.clusters[3], EXCLUDED);
//! ```
//!
//! # Randomness
//!
//! The first k-means++ centroid is the only random draw in the whole pipeline.
//! Pass a seed (or your own RNG) to make runs reproducible.

use thiserror::Error;

pub mod correlation;
pub mod dataset;
pub mod descriptive;
pub mod distribution;
pub mod eigen;
pub mod grouping;
pub mod kmeans;
pub mod pca;
pub mod scan;

pub use correlation::{
    correlate, pearson, CorrelationOptions, CorrelationResult, Method, PValueMethod, RankMethod,
};
pub use dataset::{Dataset, Row, Value};
pub use descriptive::{describe, Summary};
pub use grouping::{suggest_groups, GroupSuggestion, HeuristicProfile, SuggestionSource};
pub use kmeans::{wcss, KMeans, KMeansFit, OptimalK};
pub use pca::{Pca, PcaResult, EXCLUDED};
pub use scan::{
    column_pairs, correlation_matrix, evaluate_pairs, scan_pairs, CorrelationMatrix, PairScan,
    ScanConfig,
};

/// Errors returned by the engine.
///
/// Every failure is local and synchronous; there is nothing to retry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    /// No finite values were left after filtering.
    #[error("no finite values to summarise")]
    EmptyInput,
    /// Fewer than three finite (x, y) pairs.
    #[error("need at least 3 valid paired points, found {valid_pairs}")]
    InsufficientData { valid_pairs: usize },
    /// Too few rows had a value for every requested variable.
    #[error(
        "need at least {required} rows with every variable present, found {valid_rows} (valid values per variable: {})",
        format_counts(.valid_counts)
    )]
    InsufficientSamples {
        valid_rows: usize,
        required: usize,
        valid_counts: Vec<(String, usize)>,
    },
    /// Fewer than two variables were requested.
    #[error(
        "need at least 2 variables, got {requested} (valid values per variable: {})",
        format_counts(.valid_counts)
    )]
    InsufficientVariables {
        requested: usize,
        valid_counts: Vec<(String, usize)>,
    },
    /// The requested correlation method has no implementation.
    #[error("correlation method `{0}` is not supported")]
    UnsupportedMethod(Method),
    /// A threshold or configuration value is out of range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

fn format_counts(counts: &[(String, usize)]) -> String {
    if counts.is_empty() {
        return "none".to_string();
    }
    counts
        .iter()
        .map(|(name, n)| format!("{name}={n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = StatsError> = std::result::Result<T, E>;
