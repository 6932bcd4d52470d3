//! Principal component analysis with cluster labels on the first two scores.
//!
//! The pipeline for one fit:
//!
//! 1. keep rows where every requested variable parses to a finite number;
//! 2. mean-centre (optionally scale to unit variance) and form the sample
//!    covariance matrix;
//! 3. eigen-decompose it, largest eigenvalue first;
//! 4. project the clean rows onto the retained components;
//! 5. choose k with the elbow rule and run k-means on (PC1, PC2);
//! 6. spread the labels back over the original rows, [`EXCLUDED`] for dropped ones.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::dataset::Dataset;
use crate::eigen::symmetric_eigen;
use crate::kmeans::{KMeans, OptimalK, DEFAULT_MAX_ITER, DEFAULT_MAX_K};
use crate::{Result, StatsError};

/// Cluster label for rows dropped during cleaning.
pub const EXCLUDED: i32 = -1;

/// Fewest complete rows a fit accepts.
pub const MIN_SAMPLES: usize = 3;

/// Fewest variables a fit accepts.
pub const MIN_VARIABLES: usize = 2;

/// Components retained when none are requested.
pub const DEFAULT_COMPONENTS: usize = 2;

/// PCA configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pca {
    n_components: Option<usize>,
    standardize: bool,
    max_k: usize,
    max_iter: usize,
    seed: Option<u64>,
}

impl Default for Pca {
    fn default() -> Self {
        Self {
            n_components: None,
            standardize: false,
            max_k: DEFAULT_MAX_K,
            max_iter: DEFAULT_MAX_ITER,
            seed: None,
        }
    }
}

/// Output of one PCA fit.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PcaResult {
    /// Variables in input order.
    pub variables: Vec<String>,
    /// Retained components.
    pub n_components: usize,
    /// Eigenvalue per retained component, descending.
    pub eigenvalues: Vec<f64>,
    /// Sum of all eigenvalues, retained or not.
    pub total_variance: f64,
    /// Percent of total variance per retained component.
    pub explained_variance: Vec<f64>,
    /// Running sum of `explained_variance`.
    pub cumulative_variance: Vec<f64>,
    /// `loadings[c][v]`: weight of variable `v` in component `c`.
    pub loadings: Vec<Vec<f64>>,
    /// `scores[s][c]`: clean sample `s` projected on component `c`.
    pub scores: Vec<Vec<f64>>,
    /// Original row index of each clean sample.
    pub row_indices: Vec<usize>,
    /// Column means used for centring.
    pub means: Vec<f64>,
    /// Cluster per original row; [`EXCLUDED`] where the row was dropped.
    pub clusters: Vec<i32>,
    /// Number of occupied clusters; labels are dense in `0..n_clusters`.
    pub n_clusters: usize,
}

impl PcaResult {
    /// Original row indices dropped during cleaning.
    pub fn excluded_rows(&self) -> Vec<usize> {
        self.clusters
            .iter()
            .enumerate()
            .filter_map(|(i, &c)| (c == EXCLUDED).then_some(i))
            .collect()
    }

    /// Loadings of one variable across the retained components.
    pub fn variable_loadings(&self, variable: &str) -> Option<Vec<f64>> {
        let v = self.variables.iter().position(|n| n == variable)?;
        Some(self.loadings.iter().map(|c| c[v]).collect())
    }
}

impl Pca {
    pub fn new() -> Self {
        Self::default()
    }

    /// Components to retain (capped by variable count and `rows - 1`).
    pub fn with_components(mut self, n: usize) -> Self {
        self.n_components = Some(n);
        self
    }

    /// Scale every variable to unit variance before decomposition, which
    /// amounts to PCA on the correlation matrix.
    pub fn with_standardize(mut self, standardize: bool) -> Self {
        self.standardize = standardize;
        self
    }

    /// Upper bound on k for the elbow search.
    pub fn with_max_k(mut self, max_k: usize) -> Self {
        self.max_k = max_k;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Seed for the k-means++ first draw.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fit on `variables` of `dataset`.
    ///
    /// Draws the clustering seed from `seed` if set, otherwise from OS entropy.
    pub fn fit<S: AsRef<str>>(&self, dataset: &Dataset, variables: &[S]) -> Result<PcaResult> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        self.fit_with_rng(dataset, variables, &mut rng)
    }

    /// Fit using the caller's RNG for the clustering step.
    pub fn fit_with_rng<S, R>(
        &self,
        dataset: &Dataset,
        variables: &[S],
        rng: &mut R,
    ) -> Result<PcaResult>
    where
        S: AsRef<str>,
        R: Rng + ?Sized,
    {
        if self.n_components == Some(0) {
            return Err(StatsError::InvalidParameter {
                name: "n_components",
                reason: "must be at least 1".to_string(),
            });
        }

        let clean = dataset.clean(variables);
        if variables.len() < MIN_VARIABLES {
            return Err(StatsError::InsufficientVariables {
                requested: variables.len(),
                valid_counts: clean.valid_counts,
            });
        }
        let n = clean.samples.len();
        if n < MIN_SAMPLES {
            return Err(StatsError::InsufficientSamples {
                valid_rows: n,
                required: MIN_SAMPLES,
                valid_counts: clean.valid_counts,
            });
        }

        let p = variables.len();
        let means: Vec<f64> = (0..p)
            .map(|j| clean.samples.iter().map(|s| s[j]).sum::<f64>() / n as f64)
            .collect();
        let mut centred: Vec<Vec<f64>> = clean
            .samples
            .iter()
            .map(|s| s.iter().zip(&means).map(|(x, m)| x - m).collect())
            .collect();
        if self.standardize {
            for j in 0..p {
                let sd = (centred.iter().map(|r| r[j] * r[j]).sum::<f64>() / (n - 1) as f64).sqrt();
                // Constant columns stay at zero.
                if sd > 0.0 {
                    centred.iter_mut().for_each(|r| r[j] /= sd);
                }
            }
        }

        let cov = covariance(&centred, p);
        let eig = symmetric_eigen(&cov, p);
        // Covariance is PSD; negative eigenvalues are rounding noise.
        let all_values: Vec<f64> = eig.values.iter().map(|v| v.max(0.0)).collect();
        let total_variance: f64 = all_values.iter().sum();

        let n_components = self
            .n_components
            .unwrap_or(DEFAULT_COMPONENTS)
            .min(p)
            .min(n - 1);

        let eigenvalues = all_values[..n_components].to_vec();
        let explained_variance: Vec<f64> = eigenvalues
            .iter()
            .map(|v| {
                if total_variance > 0.0 {
                    v / total_variance * 100.0
                } else {
                    0.0
                }
            })
            .collect();
        let cumulative_variance = explained_variance
            .iter()
            .scan(0.0, |acc, &v| {
                *acc += v;
                Some(*acc)
            })
            .collect();
        let loadings: Vec<Vec<f64>> = eig.vectors[..n_components].to_vec();
        let scores = project(&centred, &loadings);

        // Clusters always come from the (PC1, PC2) plane.
        let plane = project(&centred, &eig.vectors[..MIN_VARIABLES]);
        let k = OptimalK::new()
            .with_max_k(self.max_k)
            .with_max_iter(self.max_iter)
            .select(&plane, rng);
        let fit = KMeans::new(k)
            .with_max_iter(self.max_iter)
            .fit(&plane, rng)
            .compact();

        let mut clusters = vec![EXCLUDED; dataset.len()];
        for (&row, &label) in clean.row_indices.iter().zip(&fit.labels) {
            clusters[row] = label as i32;
        }

        debug!(
            rows = dataset.len(),
            kept = n,
            excluded = clean.excluded.len(),
            variables = p,
            n_components,
            k,
            "pca fit complete"
        );

        Ok(PcaResult {
            variables: variables.iter().map(|v| v.as_ref().to_string()).collect(),
            n_components,
            eigenvalues,
            total_variance,
            explained_variance,
            cumulative_variance,
            loadings,
            scores,
            row_indices: clean.row_indices,
            means,
            clusters,
            n_clusters: fit.n_clusters(),
        })
    }
}

/// Sample covariance (`n - 1`) of already-centred rows, row-major `p * p`.
fn covariance(centred: &[Vec<f64>], p: usize) -> Vec<f64> {
    let denom = (centred.len() - 1) as f64;
    let mut cov = vec![0.0; p * p];
    for i in 0..p {
        for j in i..p {
            let c = centred.iter().map(|r| r[i] * r[j]).sum::<f64>() / denom;
            cov[i * p + j] = c;
            cov[j * p + i] = c;
        }
    }
    cov
}

fn project(centred: &[Vec<f64>], components: &[Vec<f64>]) -> Vec<Vec<f64>> {
    centred
        .iter()
        .map(|row| {
            components
                .iter()
                .map(|c| row.iter().zip(c).map(|(x, w)| x * w).sum())
                .collect()
        })
        .collect()
}
