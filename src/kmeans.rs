//! K-means clustering with k-means++ style seeding, and elbow selection of k.
//!
//! Seeding draws the first centroid uniformly at random; every later centroid
//! is the point farthest from all centroids chosen so far. That first draw is
//! the only source of randomness, and the caller supplies the RNG.
//!
//! ```
//! use assay::KMeans;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let points = vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//! ];
//! let mut rng = StdRng::seed_from_u64(1);
//! let fit = KMeans::new(2).fit(&points, &mut rng);
//! assert_eq!(fit.labels[0], fit.labels[1]);
//! assert_ne!(fit.labels[0], fit.labels[2]);
//! ```

use rand::Rng;
use tracing::{debug, trace};

/// Default iteration bound for Lloyd's algorithm.
pub const DEFAULT_MAX_ITER: usize = 100;

/// Default upper bound on k considered by [`OptimalK`].
pub const DEFAULT_MAX_K: usize = 6;

/// Hard cap on k considered by [`OptimalK`], whatever `max_k` says.
pub const ELBOW_K_CAP: usize = 4;

/// K-means configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KMeans {
    k: usize,
    max_iter: usize,
}

/// Result of a k-means run.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KMeansFit {
    /// Cluster index in `[0, k)` per input point.
    pub labels: Vec<usize>,
    pub centroids: Vec<Vec<f64>>,
    /// Lloyd iterations performed.
    pub iterations: usize,
}

impl KMeansFit {
    /// Within-cluster sum of squares of this fit over `points`.
    pub fn wcss(&self, points: &[Vec<f64>]) -> f64 {
        wcss(points, &self.labels, &self.centroids)
    }

    /// Clusters that own at least one point. Empty clusters keep a centroid
    /// but are not counted.
    pub fn n_clusters(&self) -> usize {
        self.occupied().into_iter().filter(|&u| u).count()
    }

    /// Drop centroids that own no point and renumber labels densely,
    /// preserving the order of the remaining clusters.
    pub fn compact(mut self) -> Self {
        let occupied = self.occupied();
        let mut remap = vec![0; occupied.len()];
        let mut next = 0;
        for (slot, &used) in remap.iter_mut().zip(&occupied) {
            if used {
                *slot = next;
                next += 1;
            }
        }
        for label in &mut self.labels {
            *label = remap.get(*label).copied().unwrap_or(*label);
        }
        self.centroids = self
            .centroids
            .into_iter()
            .zip(occupied)
            .filter_map(|(c, used)| used.then_some(c))
            .collect();
        self
    }

    fn occupied(&self) -> Vec<bool> {
        let mut used = vec![false; self.centroids.len()];
        for &l in &self.labels {
            if let Some(u) = used.get_mut(l) {
                *u = true;
            }
        }
        used
    }
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: DEFAULT_MAX_ITER,
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Cluster `points` (all of the same dimension).
    ///
    /// - no points or `k == 0`: empty fit.
    /// - `points.len() <= k`: every point is its own cluster, labelled in order.
    pub fn fit<R: Rng + ?Sized>(&self, points: &[Vec<f64>], rng: &mut R) -> KMeansFit {
        let n = points.len();
        if n == 0 || self.k == 0 {
            return KMeansFit::default();
        }
        if n <= self.k {
            return KMeansFit {
                labels: (0..n).collect(),
                centroids: points.to_vec(),
                iterations: 0,
            };
        }

        let mut centroids = self.seed(points, rng);
        let mut labels = vec![usize::MAX; n];
        let mut iterations = 0;

        // At least one assignment pass runs so every point gets a label.
        loop {
            iterations += 1;
            let mut changed = false;
            for (label, p) in labels.iter_mut().zip(points) {
                let nearest = nearest_centroid(p, &centroids);
                if *label != nearest {
                    *label = nearest;
                    changed = true;
                }
            }
            if changed {
                update_centroids(points, &labels, &mut centroids);
            }
            if !changed || iterations >= self.max_iter {
                break;
            }
        }

        trace!(k = self.k, n, iterations, "k-means finished");
        KMeansFit {
            labels,
            centroids,
            iterations,
        }
    }

    fn seed<R: Rng + ?Sized>(&self, points: &[Vec<f64>], rng: &mut R) -> Vec<Vec<f64>> {
        let first = rng.random_range(0..points.len());
        let mut centroids = Vec::with_capacity(self.k);
        centroids.push(points[first].clone());
        // min_dist[i]: distance from point i to its nearest chosen centroid.
        let mut min_dist: Vec<f64> = points
            .iter()
            .map(|p| euclidean(p, &centroids[0]))
            .collect();

        while centroids.len() < self.k {
            let mut far = 0;
            for (i, &d) in min_dist.iter().enumerate() {
                if d > min_dist[far] {
                    far = i;
                }
            }
            let next = points[far].clone();
            for (d, p) in min_dist.iter_mut().zip(points) {
                *d = d.min(euclidean(p, &next));
            }
            centroids.push(next);
        }
        centroids
    }
}

/// Within-cluster sum of squared distances.
pub fn wcss(points: &[Vec<f64>], labels: &[usize], centroids: &[Vec<f64>]) -> f64 {
    points
        .iter()
        .zip(labels)
        .filter_map(|(p, &l)| centroids.get(l).map(|c| squared_euclidean(p, c)))
        .sum()
}

/// Elbow-based choice of the number of clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimalK {
    max_k: usize,
    max_iter: usize,
}

/// The chosen k together with the WCSS curve it was read from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElbowCurve {
    pub k: usize,
    /// `(k, wcss)` for every candidate evaluated, ascending k.
    pub wcss: Vec<(usize, f64)>,
}

impl Default for OptimalK {
    fn default() -> Self {
        Self {
            max_k: DEFAULT_MAX_K,
            max_iter: DEFAULT_MAX_ITER,
        }
    }
}

impl OptimalK {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_k(mut self, max_k: usize) -> Self {
        self.max_k = max_k;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Candidate upper bound: `min(max_k, n / 2, 4)`.
    pub fn bound(&self, n: usize) -> usize {
        self.max_k.min(n / 2).min(ELBOW_K_CAP)
    }

    /// Pick k for `points`.
    pub fn select<R: Rng + ?Sized>(&self, points: &[Vec<f64>], rng: &mut R) -> usize {
        self.curve(points, rng).k
    }

    /// Evaluate WCSS for `k = 1..=bound` and read the elbow.
    ///
    /// With fewer than four points nothing is evaluated and k is 2. The elbow
    /// is the interior k whose improvement over `k - 1` exceeds 1.5 times the
    /// improvement of `k + 1` over `k` by the widest margin; 2 when no k
    /// qualifies. The result is clamped to `[2, bound]`.
    pub fn curve<R: Rng + ?Sized>(&self, points: &[Vec<f64>], rng: &mut R) -> ElbowCurve {
        if points.len() < 4 {
            return ElbowCurve {
                k: 2,
                wcss: Vec::new(),
            };
        }
        let bound = self.bound(points.len());
        let curve: Vec<(usize, f64)> = (1..=bound)
            .map(|k| {
                let fit = KMeans::new(k).with_max_iter(self.max_iter).fit(points, rng);
                (k, fit.wcss(points))
            })
            .collect();

        // improvement[k] = wcss(k - 1) - wcss(k), indexed by position in `curve`.
        let improvement = |i: usize| curve[i - 1].1 - curve[i].1;
        let mut best = None;
        let mut best_margin = 0.0;
        for i in 1..curve.len().saturating_sub(1) {
            let here = improvement(i);
            let next = improvement(i + 1);
            let margin = here - 1.5 * next;
            if here > 1.5 * next && (best.is_none() || margin > best_margin) {
                best = Some(curve[i].0);
                best_margin = margin;
            }
        }

        let k = best.unwrap_or(2).max(2).min(bound.max(2));
        debug!(n = points.len(), bound, k, wcss = ?curve, "optimal k selected");
        ElbowCurve { k, wcss: curve }
    }
}

fn nearest_centroid(p: &[f64], centroids: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (j, c) in centroids.iter().enumerate() {
        let d = squared_euclidean(p, c);
        if d < best_d {
            best_d = d;
            best = j;
        }
    }
    best
}

fn update_centroids(points: &[Vec<f64>], labels: &[usize], centroids: &mut [Vec<f64>]) {
    let dim = centroids.first().map_or(0, Vec::len);
    let mut sums = vec![vec![0.0; dim]; centroids.len()];
    let mut counts = vec![0usize; centroids.len()];
    for (p, &l) in points.iter().zip(labels) {
        counts[l] += 1;
        for (s, &x) in sums[l].iter_mut().zip(p) {
            *s += x;
        }
    }
    for ((c, sum), &count) in centroids.iter_mut().zip(sums).zip(&counts) {
        // Empty clusters keep their previous centroid.
        if count > 0 {
            *c = sum.into_iter().map(|s| s / count as f64).collect();
        }
    }
}

fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    squared_euclidean(a, b).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn blobs() -> Vec<Vec<f64>> {
        let mut pts = Vec::new();
        for &(cx, cy) in &[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)] {
            for i in 0..5 {
                let d = i as f64 * 0.1;
                pts.push(vec![cx + d, cy - d]);
            }
        }
        pts
    }

    #[test]
    fn empty_and_zero_k() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(KMeans::new(3).fit(&[], &mut rng).labels.is_empty());
        let pts = vec![vec![1.0, 2.0]];
        assert!(KMeans::new(0).fit(&pts, &mut rng).labels.is_empty());
    }

    #[test]
    fn fewer_points_than_clusters_are_singletons() {
        let mut rng = StdRng::seed_from_u64(0);
        let pts = vec![vec![1.0, 1.0], vec![1.0, 1.0], vec![5.0, 5.0]];
        let fit = KMeans::new(3).fit(&pts, &mut rng);
        assert_eq!(fit.labels, vec![0, 1, 2]);
        assert_eq!(fit.wcss(&pts), 0.0);
    }

    #[test]
    fn empty_cluster_keeps_its_seed() {
        // Farthest-point seeding over duplicates picks [0, 0] twice; the
        // later copy never wins a point.
        let mut pts = vec![vec![0.0, 0.0]; 6];
        pts.push(vec![5.0, 5.0]);
        for seed in 0..8 {
            let fit = KMeans::new(3).fit(&pts, &mut StdRng::seed_from_u64(seed));
            assert_eq!(fit.centroids.len(), 3);
            assert!(fit.labels.iter().all(|&l| l < 3));
            let counts: Vec<usize> = (0..3)
                .map(|c| fit.labels.iter().filter(|&&l| l == c).count())
                .collect();
            let empty = counts.iter().position(|&c| c == 0).unwrap();
            assert_eq!(fit.centroids[empty], vec![0.0, 0.0]);
            assert_eq!(fit.n_clusters(), 2);
            assert_eq!(fit.wcss(&pts), 0.0);

            let dense = fit.compact();
            assert_eq!(dense.centroids.len(), 2);
            assert_eq!(dense.n_clusters(), 2);
            assert!(dense.labels.iter().all(|&l| l < 2));
            assert_ne!(dense.labels[0], dense.labels[6]);
            assert_eq!(dense.wcss(&pts), 0.0);
        }
    }

    #[test]
    fn identical_points_occupy_one_cluster() {
        let pts = vec![vec![1.0, 1.0]; 6];
        let fit = KMeans::new(3).fit(&pts, &mut StdRng::seed_from_u64(2));
        assert!(fit.labels.iter().all(|&l| l == fit.labels[0]));
        assert_eq!(fit.n_clusters(), 1);
        let dense = fit.compact();
        assert_eq!(dense.labels, vec![0; 6]);
        assert_eq!(dense.centroids, vec![vec![1.0, 1.0]]);
    }

    #[test]
    fn separates_well_spaced_blobs() {
        let pts = blobs();
        let mut rng = StdRng::seed_from_u64(42);
        let fit = KMeans::new(3).fit(&pts, &mut rng);
        for blob in fit.labels.chunks(5) {
            assert!(blob.iter().all(|&l| l == blob[0]));
        }
        assert_ne!(fit.labels[0], fit.labels[5]);
        assert_ne!(fit.labels[5], fit.labels[10]);
        assert_ne!(fit.labels[0], fit.labels[10]);
        assert!(fit.wcss(&pts) < 1.0);
    }

    #[test]
    fn same_seed_same_labels() {
        let pts = blobs();
        let a = KMeans::new(3).fit(&pts, &mut StdRng::seed_from_u64(9));
        let b = KMeans::new(3).fit(&pts, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn iteration_bound_is_respected() {
        let pts = blobs();
        let fit = KMeans::new(3)
            .with_max_iter(1)
            .fit(&pts, &mut StdRng::seed_from_u64(3));
        assert_eq!(fit.iterations, 1);
        assert_eq!(fit.labels.len(), pts.len());
    }

    #[test]
    fn wcss_of_single_cluster() {
        let pts = vec![vec![0.0, 0.0], vec![2.0, 0.0]];
        let w = wcss(&pts, &[0, 0], &[vec![1.0, 0.0]]);
        assert!((w - 2.0).abs() < 1e-12);
    }

    #[test]
    fn elbow_finds_three_blobs() {
        let pts = blobs();
        let curve = OptimalK::new().curve(&pts, &mut StdRng::seed_from_u64(5));
        assert_eq!(curve.k, 3);
        assert_eq!(curve.wcss.len(), 4);
        for w in curve.wcss.windows(2) {
            assert!(w[0].1 + 1e-9 >= w[1].1);
        }
    }

    #[test]
    fn elbow_small_inputs_default_to_two() {
        let mut rng = StdRng::seed_from_u64(0);
        let pts = vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 2.0]];
        assert_eq!(OptimalK::new().select(&pts, &mut rng), 2);
        let pts = vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]];
        let k = OptimalK::new().select(&pts, &mut rng);
        assert_eq!(k, 2);
    }

    #[test]
    fn bound_caps() {
        let ok = OptimalK::new();
        assert_eq!(ok.bound(4), 2);
        assert_eq!(ok.bound(7), 3);
        assert_eq!(ok.bound(100), 4);
        assert_eq!(ok.with_max_k(3).bound(100), 3);
    }
}
