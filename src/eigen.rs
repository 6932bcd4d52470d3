//! Eigen-decomposition of small symmetric matrices.
//!
//! PCA only ever decomposes a `p x p` covariance matrix where `p` is the number
//! of selected variables (a handful to a few dozen), so the classical Jacobi
//! rotation method is plenty and keeps the crate free of a LAPACK binding.

use std::cmp::Ordering;

use tracing::warn;

/// Eigenvalues and unit eigenvectors of a symmetric matrix, sorted by
/// descending eigenvalue.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetricEigen {
    /// Eigenvalues, descending.
    pub values: Vec<f64>,
    /// `vectors[k]` is the unit eigenvector for `values[k]`.
    pub vectors: Vec<Vec<f64>>,
    /// Whether the off-diagonal mass fell below tolerance.
    pub converged: bool,
}

/// Decompose a symmetric matrix given row-major as `n * n` values.
///
/// Repeatedly picks the largest off-diagonal entry and zeroes it with a Givens
/// rotation, accumulating the rotations into the eigenvector matrix. Each
/// eigenvector's sign is fixed so that its largest-magnitude entry is positive.
pub fn symmetric_eigen(a: &[f64], n: usize) -> SymmetricEigen {
    debug_assert_eq!(a.len(), n * n);
    if n == 0 {
        return SymmetricEigen {
            values: Vec::new(),
            vectors: Vec::new(),
            converged: true,
        };
    }

    let mut mat = a.to_vec();
    // v[i * n + k]: component i of eigenvector k (columns are eigenvectors).
    let mut v = vec![0.0; n * n];
    for i in 0..n {
        v[i * n + i] = 1.0;
    }

    let scale = mat.iter().map(|x| x * x).sum::<f64>().sqrt().max(1.0);
    let tol = 1e-12 * scale;
    let max_iter = 100 * n * n;
    let mut converged = n == 1;

    for _ in 0..max_iter {
        let mut max_off = 0.0_f64;
        let mut p = 0;
        let mut q = 1;
        for i in 0..n {
            for j in (i + 1)..n {
                let x = mat[i * n + j].abs();
                if x > max_off {
                    max_off = x;
                    p = i;
                    q = j;
                }
            }
        }
        if max_off < tol {
            converged = true;
            break;
        }

        // tan(2θ) = 2 a_pq / (a_pp - a_qq) zeroes a_pq.
        let app = mat[p * n + p];
        let aqq = mat[q * n + q];
        let apq = mat[p * n + q];
        let theta = if (app - aqq).abs() < tol {
            core::f64::consts::FRAC_PI_4.copysign(apq)
        } else {
            0.5 * (2.0 * apq / (app - aqq)).atan()
        };
        let c = theta.cos();
        let s = theta.sin();

        for i in 0..n {
            if i != p && i != q {
                let ip = mat[i * n + p];
                let iq = mat[i * n + q];
                let new_ip = c * ip + s * iq;
                let new_iq = -s * ip + c * iq;
                mat[i * n + p] = new_ip;
                mat[p * n + i] = new_ip;
                mat[i * n + q] = new_iq;
                mat[q * n + i] = new_iq;
            }
        }
        mat[p * n + p] = c * c * app + 2.0 * c * s * apq + s * s * aqq;
        mat[q * n + q] = s * s * app - 2.0 * c * s * apq + c * c * aqq;
        mat[p * n + q] = 0.0;
        mat[q * n + p] = 0.0;

        for i in 0..n {
            let vip = v[i * n + p];
            let viq = v[i * n + q];
            v[i * n + p] = c * vip + s * viq;
            v[i * n + q] = -s * vip + c * viq;
        }
    }

    if !converged {
        warn!(n, "jacobi eigen solver hit its rotation budget before converging");
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        mat[b * n + b]
            .partial_cmp(&mat[a * n + a])
            .unwrap_or(Ordering::Equal)
    });

    let values = order.iter().map(|&k| mat[k * n + k]).collect();
    let vectors = order
        .iter()
        .map(|&k| {
            let mut col: Vec<f64> = (0..n).map(|i| v[i * n + k]).collect();
            // First entry of largest magnitude decides the sign.
            let pivot = col
                .iter()
                .fold(0.0_f64, |m, &x| if x.abs() > m.abs() { x } else { m });
            if pivot < 0.0 {
                col.iter_mut().for_each(|x| *x = -*x);
            }
            col
        })
        .collect();

    SymmetricEigen {
        values,
        vectors,
        converged,
    }
}
