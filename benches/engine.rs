use assay::{
    correlation_matrix, describe, scan_pairs, Dataset, KMeans, OptimalK, Pca, ScanConfig, Value,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::prelude::*;

/// `n` rows over `p` columns; column `j > 0` follows column 0 with noise
/// growing in `j`, and about 2% of cells are missing.
fn synthetic(rng: &mut StdRng, n: usize, p: usize) -> (Dataset, Vec<String>) {
    let names: Vec<String> = (0..p).map(|j| format!("x{j}")).collect();
    let rows = (0..n).map(|_| {
        let base = rng.random::<f64>() * 10.0;
        names
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let v = if rng.random::<f64>() < 0.02 {
                    Value::Missing
                } else {
                    Value::from(base + j as f64 * rng.random::<f64>())
                };
                (name.clone(), v)
            })
            .collect::<Vec<_>>()
    });
    (Dataset::from_pairs(rows.collect::<Vec<_>>()), names)
}

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine");
    let mut rng = StdRng::seed_from_u64(42);

    let (data, names) = synthetic(&mut rng, 500, 12);

    // Every pair of 12 columns over 500 rows (66 pairs).
    group.bench_function("scan_pairs_n500_p12", |b| {
        let config = ScanConfig::new(0.3, 0.05);
        b.iter(|| black_box(scan_pairs(black_box(&data), &names, &config).map(|h| h.len())))
    });

    group.bench_function("correlation_matrix_n500_p12", |b| {
        let columns: Vec<(&str, Vec<f64>)> =
            names.iter().map(|n| (n.as_str(), data.column(n))).collect();
        b.iter(|| black_box(correlation_matrix(black_box(&columns)).len()))
    });

    group.bench_function("describe_n500", |b| {
        let col = data.column("x0");
        b.iter(|| black_box(describe(black_box(&col)).map(|s| s.outliers.len())))
    });

    group.bench_function("pca_n500_p12", |b| {
        let pca = Pca::new().with_seed(7);
        b.iter(|| black_box(pca.fit(black_box(&data), &names).map(|r| r.n_clusters)))
    });

    // Three well-separated blobs in the plane.
    let blobs: Vec<Vec<f64>> = (0..300)
        .map(|i| {
            let (cx, cy) = [(0.0, 0.0), (8.0, 1.0), (3.0, 9.0)][i % 3];
            vec![cx + rng.random::<f64>(), cy + rng.random::<f64>()]
        })
        .collect();

    group.bench_function("kmeans_k3_n300", |b| {
        b.iter(|| {
            let mut r = StdRng::seed_from_u64(1);
            black_box(KMeans::new(3).fit(black_box(&blobs), &mut r).iterations)
        })
    });

    group.bench_function("optimal_k_n300", |b| {
        b.iter(|| {
            let mut r = StdRng::seed_from_u64(1);
            black_box(OptimalK::new().select(black_box(&blobs), &mut r))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_engine);
criterion_main!(benches);
