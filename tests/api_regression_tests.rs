use assay::{
    correlate, correlation_matrix, describe, evaluate_pairs, scan_pairs, suggest_groups,
    CorrelationMatrix, CorrelationOptions, Dataset, KMeans, Method, OptimalK, Pca, ScanConfig,
    StatsError, SuggestionSource, Value, EXCLUDED,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn doubling_rows() -> Dataset {
    Dataset::from_pairs(vec![
        vec![("A", 1.0), ("B", 2.0)],
        vec![("A", 2.0), ("B", 4.0)],
        vec![("A", 3.0), ("B", 6.0)],
        vec![("A", 4.0), ("B", 8.0)],
    ])
}

#[test]
fn perfect_doubling_pair_statistics() {
    let data = doubling_rows();
    let (x, y) = data.paired("A", "B");
    let r = correlate(&x, &y, &[Method::Pearson], &CorrelationOptions::default()).unwrap();
    assert!((r.pearson.unwrap() - 1.0).abs() < 1e-12);
    assert!((r.slope.unwrap() - 2.0).abs() < 1e-12);
    assert!(r.intercept.unwrap().abs() < 1e-12);
    assert!((r.r_squared.unwrap() - 1.0).abs() < 1e-12);
}

#[test]
fn scan_keeps_exactly_the_perfect_pair() {
    let hits = scan_pairs(&doubling_rows(), &["A", "B"], &ScanConfig::new(0.99, 0.05)).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].x, "A");
    assert_eq!(hits[0].y, "B");
    assert!(hits[0].meets_criteria);
}

#[test]
fn scan_with_legacy_options_matches_on_perfect_pair() {
    let config = ScanConfig::new(0.99, 0.05)
        .with_methods(vec![Method::Pearson, Method::Spearman])
        .with_options(CorrelationOptions::legacy());
    let hits = scan_pairs(&doubling_rows(), &["A", "B"], &config).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].result.pearson_p, Some(0.0001));
}

#[test]
fn pca_excludes_row_with_missing_value() {
    let data = Dataset::from_pairs(vec![
        vec![("A", Value::from(1.0)), ("B", Value::from(1.5))],
        vec![("A", Value::from(2.0)), ("B", Value::from(4.5))],
        vec![("A", Value::from(3.0)), ("B", Value::from(""))],
        vec![("A", Value::from(4.0)), ("B", Value::from(7.0))],
        vec![("A", Value::from(5.0)), ("B", Value::from("10.5"))],
    ]);
    let r = Pca::new().with_seed(4).fit(&data, &["A", "B"]).unwrap();
    assert_eq!(r.clusters.len(), 5);
    assert_eq!(r.clusters[2], EXCLUDED);
    let k = r.n_clusters as i32;
    for (i, &c) in r.clusters.iter().enumerate().filter(|&(i, _)| i != 2) {
        assert!((0..k).contains(&c), "row {i} label {c}");
    }
}

#[test]
fn pca_on_sparse_columns_fails_loudly() {
    // Seven rows, each variable present in only two of them.
    let data = Dataset::from_pairs(vec![
        vec![("Au", Value::from(0.1)), ("Ag", Value::Missing)],
        vec![("Au", Value::from(0.3)), ("Ag", Value::Missing)],
        vec![("Au", Value::Missing), ("Ag", Value::from(2.0))],
        vec![("Au", Value::Missing), ("Ag", Value::from(1.0))],
        vec![("Au", Value::Missing), ("Ag", Value::Missing)],
        vec![("Au", Value::from("bdl")), ("Ag", Value::Missing)],
        vec![("Au", Value::Missing), ("Ag", Value::from("n/a"))],
    ]);
    let err = Pca::new().fit(&data, &["Au", "Ag"]).unwrap_err();
    match &err {
        StatsError::InsufficientSamples {
            valid_rows,
            valid_counts,
            ..
        } => {
            assert_eq!(*valid_rows, 0);
            assert_eq!(valid_counts[0], ("Au".to_string(), 2));
            assert_eq!(valid_counts[1], ("Ag".to_string(), 2));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.to_string().contains("Au=2, Ag=2"));
}

#[test]
fn describe_reports_outliers_from_fences() {
    let s = describe(&[4.0, 5.0, 5.0, 6.0, 5.5, 4.5, 40.0, f64::NAN]).unwrap();
    assert_eq!(s.count, 7);
    assert_eq!(s.outliers, vec![40.0]);
    assert_eq!(describe(&[f64::NAN]), Err(StatsError::EmptyInput));
}

#[test]
fn kendall_is_unsupported_everywhere() {
    let x = [1.0, 2.0, 3.0, 4.0];
    assert_eq!(
        correlate(&x, &x, &[Method::Kendall], &CorrelationOptions::default()),
        Err(StatsError::UnsupportedMethod(Method::Kendall))
    );
    let config = ScanConfig::default().with_methods(vec![Method::Pearson, Method::Kendall]);
    assert_eq!(
        evaluate_pairs(&doubling_rows(), &["A", "B"], &config),
        Err(StatsError::UnsupportedMethod(Method::Kendall))
    );
}

#[test]
fn matrix_feeds_grouping() {
    let data = Dataset::from_pairs((0..8).map(|i| {
        let t = i as f64;
        vec![
            ("La", Value::from(t)),
            ("Ce", Value::from(2.0 * t + 0.1 * (t * 1.3).sin())),
            ("Nd", Value::from(0.8 * t + 0.1 * (t * 0.7).cos())),
            ("Zr", Value::from((t * 2.1).sin())),
        ]
    }));
    let vars = ["La", "Ce", "Nd", "Zr"];
    let m = CorrelationMatrix::from_dataset(&data, &vars);
    let groups = suggest_groups(&m, &vars, 0.9);
    assert_eq!(groups.len(), 2);
    assert!(matches!(groups[0].source, SuggestionSource::Correlated { .. }));
    assert_eq!(groups[0].variables, vec!["La", "Ce", "Nd"]);
    assert!(matches!(groups[1].source, SuggestionSource::Domain { .. }));
    assert_eq!(groups[1].name, "Rare earth elements");
}

#[test]
fn matrix_from_slices_uses_pairwise_rows() {
    let m = correlation_matrix(&[
        ("x", vec![1.0, 2.0, f64::NAN, 4.0, 5.0]),
        ("y", vec![2.0, 4.0, 100.0, 8.0, 10.0]),
    ]);
    assert!((m.get("x", "y").unwrap() - 1.0).abs() < 1e-12);
}

#[test]
fn kmeans_and_elbow_cooperate() {
    let mut pts = Vec::new();
    for &(cx, cy) in &[(0.0, 0.0), (20.0, 20.0)] {
        for i in 0..6 {
            pts.push(vec![cx + (i % 3) as f64 * 0.2, cy + (i / 3) as f64 * 0.2]);
        }
    }
    let mut rng = StdRng::seed_from_u64(17);
    let k = OptimalK::new().select(&pts, &mut rng);
    assert_eq!(k, 2);
    let fit = KMeans::new(k).fit(&pts, &mut rng);
    assert!(fit.labels[..6].iter().all(|&l| l == fit.labels[0]));
    assert!(fit.labels[6..].iter().all(|&l| l == fit.labels[6]));
    assert_ne!(fit.labels[0], fit.labels[6]);
}
