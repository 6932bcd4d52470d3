//! Screening example: from a small assay table to PCA clusters.
//!
//! A dozen basalt-to-rhyolite samples with major oxides and a few trace
//! elements. Some cells are blank or below detection, as in real lab exports.
//! The example:
//!
//! - Summarises each column and flags IQR outliers.
//! - Scans every variable pair for strong, significant correlations.
//! - Suggests variable groups for PCA.
//! - Runs PCA on the first suggestion and prints loadings and cluster labels.
//!
//! Run: `RUST_LOG=assay=debug cargo run --example screening`

use assay::{
    describe, scan_pairs, suggest_groups, CorrelationMatrix, Dataset, Method, Pca, ScanConfig,
    Value, EXCLUDED,
};
use tracing_subscriber::EnvFilter;

const COLUMNS: [&str; 8] = ["SiO2", "MgO", "CaO", "K2O", "La", "Ce", "Nd", "Zr"];

#[rustfmt::skip]
const SAMPLES: [[&str; 8]; 12] = [
    ["48.2", "9.8", "11.2", "0.31", "4.1",  "10.2", "7.9",  "88"],
    ["49.0", "9.1", "10.9", "0.42", "5.0",  "12.1", "9.0",  "95"],
    ["50.5", "8.2", "10.1", "0.55", "6.2",  "14.9", "10.8", "102"],
    ["52.1", "7.0", "9.4",  "0.80", "",     "18.0", "12.5", "110"],
    ["54.8", "5.9", "8.2",  "1.10", "10.4", "22.6", "15.1", "131"],
    ["56.3", "5.1", "7.5",  "1.42", "12.0", "26.1", "17.0", "140"],
    ["59.9", "3.8", "6.1",  "1.90", "15.8", "33.0", "20.4", "162"],
    ["62.4", "3.0", "5.2",  "2.30", "18.1", "38.9", "23.0", "171"],
    ["66.0", "2.1", "3.9",  "3.05", "22.7", "46.2", "26.8", "188"],
    ["68.7", "1.4", "2.8",  "3.60", "25.9", "52.8", "29.1", "bdl"],
    ["71.2", "0.9", "1.9",  "4.10", "29.3", "58.0", "31.5", "204"],
    ["73.5", "0.5", "1.2",  "4.55", "31.0", "63.4", "34.0", "215"],
];

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let data = Dataset::from_pairs(SAMPLES.iter().map(|row| {
        COLUMNS.iter().zip(row).map(|(&c, &v)| (c, Value::from(v)))
    }));

    // ---------------------------------------------------------------
    // Descriptive statistics
    // ---------------------------------------------------------------
    println!("=== Column summaries ({} samples) ===\n", data.len());
    println!(
        "{:>6}  {:>3}  {:>9}  {:>9}  {:>9}  {:>8}  {:>6}",
        "var", "n", "mean", "median", "sd", "skew", "normal"
    );
    println!("{}", "-".repeat(62));
    for name in COLUMNS {
        match describe(&data.column(name)) {
            Ok(s) => {
                println!(
                    "{:>6}  {:>3}  {:>9.3}  {:>9.3}  {:>9.3}  {:>8.3}  {:>6}",
                    name, s.count, s.mean, s.median, s.std_dev, s.skewness, s.roughly_normal
                );
                if !s.outliers.is_empty() {
                    println!("        outliers: {:?}", s.outliers);
                }
            }
            Err(e) => println!("{:>6}  {}", name, e),
        }
    }

    // ---------------------------------------------------------------
    // Pairwise correlation scan
    // ---------------------------------------------------------------
    let config = ScanConfig::new(0.9, 0.01).with_methods(vec![Method::Pearson, Method::Spearman]);
    match scan_pairs(&data, &COLUMNS, &config) {
        Ok(hits) => {
            println!(
                "\n=== {} pairs with |r| > {} and p < {} ===\n",
                hits.len(),
                config.threshold,
                config.p_threshold
            );
            for hit in &hits {
                let r = &hit.result;
                println!(
                    "  {:>5} ~ {:<5} n={:>2}  pearson={:>7.3}  spearman={:>7.3}  slope={:>8.3}",
                    hit.x,
                    hit.y,
                    r.n,
                    r.pearson.unwrap_or(f64::NAN),
                    r.spearman.unwrap_or(f64::NAN),
                    r.slope.unwrap_or(f64::NAN),
                );
            }
        }
        Err(e) => println!("\nscan failed: {e}"),
    }

    // ---------------------------------------------------------------
    // Group suggestions
    // ---------------------------------------------------------------
    let matrix = CorrelationMatrix::from_dataset(&data, &COLUMNS);
    let groups = suggest_groups(&matrix, &COLUMNS, 0.95);
    println!("\n=== Suggested PCA groups ===\n");
    for g in &groups {
        println!("  {:.2}  {:<36} {:?}", g.confidence, g.name, g.variables);
    }

    // ---------------------------------------------------------------
    // PCA on the best suggestion
    // ---------------------------------------------------------------
    let Some(best) = groups.first() else {
        println!("\nNo group to analyse.");
        return;
    };
    let result = match Pca::new()
        .with_standardize(true)
        .with_seed(11)
        .fit(&data, &best.variables)
    {
        Ok(r) => r,
        Err(e) => {
            println!("\nPCA failed: {e}");
            return;
        }
    };

    println!("\n=== PCA on \"{}\" ===\n", best.name);
    println!(
        "{:>5}  {:>12}  {:>10}  {:>12}",
        "pc", "eigenvalue", "% variance", "cumulative %"
    );
    println!("{}", "-".repeat(45));
    for i in 0..result.n_components {
        println!(
            "{:>5}  {:>12.4}  {:>9.2}%  {:>11.2}%",
            i + 1,
            result.eigenvalues[i],
            result.explained_variance[i],
            result.cumulative_variance[i]
        );
    }

    println!("\nLoadings:");
    for var in &result.variables {
        if let Some(l) = result.variable_loadings(var) {
            let cells: Vec<String> = l.iter().map(|v| format!("{v:>7.3}")).collect();
            println!("  {:>6}  {}", var, cells.join("  "));
        }
    }

    println!("\nClusters ({} found):", result.n_clusters);
    for (row, &label) in result.clusters.iter().enumerate() {
        if label == EXCLUDED {
            println!("  sample {:>2}: excluded (missing value)", row + 1);
        } else {
            println!("  sample {:>2}: cluster {}", row + 1, label);
        }
    }
}
