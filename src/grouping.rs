//! Suggestions for which variables to feed into PCA.
//!
//! Two sources feed the list:
//!
//! - **Correlated groups**: a greedy pass over the correlation matrix that
//!   collects variables strongly correlated with a seed variable.
//! - **Domain groups**: fixed families of geochemical variables (major oxides,
//!   rare earths, ...) that are worth examining together whenever enough of
//!   their members are present.
//!
//! The [`HeuristicProfile`] attached to correlated groups is a rough preview
//! computed from the mean pairwise correlation alone. It is not the output of
//! a decomposition; run [`crate::Pca`] for real eigenvalues.

use std::cmp::Ordering;

use crate::scan::CorrelationMatrix;

/// Smallest group worth suggesting.
pub const MIN_GROUP_SIZE: usize = 3;

/// Confidence assigned to every domain-table suggestion.
pub const DOMAIN_CONFIDENCE: f64 = 0.8;

/// Weights spreading the estimated variance over the first three components.
const PROFILE_WEIGHTS: [f64; 3] = [0.4, 0.3, 0.2];

/// Geochemical variable families, by element or oxide symbol.
pub const DOMAIN_GROUPS: &[(&str, &[&str])] = &[
    (
        "Major oxides",
        &[
            "SiO2", "TiO2", "Al2O3", "Fe2O3", "FeO", "MnO", "MgO", "CaO", "Na2O", "K2O", "P2O5",
        ],
    ),
    (
        "Rare earth elements",
        &[
            "La", "Ce", "Pr", "Nd", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu",
        ],
    ),
    (
        "High field strength elements",
        &["Zr", "Hf", "Nb", "Ta", "Ti", "Y", "Th", "U"],
    ),
    (
        "Large-ion lithophile elements",
        &["Rb", "Sr", "Ba", "Cs", "K", "Pb"],
    ),
    ("Transition metals", &["Sc", "V", "Cr", "Co", "Ni", "Cu", "Zn"]),
    (
        "Chalcophile and ore metals",
        &["Cu", "Pb", "Zn", "Ag", "Au", "As", "Sb", "Mo", "Bi", "Cd"],
    ),
];

/// Pre-PCA variance preview for a correlated group.
///
/// With `p` members and mean pairwise `|r|` of `a`, the estimates are
/// `p * a * w` and `a * w * 100` for weights `w = 0.4, 0.3, 0.2`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeuristicProfile {
    pub estimated_eigenvalues: [f64; 3],
    /// Percent of variance each of the first three components might explain.
    pub estimated_variance: [f64; 3],
}

impl HeuristicProfile {
    pub fn from_mean_correlation(group_size: usize, mean_abs_r: f64) -> Self {
        let p = group_size as f64;
        Self {
            estimated_eigenvalues: PROFILE_WEIGHTS.map(|w| p * mean_abs_r * w),
            estimated_variance: PROFILE_WEIGHTS.map(|w| mean_abs_r * w * 100.0),
        }
    }
}

/// Where a suggestion came from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SuggestionSource {
    Correlated {
        mean_abs_correlation: f64,
        profile: HeuristicProfile,
    },
    Domain { group: String },
}

/// A proposed variable subset for PCA.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupSuggestion {
    pub name: String,
    pub variables: Vec<String>,
    /// In `[0, 1]`; suggestions are returned highest first.
    pub confidence: f64,
    pub source: SuggestionSource,
}

/// Propose variable groups from `matrix` and the domain table.
///
/// The correlated pass walks `variables` in order. Each variable not yet
/// grouped seeds a candidate made of itself plus every other ungrouped
/// variable whose `|r|` with it exceeds `threshold`; candidates with at least
/// three members are kept and their members marked as grouped. Variables
/// missing from `matrix` are skipped.
pub fn suggest_groups<S: AsRef<str>>(
    matrix: &CorrelationMatrix,
    variables: &[S],
    threshold: f64,
) -> Vec<GroupSuggestion> {
    let mut suggestions = correlated_groups(matrix, variables, threshold);
    suggestions.extend(domain_groups(variables));
    // Stable: equal confidences keep discovery order.
    suggestions.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });
    suggestions
}

fn correlated_groups<S: AsRef<str>>(
    matrix: &CorrelationMatrix,
    variables: &[S],
    threshold: f64,
) -> Vec<GroupSuggestion> {
    let indexed: Vec<(&str, usize)> = variables
        .iter()
        .filter_map(|v| Some((v.as_ref(), matrix.index_of(v.as_ref())?)))
        .collect();
    let mut grouped = vec![false; indexed.len()];
    let mut out = Vec::new();

    for (seed, &(name, mi)) in indexed.iter().enumerate() {
        if grouped[seed] {
            continue;
        }
        let mut members = vec![seed];
        for (other, &(_, mj)) in indexed.iter().enumerate() {
            if other != seed && !grouped[other] && matrix.at(mi, mj).abs() > threshold {
                members.push(other);
            }
        }
        grouped[seed] = true;
        if members.len() < MIN_GROUP_SIZE {
            continue;
        }
        for &m in &members {
            grouped[m] = true;
        }

        let mut sum = 0.0;
        let mut pairs = 0usize;
        for (i, &a) in members.iter().enumerate() {
            for &b in &members[i + 1..] {
                sum += matrix.at(indexed[a].1, indexed[b].1).abs();
                pairs += 1;
            }
        }
        let mean_abs = sum / pairs as f64;

        out.push(GroupSuggestion {
            name: format!("Correlated with {name}"),
            variables: members.iter().map(|&m| indexed[m].0.to_string()).collect(),
            confidence: mean_abs,
            source: SuggestionSource::Correlated {
                mean_abs_correlation: mean_abs,
                profile: HeuristicProfile::from_mean_correlation(members.len(), mean_abs),
            },
        });
    }
    out
}

fn domain_groups<S: AsRef<str>>(variables: &[S]) -> Vec<GroupSuggestion> {
    DOMAIN_GROUPS
        .iter()
        .filter_map(|&(group, members)| {
            let present: Vec<String> = variables
                .iter()
                .map(|v| v.as_ref())
                .filter(|v| members.iter().any(|m| matches_symbol(v, m)))
                .map(str::to_string)
                .collect();
            (present.len() >= MIN_GROUP_SIZE).then(|| GroupSuggestion {
                name: group.to_string(),
                variables: present,
                confidence: DOMAIN_CONFIDENCE,
                source: SuggestionSource::Domain {
                    group: group.to_string(),
                },
            })
        })
        .collect()
}

/// Whether column `name` refers to `symbol`.
///
/// Case-insensitive; the symbol may be followed by a unit or qualifier after a
/// non-alphanumeric separator (`La_ppm`, `SiO2 (wt%)`), but not by more
/// letters or digits (`K` does not match `K2O`).
pub fn matches_symbol(name: &str, symbol: &str) -> bool {
    let name = name.trim();
    if name.len() < symbol.len() || !name.is_char_boundary(symbol.len()) {
        return false;
    }
    let (head, rest) = name.split_at(symbol.len());
    head.eq_ignore_ascii_case(symbol)
        && rest
            .chars()
            .next()
            .is_none_or(|c| !c.is_ascii_alphanumeric())
}
