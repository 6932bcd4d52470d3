//! Row-major tables of raw cell values.
//!
//! Ingestion (spreadsheet or CSV readers) happens elsewhere; this module only
//! holds the resulting table and knows how to turn cells into finite numbers.
//! Row order is the index space every engine output is aligned to.

use std::collections::HashMap;

/// A single raw cell.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    /// A parsed number (may still be NaN or infinite).
    Number(f64),
    /// Text as it came from the source, numeric-looking or not.
    Text(String),
    /// An empty cell.
    #[default]
    Missing,
}

impl Value {
    /// Tolerant numeric view of the cell.
    ///
    /// Text is trimmed and parsed; anything that does not yield a finite number
    /// (free text, NaN, infinities, empty cells) is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            Value::Number(v) => *v,
            Value::Text(s) => s.trim().parse::<f64>().ok()?,
            Value::Missing => return None,
        };
        v.is_finite().then_some(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Missing, Into::into)
    }
}

/// One row: column name to raw cell. Absent keys read as missing.
pub type Row = HashMap<String, Value>;

/// An ordered table of rows.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Dataset {
    rows: Vec<Row>,
}

/// Rows of a dataset reduced to a variable set, keeping only complete rows.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanMatrix {
    /// One entry per complete row, values in variable order.
    pub samples: Vec<Vec<f64>>,
    /// Original row index of each sample.
    pub row_indices: Vec<usize>,
    /// Original row indices that were dropped.
    pub excluded: Vec<usize>,
    /// Per variable, how many rows had a finite value for it.
    pub valid_counts: Vec<(String, usize)>,
}

impl Dataset {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Build a dataset from `(column, value)` pairs per row.
    pub fn from_pairs<R, K, V>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let rows = rows
            .into_iter()
            .map(|r| r.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
            .collect();
        Self { rows }
    }

    /// Build a dataset from named columns of equal length.
    ///
    /// Shorter columns are padded with missing cells.
    pub fn from_columns<K: Into<String>>(columns: impl IntoIterator<Item = (K, Vec<Value>)>) -> Self {
        let columns: Vec<(String, Vec<Value>)> =
            columns.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let n = columns.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
        let rows = (0..n)
            .map(|i| {
                columns
                    .iter()
                    .map(|(name, vals)| (name.clone(), vals.get(i).cloned().unwrap_or_default()))
                    .collect()
            })
            .collect();
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Numeric value at `(row, column)`, if finite.
    pub fn value(&self, row: usize, column: &str) -> Option<f64> {
        self.rows.get(row)?.get(column)?.as_f64()
    }

    /// A column as aligned numbers; unparseable cells become NaN.
    pub fn column(&self, column: &str) -> Vec<f64> {
        (0..self.rows.len())
            .map(|i| self.value(i, column).unwrap_or(f64::NAN))
            .collect()
    }

    /// Finite values of a column, in row order.
    pub fn finite_column(&self, column: &str) -> Vec<f64> {
        (0..self.rows.len())
            .filter_map(|i| self.value(i, column))
            .collect()
    }

    /// Rows where both columns are finite, as two aligned vectors.
    pub fn paired(&self, x: &str, y: &str) -> (Vec<f64>, Vec<f64>) {
        (0..self.rows.len())
            .filter_map(|i| Some((self.value(i, x)?, self.value(i, y)?)))
            .unzip()
    }

    /// Keep only rows where every variable parses to a finite number.
    pub fn clean<S: AsRef<str>>(&self, variables: &[S]) -> CleanMatrix {
        let mut samples = Vec::new();
        let mut row_indices = Vec::new();
        let mut excluded = Vec::new();
        let mut counts = vec![0usize; variables.len()];

        for (i, row) in self.rows.iter().enumerate() {
            let mut sample = Vec::with_capacity(variables.len());
            for (j, var) in variables.iter().enumerate() {
                if let Some(v) = row.get(var.as_ref()).and_then(Value::as_f64) {
                    counts[j] += 1;
                    sample.push(v);
                }
            }
            if sample.len() == variables.len() {
                samples.push(sample);
                row_indices.push(i);
            } else {
                excluded.push(i);
            }
        }

        let valid_counts = variables
            .iter()
            .map(|v| v.as_ref().to_string())
            .zip(counts)
            .collect();

        CleanMatrix {
            samples,
            row_indices,
            excluded,
            valid_counts,
        }
    }
}

impl FromIterator<Row> for Dataset {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
