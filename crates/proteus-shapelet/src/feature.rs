//! Distance-feature matrix produced by the transform.

use proteus_series::ClassLabel;

/// One row per series, one column per shapelet, holding the minimum
/// distance from the shapelet to the series.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    rows: Vec<Vec<f64>>,
    labels: Option<Vec<ClassLabel>>,
    n_shapelets: usize,
}

impl FeatureMatrix {
    pub(crate) fn new(
        rows: Vec<Vec<f64>>,
        labels: Option<Vec<ClassLabel>>,
        n_shapelets: usize,
    ) -> Self {
        Self {
            rows,
            labels,
            n_shapelets,
        }
    }

    /// Number of rows (series).
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of feature columns (shapelets), excluding the class column.
    #[must_use]
    pub fn n_shapelets(&self) -> usize {
        self.n_shapelets
    }

    /// Borrow all rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Borrow one row.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[f64]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Distance from shapelet `column` to series `row`.
    #[must_use]
    pub fn value(&self, row: usize, column: usize) -> Option<f64> {
        self.rows.get(row)?.get(column).copied()
    }

    /// Class of each row, when the transformed dataset was labelled.
    #[must_use]
    pub fn labels(&self) -> Option<&[ClassLabel]> {
        self.labels.as_deref()
    }

    /// Rows with the class index appended as a final column, when labelled.
    #[must_use]
    pub fn with_class_column(&self) -> Vec<Vec<f64>> {
        match &self.labels {
            Some(labels) => self
                .rows
                .iter()
                .zip(labels)
                .map(|(row, label)| {
                    let mut out = row.clone();
                    out.push(label.index() as f64);
                    out
                })
                .collect(),
            None => self.rows.clone(),
        }
    }

    /// `shapelet_0 .. shapelet_{K-1}`, then `class` when labelled.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = (0..self.n_shapelets)
            .map(|i| format!("shapelet_{i}"))
            .collect();
        if self.labels.is_some() {
            names.push("class".to_string());
        }
        names
    }
}
