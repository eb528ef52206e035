//! Domain types for proteus-io.

use proteus_series::{ClassLabel, Dataset};

use crate::IoError;

/// A series identifier.
///
/// Wraps a non-empty string parsed from the first column of the input CSV.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesId(String);

impl SeriesId {
    /// Create a new series ID from a non-empty string.
    pub(crate) fn new(id: String) -> Self {
        debug_assert!(!id.is_empty(), "series ID must not be empty");
        Self(id)
    }

    /// Return the series ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SeriesId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A dataset read from disk, with the identifiers and class names the
/// numeric [`Dataset`] does not carry.
///
/// `series_ids[i]` names `dataset.series()[i]`; class label `c` stands for
/// `class_names[c]`.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    series_ids: Vec<SeriesId>,
    class_names: Option<Vec<String>>,
    dataset: Dataset,
}

impl LoadedDataset {
    /// Create a new loaded dataset.
    pub(crate) fn new(
        series_ids: Vec<SeriesId>,
        class_names: Option<Vec<String>>,
        dataset: Dataset,
    ) -> Self {
        Self {
            series_ids,
            class_names,
            dataset,
        }
    }

    /// Return the series IDs in file order.
    #[must_use]
    pub fn series_ids(&self) -> &[SeriesId] {
        &self.series_ids
    }

    /// Return the class names in label order, if the file had a class column.
    #[must_use]
    pub fn class_names(&self) -> Option<&[String]> {
        self.class_names.as_deref()
    }

    /// Return the name of a class label.
    #[must_use]
    pub fn class_name(&self, label: ClassLabel) -> Option<&str> {
        self.class_names
            .as_ref()
            .and_then(|names| names.get(label.index()))
            .map(String::as_str)
    }

    /// Borrow the numeric dataset.
    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Consume and return the numeric dataset.
    #[must_use]
    pub fn into_dataset(self) -> Dataset {
        self.dataset
    }
}
