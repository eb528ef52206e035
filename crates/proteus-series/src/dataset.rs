//! A collection of equal-length series with optional class labels.

use crate::error::SeriesError;
use crate::label::ClassLabel;
use crate::series::TimeSeries;

/// A validated dataset of time series.
///
/// All series share the same length and channel count. Labels, when
/// present, are parallel to the series: `labels[i]` is the class of
/// `series[i]`.
#[derive(Debug, Clone)]
pub struct Dataset {
    series: Vec<TimeSeries>,
    labels: Option<Vec<ClassLabel>>,
    n_classes: usize,
}

impl Dataset {
    /// Build a labelled dataset.
    ///
    /// The number of classes is one more than the largest label index.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SeriesError::EmptyDataset`] | `series` is empty |
    /// | [`SeriesError::LabelCountMismatch`] | `labels.len() != series.len()` |
    /// | [`SeriesError::SeriesLengthMismatch`] | Series differ in length |
    /// | [`SeriesError::ChannelCountMismatch`] | Series differ in channel count |
    pub fn labelled(series: Vec<TimeSeries>, labels: Vec<ClassLabel>) -> Result<Self, SeriesError> {
        if labels.len() != series.len() {
            return Err(SeriesError::LabelCountMismatch {
                n_series: series.len(),
                n_labels: labels.len(),
            });
        }
        Self::build(series, Some(labels))
    }

    /// Build an unlabelled dataset (for transforming data of unknown class).
    ///
    /// # Errors
    ///
    /// Same as [`Dataset::labelled`], minus the label check.
    pub fn unlabelled(series: Vec<TimeSeries>) -> Result<Self, SeriesError> {
        Self::build(series, None)
    }

    fn build(series: Vec<TimeSeries>, labels: Option<Vec<ClassLabel>>) -> Result<Self, SeriesError> {
        let Some(first) = series.first() else {
            return Err(SeriesError::EmptyDataset);
        };
        let expected_len = first.len();
        let expected_channels = first.n_channels();
        for (series_index, s) in series.iter().enumerate() {
            if s.len() != expected_len {
                return Err(SeriesError::SeriesLengthMismatch {
                    series_index,
                    expected: expected_len,
                    got: s.len(),
                });
            }
            if s.n_channels() != expected_channels {
                return Err(SeriesError::ChannelCountMismatch {
                    series_index,
                    expected: expected_channels,
                    got: s.n_channels(),
                });
            }
        }
        let n_classes = labels
            .as_ref()
            .and_then(|l| l.iter().map(|c| c.index()).max())
            .map_or(0, |max| max + 1);
        Ok(Self {
            series,
            labels,
            n_classes,
        })
    }

    /// Return the number of series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Always `false` for a validated dataset.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Borrow all series.
    #[must_use]
    pub fn series(&self) -> &[TimeSeries] {
        &self.series
    }

    /// Borrow one series by index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TimeSeries> {
        self.series.get(index)
    }

    /// Borrow the labels, if the dataset is labelled.
    #[must_use]
    pub fn labels(&self) -> Option<&[ClassLabel]> {
        self.labels.as_deref()
    }

    /// Return the label of one series, if labelled.
    #[must_use]
    pub fn label(&self, index: usize) -> Option<ClassLabel> {
        self.labels.as_ref().and_then(|l| l.get(index).copied())
    }

    /// Return the number of classes (zero for an unlabelled dataset).
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return the number of series in each class, indexed by class.
    #[must_use]
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        if let Some(labels) = &self.labels {
            for label in labels {
                counts[label.index()] += 1;
            }
        }
        counts
    }

    /// Return the shared series length.
    #[must_use]
    pub fn series_length(&self) -> usize {
        self.series[0].len()
    }

    /// Return the shared channel count.
    #[must_use]
    pub fn n_channels(&self) -> usize {
        self.series[0].n_channels()
    }
}
