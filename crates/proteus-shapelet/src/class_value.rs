//! Class-distribution bookkeeping for quality evaluation.

use proteus_series::ClassLabel;

/// How series classes are presented to the quality measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum ClassValueMode {
    /// Every class is kept distinct.
    #[default]
    Normal,
    /// One-vs-rest around the candidate's own class: class 0 is the
    /// candidate's class, class 1 is everything else.
    Binary,
}

/// Class counts of the training set under a [`ClassValueMode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassValues {
    mode: ClassValueMode,
    counts: Vec<usize>,
}

impl ClassValues {
    /// Wrap per-class counts (indexed by class).
    #[must_use]
    pub fn new(mode: ClassValueMode, counts: Vec<usize>) -> Self {
        Self { mode, counts }
    }

    /// The mode in use.
    #[must_use]
    pub fn mode(&self) -> ClassValueMode {
        self.mode
    }

    /// Total number of series.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Number of classes seen by the quality measure.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        match self.mode {
            ClassValueMode::Normal => self.counts.len(),
            ClassValueMode::Binary => 2,
        }
    }

    /// Class distribution for evaluating a candidate cut from a series of
    /// class `shapelet_class`.
    #[must_use]
    pub fn distribution(&self, shapelet_class: ClassLabel) -> Vec<usize> {
        match self.mode {
            ClassValueMode::Normal => self.counts.clone(),
            ClassValueMode::Binary => {
                let own = self.counts.get(shapelet_class.index()).copied().unwrap_or(0);
                vec![own, self.total() - own]
            }
        }
    }

    /// Map a series label to the class index the quality measure sees.
    #[must_use]
    pub fn map(&self, label: ClassLabel, shapelet_class: ClassLabel) -> usize {
        match self.mode {
            ClassValueMode::Normal => label.index(),
            ClassValueMode::Binary => usize::from(label != shapelet_class),
        }
    }
}
