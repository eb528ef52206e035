//! The (length, start, dimension) candidate space of one series.

use rand::Rng;

use crate::candidate::CandidateLocation;

/// Every candidate location a strategy may visit in a single series.
///
/// Lengths run over `min_length..=max_length` in steps of `length_step`,
/// starts over `0..=series_length - length` in steps of `position_step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SearchSpace {
    series_length: usize,
    min_length: usize,
    max_length: usize,
    n_dimensions: usize,
    length_step: usize,
    position_step: usize,
}

impl SearchSpace {
    /// Create a unit-step space.
    ///
    /// The caller guarantees `1 <= min_length <= max_length <= series_length`
    /// and `n_dimensions >= 1`.
    #[must_use]
    pub fn new(
        series_length: usize,
        min_length: usize,
        max_length: usize,
        n_dimensions: usize,
    ) -> Self {
        Self {
            series_length,
            min_length,
            max_length,
            n_dimensions,
            length_step: 1,
            position_step: 1,
        }
    }

    /// Coarsen the grid. Zero steps are treated as 1.
    #[must_use]
    pub fn with_steps(mut self, length_step: usize, position_step: usize) -> Self {
        self.length_step = length_step.max(1);
        self.position_step = position_step.max(1);
        self
    }

    /// Series length.
    #[must_use]
    pub fn series_length(&self) -> usize {
        self.series_length
    }

    /// Shortest candidate length.
    #[must_use]
    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// Longest candidate length.
    #[must_use]
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Number of channels a candidate can be cut from.
    #[must_use]
    pub fn n_dimensions(&self) -> usize {
        self.n_dimensions
    }

    /// Candidate lengths in ascending order.
    pub fn lengths(&self) -> impl Iterator<Item = usize> + use<> {
        (self.min_length..=self.max_length).step_by(self.length_step)
    }

    /// Number of starts on the grid for one length.
    #[must_use]
    pub fn n_starts(&self, length: usize) -> usize {
        if length == 0 || length > self.series_length {
            return 0;
        }
        (self.series_length - length) / self.position_step + 1
    }

    /// Size of the whole space of one series.
    #[must_use]
    pub fn candidates_per_series(&self) -> u64 {
        self.lengths()
            .map(|l| (self.n_starts(l) * self.n_dimensions) as u64)
            .sum()
    }

    /// Return true if the location lies inside the series and the length
    /// range. Grid steps are ignored.
    #[must_use]
    pub fn contains(&self, location: &CandidateLocation) -> bool {
        location.length >= self.min_length
            && location.length <= self.max_length
            && location.end() <= self.series_length
            && location.dimension < self.n_dimensions
    }

    /// The `index`-th location in enumeration order (length, dimension, start).
    ///
    /// Returns `None` when `index >= self.candidates_per_series()`.
    #[must_use]
    pub fn location_at(&self, mut index: u64) -> Option<CandidateLocation> {
        for length in self.lengths() {
            let n_starts = self.n_starts(length) as u64;
            let block = n_starts * self.n_dimensions as u64;
            if index < block {
                let dimension = (index / n_starts) as usize;
                let start = (index % n_starts) as usize * self.position_step;
                return Some(CandidateLocation::new(start, length, dimension));
            }
            index -= block;
        }
        None
    }

    /// Draw a location uniformly over the whole grid.
    pub fn random_location(&self, rng: &mut impl Rng) -> Option<CandidateLocation> {
        let total = self.candidates_per_series();
        if total == 0 {
            return None;
        }
        self.location_at(rng.gen_range(0..total))
    }

    /// Draw a start and dimension uniformly for a fixed length.
    pub fn random_location_with_length(
        &self,
        length: usize,
        rng: &mut impl Rng,
    ) -> Option<CandidateLocation> {
        let n_starts = self.n_starts(length);
        if n_starts == 0 {
            return None;
        }
        let start = rng.gen_range(0..n_starts) * self.position_step;
        let dimension = rng.gen_range(0..self.n_dimensions);
        Some(CandidateLocation::new(start, length, dimension))
    }

    /// Every location in enumeration order.
    pub fn locations(&self) -> impl Iterator<Item = CandidateLocation> + use<> {
        let space = *self;
        space.lengths().flat_map(move |length| {
            (0..space.n_dimensions).flat_map(move |dimension| {
                (0..space.n_starts(length)).map(move |i| {
                    CandidateLocation::new(i * space.position_step, length, dimension)
                })
            })
        })
    }
}
