//! Coarse grid search that shifts the grid for each series of a class.

use std::collections::HashMap;

use proteus_series::ClassLabel;

use crate::candidate::CandidateLocation;
use crate::error::ShapeletError;
use crate::search::{SearchContext, SearchSpace, SeriesRef, ShapeletSearch};
use crate::shapelet::Shapelet;

/// Evaluates `length = min + l0 + i * length_skip`, `start = s0 + j * position_skip`.
///
/// Each class keeps its own cursor `(s0, l0)`; after a series of that class
/// is searched the start offset advances, wrapping into the length offset,
/// so successive series of a class cover different grids.
#[derive(Debug, Clone)]
pub struct SkippingSearch {
    position_skip: usize,
    length_skip: usize,
    space: Option<SearchSpace>,
    cursors: HashMap<ClassLabel, (usize, usize)>,
}

impl SkippingSearch {
    /// Create a skipping search.
    #[must_use]
    pub fn new(position_skip: usize, length_skip: usize) -> Self {
        Self {
            position_skip: position_skip.max(1),
            length_skip: length_skip.max(1),
            space: None,
            cursors: HashMap::new(),
        }
    }

    fn advance(&self, (s0, l0): (usize, usize)) -> (usize, usize) {
        let s0 = (s0 + 1) % self.position_skip;
        let l0 = if s0 == 0 {
            (l0 + 1) % self.length_skip
        } else {
            l0
        };
        (s0, l0)
    }
}

impl ShapeletSearch for SkippingSearch {
    fn init(&mut self, context: &SearchContext<'_>) -> Result<(), ShapeletError> {
        self.space = Some(context.space);
        self.cursors.clear();
        Ok(())
    }

    fn search_series(
        &mut self,
        series: &SeriesRef<'_>,
        evaluate: &mut dyn FnMut(CandidateLocation) -> Option<Shapelet>,
    ) -> Vec<Shapelet> {
        let Some(space) = self.space else {
            return Vec::new();
        };
        let cursor = self.cursors.get(&series.class).copied().unwrap_or((0, 0));
        let (s0, l0) = cursor;

        let mut found = Vec::new();
        for length in (space.min_length() + l0..=space.max_length()).step_by(self.length_skip) {
            let last_start = space.series_length() - length;
            for dimension in 0..space.n_dimensions() {
                for start in (s0..=last_start).step_by(self.position_skip) {
                    found.extend(evaluate(CandidateLocation::new(start, length, dimension)));
                }
            }
        }
        self.cursors.insert(series.class, self.advance(cursor));
        found
    }

    fn name(&self) -> &'static str {
        "skipping"
    }
}
