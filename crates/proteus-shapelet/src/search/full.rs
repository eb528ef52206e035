//! Exhaustive enumeration of the candidate grid.

use crate::candidate::CandidateLocation;
use crate::error::ShapeletError;
use crate::search::{SearchContext, SearchSpace, SeriesRef, ShapeletSearch};
use crate::shapelet::Shapelet;

/// Scores every location on the grid, in enumeration order.
#[derive(Debug, Clone)]
pub struct FullSearch {
    length_step: usize,
    position_step: usize,
    space: Option<SearchSpace>,
}

impl FullSearch {
    /// Create an exhaustive search over a grid with the given steps.
    #[must_use]
    pub fn new(length_step: usize, position_step: usize) -> Self {
        Self {
            length_step,
            position_step,
            space: None,
        }
    }
}

impl ShapeletSearch for FullSearch {
    fn init(&mut self, context: &SearchContext<'_>) -> Result<(), ShapeletError> {
        self.space = Some(
            context
                .space
                .with_steps(self.length_step, self.position_step),
        );
        Ok(())
    }

    fn search_series(
        &mut self,
        _series: &SeriesRef<'_>,
        evaluate: &mut dyn FnMut(CandidateLocation) -> Option<Shapelet>,
    ) -> Vec<Shapelet> {
        let Some(space) = self.space else {
            return Vec::new();
        };
        space.locations().filter_map(|loc| evaluate(loc)).collect()
    }

    fn can_restart(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "full"
    }
}

#[cfg(test)]
mod tests {
    use proteus_series::{ClassLabel, TimeSeries};

    use super::*;

    #[test]
    fn visits_every_location_once() {
        let labels = [ClassLabel::new(0)];
        let context = SearchContext {
            space: SearchSpace::new(8, 2, 4, 1),
            labels: &labels,
            n_classes: 1,
            contract: None,
        };
        let mut search = FullSearch::new(1, 1);
        search.init(&context).unwrap();

        let series = TimeSeries::new(vec![0.0; 8]).unwrap();
        let target = SeriesRef {
            id: 0,
            class: ClassLabel::new(0),
            series: &series,
        };
        let mut seen = Vec::new();
        let found = search.search_series(&target, &mut |loc| {
            seen.push(loc);
            None
        });
        assert!(found.is_empty());
        assert_eq!(seen.len(), 7 + 6 + 5);
        let mut dedup = seen.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), seen.len());
    }
}
