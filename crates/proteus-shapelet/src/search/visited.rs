//! Per-series record of locations already drawn.

use crate::candidate::CandidateLocation;
use crate::search::space::SearchSpace;

/// Visited flags, one table per (length, dimension) allocated on first use
/// and indexed by start.
#[derive(Debug, Clone)]
pub(crate) struct VisitedSet {
    series_length: usize,
    min_length: usize,
    n_dimensions: usize,
    tables: Vec<Option<Vec<bool>>>,
    count: usize,
}

impl VisitedSet {
    pub(crate) fn new(space: &SearchSpace) -> Self {
        let n_lengths = space.max_length() - space.min_length() + 1;
        Self {
            series_length: space.series_length(),
            min_length: space.min_length(),
            n_dimensions: space.n_dimensions(),
            tables: vec![None; n_lengths * space.n_dimensions()],
            count: 0,
        }
    }

    fn slot(&self, location: &CandidateLocation) -> usize {
        (location.length - self.min_length) * self.n_dimensions + location.dimension
    }

    /// Mark a location, returning true if it had not been seen before.
    ///
    /// The location must lie inside the space the set was built for.
    pub(crate) fn insert(&mut self, location: CandidateLocation) -> bool {
        let slot = self.slot(&location);
        let n_starts = self.series_length - location.length + 1;
        let table = self.tables[slot].get_or_insert_with(|| vec![false; n_starts]);
        if table[location.start] {
            return false;
        }
        table[location.start] = true;
        self.count += 1;
        true
    }

    pub(crate) fn contains(&self, location: &CandidateLocation) -> bool {
        self.tables[self.slot(location)]
            .as_ref()
            .is_some_and(|t| t[location.start])
    }

    /// Number of distinct locations marked.
    pub(crate) fn len(&self) -> usize {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_reports_novelty() {
        let space = SearchSpace::new(10, 3, 5, 2);
        let mut visited = VisitedSet::new(&space);
        let loc = CandidateLocation::new(2, 4, 1);
        assert!(!visited.contains(&loc));
        assert!(visited.insert(loc));
        assert!(!visited.insert(loc));
        assert!(visited.contains(&loc));
        assert!(!visited.contains(&CandidateLocation::new(2, 4, 0)));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn tables_allocated_lazily() {
        let space = SearchSpace::new(10, 3, 5, 1);
        let mut visited = VisitedSet::new(&space);
        assert!(visited.tables.iter().all(Option::is_none));
        visited.insert(CandidateLocation::new(0, 5, 0));
        assert_eq!(visited.tables.iter().filter(|t| t.is_some()).count(), 1);
    }
}
