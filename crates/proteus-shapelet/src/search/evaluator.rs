//! Memoising wrapper around the engine's evaluation callback.

use std::collections::HashMap;

use crate::candidate::CandidateLocation;
use crate::shapelet::Shapelet;

/// Evaluates locations of one series at most once and keeps every
/// non-pruned result.
///
/// Neighbourhood strategies revisit locations; the cache returns the stored
/// quality (or `None` for a pruned candidate) without calling back again.
pub(crate) struct SeriesEvaluator<'a> {
    evaluate: &'a mut dyn FnMut(CandidateLocation) -> Option<Shapelet>,
    cache: HashMap<CandidateLocation, Option<f64>>,
    found: Vec<Shapelet>,
}

impl<'a> SeriesEvaluator<'a> {
    pub(crate) fn new(evaluate: &'a mut dyn FnMut(CandidateLocation) -> Option<Shapelet>) -> Self {
        Self {
            evaluate,
            cache: HashMap::new(),
            found: Vec::new(),
        }
    }

    /// Quality of the candidate at `location`, `None` if it was pruned.
    pub(crate) fn quality(&mut self, location: CandidateLocation) -> Option<f64> {
        if let Some(&cached) = self.cache.get(&location) {
            return cached;
        }
        let result = (self.evaluate)(location);
        let quality = result.as_ref().map(Shapelet::quality);
        if let Some(shapelet) = result {
            self.found.push(shapelet);
        }
        self.cache.insert(location, quality);
        quality
    }

    pub(crate) fn is_evaluated(&self, location: &CandidateLocation) -> bool {
        self.cache.contains_key(location)
    }

    /// Number of distinct locations evaluated.
    pub(crate) fn evaluations(&self) -> usize {
        self.cache.len()
    }

    pub(crate) fn into_found(self) -> Vec<Shapelet> {
        self.found
    }
}
