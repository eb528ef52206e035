//! Tabu neighbourhood search over (start, length).

use std::collections::VecDeque;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::candidate::CandidateLocation;
use crate::error::ShapeletError;
use crate::search::{
    SearchContext, SearchSpace, SeriesEvaluator, SeriesRef, ShapeletSearch, clamp_quota,
};
use crate::shapelet::Shapelet;

/// Moves through the neighbourhood of the best location found so far,
/// refusing recently chosen locations.
///
/// A series starts from the best location of the previous series. When
/// every neighbour is tabu or pruned the search restarts from a random
/// location.
#[derive(Debug, Clone)]
pub struct TabuSearch {
    candidates_per_series: u64,
    neighbourhood_width: usize,
    tabu_size: usize,
    seed: u64,
    rng: ChaCha8Rng,
    space: Option<SearchSpace>,
    carried: Option<CandidateLocation>,
}

impl TabuSearch {
    /// Create a tabu search.
    #[must_use]
    pub fn new(
        candidates_per_series: u64,
        neighbourhood_width: usize,
        tabu_size: usize,
        seed: u64,
    ) -> Self {
        Self {
            candidates_per_series,
            neighbourhood_width,
            tabu_size,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            space: None,
            carried: None,
        }
    }

    /// Valid locations within `width / 2` of `centre` in start and length.
    fn neighbourhood(&self, space: &SearchSpace, centre: CandidateLocation) -> Vec<CandidateLocation> {
        let half = (self.neighbourhood_width / 2) as isize;
        let mut out = Vec::new();
        for dl in -half..=half {
            for ds in -half..=half {
                let length = centre.length as isize + dl;
                let start = centre.start as isize + ds;
                if length < 1 || start < 0 {
                    continue;
                }
                let loc = CandidateLocation::new(start as usize, length as usize, centre.dimension);
                if space.contains(&loc) {
                    out.push(loc);
                }
            }
        }
        out
    }
}

impl ShapeletSearch for TabuSearch {
    fn init(&mut self, context: &SearchContext<'_>) -> Result<(), ShapeletError> {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.space = Some(context.space);
        self.carried = None;
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
        let quota = clamp_quota(self.candidates_per_series, &space);
        let mut evaluator = SeriesEvaluator::new(evaluate);
        let mut tabu: VecDeque<CandidateLocation> = VecDeque::with_capacity(self.tabu_size);
        let mut best: Option<(CandidateLocation, f64)> = None;

        let Some(mut centre) = self
            .carried
            .filter(|loc| space.contains(loc))
            .or_else(|| space.random_location(&mut self.rng))
        else {
            return Vec::new();
        };

        let max_iterations = quota * 4 + 16;
        let mut iterations = 0;
        while evaluator.evaluations() < quota && iterations < max_iterations {
            iterations += 1;

            let mut step_best: Option<(CandidateLocation, f64)> = None;
            for loc in self.neighbourhood(&space, centre) {
                if tabu.contains(&loc) {
                    continue;
                }
                if evaluator.evaluations() >= quota && !evaluator.is_evaluated(&loc) {
                    break;
                }
                if let Some(q) = evaluator.quality(loc)
                    && step_best.is_none_or(|(_, bq)| q > bq)
                {
                    step_best = Some((loc, q));
                }
            }

            let Some((chosen, quality)) = step_best else {
                match space.random_location(&mut self.rng) {
                    Some(loc) => centre = loc,
                    None => break,
                }
                continue;
            };

            if tabu.len() == self.tabu_size {
                tabu.pop_front();
            }
            tabu.push_back(chosen);
            if best.is_none_or(|(_, bq)| quality > bq) {
                best = Some((chosen, quality));
            }
            centre = best.map_or(chosen, |(loc, _)| loc);
        }

        if let Some((loc, _)) = best {
            self.carried = Some(loc);
        }
        evaluator.into_found()
    }

    fn set_candidates_per_series(&mut self, candidates: u64) {
        self.candidates_per_series = candidates.max(1);
    }

    fn name(&self) -> &'static str {
        "tabu"
    }
}
