//! Hill climbing from random starting locations.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::candidate::CandidateLocation;
use crate::error::ShapeletError;
use crate::search::{
    SearchContext, SearchSpace, SeriesEvaluator, SeriesRef, ShapeletSearch, clamp_quota,
};
use crate::shapelet::Shapelet;

/// Runs independent climbs until the per-series quota is scored.
///
/// Each step looks at length + 1, start - 1, start + 1 and length - 1 (in
/// that order) and moves to the best strict improvement; equal gains keep
/// the earlier move.
#[derive(Debug, Clone)]
pub struct LocalSearch {
    candidates_per_series: u64,
    max_steps: usize,
    seed: u64,
    rng: ChaCha8Rng,
    space: Option<SearchSpace>,
}

impl LocalSearch {
    /// Create a local search.
    #[must_use]
    pub fn new(candidates_per_series: u64, max_steps: usize, seed: u64) -> Self {
        Self {
            candidates_per_series,
            max_steps,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            space: None,
        }
    }
}

fn moves(loc: CandidateLocation) -> [Option<CandidateLocation>; 4] {
    [
        Some(CandidateLocation::new(loc.start, loc.length + 1, loc.dimension)),
        loc.start
            .checked_sub(1)
            .map(|s| CandidateLocation::new(s, loc.length, loc.dimension)),
        Some(CandidateLocation::new(loc.start + 1, loc.length, loc.dimension)),
        loc.length
            .checked_sub(1)
            .map(|l| CandidateLocation::new(loc.start, l, loc.dimension)),
    ]
}

impl ShapeletSearch for LocalSearch {
    fn init(&mut self, context: &SearchContext<'_>) -> Result<(), ShapeletError> {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.space = Some(context.space);
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

        let max_climbs = quota * 4 + 16;
        let mut climbs = 0;
        while evaluator.evaluations() < quota && climbs < max_climbs {
            climbs += 1;
            let Some(mut current) = space.random_location(&mut self.rng) else {
                break;
            };
            let Some(mut current_quality) = evaluator.quality(current) else {
                continue;
            };

            for _ in 0..self.max_steps {
                let mut next: Option<(CandidateLocation, f64)> = None;
                for candidate in moves(current).into_iter().flatten() {
                    if !space.contains(&candidate) {
                        continue;
                    }
                    if evaluator.evaluations() >= quota && !evaluator.is_evaluated(&candidate) {
                        break;
                    }
                    let Some(q) = evaluator.quality(candidate) else {
                        continue;
                    };
                    let threshold = next.map_or(current_quality, |(_, nq)| nq);
                    if q > threshold {
                        next = Some((candidate, q));
                    }
                }
                match next {
                    Some((loc, q)) => {
                        current = loc;
                        current_quality = q;
                    }
                    None => break,
                }
            }
        }
        evaluator.into_found()
    }

    fn set_candidates_per_series(&mut self, candidates: u64) {
        self.candidates_per_series = candidates.max(1);
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
