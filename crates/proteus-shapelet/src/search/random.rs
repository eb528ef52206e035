//! Uniform random sampling without replacement within each series.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::candidate::CandidateLocation;
use crate::error::ShapeletError;
use crate::search::{SearchContext, SearchSpace, SeriesRef, ShapeletSearch, VisitedSet, clamp_quota};
use crate::shapelet::Shapelet;

/// Draw `quota` distinct locations of `space`.
///
/// Dense draws (at least half the space) shuffle the whole grid and take a
/// prefix; sparse draws use rejection sampling against a [`VisitedSet`].
pub(crate) fn sample_distinct(
    space: &SearchSpace,
    quota: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<CandidateLocation> {
    let total = space.candidates_per_series() as usize;
    let quota = quota.min(total);
    if quota.saturating_mul(2) >= total {
        let mut all: Vec<CandidateLocation> = space.locations().collect();
        all.shuffle(rng);
        all.truncate(quota);
        return all;
    }
    let mut visited = VisitedSet::new(space);
    let mut drawn = Vec::with_capacity(quota);
    while drawn.len() < quota {
        let Some(location) = space.random_location(rng) else {
            break;
        };
        if visited.insert(location) {
            drawn.push(location);
        }
    }
    drawn
}

/// Scores a fixed number of distinct, uniformly drawn locations per series.
#[derive(Debug, Clone)]
pub struct RandomSearch {
    candidates_per_series: u64,
    seed: u64,
    rng: ChaCha8Rng,
    space: Option<SearchSpace>,
}

impl RandomSearch {
    /// Create a random search drawing `candidates_per_series` per series.
    #[must_use]
    pub fn new(candidates_per_series: u64, seed: u64) -> Self {
        Self {
            candidates_per_series,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            space: None,
        }
    }
}

impl ShapeletSearch for RandomSearch {
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
        sample_distinct(&space, quota, &mut self.rng)
            .into_iter()
            .filter_map(|loc| evaluate(loc))
            .collect()
    }

    fn set_candidates_per_series(&mut self, candidates: u64) {
        self.candidates_per_series = candidates.max(1);
    }

    fn name(&self) -> &'static str {
        "random"
    }
}
