//! Dataset-wide pre-sampling: improved, subsample, refined and skewed random.

use std::collections::{HashMap, HashSet};

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::candidate::CandidateLocation;
use crate::error::ShapeletError;
use crate::search::{SearchContext, SearchSpace, SeriesRef, ShapeletSearch};
use crate::shapelet::Shapelet;

/// Smallest subset the refined pool shrinks to (capped at the dataset size).
const REFINED_MIN_SERIES: usize = 25;

/// Which series may own sampled candidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeriesPool {
    /// Every series.
    All,
    /// A random subset of `ceil(proportion * N)` series.
    Proportion(f64),
    /// A random subset sized so that sampled candidates cover at least
    /// `min_ratio` of the subset's space.
    Refined {
        /// Minimum coverage ratio.
        min_ratio: f64,
    },
}

/// How candidate lengths are drawn.
#[derive(Debug, Clone, PartialEq)]
pub enum LengthSampler {
    /// Uniform over every (length, start, dimension) triple.
    Uniform,
    /// Length from a weighted histogram over `min_length..=max_length`,
    /// then start and dimension uniformly.
    Weighted(Vec<f64>),
}

/// Pre-samples a fixed number of distinct (series, location) pairs at init
/// and evaluates each series' share when that series is searched.
#[derive(Debug, Clone)]
pub struct SampledSearch {
    total_candidates: u64,
    pool: SeriesPool,
    lengths: LengthSampler,
    seed: u64,
    plan: HashMap<usize, Vec<CandidateLocation>>,
}

impl SampledSearch {
    /// Create a pre-sampling search.
    #[must_use]
    pub fn new(total_candidates: u64, pool: SeriesPool, lengths: LengthSampler, seed: u64) -> Self {
        Self {
            total_candidates,
            pool,
            lengths,
            seed,
            plan: HashMap::new(),
        }
    }

    /// Number of locations still planned across all series.
    #[must_use]
    pub fn planned(&self) -> usize {
        self.plan.values().map(Vec::len).sum()
    }

    /// Series that own at least one planned location, ascending.
    #[must_use]
    pub fn planned_series(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = self.plan.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn pool_size(&self, n_series: usize, per_series: u64) -> usize {
        match self.pool {
            SeriesPool::All => n_series,
            SeriesPool::Proportion(p) => ((p * n_series as f64).ceil() as usize).clamp(1, n_series),
            SeriesPool::Refined { min_ratio } => {
                let floor = REFINED_MIN_SERIES.min(n_series).max(1);
                let fitted =
                    (self.total_candidates as f64 / (min_ratio * per_series as f64)).floor();
                (fitted as usize).clamp(floor, n_series)
            }
        }
    }
}

impl ShapeletSearch for SampledSearch {
    fn init(&mut self, context: &SearchContext<'_>) -> Result<(), ShapeletError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let space = context.space;
        let n_series = context.n_series();
        self.plan.clear();
        if n_series == 0 {
            return Ok(());
        }

        // --- Choose the owning series ---
        let per_series = space.candidates_per_series();
        let size = self.pool_size(n_series, per_series);
        let mut subset: Vec<usize> = if size >= n_series {
            (0..n_series).collect()
        } else {
            index::sample(&mut rng, n_series, size).into_vec()
        };
        subset.sort_unstable();

        // --- Resolve the length sampler ---
        let lengths: Vec<usize> = space.lengths().collect();
        let (weighted, usable_lengths) = match &self.lengths {
            LengthSampler::Uniform => (None, lengths.clone()),
            LengthSampler::Weighted(weights) => {
                if weights.len() != lengths.len() {
                    return Err(ShapeletError::LengthWeightCountMismatch {
                        expected: lengths.len(),
                        got: weights.len(),
                    });
                }
                let dist = WeightedIndex::new(weights)
                    .map_err(|_| ShapeletError::InvalidLengthWeights)?;
                let usable = lengths
                    .iter()
                    .zip(weights)
                    .filter(|(_, w)| **w > 0.0)
                    .map(|(&l, _)| l)
                    .collect::<Vec<_>>();
                (Some(dist), usable)
            }
        };
        let reachable_per_series: u64 = usable_lengths
            .iter()
            .map(|&l| (space.n_starts(l) * space.n_dimensions()) as u64)
            .sum();
        let reachable = reachable_per_series * subset.len() as u64;
        let target = self.total_candidates.min(reachable) as usize;

        // --- Draw distinct (series, location) pairs ---
        let drawn: Vec<(usize, CandidateLocation)> = if (target as u64).saturating_mul(2) >= reachable
        {
            let mut all: Vec<(usize, CandidateLocation)> = subset
                .iter()
                .flat_map(|&id| {
                    space
                        .locations()
                        .filter(|loc| usable_lengths.contains(&loc.length))
                        .map(move |loc| (id, loc))
                })
                .collect();
            all.shuffle(&mut rng);
            all.truncate(target);
            all
        } else {
            let mut seen = HashSet::with_capacity(target);
            let mut drawn = Vec::with_capacity(target);
            while drawn.len() < target {
                let id = subset[rng.gen_range(0..subset.len())];
                let location = match &weighted {
                    None => space.random_location(&mut rng),
                    Some(dist) => {
                        let length = lengths[dist.sample(&mut rng)];
                        space.random_location_with_length(length, &mut rng)
                    }
                };
                if let Some(location) = location
                    && seen.insert((id, location))
                {
                    drawn.push((id, location));
                }
            }
            drawn
        };

        for (id, location) in drawn {
            self.plan.entry(id).or_default().push(location);
        }
        debug!(
            strategy = self.name(),
            subset = subset.len(),
            planned = self.planned(),
            "candidate plan sampled"
        );
        Ok(())
    }

    fn search_series(
        &mut self,
        series: &SeriesRef<'_>,
        evaluate: &mut dyn FnMut(CandidateLocation) -> Option<Shapelet>,
    ) -> Vec<Shapelet> {
        self.plan
            .remove(&series.id)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|loc| evaluate(loc))
            .collect()
    }

    fn can_restart(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        match (&self.pool, &self.lengths) {
            (_, LengthSampler::Weighted(_)) => "skewed_random",
            (SeriesPool::All, LengthSampler::Uniform) => "improved_random",
            (SeriesPool::Proportion(_), LengthSampler::Uniform) => "subsample_random",
            (SeriesPool::Refined { .. }, LengthSampler::Uniform) => "refined_random",
        }
    }
}

#[cfg(test)]
mod tests {
    use proteus_series::ClassLabel;

    use super::*;

    fn init(search: &mut SampledSearch, space: SearchSpace, n_series: usize) {
        let labels = vec![ClassLabel::new(0); n_series];
        let context = SearchContext {
            space,
            labels: &labels,
            n_classes: 1,
            contract: None,
        };
        search.init(&context).unwrap();
    }

    fn all_planned(search: &SampledSearch) -> Vec<(usize, CandidateLocation)> {
        search
            .plan
            .iter()
            .flat_map(|(&id, locs)| locs.iter().map(move |&l| (id, l)))
            .collect()
    }

    #[test]
    fn improved_random_plans_exact_total() {
        let space = SearchSpace::new(40, 3, 12, 1);
        let mut search = SampledSearch::new(30, SeriesPool::All, LengthSampler::Uniform, 3);
        init(&mut search, space, 8);
        let planned = all_planned(&search);
        assert_eq!(planned.len(), 30);
        let unique: HashSet<_> = planned.iter().collect();
        assert_eq!(unique.len(), 30);
        assert!(planned.iter().all(|(id, l)| *id < 8 && space.contains(l)));
    }

    #[test]
    fn total_capped_at_reachable_space() {
        let space = SearchSpace::new(6, 3, 4, 1);
        let mut search = SampledSearch::new(1_000, SeriesPool::All, LengthSampler::Uniform, 3);
        init(&mut search, space, 2);
        // (4 + 3) locations per series
        assert_eq!(search.planned(), 14);
    }

    #[test]
    fn subsample_restricts_owning_series() {
        let space = SearchSpace::new(40, 3, 12, 1);
        let mut search =
            SampledSearch::new(50, SeriesPool::Proportion(0.25), LengthSampler::Uniform, 11);
        init(&mut search, space, 20);
        assert!(search.planned_series().len() <= 5);
        assert_eq!(search.planned(), 50);
    }

    #[test]
    fn refined_pool_keeps_floor() {
        let space = SearchSpace::new(40, 3, 12, 1);
        let mut search = SampledSearch::new(
            10,
            SeriesPool::Refined { min_ratio: 1.0 },
            LengthSampler::Uniform,
            4,
        );
        // 10 candidates alone would justify under one series; floor is min(25, 10).
        assert_eq!(search.pool_size(10, space.candidates_per_series()), 10);
        init(&mut search, space, 10);
        assert_eq!(search.planned(), 10);
    }

    #[test]
    fn skewed_lengths_follow_weights() {
        let space = SearchSpace::new(60, 3, 5, 1);
        let mut search = SampledSearch::new(
            40,
            SeriesPool::All,
            LengthSampler::Weighted(vec![0.0, 0.0, 1.0]),
            8,
        );
        init(&mut search, space, 4);
        let planned = all_planned(&search);
        assert_eq!(planned.len(), 40);
        assert!(planned.iter().all(|(_, l)| l.length == 5));
    }

    #[test]
    fn each_series_evaluates_its_plan_once() {
        let space = SearchSpace::new(20, 3, 6, 1);
        let mut search = SampledSearch::new(12, SeriesPool::All, LengthSampler::Uniform, 2);
        init(&mut search, space, 3);
        let series = crate::search::testing::flat_series(20);
        let mut calls = 0;
        for id in 0..3 {
            let target = SeriesRef {
                id,
                class: ClassLabel::new(0),
                series: &series,
            };
            search.search_series(&target, &mut |_| {
                calls += 1;
                None
            });
        }
        assert_eq!(calls, 12);
        assert_eq!(search.planned(), 0);
    }
}
