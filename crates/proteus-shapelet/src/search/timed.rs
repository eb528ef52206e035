//! Random search that stops when a predicted time budget is spent.

use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::candidate::CandidateLocation;
use crate::error::ShapeletError;
use crate::search::random::sample_distinct;
use crate::search::{SearchContext, SearchSpace, SeriesRef, ShapeletSearch};
use crate::shapelet::Shapelet;
use crate::timing::candidate_cost;

/// Draws locations without replacement, charging each its predicted cost
/// `(m - L + 1) * L * (N - 1)` operations, until the per-series budget is
/// exceeded. At least one candidate is scored per series.
#[derive(Debug, Clone)]
pub struct TimedSearch {
    time_per_series: Option<Duration>,
    nanos_per_operation: f64,
    seed: u64,
    rng: ChaCha8Rng,
    space: Option<SearchSpace>,
    n_series: usize,
    budget_nanos: f64,
}

impl TimedSearch {
    /// Create a timed search. Without `time_per_series` the budget is the
    /// contract divided evenly over the series.
    #[must_use]
    pub fn new(time_per_series: Option<Duration>, nanos_per_operation: f64, seed: u64) -> Self {
        Self {
            time_per_series,
            nanos_per_operation,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            space: None,
            n_series: 0,
            budget_nanos: 0.0,
        }
    }

    /// Budget per series in nanoseconds, resolved at init.
    #[must_use]
    pub fn budget_nanos(&self) -> f64 {
        self.budget_nanos
    }
}

impl ShapeletSearch for TimedSearch {
    fn init(&mut self, context: &SearchContext<'_>) -> Result<(), ShapeletError> {
        let n_series = context.n_series().max(1);
        let budget = match (self.time_per_series, context.contract) {
            (Some(per_series), _) => per_series,
            (None, Some(contract)) => contract / n_series as u32,
            (None, None) => return Err(ShapeletError::TimedSearchWithoutBudget),
        };
        self.budget_nanos = budget.as_nanos() as f64;
        self.n_series = context.n_series();
        self.space = Some(context.space);
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
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
        let order = sample_distinct(&space, space.candidates_per_series() as usize, &mut self.rng);
        let mut spent = 0.0;
        let mut found = Vec::new();
        for location in order {
            spent += candidate_cost(
                space.series_length(),
                location.length,
                self.n_series,
                self.nanos_per_operation,
            );
            found.extend(evaluate(location));
            if spent > self.budget_nanos {
                break;
            }
        }
        found
    }

    fn name(&self) -> &'static str {
        "timed_random"
    }
}
