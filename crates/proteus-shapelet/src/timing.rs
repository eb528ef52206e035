//! Operation counting, contract planning and adaptive per-series budgets.

use std::time::Duration;

use crate::search::{SearchSpace, SearchStrategy};

/// Predicted cost of one distance operation.
pub const NANOS_PER_OPERATION: f64 = 10.0;
/// Weight of the newest observation in the time-per-candidate average.
pub const DEFAULT_BETA: f64 = 0.2;
/// Per-series quota never drops below this.
pub const MIN_CANDIDATES_PER_SERIES: u64 = 1;
/// Upper limit on K chosen for a contract.
pub const MAX_CONTRACT_SHAPELETS: usize = 2000;

/// Number of candidates in one univariate series on a stepped grid.
#[must_use]
pub fn candidates_per_series(
    series_length: usize,
    min_length: usize,
    max_length: usize,
    length_step: usize,
    position_step: usize,
) -> u64 {
    if min_length == 0 || min_length > max_length || max_length > series_length {
        return 0;
    }
    SearchSpace::new(series_length, min_length, max_length, 1)
        .with_steps(length_step, position_step)
        .candidates_per_series()
}

/// `n * sum over L in [min, max] of (m - L + 1)`.
#[must_use]
pub fn total_candidates(n_series: usize, series_length: usize, min_length: usize, max_length: usize) -> u64 {
    n_series as u64 * candidates_per_series(series_length, min_length, max_length, 1, 1)
}

/// Distance operations of an exhaustive search on a stepped grid.
///
/// Each length `L` contributes `ceil((m - L + 1) / position_step)` candidates,
/// each compared at `m - L + 1` offsets of `L` points, against `n (n - 1)`
/// (candidate series, other series) pairs.
#[must_use]
pub fn estimate_operations(
    n_series: usize,
    series_length: usize,
    min_length: usize,
    max_length: usize,
    position_step: usize,
    length_step: usize,
) -> f64 {
    if min_length == 0 || min_length > max_length || max_length > series_length {
        return 0.0;
    }
    let position_step = position_step.max(1) as f64;
    let per_pair: f64 = (min_length..=max_length)
        .step_by(length_step.max(1))
        .map(|length| {
            let offsets = (series_length - length + 1) as f64;
            (offsets / position_step).ceil() * offsets * length as f64
        })
        .sum();
    let n = n_series as f64;
    per_pair * n * (n - 1.0).max(0.0)
}

/// Predicted nanoseconds to score one candidate of length `length`.
#[must_use]
pub fn candidate_cost(series_length: usize, length: usize, n_series: usize, nanos_per_operation: f64) -> f64 {
    let offsets = series_length.saturating_sub(length) + 1;
    (offsets * length * n_series.saturating_sub(1)) as f64 * nanos_per_operation
}

/// K, lengths and strategy that fit a search into a time contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractPlan {
    /// Number of shapelets to retain.
    pub k: usize,
    /// Shortest candidate length.
    pub min_length: usize,
    /// Longest candidate length.
    pub max_length: usize,
    /// Exhaustive when it fits, improved random otherwise.
    pub strategy: SearchStrategy,
    /// Predicted operations of the exhaustive search.
    pub operations: f64,
    /// Operations affordable within the contract.
    pub target_operations: f64,
}

impl ContractPlan {
    /// Plan a search over `n_series` series of `series_length` points and
    /// `n_dimensions` independent channels within `contract`.
    ///
    /// K is `min(n_series, 2000)` and lengths run from 3 (or the series
    /// length, if shorter) to the series length. When the exhaustive search
    /// would take more operations than the contract affords at 10 ns each,
    /// improved random search samples the affordable share of the candidates
    /// and K is capped by that count.
    #[must_use]
    pub fn for_contract(
        n_series: usize,
        series_length: usize,
        n_dimensions: usize,
        contract: Duration,
    ) -> Self {
        let max_length = series_length;
        let min_length = 3.min(series_length);
        let dims = n_dimensions.max(1) as f64;
        let mut k = n_series.min(MAX_CONTRACT_SHAPELETS).max(1);

        let operations =
            estimate_operations(n_series, series_length, min_length, max_length, 1, 1) * dims;
        let target_operations = contract.as_nanos() as f64 / NANOS_PER_OPERATION;

        let strategy = if operations <= target_operations {
            SearchStrategy::default()
        } else {
            let total = total_candidates(n_series, series_length, min_length, max_length) as f64 * dims;
            let count = ((total * target_operations / operations).floor() as u64).max(1);
            k = k.min(count as usize);
            SearchStrategy::ImprovedRandom {
                total_candidates: count,
            }
        };

        Self {
            k,
            min_length,
            max_length,
            strategy,
            operations,
            target_operations,
        }
    }
}

/// Exponential moving average of the observed time per candidate, turned
/// into a per-series quota for the time that is left.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveTimer {
    contract: Duration,
    beta: f64,
    estimate_nanos: Option<f64>,
}

impl AdaptiveTimer {
    /// Create a timer. `initial` seeds the estimate; without it the first
    /// observation does.
    #[must_use]
    pub fn new(contract: Duration, initial: Option<Duration>) -> Self {
        Self {
            contract,
            beta: DEFAULT_BETA,
            estimate_nanos: initial.map(|d| d.as_nanos() as f64),
        }
    }

    /// Restore a timer from a saved estimate.
    #[must_use]
    pub fn with_estimate(mut self, estimate_nanos: Option<f64>) -> Self {
        if estimate_nanos.is_some() {
            self.estimate_nanos = estimate_nanos;
        }
        self
    }

    /// Current time-per-candidate estimate in nanoseconds.
    #[must_use]
    pub fn estimate_nanos(&self) -> Option<f64> {
        self.estimate_nanos
    }

    /// Fold in one series that took `elapsed` for `attempted` candidates.
    pub fn observe(&mut self, elapsed: Duration, attempted: u64) {
        if attempted == 0 {
            return;
        }
        let observed = elapsed.as_nanos() as f64 / attempted as f64;
        self.estimate_nanos = Some(match self.estimate_nanos {
            None => observed,
            Some(previous) => self.beta * observed + (1.0 - self.beta) * previous,
        });
    }

    /// Candidates each of the `series_left` series can afford after `used`.
    ///
    /// `None` until an estimate exists. Never below one.
    #[must_use]
    pub fn quota(&self, used: Duration, series_left: usize) -> Option<u64> {
        let estimate = self.estimate_nanos?;
        let remaining = self.contract.saturating_sub(used).as_nanos() as f64;
        let per_series = remaining / series_left.max(1) as f64;
        let quota = if estimate > 0.0 {
            (per_series / estimate).floor()
        } else {
            f64::MAX
        };
        Some((quota.min(u64::MAX as f64) as u64).max(MIN_CANDIDATES_PER_SERIES))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_candidates_sums_offsets() {
        // m = 10, lengths 3..=5: 8 + 7 + 6
        assert_eq!(total_candidates(4, 10, 3, 5), 4 * 21);
        assert_eq!(candidates_per_series(10, 3, 5, 1, 1), 21);
        assert_eq!(candidates_per_series(10, 3, 5, 2, 1), 14);
        assert_eq!(candidates_per_series(10, 6, 5, 1, 1), 0);
    }

    #[test]
    fn operation_estimate_formula() {
        // One length L = 2, m = 4: 3 candidates * 3 offsets * 2 points * (3 * 2) pairs.
        assert_eq!(estimate_operations(3, 4, 2, 2, 1, 1), 108.0);
        // position step 2 halves (rounding up) the candidates.
        assert_eq!(estimate_operations(3, 4, 2, 2, 2, 1), 72.0);
        assert_eq!(estimate_operations(1, 4, 2, 2, 1, 1), 0.0);
    }

    #[test]
    fn candidate_cost_formula() {
        assert_eq!(candidate_cost(20, 5, 11, 1.0), 800.0);
        assert_eq!(candidate_cost(20, 5, 1, 10.0), 0.0);
    }

    #[test]
    fn generous_contract_plans_exhaustive_search() {
        let plan = ContractPlan::for_contract(10, 20, 1, Duration::from_secs(3600));
        assert!(plan.strategy.is_exhaustive());
        assert_eq!(plan.k, 10);
        assert_eq!((plan.min_length, plan.max_length), (3, 20));
    }

    #[test]
    fn tight_contract_plans_sampling() {
        let plan = ContractPlan::for_contract(100, 200, 1, Duration::from_millis(1));
        assert!(plan.operations > plan.target_operations);
        let SearchStrategy::ImprovedRandom { total_candidates: count } = plan.strategy else {
            panic!("expected improved random, got {:?}", plan.strategy);
        };
        let total = total_candidates(100, 200, 3, 200) as f64;
        let expected = (total * plan.target_operations / plan.operations).floor() as u64;
        assert_eq!(count, expected.max(1));
        assert!(plan.k <= count as usize);
    }

    #[test]
    fn timer_seeds_then_averages() {
        let mut timer = AdaptiveTimer::new(Duration::from_secs(1), None);
        assert_eq!(timer.quota(Duration::ZERO, 10), None);
        timer.observe(Duration::from_micros(100), 10);
        assert_eq!(timer.estimate_nanos(), Some(10_000.0));
        timer.observe(Duration::from_micros(200), 10);
        assert!((timer.estimate_nanos().unwrap() - 12_000.0).abs() < 1e-6);
        timer.observe(Duration::from_secs(5), 0);
        assert!((timer.estimate_nanos().unwrap() - 12_000.0).abs() < 1e-6);
    }

    #[test]
    fn quota_from_remaining_time() {
        let timer = AdaptiveTimer::new(Duration::from_millis(10), Some(Duration::from_micros(1)));
        // 6 ms left over 3 series at 1 us per candidate
        assert_eq!(timer.quota(Duration::from_millis(4), 3), Some(2_000));
        // Out of time still allows one candidate.
        assert_eq!(timer.quota(Duration::from_millis(20), 3), Some(1));
    }
}
