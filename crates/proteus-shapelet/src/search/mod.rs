//! Candidate search strategies.
//!
//! Every strategy implements [`ShapeletSearch`]: it is initialised once per
//! fit, then asked to search one series at a time, reporting each location
//! it wants scored to the engine's callback.

mod evaluator;
mod full;
mod genetic;
mod local;
mod random;
mod sampled;
mod skipping;
mod space;
mod tabu;
mod timed;
mod visited;

use std::time::Duration;

use proteus_series::{ClassLabel, TimeSeries};

use crate::candidate::CandidateLocation;
use crate::error::ShapeletError;
use crate::shapelet::Shapelet;

pub use full::FullSearch;
pub use genetic::GeneticSearch;
pub use local::LocalSearch;
pub use random::RandomSearch;
pub use sampled::{LengthSampler, SampledSearch, SeriesPool};
pub use skipping::SkippingSearch;
pub use space::SearchSpace;
pub use tabu::TabuSearch;
pub use timed::TimedSearch;

pub(crate) use evaluator::SeriesEvaluator;
pub(crate) use visited::VisitedSet;

/// Default number of neighbours per axis examined by tabu search.
pub const DEFAULT_NEIGHBOURHOOD_WIDTH: usize = 3;
/// Default capacity of the tabu list.
pub const DEFAULT_TABU_SIZE: usize = 50;
/// Default genetic crossover probability.
pub const DEFAULT_CROSSOVER_RATE: f64 = 0.9;
/// Default genetic per-gene mutation probability.
pub const DEFAULT_MUTATION_RATE: f64 = 0.1;

/// What a strategy learns about the fit before searching.
#[derive(Debug, Clone, Copy)]
pub struct SearchContext<'a> {
    /// Candidate space of every series.
    pub space: SearchSpace,
    /// Class of each series, indexed by series id.
    pub labels: &'a [ClassLabel],
    /// Number of classes in the dataset.
    pub n_classes: usize,
    /// Overall time contract, if any.
    pub contract: Option<Duration>,
}

impl SearchContext<'_> {
    /// Number of series in the dataset.
    #[must_use]
    pub fn n_series(&self) -> usize {
        self.labels.len()
    }
}

/// The series currently being searched.
#[derive(Debug, Clone, Copy)]
pub struct SeriesRef<'a> {
    /// Series id (index into the training dataset).
    pub id: usize,
    /// Class of the series.
    pub class: ClassLabel,
    /// The series itself.
    pub series: &'a TimeSeries,
}

/// A strategy for choosing which candidates of a series get scored.
pub trait ShapeletSearch: Send {
    /// Reset state and precompute anything that depends on the dataset.
    ///
    /// # Errors
    ///
    /// Returns an error if the strategy cannot run on this dataset.
    fn init(&mut self, context: &SearchContext<'_>) -> Result<(), ShapeletError>;

    /// Search one series, calling `evaluate` for each location to score.
    ///
    /// `evaluate` returns `None` for a pruned candidate. Returns every
    /// shapelet that was not pruned, in discovery order.
    fn search_series(
        &mut self,
        series: &SeriesRef<'_>,
        evaluate: &mut dyn FnMut(CandidateLocation) -> Option<Shapelet>,
    ) -> Vec<Shapelet>;

    /// Change the per-series candidate quota. Strategies without a quota
    /// ignore it.
    fn set_candidates_per_series(&mut self, _candidates: u64) {}

    /// Return true if another pass over the data can find new candidates.
    fn can_restart(&self) -> bool {
        true
    }

    /// Short name for logs and summaries.
    fn name(&self) -> &'static str;
}

/// Search strategy and its parameters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum SearchStrategy {
    /// Every location on the (possibly coarsened) grid.
    Full {
        /// Step between candidate lengths.
        length_step: usize,
        /// Step between candidate starts.
        position_step: usize,
    },
    /// Distinct uniformly drawn locations per series.
    Random {
        /// Locations drawn in each series.
        candidates_per_series: u64,
    },
    /// A fixed total of distinct locations pre-sampled over the whole dataset.
    ImprovedRandom {
        /// Locations drawn across the dataset.
        total_candidates: u64,
    },
    /// Improved random restricted to a random subset of series.
    SubsampleRandom {
        /// Locations drawn across the subset.
        total_candidates: u64,
        /// Fraction of series in the subset, in (0, 1].
        proportion: f64,
    },
    /// Improved random with the subset sized to keep coverage above a ratio.
    RefinedRandom {
        /// Locations drawn across the subset.
        total_candidates: u64,
        /// Minimum ratio of sampled locations to the subset's space, in (0, 1].
        min_ratio: f64,
    },
    /// Improved random with lengths drawn from a histogram.
    SkewedRandom {
        /// Locations drawn across the dataset.
        total_candidates: u64,
        /// One non-negative weight per length in `min_length..=max_length`.
        length_weights: Vec<f64>,
    },
    /// Tabu neighbourhood search.
    Tabu {
        /// Distinct locations scored per series.
        candidates_per_series: u64,
        /// Neighbourhood size per axis.
        neighbourhood_width: usize,
        /// Capacity of the tabu list.
        tabu_size: usize,
    },
    /// Hill climbing from random starts.
    Local {
        /// Distinct locations scored per series.
        candidates_per_series: u64,
        /// Maximum moves per climb.
        max_steps: usize,
    },
    /// Genetic search over (start, length) genes.
    Genetic {
        /// Distinct locations scored per series.
        candidates_per_series: u64,
        /// Individuals per generation.
        population_size: usize,
        /// Individuals compared in each tournament.
        tournament_size: usize,
        /// Probability of crossing two parents.
        crossover_rate: f64,
        /// Per-gene probability of a +/-1 mutation.
        mutation_rate: f64,
    },
    /// A coarse grid shifted per class on every visit.
    Skipping {
        /// Step between starts.
        position_skip: usize,
        /// Step between lengths.
        length_skip: usize,
    },
    /// Random without replacement until a predicted time budget is spent.
    TimedRandom {
        /// Budget per series; derived from the contract when `None`.
        time_per_series: Option<Duration>,
        /// Predicted cost of one distance operation in nanoseconds.
        nanos_per_operation: f64,
    },
}

impl Default for SearchStrategy {
    fn default() -> Self {
        SearchStrategy::Full {
            length_step: 1,
            position_step: 1,
        }
    }
}

impl SearchStrategy {
    /// Tabu search with default neighbourhood width and list size.
    #[must_use]
    pub fn tabu(candidates_per_series: u64) -> Self {
        SearchStrategy::Tabu {
            candidates_per_series,
            neighbourhood_width: DEFAULT_NEIGHBOURHOOD_WIDTH,
            tabu_size: DEFAULT_TABU_SIZE,
        }
    }

    /// Genetic search with default crossover and mutation rates.
    #[must_use]
    pub fn genetic(candidates_per_series: u64, population_size: usize, tournament_size: usize) -> Self {
        SearchStrategy::Genetic {
            candidates_per_series,
            population_size,
            tournament_size,
            crossover_rate: DEFAULT_CROSSOVER_RATE,
            mutation_rate: DEFAULT_MUTATION_RATE,
        }
    }

    /// Time-contracted random search with the default operation cost.
    #[must_use]
    pub fn timed(time_per_series: Option<Duration>) -> Self {
        SearchStrategy::TimedRandom {
            time_per_series,
            nanos_per_operation: crate::timing::NANOS_PER_OPERATION,
        }
    }

    /// Return true for the exhaustive strategy.
    #[must_use]
    pub fn is_exhaustive(&self) -> bool {
        matches!(self, SearchStrategy::Full { .. })
    }

    /// Check parameters that do not depend on the dataset.
    ///
    /// `n_lengths` is the number of lengths in `min_length..=max_length`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ShapeletError::InvalidStep`] | A step or skip is zero |
    /// | [`ShapeletError::InvalidCandidateCount`] | A candidate quota is zero |
    /// | [`ShapeletError::InvalidProportion`] | `proportion` not in (0, 1] |
    /// | [`ShapeletError::InvalidCandidateRatio`] | `min_ratio` not in (0, 1] |
    /// | [`ShapeletError::LengthWeightCountMismatch`] | Weights do not cover every length |
    /// | [`ShapeletError::InvalidLengthWeights`] | A weight is negative or non-finite, or all are zero |
    /// | [`ShapeletError::InvalidTabuParameters`] | Neighbourhood width or tabu size is zero |
    /// | [`ShapeletError::InvalidMaxSteps`] | `max_steps` is zero |
    /// | [`ShapeletError::InvalidPopulationSize`] | Population below 2 |
    /// | [`ShapeletError::InvalidTournamentSize`] | Tournament size outside [1, population] |
    /// | [`ShapeletError::InvalidRate`] | Crossover or mutation rate outside [0, 1] |
    /// | [`ShapeletError::InvalidOperationCost`] | Operation cost not positive and finite |
    pub fn validate(&self, n_lengths: usize) -> Result<(), ShapeletError> {
        match self {
            SearchStrategy::Full {
                length_step,
                position_step,
            } => check_steps(*position_step, *length_step),
            SearchStrategy::Random {
                candidates_per_series,
            } => check_count(*candidates_per_series),
            SearchStrategy::ImprovedRandom { total_candidates } => check_count(*total_candidates),
            SearchStrategy::SubsampleRandom {
                total_candidates,
                proportion,
            } => {
                check_count(*total_candidates)?;
                if !(*proportion > 0.0 && *proportion <= 1.0) {
                    return Err(ShapeletError::InvalidProportion {
                        proportion: *proportion,
                    });
                }
                Ok(())
            }
            SearchStrategy::RefinedRandom {
                total_candidates,
                min_ratio,
            } => {
                check_count(*total_candidates)?;
                if !(*min_ratio > 0.0 && *min_ratio <= 1.0) {
                    return Err(ShapeletError::InvalidCandidateRatio { ratio: *min_ratio });
                }
                Ok(())
            }
            SearchStrategy::SkewedRandom {
                total_candidates,
                length_weights,
            } => {
                check_count(*total_candidates)?;
                if length_weights.len() != n_lengths {
                    return Err(ShapeletError::LengthWeightCountMismatch {
                        expected: n_lengths,
                        got: length_weights.len(),
                    });
                }
                if length_weights.iter().any(|w| !w.is_finite() || *w < 0.0)
                    || length_weights.iter().all(|&w| w == 0.0)
                {
                    return Err(ShapeletError::InvalidLengthWeights);
                }
                Ok(())
            }
            SearchStrategy::Tabu {
                candidates_per_series,
                neighbourhood_width,
                tabu_size,
            } => {
                check_count(*candidates_per_series)?;
                if *neighbourhood_width == 0 || *tabu_size == 0 {
                    return Err(ShapeletError::InvalidTabuParameters {
                        neighbourhood_width: *neighbourhood_width,
                        tabu_size: *tabu_size,
                    });
                }
                Ok(())
            }
            SearchStrategy::Local {
                candidates_per_series,
                max_steps,
            } => {
                check_count(*candidates_per_series)?;
                if *max_steps == 0 {
                    return Err(ShapeletError::InvalidMaxSteps {
                        max_steps: *max_steps,
                    });
                }
                Ok(())
            }
            SearchStrategy::Genetic {
                candidates_per_series,
                population_size,
                tournament_size,
                crossover_rate,
                mutation_rate,
            } => {
                check_count(*candidates_per_series)?;
                if *population_size < 2 {
                    return Err(ShapeletError::InvalidPopulationSize {
                        population_size: *population_size,
                    });
                }
                if *tournament_size == 0 || tournament_size > population_size {
                    return Err(ShapeletError::InvalidTournamentSize {
                        tournament_size: *tournament_size,
                        population_size: *population_size,
                    });
                }
                check_rate("crossover_rate", *crossover_rate)?;
                check_rate("mutation_rate", *mutation_rate)
            }
            SearchStrategy::Skipping {
                position_skip,
                length_skip,
            } => check_steps(*position_skip, *length_skip),
            SearchStrategy::TimedRandom {
                nanos_per_operation,
                ..
            } => {
                if !(nanos_per_operation.is_finite() && *nanos_per_operation > 0.0) {
                    return Err(ShapeletError::InvalidOperationCost {
                        nanos: *nanos_per_operation,
                    });
                }
                Ok(())
            }
        }
    }

    /// Instantiate the strategy with its own random stream.
    #[must_use]
    pub fn build(&self, seed: u64) -> Box<dyn ShapeletSearch> {
        match self {
            SearchStrategy::Full {
                length_step,
                position_step,
            } => Box::new(FullSearch::new(*length_step, *position_step)),
            SearchStrategy::Random {
                candidates_per_series,
            } => Box::new(RandomSearch::new(*candidates_per_series, seed)),
            SearchStrategy::ImprovedRandom { total_candidates } => Box::new(SampledSearch::new(
                *total_candidates,
                SeriesPool::All,
                LengthSampler::Uniform,
                seed,
            )),
            SearchStrategy::SubsampleRandom {
                total_candidates,
                proportion,
            } => Box::new(SampledSearch::new(
                *total_candidates,
                SeriesPool::Proportion(*proportion),
                LengthSampler::Uniform,
                seed,
            )),
            SearchStrategy::RefinedRandom {
                total_candidates,
                min_ratio,
            } => Box::new(SampledSearch::new(
                *total_candidates,
                SeriesPool::Refined {
                    min_ratio: *min_ratio,
                },
                LengthSampler::Uniform,
                seed,
            )),
            SearchStrategy::SkewedRandom {
                total_candidates,
                length_weights,
            } => Box::new(SampledSearch::new(
                *total_candidates,
                SeriesPool::All,
                LengthSampler::Weighted(length_weights.clone()),
                seed,
            )),
            SearchStrategy::Tabu {
                candidates_per_series,
                neighbourhood_width,
                tabu_size,
            } => Box::new(TabuSearch::new(
                *candidates_per_series,
                *neighbourhood_width,
                *tabu_size,
                seed,
            )),
            SearchStrategy::Local {
                candidates_per_series,
                max_steps,
            } => Box::new(LocalSearch::new(*candidates_per_series, *max_steps, seed)),
            SearchStrategy::Genetic {
                candidates_per_series,
                population_size,
                tournament_size,
                crossover_rate,
                mutation_rate,
            } => Box::new(GeneticSearch::new(
                *candidates_per_series,
                *population_size,
                *tournament_size,
                *crossover_rate,
                *mutation_rate,
                seed,
            )),
            SearchStrategy::Skipping {
                position_skip,
                length_skip,
            } => Box::new(SkippingSearch::new(*position_skip, *length_skip)),
            SearchStrategy::TimedRandom {
                time_per_series,
                nanos_per_operation,
            } => Box::new(TimedSearch::new(*time_per_series, *nanos_per_operation, seed)),
        }
    }
}

fn check_count(count: u64) -> Result<(), ShapeletError> {
    if count == 0 {
        return Err(ShapeletError::InvalidCandidateCount { count });
    }
    Ok(())
}

fn check_steps(position_step: usize, length_step: usize) -> Result<(), ShapeletError> {
    if position_step == 0 || length_step == 0 {
        return Err(ShapeletError::InvalidStep {
            position_step,
            length_step,
        });
    }
    Ok(())
}

fn check_rate(name: &'static str, rate: f64) -> Result<(), ShapeletError> {
    if !(0.0..=1.0).contains(&rate) {
        return Err(ShapeletError::InvalidRate { name, rate });
    }
    Ok(())
}

/// Quota clamped to the size of the series' space.
pub(crate) fn clamp_quota(quota: u64, space: &SearchSpace) -> usize {
    quota.min(space.candidates_per_series()) as usize
}
