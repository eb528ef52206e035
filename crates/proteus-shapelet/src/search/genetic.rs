//! Genetic search over (start, length) genes.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::candidate::CandidateLocation;
use crate::error::ShapeletError;
use crate::search::{
    SearchContext, SearchSpace, SeriesEvaluator, SeriesRef, ShapeletSearch, clamp_quota,
};
use crate::shapelet::Shapelet;

/// Fitness of a pruned individual; every real quality is non-negative.
const PRUNED_FITNESS: f64 = -1.0;

#[derive(Debug, Clone, Copy)]
struct Individual {
    location: CandidateLocation,
    fitness: f64,
}

/// Evolves a population of locations per series until the per-series
/// quota of distinct locations has been scored.
///
/// Tournament selection, single-point crossover, +/-1 per-gene mutation and
/// elitism of the best individual. Invalid or already scored children are
/// replaced by fresh random locations.
#[derive(Debug, Clone)]
pub struct GeneticSearch {
    candidates_per_series: u64,
    population_size: usize,
    tournament_size: usize,
    crossover_rate: f64,
    mutation_rate: f64,
    seed: u64,
    rng: ChaCha8Rng,
    space: Option<SearchSpace>,
}

impl GeneticSearch {
    /// Create a genetic search.
    #[must_use]
    pub fn new(
        candidates_per_series: u64,
        population_size: usize,
        tournament_size: usize,
        crossover_rate: f64,
        mutation_rate: f64,
        seed: u64,
    ) -> Self {
        Self {
            candidates_per_series,
            population_size,
            tournament_size,
            crossover_rate,
            mutation_rate,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            space: None,
        }
    }

    fn tournament(&mut self, population: &[Individual]) -> Individual {
        let mut winner = population[self.rng.gen_range(0..population.len())];
        for _ in 1..self.tournament_size {
            let challenger = population[self.rng.gen_range(0..population.len())];
            if challenger.fitness > winner.fitness {
                winner = challenger;
            }
        }
        winner
    }

    fn mutate_gene(&mut self, gene: usize) -> usize {
        if self.rng.r#gen::<f64>() >= self.mutation_rate {
            return gene;
        }
        if self.rng.gen_bool(0.5) {
            gene + 1
        } else {
            gene.saturating_sub(1)
        }
    }

    fn breed(&mut self, space: &SearchSpace, a: Individual, b: Individual) -> Option<CandidateLocation> {
        let (start, length) = if self.rng.r#gen::<f64>() < self.crossover_rate {
            // Two genes, so the only cut point swaps the length gene.
            (a.location.start, b.location.length)
        } else {
            (a.location.start, a.location.length)
        };
        let child = CandidateLocation::new(
            self.mutate_gene(start),
            self.mutate_gene(length),
            a.location.dimension,
        );
        if space.contains(&child) {
            Some(child)
        } else {
            space.random_location(&mut self.rng)
        }
    }
}

impl ShapeletSearch for GeneticSearch {
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

        // --- Initial population ---
        let mut population = Vec::with_capacity(self.population_size);
        while population.len() < self.population_size && evaluator.evaluations() < quota {
            let Some(location) = space.random_location(&mut self.rng) else {
                break;
            };
            let fitness = evaluator.quality(location).unwrap_or(PRUNED_FITNESS);
            population.push(Individual { location, fitness });
        }
        if population.is_empty() {
            return evaluator.into_found();
        }

        // --- Generations ---
        let max_generations = quota * 4 + 16;
        let mut generation = 0;
        while evaluator.evaluations() < quota && generation < max_generations {
            generation += 1;
            let elite = population
                .iter()
                .copied()
                .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
                .unwrap_or(population[0]);
            let mut next = Vec::with_capacity(self.population_size);
            next.push(elite);
            while next.len() < self.population_size && evaluator.evaluations() < quota {
                let a = self.tournament(&population);
                let b = self.tournament(&population);
                let Some(mut location) = self.breed(&space, a, b) else {
                    break;
                };
                if evaluator.is_evaluated(&location)
                    && let Some(fresh) = space.random_location(&mut self.rng)
                {
                    location = fresh;
                }
                let fitness = evaluator.quality(location).unwrap_or(PRUNED_FITNESS);
                next.push(Individual { location, fitness });
            }
            population = next;
        }
        evaluator.into_found()
    }

    fn set_candidates_per_series(&mut self, candidates: u64) {
        self.candidates_per_series = candidates.max(1);
    }

    fn name(&self) -> &'static str {
        "genetic"
    }
}

#[cfg(test)]
mod tests {
    use proteus_series::ClassLabel;

    use super::*;
    use crate::search::testing::{flat_series, scored};

    fn run(search: &mut GeneticSearch, space: SearchSpace) -> (usize, Vec<Shapelet>) {
        let labels = [ClassLabel::new(0)];
        let context = SearchContext {
            space,
            labels: &labels,
            n_classes: 1,
            contract: None,
        };
        search.init(&context).unwrap();
        let series = flat_series(space.series_length());
        let target = SeriesRef {
            id: 0,
            class: ClassLabel::new(0),
            series: &series,
        };
        let mut calls = 0;
        let found = search.search_series(&target, &mut |loc| {
            calls += 1;
            Some(scored(loc, loc.length as f64 - (loc.start as f64 - 10.0).abs()))
        });
        (calls, found)
    }

    #[test]
    fn scores_exactly_the_quota() {
        let space = SearchSpace::new(40, 3, 12, 1);
        let mut search = GeneticSearch::new(50, 10, 3, 0.9, 0.1, 5);
        let (calls, found) = run(&mut search, space);
        assert_eq!(calls, 50);
        assert_eq!(found.len(), 50);
        assert!(found.iter().all(|s| space.contains(&s.location())));
    }

    #[test]
    fn deterministic_for_a_seed() {
        let space = SearchSpace::new(40, 3, 12, 1);
        let (_, a) = run(&mut GeneticSearch::new(30, 8, 2, 0.9, 0.1, 5), space);
        let (_, b) = run(&mut GeneticSearch::new(30, 8, 2, 0.9, 0.1, 5), space);
        assert_eq!(a, b);
    }

    #[test]
    fn quota_above_space_is_clamped() {
        let space = SearchSpace::new(6, 3, 4, 1);
        let mut search = GeneticSearch::new(1_000, 4, 2, 0.9, 0.5, 1);
        let (calls, _) = run(&mut search, space);
        assert!(calls <= 7);
    }
}
