//! Genetic algorithm over item orderings: biased initial population, order-based
//! crossover, swap/rotate mutation and a generational loop that tracks the best
//! ordering ever scored.

pub(crate) mod crossover;
pub(crate) mod mutation;

use crate::fitness::compute_fitnesses;
use crate::population::generate_population;
use crate::{Error, Gene, Item, Result};
use log::debug;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Parameters of the genetic algorithm. Fields missing from a deserialized
/// configuration fall back to their defaults.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    /// Number of orderings per generation.
    pub population_size: usize,

    /// Number of generations to run.
    pub generations: usize,

    /// Fraction of the population replaced by crossover offspring each generation.
    pub crossover_rate: f64,

    /// Probability for each individual to be mutated each generation.
    pub mutation_rate: f64,

    /// Bias of the initial population towards the deterministic (large items first)
    /// sequence. Must be at least 1.
    pub kappa: f64,

    /// Bias of crossover partner selection towards fitter orderings. Must be at
    /// least 1.
    pub delta: f64,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        GeneticConfig {
            population_size: 100,
            generations: 50,
            crossover_rate: 0.7,
            mutation_rate: 0.1,
            kappa: 1.0,
            delta: 1.0,
        }
    }
}

impl GeneticConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(Error::InvalidParameter("population size must be positive"));
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(Error::InvalidParameter(
                "crossover rate must be within [0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(Error::InvalidParameter(
                "mutation rate must be within [0, 1]",
            ));
        }
        if self.kappa < 1.0 {
            return Err(Error::InvalidParameter("kappa must be at least 1"));
        }
        if self.delta < 1.0 {
            return Err(Error::InvalidParameter("delta must be at least 1"));
        }
        Ok(())
    }
}

/// Runs the generational loop and returns the best ordering scored along the way with
/// its fitness. The best ordering is tracked outside the population and never
/// re-injected.
pub(crate) fn genetic_algo<R>(
    items: &[Item],
    bin_dimensions: (usize, usize),
    config: &GeneticConfig,
    guillotine_cut: bool,
    rotation: bool,
    rng: &mut R,
) -> (Vec<Gene>, f64)
where
    R: Rng + ?Sized,
{
    let psize = config.population_size;
    let mut population = generate_population(items, psize, config.kappa, rng);

    let mut best_ordering = population[0].clone();
    let mut best_fitness = f64::INFINITY;

    for generation in 0..config.generations {
        let fitnesses =
            compute_fitnesses(&population, items, bin_dimensions, guillotine_cut, rotation);

        // Lowest index wins ties to keep runs reproducible under a fixed seed.
        if let Some((best_index, &generation_best)) = fitnesses
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
        {
            if generation_best < best_fitness {
                best_fitness = generation_best;
                best_ordering = population[best_index].clone();
                debug!(
                    "generation {}: best fitness improved to {:.4}",
                    generation, best_fitness
                );
            }
        }

        let offspring = crossover::crossover(
            &population,
            &fitnesses,
            config.crossover_rate,
            config.delta,
            rng,
        );
        let fresh = generate_population(items, psize - offspring.len(), config.kappa, rng);

        population = offspring;
        population.extend(fresh);
        mutation::mutate_population(&mut population, config.mutation_rate, rotation, rng);
    }

    (best_ordering, best_fitness)
}
