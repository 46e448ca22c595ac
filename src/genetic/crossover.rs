//! Order-based recombination of parent orderings.

use crate::population::weighted_choice;
use crate::Gene;
use fnv::FnvHashSet;
use rand::prelude::*;
use rayon::prelude::*;

/// Produces `floor(crossover_rate * psize)` offspring. The best orderings by fitness
/// become the first parents; partners are drawn over the fitness ranks with weights
/// `(psize - rank)^delta`, resampled while a parent would be paired with itself.
/// Offspring are generated in parallel, each from its own pre-drawn seed so the result
/// only depends on the caller's RNG.
pub(crate) fn crossover<R>(
    population: &[Vec<Gene>],
    fitnesses: &[f64],
    crossover_rate: f64,
    delta: f64,
    rng: &mut R,
) -> Vec<Vec<Gene>>
where
    R: Rng + ?Sized,
{
    let psize = population.len();
    let num_crossover = (crossover_rate * psize as f64).floor() as usize;
    if num_crossover == 0 || psize < 2 {
        return Vec::new();
    }

    let mut sorted_indices: Vec<usize> = (0..psize).collect();
    sorted_indices.sort_by(|&a, &b| fitnesses[a].total_cmp(&fitnesses[b]));

    let rank_weights: Vec<f64> = (0..psize)
        .map(|rank| ((psize - rank) as f64).powf(delta))
        .collect();

    let seeds: Vec<u64> = (0..num_crossover).map(|_| rng.gen()).collect();

    seeds
        .par_iter()
        .enumerate()
        .map(|(rank, &seed)| {
            let mut rng: StdRng = SeedableRng::seed_from_u64(seed);

            let parent1 = &population[sorted_indices[rank]];
            let fitness1 = fitnesses[sorted_indices[rank]];

            let mut partner_rank = weighted_choice(&rank_weights, &mut rng);
            while partner_rank == rank {
                partner_rank = weighted_choice(&rank_weights, &mut rng);
            }
            let parent2 = &population[sorted_indices[partner_rank]];
            let fitness2 = fitnesses[sorted_indices[partner_rank]];

            offspring_generation(parent1, parent2, fitness1, fitness2, &mut rng)
        })
        .collect()
}

/// Walks both parents front to back. Genes the parents agree on are copied; where they
/// disagree, one of the two candidates is drawn with 0.75 probability on the fitter
/// (lower fitness) parent's side. Cursors skip over items the offspring already
/// contains, so the result is a permutation of the same item set.
pub(crate) fn offspring_generation<R>(
    parent1: &[Gene],
    parent2: &[Gene],
    fitness1: f64,
    fitness2: f64,
    rng: &mut R,
) -> Vec<Gene>
where
    R: Rng + ?Sized,
{
    let n = parent1.len();
    let mut offspring = Vec::with_capacity(n);
    let mut used_items = FnvHashSet::default();

    let mut k = 0;
    let mut l = 0;
    while offspring.len() < n {
        let gene = if parent1[k] == parent2[l] {
            parent1[k]
        } else {
            let candidates = [parent1[k], parent2[l]];
            let weights = if fitness1 < fitness2 {
                [0.75, 0.25]
            } else {
                [0.25, 0.75]
            };
            candidates[weighted_choice(&weights, rng)]
        };

        offspring.push(gene);
        used_items.insert(gene.item);

        while k < n && used_items.contains(&parent1[k].item) {
            k += 1;
        }
        while l < n && used_items.contains(&parent2[l].item) {
            l += 1;
        }
    }

    offspring
}
