//! Swap and rotate perturbations of individual orderings.

use crate::Gene;
use rand::prelude::*;

/// Swaps two distinct uniformly chosen positions.
pub(crate) fn swap_genes<R>(individual: &mut [Gene], rng: &mut R)
where
    R: Rng + ?Sized,
{
    let n = individual.len();
    if n <= 1 {
        return;
    }

    let first = rng.gen_range(0..n);
    let mut second = rng.gen_range(0..n);
    while second == first {
        second = rng.gen_range(0..n);
    }
    individual.swap(first, second);
}

/// Toggles the rotation flag of one uniformly chosen position.
pub(crate) fn rotate_gene<R>(individual: &mut [Gene], rng: &mut R)
where
    R: Rng + ?Sized,
{
    if individual.is_empty() {
        return;
    }

    let index = rng.gen_range(0..individual.len());
    individual[index].rotated = !individual[index].rotated;
}

/// Mutates each individual independently with probability `mutation_rate`. With item
/// rotation disabled every mutation is a swap (the rotate operator would smuggle
/// rotations into the orderings); otherwise the operator is drawn uniformly.
pub(crate) fn mutate_population<R>(
    population: &mut [Vec<Gene>],
    mutation_rate: f64,
    rotation: bool,
    rng: &mut R,
) where
    R: Rng + ?Sized,
{
    for individual in population.iter_mut() {
        if rng.gen::<f64>() < mutation_rate {
            if rotation && rng.gen_bool(0.5) {
                rotate_gene(individual, rng);
            } else {
                swap_genes(individual, rng);
            }
        }
    }
}
