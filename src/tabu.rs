//! Tabu search over item orderings: a single current ordering, a three-class move
//! neighborhood and a bounded FIFO memory of recently taken non-improving moves.

use crate::fitness::compute_fitness;
use crate::population::generate_population;
use crate::{Error, Gene, Item, Result};
use log::trace;
use rand::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Parameters of the tabu search. Fields missing from a deserialized configuration
/// fall back to their defaults.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TabuConfig {
    /// Number of iterations to run.
    pub iterations: usize,

    /// Capacity of the tabu list. Must be positive and below three times the number
    /// of items.
    pub tabu_size: usize,

    /// Bias of the initial ordering towards the deterministic (large items first)
    /// sequence. Must be at least 1.
    pub kappa: f64,
}

impl Default for TabuConfig {
    fn default() -> Self {
        TabuConfig {
            iterations: 500,
            tabu_size: 10,
            kappa: 1.0,
        }
    }
}

impl TabuConfig {
    pub(crate) fn validate(&self, num_items: usize) -> Result<()> {
        if self.kappa < 1.0 {
            return Err(Error::InvalidParameter("kappa must be at least 1"));
        }
        if self.tabu_size == 0 {
            return Err(Error::InvalidParameter("tabu list size must be positive"));
        }
        if num_items > 0 && self.tabu_size >= 3 * num_items {
            return Err(Error::InvalidParameter(
                "tabu list size must be below 3x the number of items",
            ));
        }
        Ok(())
    }
}

/// A move applied to the current ordering; each neighbor carries exactly one.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Move {
    /// Swap of positions `i` and `i + 1`.
    AdjacentSwap(usize),
    /// Rotation flag toggle at position `i`.
    Rotation(usize),
    /// Move of position `i` to the front, shifting `0..i` right.
    HeadInsertion(usize),
}

/// Bounded FIFO memory of forbidden moves; overflow drops the oldest entry.
pub(crate) struct TabuList {
    entries: VecDeque<Move>,
    capacity: usize,
}

impl TabuList {
    pub(crate) fn new(capacity: usize) -> Self {
        TabuList {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub(crate) fn contains(&self, mv: &Move) -> bool {
        self.entries.contains(mv)
    }

    pub(crate) fn push(&mut self, mv: Move) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(mv);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

pub(crate) struct Neighbor {
    pub(crate) ordering: Vec<Gene>,
    pub(crate) mv: Move,
}

/// The union of adjacent swaps, rotation toggles and head insertions, minus whatever
/// the tabu list currently forbids. Rotation moves are only generated when item
/// rotation is enabled.
pub(crate) fn neighborhood(
    current: &[Gene],
    tabu_list: &TabuList,
    rotation: bool,
) -> Vec<Neighbor> {
    let n = current.len();
    let mut neighbors = Vec::new();

    for i in 0..n.saturating_sub(1) {
        let mv = Move::AdjacentSwap(i);
        if tabu_list.contains(&mv) {
            continue;
        }
        let mut ordering = current.to_vec();
        ordering.swap(i, i + 1);
        neighbors.push(Neighbor { ordering, mv });
    }

    if rotation {
        for i in 0..n {
            let mv = Move::Rotation(i);
            if tabu_list.contains(&mv) {
                continue;
            }
            let mut ordering = current.to_vec();
            ordering[i].rotated = !ordering[i].rotated;
            neighbors.push(Neighbor { ordering, mv });
        }
    }

    for i in 1..n {
        let mv = Move::HeadInsertion(i);
        if tabu_list.contains(&mv) {
            continue;
        }
        let mut ordering = current.to_vec();
        let gene = ordering.remove(i);
        ordering.insert(0, gene);
        neighbors.push(Neighbor { ordering, mv });
    }

    neighbors
}

/// Classical tabu search: score the whole filtered neighborhood, always move to a
/// minimum-fitness neighbor (uniform random tie-break), remember the move in the tabu
/// list when it did not improve, and track the best ordering ever seen.
pub(crate) fn tabu_search<R>(
    items: &[Item],
    bin_dimensions: (usize, usize),
    config: &TabuConfig,
    guillotine_cut: bool,
    rotation: bool,
    rng: &mut R,
) -> (Vec<Gene>, f64)
where
    R: Rng + ?Sized,
{
    let mut current = generate_population(items, 1, config.kappa, rng)
        .into_iter()
        .next()
        .unwrap_or_default();
    let mut current_fitness =
        compute_fitness(items, &current, bin_dimensions, guillotine_cut, rotation);

    let mut best_ordering = current.clone();
    let mut best_fitness = current_fitness;
    let mut tabu_list = TabuList::new(config.tabu_size);

    for iteration in 0..config.iterations {
        let neighbors = neighborhood(&current, &tabu_list, rotation);
        if neighbors.is_empty() {
            break;
        }

        let fitnesses: Vec<f64> = neighbors
            .par_iter()
            .map(|neighbor| {
                compute_fitness(
                    items,
                    &neighbor.ordering,
                    bin_dimensions,
                    guillotine_cut,
                    rotation,
                )
            })
            .collect();

        let min_fitness = fitnesses.iter().copied().fold(f64::INFINITY, f64::min);
        let tied: Vec<usize> = (0..fitnesses.len())
            .filter(|&i| fitnesses[i] == min_fitness)
            .collect();
        let chosen_index = tied[rng.gen_range(0..tied.len())];

        let old_fitness = current_fitness;
        let chosen = &neighbors[chosen_index];
        current_fitness = fitnesses[chosen_index];

        if current_fitness >= old_fitness {
            tabu_list.push(chosen.mv);
            trace!(
                "iteration {}: non-improving move {:?} marked tabu ({} entries)",
                iteration,
                chosen.mv,
                tabu_list.len()
            );
        } else if current_fitness < best_fitness {
            best_fitness = current_fitness;
            best_ordering = chosen.ordering.clone();
            trace!(
                "iteration {}: best fitness improved to {:.4}",
                iteration,
                best_fitness
            );
        }

        current = chosen.ordering.clone();
    }

    (best_ordering, best_fitness)
}
