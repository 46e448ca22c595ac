//! Fitness of an ordering: the number of bins its placement uses, with the fill ratio
//! of the last bin as a fractional tie-break.

use crate::lgfi::lgfi;
use crate::population::sequence_from_ordering;
use crate::{Gene, Item};
use rayon::prelude::*;

/// Runs the placement engine on the sequence dictated by `ordering` and scores the
/// result as `bins + fill_ratio(last_bin)`. Lower is better: the integer part counts
/// bins and the fractional part rewards a fuller last bin, which correlates with being
/// closer to saving the next one.
pub(crate) fn compute_fitness(
    items: &[Item],
    ordering: &[Gene],
    bin_dimensions: (usize, usize),
    guillotine_cut: bool,
    rotation: bool,
) -> f64 {
    let (bin_width, bin_height) = bin_dimensions;
    let sequence = sequence_from_ordering(items, ordering);
    let bins = lgfi(&sequence, bin_width, bin_height, guillotine_cut, rotation);

    match bins.last() {
        Some(last_bin) => bins.len() as f64 + last_bin.fill_ratio(),
        None => 0.0,
    }
}

/// Scores a whole population in parallel. Each evaluation builds its own transient
/// bins, so nothing is shared between workers besides the read-only items.
pub(crate) fn compute_fitnesses(
    population: &[Vec<Gene>],
    items: &[Item],
    bin_dimensions: (usize, usize),
    guillotine_cut: bool,
    rotation: bool,
) -> Vec<f64> {
    population
        .par_iter()
        .map(|ordering| compute_fitness(items, ordering, bin_dimensions, guillotine_cut, rotation))
        .collect()
}
