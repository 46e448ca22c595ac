//! Biased random generation of item orderings, shared by both metaheuristics.

use crate::lgfi::PackItem;
use crate::{Gene, Item};
use fnv::FnvHashMap;
use rand::prelude::*;
use std::cmp::Reverse;

/// Roulette-wheel selection: cumulative sum over `weights`, a uniform draw, and the
/// first index whose cumulative weight exceeds the draw. Falls back to the last index
/// on numerical fallthrough.
pub(crate) fn weighted_choice<R>(weights: &[f64], rng: &mut R) -> usize
where
    R: Rng + ?Sized,
{
    let total: f64 = weights.iter().sum();
    let draw = rng.gen::<f64>() * total;

    let mut cumulative = 0.0;
    for (index, weight) in weights.iter().enumerate() {
        cumulative += weight;
        if draw < cumulative {
            return index;
        }
    }
    weights.len() - 1
}

/// Generates `psize` orderings by weighted sampling without replacement from the
/// deterministic sequence (items sorted by non-increasing area). Position `i` of the
/// sequence carries weight `(n - i)^kappa`: `kappa = 1` gives a mild bias towards
/// placing large items early, large `kappa` collapses onto the deterministic sequence
/// itself. All generated genes are upright.
pub(crate) fn generate_population<R>(
    items: &[Item],
    psize: usize,
    kappa: f64,
    rng: &mut R,
) -> Vec<Vec<Gene>>
where
    R: Rng + ?Sized,
{
    let mut deterministic_sequence: Vec<&Item> = items.iter().collect();
    deterministic_sequence.sort_by_key(|item| Reverse(item.area()));

    let n = items.len();
    let weights: Vec<f64> = (0..n).map(|pos| ((n - pos) as f64).powf(kappa)).collect();

    (0..psize)
        .map(|_| {
            let mut available: Vec<usize> = (0..n).collect();
            let mut ordering = Vec::with_capacity(n);

            while !available.is_empty() {
                let remaining_weights: Vec<f64> =
                    available.iter().map(|&pos| weights[pos]).collect();
                let chosen = weighted_choice(&remaining_weights, rng);

                ordering.push(Gene::upright(deterministic_sequence[available[chosen]].id));
                available.remove(chosen);
            }

            ordering
        })
        .collect()
}

/// Materializes the item sequence dictated by an ordering: rotated genes enter the
/// placement engine with swapped dimensions and their rotation flag set. Genes whose
/// id matches no item are skipped.
pub(crate) fn sequence_from_ordering(items: &[Item], ordering: &[Gene]) -> Vec<PackItem> {
    let by_id: FnvHashMap<usize, &Item> = items.iter().map(|item| (item.id, item)).collect();

    ordering
        .iter()
        .filter_map(|gene| {
            by_id.get(&gene.item).map(|item| {
                let mut pack_item = PackItem {
                    id: item.id,
                    width: item.width,
                    height: item.height,
                    rotated: false,
                };
                if gene.rotated {
                    pack_item.rotate();
                }
                pack_item
            })
        })
        .collect()
}
