//! pack-optimizer-2d packs rectangular items into the fewest possible number of identical
//! rectangular bins. Placement is done by a deterministic construction heuristic (LGFI,
//! "Level Guillotine Fit Insertion") and the order in which items are fed to it is searched
//! by a genetic algorithm or a tabu search.

#![deny(missing_docs)]

mod fitness;
mod genetic;
mod lgfi;
mod population;
mod tabu;

pub mod io;


use fnv::FnvHashSet;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use genetic::GeneticConfig;
pub use lgfi::{Bin, FreeRect, PlacedItem};
pub use tabu::TabuConfig;

/// A rectangular item that needs to be packed into a bin.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// ID used to match placed items in the solution back to the input.
    pub id: usize,

    /// Width of this item.
    pub width: usize,

    /// Height of this item.
    pub height: usize,
}

impl Item {
    /// Creates a new item.
    pub fn new(id: usize, width: usize, height: usize) -> Self {
        Item { id, width, height }
    }

    pub(crate) fn area(&self) -> usize {
        self.width * self.height
    }
}

/// One slot of an ordering: which item the placement engine should consider next, and
/// whether it should be fed in with its width and height swapped.
///
/// An ordering (`Vec<Gene>`) contains every item id exactly once. The metaheuristics
/// search the space of orderings; they never place items themselves.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub struct Gene {
    /// ID of the item this gene refers to.
    pub item: usize,

    /// Whether the item enters the placement engine with swapped dimensions.
    pub rotated: bool,
}

impl Gene {
    /// A gene for placing the item in its original orientation.
    pub fn upright(item: usize) -> Self {
        Gene {
            item,
            rotated: false,
        }
    }
}

/// Error while optimizing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// An item does not fit in an empty bin in any permitted orientation, so no
    /// placement containing it can exist.
    NoFitForItem(Item),

    /// A driver parameter is outside its documented range.
    InvalidParameter(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoFitForItem(item) => write!(
                f,
                "item {} ({}x{}) cannot fit in any bin",
                item.id, item.width, item.height
            ),
            Error::InvalidParameter(msg) => write!(f, "invalid parameter: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Result type for optimizer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A packed layout produced by one of the metaheuristics.
#[derive(Clone, Debug)]
pub struct Solution {
    /// Fitness of the best ordering found: number of bins plus the fill ratio of the
    /// last bin. Lower is better.
    pub fitness: f64,

    /// The packed bins, each containing a disjoint subset of the input items.
    pub bins: Vec<Bin>,

    /// The ordering that produced `bins` when run through the placement engine.
    pub ordering: Vec<Gene>,
}

/// Optimizer for packing rectangular items into identical rectangular bins.
///
/// ```
/// use pack_optimizer_2d::{Item, Optimizer};
///
/// let solution = Optimizer::new(100, 100)
///     .add_item(Item::new(0, 100, 50))
///     .add_item(Item::new(1, 100, 50))
///     .set_random_seed(1)
///     .optimize_genetic(&Default::default())
///     .unwrap();
/// assert_eq!(solution.bins.len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct Optimizer {
    bin_width: usize,
    bin_height: usize,
    items: Vec<Item>,
    guillotine: bool,
    rotation: bool,
    random_seed: u64,
}

impl Optimizer {
    /// Creates a new optimizer for bins of the given dimensions.
    pub fn new(bin_width: usize, bin_height: usize) -> Self {
        Optimizer {
            bin_width,
            bin_height,
            items: Vec::new(),
            guillotine: false,
            rotation: false,
            random_seed: 0,
        }
    }

    /// Adds an item that needs to be packed.
    pub fn add_item(&mut self, item: Item) -> &mut Self {
        self.items.push(item);
        self
    }

    /// Adds items that need to be packed.
    pub fn add_items<I>(&mut self, items: I) -> &mut Self
    where
        I: IntoIterator<Item = Item>,
    {
        self.items.extend(items);
        self
    }

    /// Sets the master seed for the pseudo-random number generator. Running the same
    /// optimization twice with the same seed gives the same result.
    pub fn set_random_seed(&mut self, seed: u64) -> &mut Self {
        self.random_seed = seed;
        self
    }

    /// Sets whether the optimizer may rotate items by 90 degrees to make them fit.
    pub fn allow_rotation(&mut self, rotation: bool) -> &mut Self {
        self.rotation = rotation;
        self
    }

    /// Sets whether every bin layout must be producible by a sequence of edge-to-edge
    /// guillotine cuts. When disabled, the placement engine reclaims wasted space more
    /// aggressively and merges free areas, which can save bins.
    pub fn require_guillotine(&mut self, guillotine: bool) -> &mut Self {
        self.guillotine = guillotine;
        self
    }

    /// Optimizes the item ordering with a genetic algorithm and returns the best
    /// packing found.
    pub fn optimize_genetic(&self, config: &GeneticConfig) -> Result<Solution> {
        self.validate()?;
        config.validate()?;
        if self.items.is_empty() {
            return Ok(self.empty_solution());
        }

        let mut rng: StdRng = SeedableRng::seed_from_u64(self.random_seed);
        let (ordering, fitness) = genetic::genetic_algo(
            &self.items,
            (self.bin_width, self.bin_height),
            config,
            self.guillotine,
            self.rotation,
            &mut rng,
        );
        Ok(self.solution_from_ordering(ordering, fitness))
    }

    /// Optimizes the item ordering with a tabu search and returns the best packing
    /// found.
    pub fn optimize_tabu(&self, config: &TabuConfig) -> Result<Solution> {
        self.validate()?;
        config.validate(self.items.len())?;
        if self.items.is_empty() {
            return Ok(self.empty_solution());
        }

        let mut rng: StdRng = SeedableRng::seed_from_u64(self.random_seed);
        let (ordering, fitness) = tabu::tabu_search(
            &self.items,
            (self.bin_width, self.bin_height),
            config,
            self.guillotine,
            self.rotation,
            &mut rng,
        );
        Ok(self.solution_from_ordering(ordering, fitness))
    }

    /// Rejects instances no ordering can ever pack: zero-sized geometry, duplicate
    /// ids, and items exceeding the bin in every permitted orientation.
    fn validate(&self) -> Result<()> {
        if self.bin_width == 0 || self.bin_height == 0 {
            return Err(Error::InvalidParameter("bin dimensions must be positive"));
        }

        let mut seen_ids = FnvHashSet::default();
        for item in &self.items {
            if item.width == 0 || item.height == 0 {
                return Err(Error::InvalidParameter("item dimensions must be positive"));
            }
            if !seen_ids.insert(item.id) {
                return Err(Error::InvalidParameter("item ids must be unique"));
            }

            let upright = item.width <= self.bin_width && item.height <= self.bin_height;
            let rotated =
                self.rotation && item.height <= self.bin_width && item.width <= self.bin_height;
            if !upright && !rotated {
                return Err(Error::NoFitForItem(*item));
            }
        }

        Ok(())
    }

    fn empty_solution(&self) -> Solution {
        Solution {
            fitness: 0.0,
            bins: Vec::new(),
            ordering: Vec::new(),
        }
    }

    fn solution_from_ordering(&self, ordering: Vec<Gene>, fitness: f64) -> Solution {
        let sequence = population::sequence_from_ordering(&self.items, &ordering);
        let bins = lgfi::lgfi(
            &sequence,
            self.bin_width,
            self.bin_height,
            self.guillotine,
            self.rotation,
        );
        Solution {
            fitness,
            bins,
            ordering,
        }
    }
}
