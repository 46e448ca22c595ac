//! Level Guillotine Fit Insertion: the deterministic construction heuristic that maps an
//! ordered sequence of items to a list of packed bins.
//! [A Thousand Ways to Pack the Bin](http://pds25.egloos.com/pds/201504/21/98/RectangleBinPack.pdf)

use smallvec::{smallvec, SmallVec};

use std::mem;

/// An item in its current orientation while being packed. `rotated` toggles on every
/// swap, so after placement it is `true` iff the dimensions differ from the input by
/// exactly one net rotation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct PackItem {
    pub(crate) id: usize,
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) rotated: bool,
}

impl PackItem {
    pub(crate) fn rotate(&mut self) {
        mem::swap(&mut self.width, &mut self.height);
        self.rotated = !self.rotated;
    }
}

/// A rectangular area of a bin not covered by any placed item. Degenerate rectangles
/// (zero width or height) are never stored.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FreeRect {
    /// X location of the left side of this rectangle within the bin.
    pub x: usize,

    /// Y location of the bottom side of this rectangle within the bin.
    pub y: usize,

    /// Width of this rectangle.
    pub width: usize,

    /// Height of this rectangle.
    pub height: usize,
}

/// An item that has been placed in a bin.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PlacedItem {
    /// ID that matches the one on the input item.
    pub id: usize,

    /// Width of this item as placed.
    pub width: usize,

    /// Height of this item as placed.
    pub height: usize,

    /// Whether this item was rotated 90 degrees from its original orientation.
    pub rotated: bool,

    /// X location of the left side of this item within the bin.
    pub x: usize,

    /// Y location of the bottom side of this item within the bin.
    pub y: usize,
}

/// A bin filled by the placement engine.
#[derive(Clone, Debug)]
pub struct Bin {
    /// ID of this bin, assigned in opening order.
    pub id: usize,

    /// Width of this bin.
    pub width: usize,

    /// Height of this bin.
    pub height: usize,

    /// The items placed in this bin.
    pub items: Vec<PlacedItem>,

    /// The remaining free rectangles of this bin.
    pub free_rects: SmallVec<[FreeRect; 8]>,
}

impl Bin {
    /// We start with a single free rectangle that spans the whole bin.
    pub(crate) fn new(id: usize, width: usize, height: usize) -> Self {
        Bin {
            id,
            width,
            height,
            items: Vec::new(),
            free_rects: smallvec![FreeRect {
                x: 0,
                y: 0,
                width,
                height,
            }],
        }
    }

    /// Fraction of this bin's area covered by placed items.
    pub fn fill_ratio(&self) -> f64 {
        let used_area: usize = self.items.iter().map(|it| it.width * it.height).sum();
        used_area as f64 / (self.width * self.height) as f64
    }

    fn place(&mut self, item: PackItem, x: usize, y: usize) {
        self.items.push(PlacedItem {
            id: item.id,
            width: item.width,
            height: item.height,
            rotated: item.rotated,
            x,
            y,
        });
    }

    /// The bottom-left-most free rectangle: smallest `y`, ties broken by smallest `x`.
    fn anchor_index(&self) -> Option<usize> {
        self.free_rects
            .iter()
            .enumerate()
            .min_by_key(|(_, rect)| (rect.y, rect.x))
            .map(|(i, _)| i)
    }

    /// Attempts one insertion into this bin. On success returns the index into
    /// `unpacked` of the item that was placed. On failure the anchor rectangle is
    /// consumed (discarded in guillotine mode, shrunk to its reusable band otherwise),
    /// so repeated calls always make progress.
    pub(crate) fn insert_item(
        &mut self,
        unpacked: &[PackItem],
        guillotine_cut: bool,
        rotation: bool,
    ) -> Option<usize> {
        let anchor_index = self.anchor_index()?;
        let anchor = self.free_rects[anchor_index];

        match check_fit_and_rotation(unpacked, anchor.width, anchor.height, rotation) {
            Some((item_index, rotated)) => {
                self.perform_placement(anchor_index, unpacked[item_index], rotated, guillotine_cut);
                Some(item_index)
            }
            None => {
                if guillotine_cut {
                    // Wastage is implicit in strict guillotine mode.
                    self.free_rects.remove(anchor_index);
                } else {
                    self.handle_wastage(anchor_index);
                }
                None
            }
        }
    }

    /// Places the item at the anchor's corner and splits the remaining free space of
    /// the anchor into up to two rectangles (Shorter-Leftover rule in guillotine mode,
    /// vertical cut otherwise).
    fn perform_placement(
        &mut self,
        anchor_index: usize,
        mut item: PackItem,
        rotated: bool,
        guillotine_cut: bool,
    ) {
        if rotated {
            item.rotate();
        }

        let anchor = self.free_rects[anchor_index];
        self.place(item, anchor.x, anchor.y);

        let horizontal_leftover = anchor.width - item.width;
        let vertical_leftover = anchor.height - item.height;
        let horizontal = guillotine_cut && horizontal_leftover < vertical_leftover;

        let right = (horizontal_leftover > 0).then(|| FreeRect {
            x: anchor.x + item.width,
            y: anchor.y,
            width: horizontal_leftover,
            height: if horizontal { item.height } else { anchor.height },
        });
        let top = (vertical_leftover > 0).then(|| FreeRect {
            x: anchor.x,
            y: anchor.y + item.height,
            width: if horizontal { anchor.width } else { item.width },
            height: vertical_leftover,
        });

        match (right, top) {
            (Some(right), Some(top)) => {
                self.free_rects[anchor_index] = right;
                self.free_rects.push(top);
            }
            (Some(rect), None) | (None, Some(rect)) => self.free_rects[anchor_index] = rect,
            (None, None) => {
                self.free_rects.remove(anchor_index);
            }
        }

        if horizontal_leftover > 0 && vertical_leftover > 0 && !guillotine_cut {
            self.merge_free_rects();
        }
    }

    /// Shrinks the anchor to the band above the lowest overtopping item, or removes it
    /// when no such band exists. Only used when guillotine cuts are not required.
    pub(crate) fn handle_wastage(&mut self, anchor_index: usize) {
        let anchor = self.free_rects[anchor_index];

        let mut wastage_height = anchor.height;
        for item in &self.items {
            let top = item.y + item.height;
            if top > anchor.y {
                wastage_height = wastage_height.min(top - anchor.y);
            }
        }

        if wastage_height < anchor.height {
            let rect = &mut self.free_rects[anchor_index];
            rect.y = anchor.y + wastage_height;
            rect.height = anchor.height - wastage_height;
            self.merge_free_rects();
        } else {
            // Entire space is wasted.
            self.free_rects.remove(anchor_index);
        }
    }

    /// Merges free rectangles that share `x` and `width` and meet in `y`. Horizontal
    /// merges can produce shapes unreachable by any guillotine sequence, so only
    /// vertical merges are performed.
    pub(crate) fn merge_free_rects(&mut self) {
        'scan: loop {
            for i in 0..self.free_rects.len() {
                for j in i + 1..self.free_rects.len() {
                    let first = self.free_rects[i];
                    let second = self.free_rects[j];

                    if first.width == second.width
                        && first.x == second.x
                        && (first.y + first.height == second.y
                            || second.y + second.height == first.y)
                    {
                        self.free_rects[i] = FreeRect {
                            x: first.x,
                            y: first.y.min(second.y),
                            width: first.width,
                            height: first.height + second.height,
                        };
                        self.free_rects.remove(j);
                        continue 'scan;
                    }
                }
            }
            break;
        }
    }
}

/// Scans `items` in order for the first one that fits a gap of `horizontal_gap` by
/// `vertical_gap`, trying the rotated orientation as well when `rotation` is enabled.
/// Scanning stops early when an item closes the narrow side of the gap exactly.
/// Returns the item's index and whether it must be rotated.
pub(crate) fn check_fit_and_rotation(
    items: &[PackItem],
    horizontal_gap: usize,
    vertical_gap: usize,
    rotation: bool,
) -> Option<(usize, bool)> {
    let current_gap = horizontal_gap.min(vertical_gap);
    let orientations: &[bool] = if rotation { &[false, true] } else { &[false] };

    let mut best_fit = None;
    for (index, item) in items.iter().enumerate() {
        for &rotated in orientations {
            let (width, height) = if rotated {
                (item.height, item.width)
            } else {
                (item.width, item.height)
            };

            if width <= horizontal_gap && height <= vertical_gap {
                if best_fit.is_none() {
                    best_fit = Some((index, rotated));
                }

                let perfect = (current_gap == horizontal_gap && width == current_gap)
                    || (current_gap == vertical_gap && height == current_gap);
                if perfect {
                    return Some((index, rotated));
                }
            }
        }
    }

    best_fit
}

/// Packs `sequence` into as many bins as needed, in order: every bin is tried before a
/// new one is opened, and failed attempts consume free rectangles so each pass makes
/// progress.
///
/// The caller guarantees every item fits an empty bin in some permitted orientation
/// (`Optimizer::validate`); a sequence violating that would leave its unplaceable
/// items out of the result.
pub(crate) fn lgfi(
    sequence: &[PackItem],
    bin_width: usize,
    bin_height: usize,
    guillotine_cut: bool,
    rotation: bool,
) -> Vec<Bin> {
    let mut bins: Vec<Bin> = Vec::new();
    let mut unpacked: Vec<PackItem> = sequence.to_vec();

    while !unpacked.is_empty() {
        let mut placed = false;
        for bin in bins.iter_mut() {
            if let Some(index) = bin.insert_item(&unpacked, guillotine_cut, rotation) {
                unpacked.remove(index);
                placed = true;
                break;
            }
        }

        if !placed {
            let space_available = bins.iter().any(|bin| !bin.free_rects.is_empty());
            if !space_available {
                if bins.last().is_some_and(|bin| bin.items.is_empty()) {
                    // A fresh bin rejected every remaining item; nothing will ever
                    // place them.
                    debug_assert!(false, "unplaceable item reached the placement engine");
                    break;
                }
                bins.push(Bin::new(bins.len(), bin_width, bin_height));
            }
        }
    }

    bins
}
