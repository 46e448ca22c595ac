//! Boundary I/O: `.bp2d` problem instances and solution JSON files.

use crate::{Bin, Item, PlacedItem};
use anyhow::{bail, Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// A parsed `.bp2d` problem instance.
#[derive(Clone, Debug)]
pub struct Instance {
    /// Width of every bin.
    pub bin_width: usize,

    /// Height of every bin.
    pub bin_height: usize,

    /// The items to pack.
    pub items: Vec<Item>,
}

/// Reads a `.bp2d` instance file:
///
/// ```text
/// BIN_WIDTH: 100
/// BIN_HEIGHT: 100
/// ITEMS
/// 0 30 20
/// 1 50 40
/// ```
pub fn read_instance(path: &Path) -> Result<Instance> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("could not read instance file {}", path.display()))?;
    parse_instance(&contents).with_context(|| format!("could not parse {}", path.display()))
}

pub(crate) fn parse_instance(contents: &str) -> Result<Instance> {
    let mut bin_width = None;
    let mut bin_height = None;
    let mut items = Vec::new();

    for (line_index, raw_line) in contents.lines().enumerate() {
        let line = raw_line.trim();
        let line_number = line_index + 1;

        if line.is_empty() || line.starts_with("ITEMS") {
            continue;
        }

        if let Some(rest) = line.strip_prefix("BIN_WIDTH") {
            bin_width = Some(parse_header_value(rest, line_number)?);
        } else if let Some(rest) = line.strip_prefix("BIN_HEIGHT") {
            bin_height = Some(parse_header_value(rest, line_number)?);
        } else {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 3 {
                bail!(
                    "line {}: expected `<id> <width> <height>`, got {:?}",
                    line_number,
                    line
                );
            }

            let id = parse_field(fields[0], "id", line_number)?;
            let width = parse_field(fields[1], "width", line_number)?;
            let height = parse_field(fields[2], "height", line_number)?;
            if width == 0 || height == 0 {
                bail!("line {}: item dimensions must be positive", line_number);
            }
            items.push(Item { id, width, height });
        }
    }

    let bin_width = bin_width.context("missing BIN_WIDTH header")?;
    let bin_height = bin_height.context("missing BIN_HEIGHT header")?;
    if bin_width == 0 || bin_height == 0 {
        bail!("bin dimensions must be positive");
    }

    Ok(Instance {
        bin_width,
        bin_height,
        items,
    })
}

fn parse_header_value(rest: &str, line_number: usize) -> Result<usize> {
    rest.trim_start_matches(':')
        .trim()
        .parse()
        .with_context(|| format!("line {}: header value is not an integer", line_number))
}

fn parse_field(field: &str, name: &str, line_number: usize) -> Result<usize> {
    field
        .parse()
        .with_context(|| format!("line {}: {} is not an integer", line_number, name))
}

#[derive(Serialize, Deserialize)]
pub(crate) struct JsonItem {
    id: usize,
    width: usize,
    height: usize,
    rotated: bool,
    corner_x: usize,
    corner_y: usize,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct JsonBin {
    id: usize,
    width: usize,
    height: usize,
    items: Vec<JsonItem>,
}

pub(crate) fn bins_to_json(bins: &[Bin]) -> Vec<JsonBin> {
    bins.iter()
        .map(|bin| JsonBin {
            id: bin.id,
            width: bin.width,
            height: bin.height,
            items: bin
                .items
                .iter()
                .map(|item| JsonItem {
                    id: item.id,
                    width: item.width,
                    height: item.height,
                    rotated: item.rotated,
                    corner_x: item.x,
                    corner_y: item.y,
                })
                .collect(),
        })
        .collect()
}

pub(crate) fn bins_from_json(json_bins: Vec<JsonBin>) -> Vec<Bin> {
    json_bins
        .into_iter()
        .map(|json_bin| Bin {
            id: json_bin.id,
            width: json_bin.width,
            height: json_bin.height,
            items: json_bin
                .items
                .into_iter()
                .map(|item| PlacedItem {
                    id: item.id,
                    width: item.width,
                    height: item.height,
                    rotated: item.rotated,
                    x: item.corner_x,
                    y: item.corner_y,
                })
                .collect(),
            free_rects: SmallVec::new(),
        })
        .collect()
}

/// Writes a packed layout as a JSON array of bins, each with its placed items and
/// their bottom-left corners.
pub fn write_solution(bins: &[Bin], path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("could not create solution file {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &bins_to_json(bins))
        .with_context(|| format!("could not write solution to {}", path.display()))?;

    info!("solution written to {}", path.display());
    Ok(())
}

/// Reads a solution JSON file back into bins. The bins carry only the layout; free
/// rectangles are not part of the interchange format.
pub fn read_solution(path: &Path) -> Result<Vec<Bin>> {
    let file = File::open(path)
        .with_context(|| format!("could not open solution file {}", path.display()))?;
    let json_bins = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("not a valid solution file: {}", path.display()))?;
    Ok(bins_from_json(json_bins))
}
