//! Cliff drawing: chain cliff pieces from one clicked vertex toward the next.
//!
//! Each piece exposes one or two connection points. A piece can follow the
//! current open point when one of its points faces back toward it; the piece's
//! other point becomes the new open point. The search is best effort: when the
//! target cannot be reached the closest chain found is placed.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::path::Path;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::codec::{CellPos, DirectionMask};
use crate::edit::history::TerrainUndo;
use crate::error::Result;
use crate::state::{Map, Terrain};
use crate::theater::{Rules, TheaterCatalog};

/// Face of the cliff the user is drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CliffSide {
    #[default]
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionPoint {
    /// Position relative to the piece origin
    pub offset: CellPos,
    /// Directions the chain may continue toward from this point
    pub directions: DirectionMask,
    pub side: CliffSide,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliffPiece {
    pub name: String,
    /// Interchangeable tiles for this piece; one is picked by position
    pub tile_indices: Vec<u16>,
    pub connection_points: Vec<ConnectionPoint>,
    #[serde(default)]
    pub height_offset: u8,
}

impl CliffPiece {
    fn tile_at(&self, pos: CellPos) -> Option<u16> {
        if self.tile_indices.is_empty() {
            return None;
        }
        let variant = (i32::from(pos.x) + i32::from(pos.y)).rem_euclid(self.tile_indices.len() as i32);
        self.tile_indices.get(variant as usize).copied()
    }

    /// Point that stays open after entering through point `entered`.
    fn exit_point(&self, entered: usize) -> Option<&ConnectionPoint> {
        match self.connection_points.len() {
            1 => self.connection_points.first(),
            _ => self.connection_points.iter().enumerate().find(|&(i, _)| i != entered).map(|(_, p)| p),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliffCatalog {
    pub pieces: Vec<CliffPiece>,
}

impl CliffCatalog {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Search caps for one segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliffLimits {
    /// Distance to the target that counts as arrived
    pub close_enough: f64,
    /// Expansions in a row that may fail to get closer before giving up
    pub max_idle_expansions: usize,
    pub max_expansions: usize,
}

impl Default for CliffLimits {
    fn default() -> Self {
        Self {
            close_enough: 1.0,
            max_idle_expansions: 500,
            max_expansions: 20_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CliffOptions {
    pub side: CliffSide,
    /// Leave cells that already carry non-default terrain untouched
    pub clear_ground_only: bool,
    pub limits: CliffLimits,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentReport {
    pub start: CellPos,
    pub end: CellPos,
    pub pieces: usize,
    pub reached: bool,
    /// Distance from the last open point to `end`
    pub distance: f64,
    pub expansions: usize,
}

#[derive(Debug)]
pub struct CliffOutcome {
    pub undo: TerrainUndo,
    pub touched: Vec<CellPos>,
    pub segments: Vec<SegmentReport>,
}

// ============================================================================
// Search
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct SearchNode {
    /// Piece origin; unused for the root
    location: CellPos,
    exit: CellPos,
    exit_directions: DirectionMask,
    parent: Option<usize>,
    piece: Option<usize>,
    g: u32,
    h: f64,
}

#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    node: usize,
    f: f64,
    h: f64,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f && self.h == other.h && self.node == other.node
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap behavior; earlier nodes win ties.
        other
            .f
            .partial_cmp(&self.f)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.h.partial_cmp(&self.h).unwrap_or(Ordering::Equal))
            .then_with(|| other.node.cmp(&self.node))
    }
}

struct SegmentSearch {
    nodes: Vec<SearchNode>,
    best: usize,
    reached: bool,
    expansions: usize,
}

fn search_segment(map: &Map, catalog: &CliffCatalog, start: CellPos, end: CellPos, options: &CliffOptions) -> SegmentSearch {
    let limits = options.limits;
    let mut nodes = vec![SearchNode {
        location: start,
        exit: start,
        exit_directions: DirectionMask::all(),
        parent: None,
        piece: None,
        g: 0,
        h: start.distance_to(end),
    }];
    let mut open = BinaryHeap::new();
    open.push(QueueEntry {
        node: 0,
        f: nodes[0].h,
        h: nodes[0].h,
    });
    let mut closed: AHashSet<(CellPos, u8)> = AHashSet::new();

    let mut best = 0usize;
    let mut idle = 0usize;
    let mut expansions = 0usize;
    let mut reached = nodes[0].h < limits.close_enough;

    while !reached {
        let Some(entry) = open.pop() else {
            break;
        };
        let current = nodes[entry.node];
        if !closed.insert((current.exit, current.exit_directions.bits())) {
            continue;
        }

        expansions += 1;
        if expansions > limits.max_expansions || idle > limits.max_idle_expansions {
            break;
        }
        trace!(x = current.exit.x, y = current.exit.y, h = current.h, "expanding cliff node");

        let mut improved = false;
        for (piece_index, piece) in catalog.pieces.iter().enumerate() {
            for (point_index, point) in piece.connection_points.iter().enumerate() {
                if point.side != options.side {
                    continue;
                }
                let mate = point.directions.reversed() & current.exit_directions;
                let Some(exit_point) = piece.exit_point(point_index) else {
                    continue;
                };
                for direction in mate.directions() {
                    let location = current.exit.step(direction) - point.offset;
                    if !map.is_valid(location) {
                        continue;
                    }
                    let exit = location + exit_point.offset;
                    let node = SearchNode {
                        location,
                        exit,
                        exit_directions: exit_point.directions,
                        parent: Some(entry.node),
                        piece: Some(piece_index),
                        g: current.g + 1,
                        h: exit.distance_to(end),
                    };
                    let index = nodes.len();
                    nodes.push(node);
                    if node.h < nodes[best].h {
                        best = index;
                        improved = true;
                    }
                    if node.h < limits.close_enough {
                        reached = true;
                    }
                    open.push(QueueEntry {
                        node: index,
                        f: f64::from(node.g) + node.h,
                        h: node.h,
                    });
                }
            }
        }
        idle = if improved { 0 } else { idle + 1 };
    }

    SegmentSearch {
        nodes,
        best,
        reached,
        expansions,
    }
}

// ============================================================================
// Placement
// ============================================================================

fn stamp_piece(
    map: &mut Map,
    theater: &dyn TheaterCatalog,
    tile_index: u16,
    origin: CellPos,
    level: u8,
    clear_ground_only: bool,
    undo: &mut TerrainUndo,
    touched: &mut Vec<CellPos>,
) {
    let cells: Vec<(CellPos, u8)> = match theater.tile(tile_index) {
        Some(info) => info
            .sub_tiles
            .iter()
            .enumerate()
            .filter(|&(_, &present)| present)
            .filter_map(|(i, _)| {
                let width = usize::from(info.width.max(1));
                let dx = i16::try_from(i % width).ok()?;
                let dy = i16::try_from(i / width).ok()?;
                Some((origin.offset(dx, dy), u8::try_from(i).ok()?))
            })
            .collect(),
        None => vec![(origin, 0)],
    };

    for (pos, sub_tile_index) in cells {
        let Some(tile) = map.tile(pos) else {
            continue;
        };
        if clear_ground_only && !tile.is_clear_ground() {
            continue;
        }
        undo.record(map, pos);
        if let Some(tile) = map.tile_mut(pos) {
            tile.set_terrain(Terrain {
                tile_index,
                sub_tile_index,
                level,
            });
        }
        touched.push(pos);
    }
}

/// Draw a cliff along `vertices`, one search per consecutive pair.
///
/// Heights are relative to the level of each segment's start cell. Segments
/// that cannot reach their end place the closest chain found.
pub fn draw_cliff(
    map: &mut Map,
    rules: &Rules,
    theater: &dyn TheaterCatalog,
    catalog: &CliffCatalog,
    vertices: &[CellPos],
    options: &CliffOptions,
) -> CliffOutcome {
    let mut undo = TerrainUndo::new();
    let mut touched = Vec::new();
    let mut segments = Vec::new();

    for pair in vertices.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        let search = search_segment(map, catalog, start, end, options);
        let origin_level = map.tile(start).map_or(0, |t| t.level);

        let mut chain = Vec::new();
        let mut cursor = Some(search.best);
        while let Some(index) = cursor {
            let node = search.nodes[index];
            if let Some(piece) = node.piece {
                chain.push((node.location, piece));
            }
            cursor = node.parent;
        }
        chain.reverse();

        for &(location, piece_index) in &chain {
            let piece = &catalog.pieces[piece_index];
            let Some(tile_index) = piece.tile_at(location) else {
                continue;
            };
            let level = origin_level.saturating_add(piece.height_offset).min(rules.max_height_level);
            stamp_piece(
                map,
                theater,
                tile_index,
                location,
                level,
                options.clear_ground_only,
                &mut undo,
                &mut touched,
            );
        }

        let report = SegmentReport {
            start,
            end,
            pieces: chain.len(),
            reached: search.reached,
            distance: search.nodes[search.best].h,
            expansions: search.expansions,
        };
        debug!(
            start = %start,
            end = %end,
            pieces = report.pieces,
            reached = report.reached,
            expansions = report.expansions,
            "cliff segment placed"
        );
        segments.push(report);
    }

    map.invalidate_cells(touched.clone());
    CliffOutcome {
        undo,
        touched,
        segments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MapSize;
    use crate::theater::Theater;

    fn point(x: i16, y: i16, directions: DirectionMask) -> ConnectionPoint {
        ConnectionPoint {
            offset: CellPos::new(x, y),
            directions,
            side: CliffSide::Front,
        }
    }

    fn test_map() -> Map {
        Map::new(MapSize { width: 30, height: 30 }, "TEMPERATE", &Rules::default())
    }

    /// One-cell pieces that carry the chain east (entering from the west).
    fn eastward_catalog() -> CliffCatalog {
        CliffCatalog {
            pieces: vec![CliffPiece {
                name: "straight".into(),
                tile_indices: vec![5],
                connection_points: vec![
                    point(0, 0, DirectionMask::WEST),
                    point(0, 0, DirectionMask::EAST),
                ],
                height_offset: 4,
            }],
        }
    }

    #[test]
    fn test_reaches_target_in_straight_line() {
        let mut map = test_map();
        let start = CellPos::new(25, 25);
        let end = CellPos::new(29, 21);
        let outcome = draw_cliff(
            &mut map,
            &Rules::default(),
            &Theater::new("TEMPERATE"),
            &eastward_catalog(),
            &[start, end],
            &CliffOptions::default(),
        );
        let report = &outcome.segments[0];
        assert!(report.reached);
        assert_eq!(report.pieces, 4);
        assert_eq!(map.tile(CellPos::new(26, 24)).unwrap().tile_index, 5);
        assert_eq!(map.tile(CellPos::new(29, 21)).unwrap().tile_index, 5);
        assert_eq!(map.tile(CellPos::new(26, 24)).unwrap().level, 4);
    }

    #[test]
    fn test_unreachable_target_returns_best_effort() {
        let mut map = test_map();
        let catalog = CliffCatalog {
            pieces: vec![CliffPiece {
                name: "north".into(),
                tile_indices: vec![9],
                connection_points: vec![point(0, 0, DirectionMask::NORTH)],
                height_offset: 0,
            }],
        };
        let start = CellPos::new(25, 25);
        let end = start.step(crate::codec::Direction::East);
        let outcome = draw_cliff(
            &mut map,
            &Rules::default(),
            &Theater::new("TEMPERATE"),
            &catalog,
            &[start, end],
            &CliffOptions::default(),
        );
        let report = &outcome.segments[0];
        assert!(!report.reached);
        // the only placement lands further away than the start, so nothing beats the root
        assert_eq!(report.pieces, 0);
        assert_eq!(report.expansions, 2);
        assert!((report.distance - 2f64.sqrt()).abs() < 1e-9);
    }

    /// Target off the chain's axis: every piece placed moves further away.
    fn search_off_axis(limits: CliffLimits) -> SegmentReport {
        let mut map = test_map();
        let options = CliffOptions {
            limits,
            ..CliffOptions::default()
        };
        let outcome = draw_cliff(
            &mut map,
            &Rules::default(),
            &Theater::new("TEMPERATE"),
            &eastward_catalog(),
            &[CellPos::new(25, 25), CellPos::new(20, 20)],
            &options,
        );
        outcome.segments[0].clone()
    }

    #[test]
    fn test_search_stops_at_expansion_cap() {
        let report = search_off_axis(CliffLimits {
            max_expansions: 4,
            ..CliffLimits::default()
        });
        assert!(!report.reached);
        assert_eq!(report.expansions, 5);
        assert_eq!(report.pieces, 0);
        assert!((report.distance - 50f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_search_stops_when_idle() {
        let report = search_off_axis(CliffLimits {
            max_idle_expansions: 3,
            ..CliffLimits::default()
        });
        assert!(!report.reached);
        assert_eq!(report.expansions, 5);
    }

    #[test]
    fn test_height_clamped_and_undo() {
        let mut map = test_map();
        let rules = Rules {
            max_height_level: 2,
            ..Rules::default()
        };
        let start = CellPos::new(25, 25);
        let end = CellPos::new(27, 23);
        let outcome = draw_cliff(
            &mut map,
            &rules,
            &Theater::new("TEMPERATE"),
            &eastward_catalog(),
            &[start, end],
            &CliffOptions::default(),
        );
        assert!(!outcome.touched.is_empty());
        for &pos in &outcome.touched {
            assert_eq!(map.tile(pos).unwrap().level, 2);
        }
        outcome.undo.apply(&mut map);
        for &pos in &outcome.touched {
            assert!(map.tile(pos).unwrap().is_default_terrain());
        }
    }

    #[test]
    fn test_clear_ground_only_skips_painted_cells() {
        let mut map = test_map();
        let painted = CellPos::new(26, 24);
        map.tile_mut(painted).unwrap().tile_index = 40;
        let options = CliffOptions {
            clear_ground_only: true,
            ..CliffOptions::default()
        };
        let outcome = draw_cliff(
            &mut map,
            &Rules::default(),
            &Theater::new("TEMPERATE"),
            &eastward_catalog(),
            &[CellPos::new(25, 25), CellPos::new(28, 22)],
            &options,
        );
        assert_eq!(map.tile(painted).unwrap().tile_index, 40);
        assert!(!outcome.touched.contains(&painted));
        assert!(outcome.touched.contains(&CellPos::new(27, 23)));
    }

    #[test]
    fn test_other_side_pieces_ignored() {
        let mut map = test_map();
        let options = CliffOptions {
            side: CliffSide::Back,
            ..CliffOptions::default()
        };
        let outcome = draw_cliff(
            &mut map,
            &Rules::default(),
            &Theater::new("TEMPERATE"),
            &eastward_catalog(),
            &[CellPos::new(25, 25), CellPos::new(28, 22)],
            &options,
        );
        assert!(outcome.touched.is_empty());
        assert_eq!(outcome.segments[0].pieces, 0);
    }

    #[test]
    fn test_multi_cell_piece_stamps_sub_tiles() {
        let mut theater = Theater::new("TEMPERATE");
        theater.add_tile_set("Clear", "clear", vec![(1, 1, vec![true])]);
        theater.add_tile_set("Cliff", "cliff", vec![(2, 1, vec![true, true])]);
        let catalog = CliffCatalog {
            pieces: vec![CliffPiece {
                name: "wide".into(),
                tile_indices: vec![1],
                connection_points: vec![point(0, 0, DirectionMask::WEST), point(1, 0, DirectionMask::EAST)],
                height_offset: 0,
            }],
        };
        let mut map = test_map();
        let outcome = draw_cliff(
            &mut map,
            &Rules::default(),
            &theater,
            &catalog,
            &[CellPos::new(25, 25), CellPos::new(27, 24)],
            &CliffOptions::default(),
        );
        assert!(outcome.segments[0].reached);
        let first = map.tile(CellPos::new(26, 24)).unwrap();
        assert_eq!((first.tile_index, first.sub_tile_index), (1, 0));
        let second = map.tile(CellPos::new(27, 24)).unwrap();
        assert_eq!((second.tile_index, second.sub_tile_index), (1, 1));
    }
}
