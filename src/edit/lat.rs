//! Auto-LAT: pick transition tiles where one ground type borders another.
//!
//! A cell is matched against a table of five-point patterns covering the cell
//! itself and its four diagonal neighbors. The first pattern that matches decides
//! whether the cell gets a transition tile or the plain base tile.

use crate::codec::{CellPos, Direction};
use crate::edit::history::TerrainUndo;
use crate::state::{Map, Terrain};
use crate::theater::TheaterCatalog;

/// Requirement a pattern puts on one of its five points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointRule {
    /// Must belong to the pair (or be admitted by the caller)
    In,
    NotIn,
    Any,
}

impl PointRule {
    fn accepts(self, member: bool) -> bool {
        match self {
            PointRule::In => member,
            PointRule::NotIn => !member,
            PointRule::Any => true,
        }
    }
}

/// Pattern points in order: self, NE, NW, SE, SW.
pub const LAT_POINTS: [Option<Direction>; 5] = [
    None,
    Some(Direction::NorthEast),
    Some(Direction::NorthWest),
    Some(Direction::SouthEast),
    Some(Direction::SouthWest),
];

// Neighbor bits used to number the transition tiles.
const NE: u8 = 1;
const SE: u8 = 2;
const SW: u8 = 4;
const NW: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatTile {
    /// Tile `offset` of the transition set
    Transition(u16),
    /// First tile of the base set
    Base,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatPattern {
    pub points: [PointRule; 5],
    pub tile: LatTile,
}

const fn member_rule(members: u8, bit: u8) -> PointRule {
    if members & bit != 0 {
        PointRule::In
    } else {
        PointRule::NotIn
    }
}

const fn build_patterns() -> [LatPattern; 16] {
    let mut patterns = [LatPattern {
        points: [PointRule::In, PointRule::Any, PointRule::Any, PointRule::Any, PointRule::Any],
        tile: LatTile::Base,
    }; 16];
    // Transition `n` covers a member cell whose member neighbors are the bits of `n`.
    let mut members = 0u8;
    while members < 15 {
        patterns[members as usize] = LatPattern {
            points: [
                PointRule::In,
                member_rule(members, NE),
                member_rule(members, NW),
                member_rule(members, SE),
                member_rule(members, SW),
            ],
            tile: LatTile::Transition(members as u16),
        };
        members += 1;
    }
    patterns
}

/// Transition patterns in match order; the last entry is the catch-all base tile.
pub const LAT_PATTERNS: [LatPattern; 16] = build_patterns();

/// Ground type and the tile set holding its transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatPair {
    pub base_set: u16,
    pub transition_set: u16,
}

impl LatPair {
    /// Whether the terrain at `pos` counts as this ground type. Cells off the map
    /// count as members so that map edges get no transition.
    fn is_member(&self, map: &Map, catalog: &dyn TheaterCatalog, pos: CellPos, admit: &dyn Fn(u16) -> bool) -> bool {
        let Some(tile) = map.tile(pos) else {
            return true;
        };
        match catalog.tile_set_of(tile.tile_index) {
            Some(set) => set == self.base_set || set == self.transition_set || admit(set),
            None => false,
        }
    }
}

/// First pattern matching the surroundings of `pos`, or `None` when the cell
/// itself is not of the pair's ground type.
pub fn select_lat(
    map: &Map,
    catalog: &dyn TheaterCatalog,
    pair: &LatPair,
    pos: CellPos,
    admit: &dyn Fn(u16) -> bool,
) -> Option<LatTile> {
    let membership = LAT_POINTS.map(|point| {
        let cell = point.map_or(pos, |d| pos.step(d));
        pair.is_member(map, catalog, cell, admit)
    });
    LAT_PATTERNS
        .iter()
        .find(|pattern| pattern.points.iter().zip(membership).all(|(rule, member)| rule.accepts(member)))
        .map(|pattern| pattern.tile)
}

fn stamp_lat(
    map: &mut Map,
    catalog: &dyn TheaterCatalog,
    pair: &LatPair,
    pos: CellPos,
    admit: &dyn Fn(u16) -> bool,
    undo: &mut TerrainUndo,
) -> bool {
    let Some(choice) = select_lat(map, catalog, pair, pos, admit) else {
        return false;
    };
    let tile_index = match choice {
        LatTile::Transition(offset) => catalog.tile_in_set(pair.transition_set, offset),
        LatTile::Base => catalog.tile_in_set(pair.base_set, 0),
    };
    let Some(tile_index) = tile_index else {
        return false;
    };
    let Some(tile) = map.tile(pos) else {
        return false;
    };
    // Cells of other admitted sets keep their tile.
    if let Some(set) = catalog.tile_set_of(tile.tile_index) {
        if set != pair.base_set && set != pair.transition_set {
            return false;
        }
    }
    if tile.tile_index == tile_index && tile.sub_tile_index == 0 {
        return false;
    }
    let level = tile.level;
    undo.record(map, pos);
    if let Some(tile) = map.tile_mut(pos) {
        tile.set_terrain(Terrain {
            tile_index,
            sub_tile_index: 0,
            level,
        });
    }
    true
}

/// Restamp `pos` with the tile its neighbors call for. Returns `None` when no
/// pattern matches or the tile already fits.
pub fn apply_auto_lat(
    map: &mut Map,
    catalog: &dyn TheaterCatalog,
    pair: &LatPair,
    pos: CellPos,
    admit: &dyn Fn(u16) -> bool,
) -> Option<TerrainUndo> {
    let mut undo = TerrainUndo::new();
    if !stamp_lat(map, catalog, pair, pos, admit, &mut undo) {
        return None;
    }
    map.invalidate_cells(vec![pos]);
    Some(undo)
}

/// Restamp `pos` and its four diagonal neighbors, as needed after painting `pos`.
pub fn apply_auto_lat_around(
    map: &mut Map,
    catalog: &dyn TheaterCatalog,
    pair: &LatPair,
    pos: CellPos,
    admit: &dyn Fn(u16) -> bool,
) -> TerrainUndo {
    let mut undo = TerrainUndo::new();
    for point in LAT_POINTS {
        let cell = point.map_or(pos, |d| pos.step(d));
        stamp_lat(map, catalog, pair, cell, admit, &mut undo);
    }
    map.invalidate_cells(undo.cells().collect());
    undo
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MapSize;
    use crate::theater::{Rules, Theater};

    fn no_extra(_: u16) -> bool {
        false
    }

    struct Fixture {
        theater: Theater,
        pair: LatPair,
        rock: u16,
        map: Map,
    }

    fn fixture() -> Fixture {
        let mut theater = Theater::new("TEMPERATE");
        theater.add_tile_set("Clear", "clear", vec![(1, 1, vec![true])]);
        let base_set = theater.add_tile_set("Rough", "rough", vec![(1, 1, vec![true])]);
        let transition_set = theater.add_tile_set("RoughLAT", "rlat", vec![(1, 1, vec![true]); 15]);
        let rock = theater.add_tile_set("Rock", "rock", vec![(1, 1, vec![true])]);
        let map = Map::new(MapSize { width: 20, height: 20 }, "TEMPERATE", &Rules::default());
        Fixture {
            theater,
            pair: LatPair { base_set, transition_set },
            rock,
            map,
        }
    }

    fn paint(map: &mut Map, pos: CellPos, tile_index: u16) {
        map.tile_mut(pos).unwrap().tile_index = tile_index;
    }

    #[test]
    fn test_pattern_table_shape() {
        assert_eq!(LAT_PATTERNS[0].tile, LatTile::Transition(0));
        assert_eq!(LAT_PATTERNS[0].points[1], PointRule::NotIn);
        assert_eq!(LAT_PATTERNS[NE as usize].points[1], PointRule::In);
        assert_eq!(LAT_PATTERNS[NW as usize].points[2], PointRule::In);
        assert_eq!(LAT_PATTERNS[15].tile, LatTile::Base);
        assert!(LAT_PATTERNS.iter().all(|p| p.points[0] == PointRule::In));
    }

    #[test]
    fn test_isolated_cell_gets_full_transition() {
        let mut f = fixture();
        let pos = CellPos::new(20, 20);
        paint(&mut f.map, pos, 1);
        assert_eq!(
            select_lat(&f.map, &f.theater, &f.pair, pos, &no_extra),
            Some(LatTile::Transition(0))
        );
    }

    #[test]
    fn test_neighbor_bits() {
        let mut f = fixture();
        let pos = CellPos::new(20, 20);
        paint(&mut f.map, pos, 1);
        paint(&mut f.map, pos.step(Direction::NorthEast), 1);
        paint(&mut f.map, pos.step(Direction::SouthWest), 1);
        assert_eq!(
            select_lat(&f.map, &f.theater, &f.pair, pos, &no_extra),
            Some(LatTile::Transition((NE | SW) as u16))
        );
    }

    #[test]
    fn test_non_member_has_no_match() {
        let f = fixture();
        assert_eq!(select_lat(&f.map, &f.theater, &f.pair, CellPos::new(20, 20), &no_extra), None);
    }

    #[test]
    fn test_predicate_admits_other_sets() {
        let mut f = fixture();
        let pos = CellPos::new(20, 20);
        paint(&mut f.map, pos, 1);
        for d in [Direction::NorthEast, Direction::NorthWest, Direction::SouthEast, Direction::SouthWest] {
            paint(&mut f.map, pos.step(d), 17);
        }
        assert_eq!(
            select_lat(&f.map, &f.theater, &f.pair, pos, &no_extra),
            Some(LatTile::Transition(0))
        );
        let rock = f.rock;
        let admit_rock = move |set: u16| set == rock;
        assert_eq!(select_lat(&f.map, &f.theater, &f.pair, pos, &admit_rock), Some(LatTile::Base));
    }

    #[test]
    fn test_apply_stamps_transition_and_undoes() {
        let mut f = fixture();
        let pos = CellPos::new(20, 20);
        f.map.tile_mut(pos).unwrap().set_terrain(Terrain {
            tile_index: 1,
            sub_tile_index: 0,
            level: 3,
        });
        let undo = apply_auto_lat(&mut f.map, &f.theater, &f.pair, pos, &no_extra).unwrap();
        let tile = f.map.tile(pos).unwrap();
        assert_eq!(tile.tile_index, 2);
        assert_eq!(tile.level, 3);

        assert!(apply_auto_lat(&mut f.map, &f.theater, &f.pair, pos, &no_extra).is_none());
        undo.apply(&mut f.map);
        assert_eq!(f.map.tile(pos).unwrap().tile_index, 1);
    }

    #[test]
    fn test_apply_around_updates_neighbors() {
        let mut f = fixture();
        let pos = CellPos::new(20, 20);
        let ne = pos.step(Direction::NorthEast);
        paint(&mut f.map, pos, 1);
        paint(&mut f.map, ne, 1);
        let undo = apply_auto_lat_around(&mut f.map, &f.theater, &f.pair, pos, &no_extra);
        assert_eq!(undo.len(), 2);
        // pos sees NE; ne sees pos at its SW
        assert_eq!(f.map.tile(pos).unwrap().tile_index, 2 + NE as u16);
        assert_eq!(f.map.tile(ne).unwrap().tile_index, 2 + SW as u16);
    }
}
