//! Connected overlays (walls, fences): each cell's frame follows from which
//! neighbors hold overlay of the same family.

use crate::codec::{CellPos, Direction, DirectionMask};
use crate::edit::history::OverlayUndo;
use crate::state::{Map, Overlay, PlacementError, PlacementResult};
use crate::theater::rules::ConnectedOverlay;
use crate::theater::Rules;

fn family_at<'r>(map: &Map, rules: &'r Rules, pos: CellPos) -> Option<&'r str> {
    let overlay = map.tile(pos)?.overlay()?;
    rules.connected_overlay(overlay.type_index).map(|c| c.family.as_str())
}

/// Directions around `pos` whose cell holds overlay of `family`.
pub fn observed_mask(map: &Map, rules: &Rules, pos: CellPos, family: &str) -> DirectionMask {
    Direction::ALL
        .into_iter()
        .filter(|&d| family_at(map, rules, pos.step(d)) == Some(family))
        .fold(DirectionMask::empty(), |mask, d| mask | d.mask())
}

/// First frame whose pattern equals the observed neighbors restricted to the
/// type's connection mask.
pub fn select_frame(overlay: &ConnectedOverlay, observed: DirectionMask) -> Option<u8> {
    let masked = observed & overlay.connection_mask;
    overlay.frames.iter().find(|f| f.connects_to == masked).map(|f| f.frame)
}

/// Recompute the frame of a connected overlay at `pos`. Frame 0 when no frame matches.
fn restamp(map: &mut Map, rules: &Rules, pos: CellPos, undo: &mut OverlayUndo) {
    let Some(current) = map.tile(pos).and_then(|t| t.overlay()) else {
        return;
    };
    let Some(connected) = rules.connected_overlay(current.type_index) else {
        return;
    };
    let observed = observed_mask(map, rules, pos, &connected.family);
    let frame = select_frame(connected, observed).unwrap_or(0);
    if frame != current.frame {
        undo.record(map, pos);
        if let Some(tile) = map.tile_mut(pos) {
            tile.overlay = Some(Overlay {
                type_index: current.type_index,
                frame,
            });
        }
    }
}

fn set_and_restamp(map: &mut Map, rules: &Rules, pos: CellPos, overlay: Option<Overlay>) -> PlacementResult<OverlayUndo> {
    if !map.is_valid(pos) {
        return Err(PlacementError::InvalidCell(pos));
    }
    let mut undo = OverlayUndo::new();
    undo.record(map, pos);
    map.set_overlay(pos, overlay)?;
    restamp(map, rules, pos, &mut undo);
    for direction in Direction::ALL {
        restamp(map, rules, pos.step(direction), &mut undo);
    }
    map.invalidate_cells(undo.cells().collect());
    Ok(undo)
}

/// Put overlay `type_index` on `pos` and update the frames of the cell and its
/// eight neighbors. Cells further out are left alone.
pub fn place_connected_overlay(map: &mut Map, rules: &Rules, pos: CellPos, type_index: u8) -> PlacementResult<OverlayUndo> {
    set_and_restamp(map, rules, pos, Some(Overlay { type_index, frame: 0 }))
}

pub fn remove_connected_overlay(map: &mut Map, rules: &Rules, pos: CellPos) -> PlacementResult<OverlayUndo> {
    set_and_restamp(map, rules, pos, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MapSize;
    use crate::theater::rules::{ConnectedFrame, OverlayType};

    const WALL: u8 = 0;
    const FENCE: u8 = 1;

    fn wall(mask: DirectionMask, frames: &[(u8, DirectionMask)]) -> OverlayType {
        OverlayType {
            name: "GAWALL".into(),
            connected: Some(ConnectedOverlay {
                family: "wall".into(),
                connection_mask: mask,
                frames: frames
                    .iter()
                    .map(|&(frame, connects_to)| ConnectedFrame { frame, connects_to })
                    .collect(),
            }),
        }
    }

    fn rules_with(overlays: Vec<OverlayType>) -> Rules {
        Rules {
            overlays,
            ..Rules::default()
        }
    }

    fn test_map() -> Map {
        Map::new(MapSize { width: 20, height: 20 }, "TEMPERATE", &Rules::default())
    }

    #[test]
    fn test_masked_exact_match() {
        let participating = DirectionMask::NORTH | DirectionMask::NORTH_EAST | DirectionMask::EAST | DirectionMask::SOUTH_EAST;
        let north_east = DirectionMask::NORTH | DirectionMask::EAST;
        let rules = rules_with(vec![wall(
            participating,
            &[(1, DirectionMask::NORTH), (5, north_east), (9, participating)],
        )]);
        let mut map = test_map();
        let center = CellPos::new(20, 20);
        for pos in [center.step(Direction::North), center.step(Direction::East), center.step(Direction::West)] {
            map.set_overlay(pos, Some(Overlay { type_index: WALL, frame: 0 })).unwrap();
        }

        let observed = observed_mask(&map, &rules, center, "wall");
        assert_eq!(observed, north_east | DirectionMask::WEST);
        let connected = rules.connected_overlay(WALL).unwrap();
        assert_eq!(observed & connected.connection_mask, north_east);
        assert_eq!(select_frame(connected, observed), Some(5));
    }

    #[test]
    fn test_no_exact_frame() {
        let rules = rules_with(vec![wall(DirectionMask::all(), &[(1, DirectionMask::NORTH)])]);
        let connected = rules.connected_overlay(WALL).unwrap();
        assert_eq!(select_frame(connected, DirectionMask::NORTH | DirectionMask::SOUTH), None);
        assert_eq!(select_frame(connected, DirectionMask::NORTH), Some(1));
    }

    #[test]
    fn test_place_restamps_neighbors_once() {
        let all = DirectionMask::all();
        let rules = rules_with(vec![wall(
            all,
            &[
                (0, DirectionMask::empty()),
                (2, DirectionMask::EAST),
                (3, DirectionMask::WEST),
                (4, DirectionMask::EAST | DirectionMask::WEST),
            ],
        )]);
        let mut map = test_map();
        let a = CellPos::new(18, 20);
        let b = a.step(Direction::East);
        let c = b.step(Direction::East);

        place_connected_overlay(&mut map, &rules, a, WALL).unwrap();
        place_connected_overlay(&mut map, &rules, b, WALL).unwrap();
        assert_eq!(map.tile(a).unwrap().overlay().unwrap().frame, 2);
        assert_eq!(map.tile(b).unwrap().overlay().unwrap().frame, 3);

        let undo = place_connected_overlay(&mut map, &rules, c, WALL).unwrap();
        assert_eq!(map.tile(b).unwrap().overlay().unwrap().frame, 4);
        assert_eq!(map.tile(c).unwrap().overlay().unwrap().frame, 3);
        // a is two cells away and keeps its frame
        assert_eq!(map.tile(a).unwrap().overlay().unwrap().frame, 2);

        undo.apply(&mut map);
        assert!(map.tile(c).unwrap().overlay().is_none());
        assert_eq!(map.tile(b).unwrap().overlay().unwrap().frame, 3);
    }

    #[test]
    fn test_other_family_ignored() {
        let mut fence = wall(DirectionMask::all(), &[]);
        if let Some(c) = fence.connected.as_mut() {
            c.family = "fence".into();
        }
        let rules = rules_with(vec![wall(DirectionMask::all(), &[]), fence]);
        let mut map = test_map();
        let center = CellPos::new(20, 20);
        map.set_overlay(center.step(Direction::North), Some(Overlay { type_index: FENCE, frame: 0 })).unwrap();
        assert_eq!(observed_mask(&map, &rules, center, "wall"), DirectionMask::empty());
    }

    #[test]
    fn test_remove_updates_neighbor() {
        let rules = rules_with(vec![wall(
            DirectionMask::all(),
            &[(0, DirectionMask::empty()), (7, DirectionMask::SOUTH)],
        )]);
        let mut map = test_map();
        let top = CellPos::new(20, 20);
        let bottom = top.step(Direction::South);
        place_connected_overlay(&mut map, &rules, top, WALL).unwrap();
        place_connected_overlay(&mut map, &rules, bottom, WALL).unwrap();
        assert_eq!(map.tile(top).unwrap().overlay().unwrap().frame, 7);

        remove_connected_overlay(&mut map, &rules, bottom).unwrap();
        assert_eq!(map.tile(top).unwrap().overlay().unwrap().frame, 0);
        assert!(remove_connected_overlay(&mut map, &rules, CellPos::new(0, 0)).is_err());
    }
}
