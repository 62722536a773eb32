//! Undo/redo records for map edits.

use ahash::AHashSet;

use crate::codec::CellPos;
use crate::state::{Map, Overlay, Terrain};

/// Most records kept on the undo stack.
pub const MAX_HISTORY_SIZE: usize = 100;

/// Terrain of a set of cells before an edit touched them
#[derive(Debug, Clone, Default)]
pub struct TerrainUndo {
    cells: Vec<(CellPos, Terrain)>,
    seen: AHashSet<CellPos>,
}

impl TerrainUndo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the current terrain of `pos`. Only the first call per cell counts.
    pub fn record(&mut self, map: &Map, pos: CellPos) {
        if let Some(tile) = map.tile(pos) {
            if self.seen.insert(pos) {
                self.cells.push((pos, tile.terrain()));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn cells(&self) -> impl Iterator<Item = CellPos> + '_ {
        self.cells.iter().map(|&(pos, _)| pos)
    }

    /// Restore the recorded terrain. Returns the record that reverses this restore.
    /// Cells that no longer exist, e.g. after a resize, are skipped.
    pub fn apply(&self, map: &mut Map) -> TerrainUndo {
        let mut inverse = TerrainUndo::new();
        for &(pos, terrain) in &self.cells {
            inverse.record(map, pos);
            if let Some(tile) = map.tile_mut(pos) {
                tile.set_terrain(terrain);
            }
        }
        map.invalidate_cells(inverse.cells().collect());
        inverse
    }
}

/// Overlay of a set of cells before an edit touched them
#[derive(Debug, Clone, Default)]
pub struct OverlayUndo {
    cells: Vec<(CellPos, Option<Overlay>)>,
    seen: AHashSet<CellPos>,
}

impl OverlayUndo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, map: &Map, pos: CellPos) {
        if let Some(tile) = map.tile(pos) {
            if self.seen.insert(pos) {
                self.cells.push((pos, tile.overlay()));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> impl Iterator<Item = CellPos> + '_ {
        self.cells.iter().map(|&(pos, _)| pos)
    }

    /// Restore the recorded overlay, skipping cells that no longer exist.
    pub fn apply(&self, map: &mut Map) -> OverlayUndo {
        let mut inverse = OverlayUndo::new();
        for &(pos, overlay) in &self.cells {
            inverse.record(map, pos);
            if let Some(tile) = map.tile_mut(pos) {
                tile.overlay = overlay;
            }
        }
        map.invalidate_cells(inverse.cells().collect());
        inverse
    }
}

#[derive(Debug, Clone)]
pub enum EditRecord {
    Terrain(TerrainUndo),
    Overlay(OverlayUndo),
}

impl EditRecord {
    fn apply(&self, map: &mut Map) -> EditRecord {
        match self {
            EditRecord::Terrain(undo) => EditRecord::Terrain(undo.apply(map)),
            EditRecord::Overlay(undo) => EditRecord::Overlay(undo.apply(map)),
        }
    }
}

impl From<TerrainUndo> for EditRecord {
    fn from(undo: TerrainUndo) -> Self {
        EditRecord::Terrain(undo)
    }
}

impl From<OverlayUndo> for EditRecord {
    fn from(undo: OverlayUndo) -> Self {
        EditRecord::Overlay(undo)
    }
}

/// Undo and redo stacks of edit records (most recent last)
#[derive(Debug, Default)]
pub struct EditHistory {
    undo_stack: Vec<EditRecord>,
    redo_stack: Vec<EditRecord>,
}

impl EditHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished edit. Clears the redo stack.
    pub fn push(&mut self, record: impl Into<EditRecord>) {
        self.redo_stack.clear();
        self.undo_stack.push(record.into());
        if self.undo_stack.len() > MAX_HISTORY_SIZE {
            let excess = self.undo_stack.len() - MAX_HISTORY_SIZE;
            self.undo_stack.drain(..excess);
        }
    }

    /// Revert the most recent edit. Returns false when there is nothing to undo.
    pub fn undo(&mut self, map: &mut Map) -> bool {
        let Some(record) = self.undo_stack.pop() else {
            return false;
        };
        self.redo_stack.push(record.apply(map));
        true
    }

    pub fn redo(&mut self, map: &mut Map) -> bool {
        let Some(record) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push(record.apply(map));
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MapSize;
    use crate::theater::Rules;

    fn test_map() -> Map {
        Map::new(MapSize { width: 10, height: 10 }, "TEMPERATE", &Rules::default())
    }

    fn paint(map: &mut Map, pos: CellPos, tile_index: u16) -> TerrainUndo {
        let mut undo = TerrainUndo::new();
        undo.record(map, pos);
        map.tile_mut(pos).unwrap().set_terrain(Terrain {
            tile_index,
            sub_tile_index: 0,
            level: 2,
        });
        undo
    }

    #[test]
    fn test_terrain_undo_restores() {
        let mut map = test_map();
        let pos = CellPos::new(10, 10);
        let undo = paint(&mut map, pos, 7);
        assert_eq!(map.tile(pos).unwrap().tile_index, 7);

        let redo = undo.apply(&mut map);
        assert_eq!(map.tile(pos).unwrap().terrain(), Terrain::default());
        redo.apply(&mut map);
        assert_eq!(map.tile(pos).unwrap().tile_index, 7);
        assert_eq!(map.tile(pos).unwrap().level, 2);
    }

    #[test]
    fn test_record_keeps_first_state() {
        let mut map = test_map();
        let pos = CellPos::new(10, 10);
        let mut undo = paint(&mut map, pos, 7);
        undo.record(&map, pos);
        assert_eq!(undo.len(), 1);
        undo.apply(&mut map);
        assert_eq!(map.tile(pos).unwrap().tile_index, 0);
    }

    #[test]
    fn test_history_undo_redo() {
        let mut map = test_map();
        let pos = CellPos::new(10, 10);
        let mut history = EditHistory::new();
        history.push(paint(&mut map, pos, 3));
        history.push(paint(&mut map, pos, 4));

        assert!(history.undo(&mut map));
        assert_eq!(map.tile(pos).unwrap().tile_index, 3);
        assert!(history.undo(&mut map));
        assert_eq!(map.tile(pos).unwrap().tile_index, 0);
        assert!(!history.undo(&mut map));

        assert!(history.redo(&mut map));
        assert_eq!(map.tile(pos).unwrap().tile_index, 3);
        assert_eq!(history.undo_count(), 1);
        assert_eq!(history.redo_count(), 1);

        history.push(paint(&mut map, pos, 9));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_skips_cells_lost_to_resize() {
        let mut map = Map::new(MapSize { width: 20, height: 20 }, "TEMPERATE", &Rules::default());
        let kept = CellPos::new(12, 12);
        let lost = CellPos::new(20, 20);
        let mut undo = OverlayUndo::new();
        for pos in [kept, lost] {
            undo.record(&map, pos);
            map.set_overlay(pos, Some(Overlay { type_index: 1, frame: 0 })).unwrap();
        }

        map.resize(MapSize { width: 10, height: 10 });
        assert!(map.tile(lost).is_none());
        map.take_events();

        let inverse = undo.apply(&mut map);
        assert_eq!(map.tile(kept).unwrap().overlay(), None);
        assert_eq!(inverse.cells().collect::<Vec<_>>(), vec![kept]);
        assert!(map.take_events().contains(&crate::state::MapEvent::CellsInvalidated { cells: vec![kept] }));
    }

    #[test]
    fn test_history_size_cap() {
        let mut map = test_map();
        let mut history = EditHistory::new();
        for i in 0..(MAX_HISTORY_SIZE + 5) {
            history.push(paint(&mut map, CellPos::new(10, 10), i as u16));
        }
        assert_eq!(history.undo_count(), MAX_HISTORY_SIZE);
    }
}
