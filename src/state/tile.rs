use serde::{Deserialize, Serialize};

use crate::codec::CellPos;
use crate::state::{AircraftId, CellTagId, InfantryId, SmudgeId, StructureId, TerrainObjectId, UnitId, WaypointId};

/// Side of the square tile buffer. Valid cells of any map fit inside it.
pub const MAP_BUFFER_SIZE: usize = 600;

/// Infantry position within a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum SubCell {
    #[default]
    Center = 0,
    Top = 1,
    Right = 2,
    Left = 3,
    Bottom = 4,
}

impl SubCell {
    pub const COUNT: usize = 5;
    pub const ALL: [SubCell; Self::COUNT] = [Self::Center, Self::Top, Self::Right, Self::Left, Self::Bottom];

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Center),
            1 => Some(Self::Top),
            2 => Some(Self::Right),
            3 => Some(Self::Left),
            4 => Some(Self::Bottom),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Overlay placed on a cell: the overlay type and its animation/connection frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Overlay {
    pub type_index: u8,
    pub frame: u8,
}

/// Terrain values of a cell, without occupants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Terrain {
    pub tile_index: u16,
    pub sub_tile_index: u8,
    pub level: u8,
}

/// One cell of the map: terrain plus back-references to whatever occupies it.
///
/// Occupant lists are maintained by [`Map`](crate::state::Map) mutators so that
/// they always agree with the positions stored on the entities.
#[derive(Debug, Clone, Default)]
pub struct Tile {
    pub pos: CellPos,
    pub tile_index: u16,
    pub sub_tile_index: u8,
    pub level: u8,
    pub ice_growth: u8,

    pub(crate) overlay: Option<Overlay>,
    pub(crate) terrain_object: Option<TerrainObjectId>,
    pub(crate) smudge: Option<SmudgeId>,
    pub(crate) structures: Vec<StructureId>,
    pub(crate) units: Vec<UnitId>,
    pub(crate) aircraft: Option<AircraftId>,
    pub(crate) infantry: [Option<InfantryId>; SubCell::COUNT],
    pub(crate) cell_tag: Option<CellTagId>,
    pub(crate) waypoint: Option<WaypointId>,
}

impl Tile {
    pub fn new(pos: CellPos) -> Self {
        Self {
            pos,
            ..Default::default()
        }
    }

    pub fn terrain(&self) -> Terrain {
        Terrain {
            tile_index: self.tile_index,
            sub_tile_index: self.sub_tile_index,
            level: self.level,
        }
    }

    pub fn set_terrain(&mut self, terrain: Terrain) {
        self.tile_index = terrain.tile_index;
        self.sub_tile_index = terrain.sub_tile_index;
        self.level = terrain.level;
    }

    /// Tiles in this state are omitted from the tile pack.
    pub fn is_default_terrain(&self) -> bool {
        self.tile_index == 0 && self.level == 0
    }

    pub fn is_clear_ground(&self) -> bool {
        self.tile_index == 0
    }

    pub fn overlay(&self) -> Option<Overlay> {
        self.overlay
    }

    pub fn terrain_object(&self) -> Option<TerrainObjectId> {
        self.terrain_object
    }

    pub fn smudge(&self) -> Option<SmudgeId> {
        self.smudge
    }

    pub fn structures(&self) -> &[StructureId] {
        &self.structures
    }

    pub fn units(&self) -> &[UnitId] {
        &self.units
    }

    pub fn aircraft(&self) -> Option<AircraftId> {
        self.aircraft
    }

    pub fn infantry(&self, sub_cell: SubCell) -> Option<InfantryId> {
        self.infantry[sub_cell.index()]
    }

    pub fn free_sub_cell(&self) -> Option<SubCell> {
        SubCell::ALL
            .into_iter()
            .find(|s| self.infantry[s.index()].is_none())
    }

    pub fn cell_tag(&self) -> Option<CellTagId> {
        self.cell_tag
    }

    pub fn waypoint(&self) -> Option<WaypointId> {
        self.waypoint
    }
}

/// Width and height of the playable diamond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MapSize {
    pub width: i32,
    pub height: i32,
}

/// `x + y > W`, `x + y <= W + 2H`, `x - y < W`, `y - x < W`.
pub fn is_in_diamond(size: MapSize, pos: CellPos) -> bool {
    let (x, y) = (pos.x as i32, pos.y as i32);
    let (w, h) = (size.width, size.height);
    x + y > w && x + y <= w + 2 * h && x - y < w && y - x < w
}

/// Cell storage over the fixed buffer. Every cell inside the diamond owns exactly
/// one tile; cells outside it have none.
#[derive(Debug, Clone)]
pub struct TileGrid {
    size: MapSize,
    slots: Vec<u32>,
    tiles: Vec<Tile>,
}

const NO_SLOT: u32 = u32::MAX;

impl TileGrid {
    pub fn new(size: MapSize) -> Self {
        let mut slots = vec![NO_SLOT; MAP_BUFFER_SIZE * MAP_BUFFER_SIZE];
        let mut tiles = Vec::new();
        for y in 0..MAP_BUFFER_SIZE {
            for x in 0..MAP_BUFFER_SIZE {
                let pos = CellPos::new(x as i16, y as i16);
                if is_in_diamond(size, pos) {
                    slots[y * MAP_BUFFER_SIZE + x] = tiles.len() as u32;
                    tiles.push(Tile::new(pos));
                }
            }
        }
        Self { size, slots, tiles }
    }

    pub fn size(&self) -> MapSize {
        self.size
    }

    fn slot(&self, pos: CellPos) -> Option<usize> {
        let x = usize::try_from(pos.x).ok()?;
        let y = usize::try_from(pos.y).ok()?;
        if x >= MAP_BUFFER_SIZE || y >= MAP_BUFFER_SIZE {
            return None;
        }
        match self.slots[y * MAP_BUFFER_SIZE + x] {
            NO_SLOT => None,
            i => Some(i as usize),
        }
    }

    pub fn is_valid(&self, pos: CellPos) -> bool {
        self.slot(pos).is_some()
    }

    pub fn get(&self, pos: CellPos) -> Option<&Tile> {
        self.slot(pos).map(|i| &self.tiles[i])
    }

    pub fn get_mut(&mut self, pos: CellPos) -> Option<&mut Tile> {
        self.slot(pos).map(|i| &mut self.tiles[i])
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tiles in buffer order (row-major by `y`, then `x`).
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Tile> {
        self.tiles.iter_mut()
    }
}
