//! Tile metadata for the map's theater, plus ruleset metadata.

pub mod rules;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use rules::Rules;

/// Shape of one tile in the theater
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileInfo {
    pub tile_set_id: u16,
    pub width: u8,
    pub height: u8,
    /// One entry per cell of the `width x height` block; `false` where the tile has no image
    pub sub_tiles: Vec<bool>,
}

impl TileInfo {
    pub fn sub_tile_count(&self) -> usize {
        self.sub_tiles.len()
    }

    pub fn has_sub_tiles(&self) -> bool {
        self.sub_tiles.iter().any(|&present| present)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSetInfo {
    pub id: u16,
    pub name: String,
    pub file_name: String,
    pub start_tile_index: u16,
    pub tile_count: u16,
}

/// Read access to tile metadata, supplied by whoever owns the theater assets.
pub trait TheaterCatalog {
    fn tile_count(&self) -> usize;

    fn tile(&self, index: u16) -> Option<&TileInfo>;

    fn tile_set(&self, id: u16) -> Option<&TileSetInfo>;

    fn tile_set_of(&self, index: u16) -> Option<u16> {
        self.tile(index).map(|t| t.tile_set_id)
    }

    /// Tile `offset` within set `id`, if the set has that many tiles.
    fn tile_in_set(&self, id: u16, offset: u16) -> Option<u16> {
        let set = self.tile_set(id)?;
        (offset < set.tile_count).then(|| set.start_tile_index + offset)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct TileShape {
    #[serde(default = "one")]
    width: u8,
    #[serde(default = "one")]
    height: u8,
    /// Missing means every cell of the block is present
    #[serde(default)]
    sub_tiles: Option<Vec<bool>>,
}

fn one() -> u8 {
    1
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct TileSetDef {
    name: String,
    #[serde(default)]
    file_name: String,
    tiles: Vec<TileShape>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct TheaterDef {
    name: String,
    tile_sets: Vec<TileSetDef>,
}

/// In-memory catalog. Tile indices are assigned in tile set order.
#[derive(Debug, Clone, Default)]
pub struct Theater {
    pub name: String,
    tile_sets: Vec<TileSetInfo>,
    tiles: Vec<TileInfo>,
}

impl Theater {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append a tile set and return its id.
    pub fn add_tile_set(&mut self, name: impl Into<String>, file_name: impl Into<String>, tiles: Vec<(u8, u8, Vec<bool>)>) -> u16 {
        let id = self.tile_sets.len() as u16;
        let start = self.tiles.len() as u16;
        let count = tiles.len() as u16;
        for (width, height, sub_tiles) in tiles {
            self.tiles.push(TileInfo {
                tile_set_id: id,
                width,
                height,
                sub_tiles,
            });
        }
        self.tile_sets.push(TileSetInfo {
            id,
            name: name.into(),
            file_name: file_name.into(),
            start_tile_index: start,
            tile_count: count,
        });
        id
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let def: TheaterDef = serde_json::from_str(&text)?;
        Ok(Self::from_def(def))
    }

    fn from_def(def: TheaterDef) -> Self {
        let mut theater = Self::new(def.name);
        for set in def.tile_sets {
            let tiles = set
                .tiles
                .into_iter()
                .map(|shape| {
                    let cells = shape.width as usize * shape.height as usize;
                    let sub_tiles = shape.sub_tiles.unwrap_or_else(|| vec![true; cells]);
                    (shape.width, shape.height, sub_tiles)
                })
                .collect();
            theater.add_tile_set(set.name, set.file_name, tiles);
        }
        theater
    }

    pub fn find_tile_set(&self, name: &str) -> Option<&TileSetInfo> {
        self.tile_sets.iter().find(|s| s.name == name)
    }
}

impl TheaterCatalog for Theater {
    fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    fn tile(&self, index: u16) -> Option<&TileInfo> {
        self.tiles.get(index as usize)
    }

    fn tile_set(&self, id: u16) -> Option<&TileSetInfo> {
        self.tile_sets.get(id as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_follow_set_order() {
        let mut theater = Theater::new("TEMPERATE");
        let clear = theater.add_tile_set("Clear", "clear", vec![(1, 1, vec![true])]);
        let cliffs = theater.add_tile_set(
            "Cliffs",
            "cliff",
            vec![(2, 1, vec![true, false]), (2, 2, vec![true; 4])],
        );
        assert_eq!(theater.tile_count(), 3);
        assert_eq!(theater.tile_set(cliffs).unwrap().start_tile_index, 1);
        assert_eq!(theater.tile_set_of(2), Some(cliffs));
        assert_eq!(theater.tile_set_of(0), Some(clear));
        assert_eq!(theater.tile(1).unwrap().sub_tile_count(), 2);
        assert_eq!(theater.tile_in_set(cliffs, 1), Some(2));
        assert_eq!(theater.tile_in_set(cliffs, 2), None);
    }

    #[test]
    fn test_from_json() {
        let json = r#"{"name": "SNOW", "tile_sets": [
            {"name": "Clear", "tiles": [{}]},
            {"name": "Ramp", "tiles": [{"width": 2, "height": 1, "sub_tiles": [true, false]}]}
        ]}"#;
        let theater = Theater::from_def(serde_json::from_str(json).unwrap());
        assert_eq!(theater.name, "SNOW");
        assert_eq!(theater.tile(0).unwrap().sub_tiles, vec![true]);
        assert!(theater.tile(1).unwrap().has_sub_tiles());
        assert_eq!(theater.find_tile_set("Ramp").map(|s| s.id), Some(1));
    }
}
