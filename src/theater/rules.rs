//! Ruleset metadata the map pipelines consult: country/house types, object
//! type names, structure footprints and connected overlays.
//!
//! An empty type list means that category is not checked; every name is accepted.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::codec::DirectionMask;
use crate::error::Result;
use crate::state::Foundation;

/// Highest terrain level on stock rules.
pub const DEFAULT_MAX_HEIGHT_LEVEL: u8 = 14;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub name: String,
    #[serde(default)]
    pub color: i32,
    #[serde(default)]
    pub side: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingType {
    pub name: String,
    #[serde(default = "one")]
    pub foundation_width: u8,
    #[serde(default = "one")]
    pub foundation_height: u8,
    /// Structure this upgrade attaches to
    #[serde(default)]
    pub powers_up_building: Option<String>,
}

fn one() -> u8 {
    1
}

impl BuildingType {
    pub fn foundation(&self) -> Foundation {
        Foundation {
            width: self.foundation_width.max(1),
            height: self.foundation_height.max(1),
        }
    }
}

/// One frame of a connected overlay and the neighbor pattern it draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedFrame {
    pub frame: u8,
    pub connects_to: DirectionMask,
}

/// Overlay whose frame depends on neighboring overlays of the same family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedOverlay {
    pub family: String,
    /// Directions that take part in the frame choice
    pub connection_mask: DirectionMask,
    pub frames: Vec<ConnectedFrame>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayType {
    pub name: String,
    #[serde(default)]
    pub connected: Option<ConnectedOverlay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Country types; each is also a standard house
    pub countries: Vec<Country>,
    /// `[Houses]` keys are country indices instead of list positions
    pub country_indexed_houses: bool,
    pub max_height_level: u8,
    pub buildings: Vec<BuildingType>,
    pub vehicles: Vec<String>,
    pub infantry: Vec<String>,
    pub aircraft: Vec<String>,
    pub terrain_objects: Vec<String>,
    pub smudges: Vec<String>,
    /// Indexed by the overlay pack's type byte
    pub overlays: Vec<OverlayType>,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            countries: Vec::new(),
            country_indexed_houses: false,
            max_height_level: DEFAULT_MAX_HEIGHT_LEVEL,
            buildings: Vec::new(),
            vehicles: Vec::new(),
            infantry: Vec::new(),
            aircraft: Vec::new(),
            terrain_objects: Vec::new(),
            smudges: Vec::new(),
            overlays: Vec::new(),
        }
    }
}

fn listed(list: &[String], name: &str) -> bool {
    list.is_empty() || list.iter().any(|n| n == name)
}

impl Rules {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn country(&self, name: &str) -> Option<&Country> {
        self.countries.iter().find(|c| c.name == name)
    }

    pub fn country_index(&self, name: &str) -> Option<usize> {
        self.countries.iter().position(|c| c.name == name)
    }

    pub fn building(&self, name: &str) -> Option<&BuildingType> {
        self.buildings.iter().find(|b| b.name == name)
    }

    /// Whether `name` is a known structure type. Unknown when the list is empty.
    pub fn is_building(&self, name: &str) -> bool {
        self.buildings.is_empty() || self.building(name).is_some()
    }

    pub fn foundation_of(&self, name: &str) -> Foundation {
        self.building(name).map(BuildingType::foundation).unwrap_or_default()
    }

    /// `upgrade` may be attached to `structure`.
    pub fn is_valid_upgrade(&self, structure: &str, upgrade: &str) -> bool {
        if self.buildings.is_empty() {
            return true;
        }
        self.building(upgrade)
            .and_then(|b| b.powers_up_building.as_deref())
            .is_some_and(|target| target == structure)
    }

    pub fn is_vehicle(&self, name: &str) -> bool {
        listed(&self.vehicles, name)
    }

    pub fn is_infantry(&self, name: &str) -> bool {
        listed(&self.infantry, name)
    }

    pub fn is_aircraft(&self, name: &str) -> bool {
        listed(&self.aircraft, name)
    }

    pub fn is_terrain_object(&self, name: &str) -> bool {
        listed(&self.terrain_objects, name)
    }

    pub fn is_smudge(&self, name: &str) -> bool {
        listed(&self.smudges, name)
    }

    pub fn overlay(&self, type_index: u8) -> Option<&OverlayType> {
        self.overlays.get(type_index as usize)
    }

    pub fn is_overlay(&self, type_index: u8) -> bool {
        self.overlays.is_empty() || self.overlay(type_index).is_some()
    }

    pub fn connected_overlay(&self, type_index: u8) -> Option<&ConnectedOverlay> {
        self.overlay(type_index).and_then(|o| o.connected.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_lists_accept_everything() {
        let rules = Rules::default();
        assert!(rules.is_vehicle("MTNK"));
        assert!(rules.is_building("GAPOWR"));
        assert!(rules.is_valid_upgrade("GAPOWR", "GAPOWRUP"));
        assert_eq!(rules.foundation_of("GAPOWR"), Foundation::default());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "countries": [{"name": "Americans", "color": 3}],
            "buildings": [
                {"name": "GAPOWR", "foundation_width": 2, "foundation_height": 2},
                {"name": "GAPOWRUP", "powers_up_building": "GAPOWR"}
            ],
            "vehicles": ["MTNK"],
            "overlays": [{"name": "GAWALL", "connected": {
                "family": "wall", "connection_mask": 170,
                "frames": [{"frame": 0, "connects_to": 0}]
            }}]
        }"#;
        let rules: Rules = serde_json::from_str(json).unwrap();
        assert_eq!(rules.max_height_level, DEFAULT_MAX_HEIGHT_LEVEL);
        assert_eq!(rules.country_index("Americans"), Some(0));
        assert!(rules.is_valid_upgrade("GAPOWR", "GAPOWRUP"));
        assert!(!rules.is_valid_upgrade("GAPOWRUP", "GAPOWR"));
        assert!(!rules.is_vehicle("HTNK"));
        assert_eq!(rules.foundation_of("GAPOWR"), Foundation { width: 2, height: 2 });
        let wall = rules.connected_overlay(0).unwrap();
        assert_eq!(wall.connection_mask.bits(), 170);
    }
}
