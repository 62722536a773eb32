use indexmap::IndexMap;

use crate::codec::fields::{bool_text, is_known, read_fields, set_bool, set_parsed, set_string, write_fields, Field};
use crate::codec::IniSection;

/// Scenario-wide settings from `[Basic]`
#[derive(Debug, Clone, PartialEq)]
pub struct Basic {
    pub name: String,
    pub author: String,
    pub percent: i32,
    pub game_mode: String,
    pub home_cell: i32,
    pub alt_home_cell: i32,
    pub init_time: i32,
    pub official: bool,
    pub end_of_game: bool,
    pub skip_score: bool,
    pub one_time_only: bool,
    pub skip_map_select: bool,
    pub truck_crate: bool,
    pub train_crate: bool,
    pub multiplayer_only: bool,
    pub tiberium_growth_enabled: bool,
    pub vein_growth_enabled: bool,
    pub ice_growth_enabled: bool,
    pub free_radar: bool,
    pub required_add_on: i32,
    pub new_ini_format: i32,
    /// Keys without a field, written back after the known ones
    pub extra: IndexMap<String, String>,
}

impl Default for Basic {
    fn default() -> Self {
        Self::from_section(None).0
    }
}

macro_rules! flag {
    ($key:literal, $field:ident, $default:literal) => {
        Field {
            key: $key,
            read: |b, v| set_bool(&mut b.$field, v),
            write: |b| bool_text(b.$field),
            default: $default,
        }
    };
}

macro_rules! int {
    ($key:literal, $field:ident, $default:literal) => {
        Field {
            key: $key,
            read: |b, v| set_parsed(&mut b.$field, v),
            write: |b| b.$field.to_string(),
            default: $default,
        }
    };
}

pub const BASIC_FIELDS: &[Field<Basic>] = &[
    Field {
        key: "Name",
        read: |b, v| set_string(&mut b.name, v),
        write: |b| b.name.clone(),
        default: "No name",
    },
    Field {
        key: "Author",
        read: |b, v| set_string(&mut b.author, v),
        write: |b| b.author.clone(),
        default: "",
    },
    int!("Percent", percent, "0"),
    Field {
        key: "GameMode",
        read: |b, v| set_string(&mut b.game_mode, v),
        write: |b| b.game_mode.clone(),
        default: "standard",
    },
    int!("HomeCell", home_cell, "98"),
    int!("AltHomeCell", alt_home_cell, "99"),
    int!("InitTime", init_time, "10000"),
    flag!("Official", official, "no"),
    flag!("EndOfGame", end_of_game, "no"),
    flag!("SkipScore", skip_score, "no"),
    flag!("OneTimeOnly", one_time_only, "no"),
    flag!("SkipMapSelect", skip_map_select, "no"),
    flag!("TruckCrate", truck_crate, "no"),
    flag!("TrainCrate", train_crate, "no"),
    flag!("MultiplayerOnly", multiplayer_only, "no"),
    flag!("TiberiumGrowthEnabled", tiberium_growth_enabled, "yes"),
    flag!("VeinGrowthEnabled", vein_growth_enabled, "yes"),
    flag!("IceGrowthEnabled", ice_growth_enabled, "yes"),
    flag!("FreeRadar", free_radar, "yes"),
    int!("RequiredAddOn", required_add_on, "0"),
    int!("NewINIFormat", new_ini_format, "4"),
];

impl Basic {
    /// Read `[Basic]`, returning the keys whose values were rejected.
    pub fn from_section(section: Option<&IniSection>) -> (Self, Vec<&'static str>) {
        let mut basic = Self {
            name: String::new(),
            author: String::new(),
            percent: 0,
            game_mode: String::new(),
            home_cell: 0,
            alt_home_cell: 0,
            init_time: 0,
            official: false,
            end_of_game: false,
            skip_score: false,
            one_time_only: false,
            skip_map_select: false,
            truck_crate: false,
            train_crate: false,
            multiplayer_only: false,
            tiberium_growth_enabled: false,
            vein_growth_enabled: false,
            ice_growth_enabled: false,
            free_radar: false,
            required_add_on: 0,
            new_ini_format: 0,
            extra: IndexMap::new(),
        };
        let rejected = read_fields(&mut basic, section, BASIC_FIELDS);
        if let Some(section) = section {
            for (key, value) in section.iter() {
                if !is_known(BASIC_FIELDS, key) {
                    basic.extra.insert(key.to_string(), value.to_string());
                }
            }
        }
        (basic, rejected)
    }

    pub fn to_section(&self) -> IniSection {
        let mut section = IniSection::new("Basic");
        write_fields(self, &mut section, BASIC_FIELDS);
        for (key, value) in &self.extra {
            section.set(key.clone(), value);
        }
        section
    }
}
