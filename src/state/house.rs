use crate::codec::fields::{bool_text, set_bool, set_parsed, set_string, Field};
use crate::codec::CellPos;

/// Most base nodes a house may list.
pub const MAX_BASE_NODES: usize = 1000;

/// Where a house entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HouseOrigin {
    /// Built in to the rules; written only if the map redefines it
    Standard,
    /// Defined by the map's `[Houses]` list
    Map,
    /// Created during load for an owner name that resolved to nothing; never written
    Placeholder,
}

/// Planned structure in a house's AI base layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseNode {
    pub structure_type: String,
    pub position: CellPos,
}

#[derive(Debug, Clone)]
pub struct House {
    pub name: String,
    /// Country this house plays as. Color and side fall back to it.
    pub country: String,
    /// Explicit color override
    pub color: Option<i32>,
    pub side: Option<String>,
    pub acts_like: Option<i32>,
    pub allies: Vec<String>,
    pub credits: i32,
    pub tech_level: i32,
    pub iq: i32,
    pub edge: String,
    pub percent_built: i32,
    pub player_control: bool,
    pub base_nodes: Vec<BaseNode>,
    pub origin: HouseOrigin,
}

impl House {
    pub fn new(name: impl Into<String>, origin: HouseOrigin) -> Self {
        let name = name.into();
        Self {
            country: name.clone(),
            name,
            color: None,
            side: None,
            acts_like: None,
            allies: Vec::new(),
            credits: 0,
            tech_level: 10,
            iq: 0,
            edge: "North".to_string(),
            percent_built: 100,
            player_control: false,
            base_nodes: Vec::new(),
            origin,
        }
    }

    pub fn is_written(&self) -> bool {
        self.origin == HouseOrigin::Map
    }
}

fn set_optional<V: std::str::FromStr>(slot: &mut Option<V>, value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        *slot = None;
        return true;
    }
    match value.parse() {
        Ok(v) => {
            *slot = Some(v);
            true
        }
        Err(_) => false,
    }
}

fn optional_text<V: ToString>(slot: &Option<V>) -> String {
    slot.as_ref().map(ToString::to_string).unwrap_or_default()
}

/// Keys of a house section, in written order. Base nodes are handled separately.
pub const HOUSE_FIELDS: &[Field<House>] = &[
    Field {
        key: "IQ",
        read: |h, v| set_parsed(&mut h.iq, v),
        write: |h| h.iq.to_string(),
        default: "0",
    },
    Field {
        key: "Edge",
        read: |h, v| set_string(&mut h.edge, v),
        write: |h| h.edge.clone(),
        default: "North",
    },
    Field {
        key: "Color",
        read: |h, v| set_optional(&mut h.color, v),
        write: |h| optional_text(&h.color),
        default: "",
    },
    Field {
        key: "Allies",
        read: |h, v| {
            h.allies = v.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect();
            true
        },
        write: |h| h.allies.join(","),
        default: "",
    },
    Field {
        key: "Country",
        read: |h, v| {
            if !v.trim().is_empty() {
                h.country = v.trim().to_string();
            }
            true
        },
        write: |h| h.country.clone(),
        default: "",
    },
    Field {
        key: "Credits",
        read: |h, v| set_parsed(&mut h.credits, v),
        write: |h| h.credits.to_string(),
        default: "0",
    },
    Field {
        key: "ActsLike",
        read: |h, v| set_optional(&mut h.acts_like, v),
        write: |h| optional_text(&h.acts_like),
        default: "",
    },
    Field {
        key: "Side",
        read: |h, v| set_optional(&mut h.side, v),
        write: |h| optional_text(&h.side),
        default: "",
    },
    Field {
        key: "TechLevel",
        read: |h, v| set_parsed(&mut h.tech_level, v),
        write: |h| h.tech_level.to_string(),
        default: "10",
    },
    Field {
        key: "PercentBuilt",
        read: |h, v| set_parsed(&mut h.percent_built, v),
        write: |h| h.percent_built.to_string(),
        default: "100",
    },
    Field {
        key: "PlayerControl",
        read: |h, v| set_bool(&mut h.player_control, v),
        write: |h| bool_text(h.player_control),
        default: "no",
    },
];
