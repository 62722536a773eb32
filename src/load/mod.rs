//! Container → [`Map`] pipeline.
//!
//! Sections are read in a fixed order so that every reference points at
//! something already loaded: houses before owned objects, triggers before tags,
//! tags before anything carrying a tag, task forces and scripts before team types.
//! Only a bad `[Map]` section or a corrupt tile pack aborts a load; every other
//! problem becomes a [`Diagnostic`](crate::diagnostics::Diagnostic) and the row is skipped.

mod geometry;
mod houses;
mod objects;
mod teams;
mod technos;
mod triggers;
mod validate;

use std::path::Path;
use std::str::FromStr;

use ahash::AHashMap;
use tracing::{debug, info};

use crate::codec::ini::parse_bool;
use crate::codec::{CellPos, IniFile};
use crate::diagnostics::Diagnostics;
use crate::error::{MapLoadError, Result};
use crate::state::{HouseId, Map, ScriptId, TagId, TaskForceId, TeamTypeId, TriggerId};
use crate::theater::{Rules, TheaterCatalog};

pub use geometry::{MAX_MAP_HEIGHT, MAX_MAP_WIDTH};

/// Literal used for "no reference" in object and trigger rows.
pub(crate) const NONE_REF: &str = "None";
/// Literal used for "no linked trigger" / "no team type".
pub(crate) const NONE_LINK: &str = "<none>";

/// Result of a successful load: the map plus everything that was skipped or repaired.
#[derive(Debug)]
pub struct LoadOutcome {
    pub map: Map,
    pub diagnostics: Diagnostics,
}

/// State shared by the load stages of one call
pub(crate) struct LoadContext<'a> {
    pub ini: &'a IniFile,
    pub rules: &'a Rules,
    pub theater: &'a dyn TheaterCatalog,
    pub diagnostics: Diagnostics,
    pub triggers: AHashMap<String, TriggerId>,
    pub tags: AHashMap<String, TagId>,
    pub task_forces: AHashMap<String, TaskForceId>,
    pub scripts: AHashMap<String, ScriptId>,
    pub team_types: AHashMap<String, TeamTypeId>,
}

impl<'a> LoadContext<'a> {
    fn new(ini: &'a IniFile, rules: &'a Rules, theater: &'a dyn TheaterCatalog) -> Self {
        Self {
            ini,
            rules,
            theater,
            diagnostics: Diagnostics::new(),
            triggers: AHashMap::new(),
            tags: AHashMap::new(),
            task_forces: AHashMap::new(),
            scripts: AHashMap::new(),
            team_types: AHashMap::new(),
        }
    }

    pub fn warn(&mut self, section: &str, key: &str, message: impl Into<String>) {
        self.diagnostics.warn(section, Some(key), message);
    }

    /// Owner by name, or a placeholder house so the object can still be placed.
    pub fn owner(&mut self, map: &mut Map, section: &str, key: &str, name: &str) -> HouseId {
        if let Some(id) = map.find_house(name) {
            return id;
        }
        self.warn(section, key, format!("unknown owner {name:?}, using a placeholder house"));
        map.placeholder_house(name)
    }

    /// Tag id text from an object row; `None` literal means no tag.
    pub fn tag(&mut self, section: &str, key: &str, id: &str) -> Option<TagId> {
        if id.is_empty() || id == NONE_REF {
            return None;
        }
        let found = self.tags.get(id).copied();
        if found.is_none() {
            self.warn(section, key, format!("unknown tag {id:?}"));
        }
        found
    }
}

/// Comma separated row of an object or trigger section
pub(crate) struct Row<'a> {
    fields: Vec<&'a str>,
}

impl<'a> Row<'a> {
    /// Split `value`, or `None` when it has fewer than `min_fields` fields.
    pub fn split(value: &'a str, min_fields: usize) -> Option<Self> {
        let fields: Vec<&str> = value.split(',').map(str::trim).collect();
        (fields.len() >= min_fields).then_some(Self { fields })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn str(&self, i: usize) -> &'a str {
        self.fields.get(i).copied().unwrap_or("")
    }

    pub fn num<T: FromStr>(&self, i: usize) -> Option<T> {
        self.str(i).parse().ok()
    }

    /// Object rows store flags as `1`/`0`; anything unreadable is false.
    pub fn flag(&self, i: usize) -> bool {
        parse_bool(self.str(i)).unwrap_or(false)
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<CellPos> {
        Some(CellPos::new(self.num(x)?, self.num(y)?))
    }

    pub fn fields(&self) -> &[&'a str] {
        &self.fields
    }
}

type Stage = fn(&mut LoadContext<'_>, &mut Map);

const STAGES: &[(&str, Stage)] = &[
    ("houses", houses::load_houses),
    ("smudges", objects::load_smudges),
    ("overlays", objects::load_overlays),
    ("terrain objects", objects::load_terrain_objects),
    ("tubes", objects::load_tubes),
    ("waypoints", objects::load_waypoints),
    ("task forces", teams::load_task_forces),
    ("triggers", triggers::load_triggers),
    ("tags", triggers::load_tags),
    ("cell tags", objects::load_cell_tags),
    ("scripts", teams::load_scripts),
    ("team types", teams::load_team_types),
    ("ai trigger types", teams::load_ai_triggers),
    ("local variables", objects::load_local_variables),
    ("structures", technos::load_structures),
    ("aircraft", technos::load_aircraft),
    ("units", technos::load_units),
    ("infantry", technos::load_infantry),
    ("validation", validate::validate_tiles),
];

/// Build a [`Map`] from a parsed container.
pub fn load_map(ini: IniFile, rules: &Rules, theater: &dyn TheaterCatalog) -> std::result::Result<LoadOutcome, MapLoadError> {
    let mut cx = LoadContext::new(&ini, rules, theater);

    let basic = geometry::read_basic(&mut cx);
    let layout = geometry::read_map_section(&mut cx)?;
    let mut map = Map::new(layout.size, layout.theater, rules);
    map.basic = basic;
    map.local_size = layout.local_size;
    geometry::load_tile_pack(&mut cx, &mut map)?;

    for (name, stage) in STAGES {
        debug!(stage = *name, "loading");
        stage(&mut cx, &mut map);
    }

    let LoadContext { diagnostics, .. } = cx;
    map.take_events();
    map.source = ini;

    info!(
        width = map.size().width,
        height = map.size().height,
        houses = map.houses().len(),
        structures = map.structures().len(),
        units = map.units().len(),
        infantry = map.infantry().len(),
        aircraft = map.aircraft().len(),
        triggers = map.triggers().len(),
        diagnostics = diagnostics.len(),
        "map loaded"
    );
    Ok(LoadOutcome { map, diagnostics })
}

/// Read and load a map file.
pub fn load_map_file(path: impl AsRef<Path>, rules: &Rules, theater: &dyn TheaterCatalog) -> Result<LoadOutcome> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading map");
    let ini = IniFile::read_file(path)?;
    Ok(load_map(ini, rules, theater)?)
}
