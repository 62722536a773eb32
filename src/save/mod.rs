//! [`Map`] → container pipeline.
//!
//! Every owned section is rebuilt from the registry on each save; sections the
//! map does not own are carried over from the container it was loaded from,
//! in their original position. Output depends only on the registry, so saving
//! a freshly loaded save reproduces it byte for byte.

mod houses;
mod objects;
mod teams;
mod technos;
mod terrain;
mod triggers;

use std::path::Path;

use ahash::AHashSet;
use tracing::{debug, info};

use crate::codec::{IniFile, IniSection};
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::state::{Map, MapEvent};
use crate::theater::Rules;

/// Sections whose content is derived entirely from the registry.
const OWNED_SECTIONS: &[&str] = &[
    "Basic",
    "Map",
    "IsoMapPack5",
    "OverlayPack",
    "OverlayDataPack",
    "Houses",
    "Smudge",
    "Terrain",
    "Tubes",
    "Waypoints",
    "TaskForces",
    "ScriptTypes",
    "TeamTypes",
    "AITriggerTypes",
    "Triggers",
    "Events",
    "Actions",
    "Tags",
    "CellTags",
    "VariableNames",
    "Structures",
    "Units",
    "Infantry",
    "Aircraft",
];

/// List sections whose values name further owned sections.
const LIST_SECTIONS: &[&str] = &["Houses", "TaskForces", "ScriptTypes", "TeamTypes"];

#[derive(Debug)]
pub struct SaveOutcome {
    pub ini: IniFile,
    pub diagnostics: Diagnostics,
}

/// State shared by the save stages of one call
pub(crate) struct SaveContext<'a> {
    pub rules: &'a Rules,
    pub diagnostics: Diagnostics,
    sections: Vec<IniSection>,
}

impl SaveContext<'_> {
    pub fn emit(&mut self, section: IniSection) {
        debug!(section = section.name(), keys = section.len(), "section written");
        self.sections.push(section);
    }
}

type Stage = fn(&mut SaveContext<'_>, &Map);

const STAGES: &[Stage] = &[
    terrain::write_basic,
    terrain::write_map_section,
    terrain::write_tile_pack,
    terrain::write_overlay_packs,
    houses::write_houses,
    objects::write_smudges,
    objects::write_terrain_objects,
    objects::write_tubes,
    objects::write_waypoints,
    teams::write_task_forces,
    triggers::write_triggers,
    triggers::write_tags,
    objects::write_cell_tags,
    teams::write_scripts,
    teams::write_team_types,
    teams::write_ai_triggers,
    objects::write_local_variables,
    technos::write_structures,
    technos::write_aircraft,
    technos::write_units,
    technos::write_infantry,
];

/// Names of every section the last load or save produced from the registry.
fn stale_sections(source: &IniFile) -> AHashSet<String> {
    let mut names: AHashSet<String> = OWNED_SECTIONS.iter().map(|s| s.to_string()).collect();
    for list in LIST_SECTIONS {
        names.extend(source.list_values(list));
    }
    names
}

/// Serialize `map` into a container.
pub fn save_map(map: &Map, rules: &Rules) -> SaveOutcome {
    let mut cx = SaveContext {
        rules,
        diagnostics: Diagnostics::new(),
        sections: Vec::new(),
    };
    for stage in STAGES {
        stage(&mut cx, map);
    }

    let mut ini = map.source().clone();
    let written: AHashSet<&str> = cx.sections.iter().map(IniSection::name).collect();
    for name in stale_sections(&ini) {
        if !written.contains(name.as_str()) {
            ini.remove_section(&name);
        }
    }
    for section in cx.sections {
        ini.put_section(section);
    }

    info!(
        sections = ini.sections().count(),
        diagnostics = cx.diagnostics.len(),
        "map saved"
    );
    SaveOutcome {
        ini,
        diagnostics: cx.diagnostics,
    }
}

/// Save `map` to `path`. The written container becomes the map's new source.
pub fn save_map_file(map: &mut Map, rules: &Rules, path: impl AsRef<Path>) -> Result<Diagnostics> {
    let path = path.as_ref();
    let SaveOutcome { ini, diagnostics } = save_map(map, rules);
    ini.write_file(path)?;
    debug!(path = %path.display(), "map written");
    map.source = ini;
    map.push_event(MapEvent::MapWritten);
    Ok(diagnostics)
}

/// `1`/`0` for booleans inside object rows.
pub(crate) fn row_flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

/// Section with keys `0`, `1`, ... holding `values` in order.
pub(crate) fn positional_section(name: &str, values: impl IntoIterator<Item = String>) -> IniSection {
    let mut section = IniSection::new(name);
    for (i, value) in values.into_iter().enumerate() {
        section.set(i.to_string(), value);
    }
    section
}
