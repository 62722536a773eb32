use crate::codec::pack::{decode_overlay_pack, overlay_grid_index, read_base64_section, NO_OVERLAY, OVERLAY_PACK_LEN};
use crate::codec::{CellPos, IniSection};
use crate::load::{LoadContext, Row};
use crate::state::{CellTag, LocalVariable, Map, Overlay, Smudge, TerrainObject, Tube, Waypoint};

fn cell_key(cx: &mut LoadContext, section: &str, key: &str) -> Option<CellPos> {
    let pos = key.trim().parse::<i32>().ok().and_then(CellPos::from_cell_number);
    if pos.is_none() {
        cx.warn(section, key, "malformed cell number");
    }
    pos
}

pub(super) fn load_smudges(cx: &mut LoadContext, map: &mut Map) {
    const SECTION: &str = "Smudge";
    let Some(list) = cx.ini.section(SECTION) else {
        return;
    };
    for (key, value) in list.iter() {
        let Some(row) = Row::split(value, 4) else {
            cx.warn(SECTION, key, "expected TYPE,X,Y,0");
            continue;
        };
        let Some(position) = row.cell(1, 2) else {
            cx.warn(SECTION, key, "malformed position");
            continue;
        };
        let type_name = row.str(0);
        if !cx.rules.is_smudge(type_name) {
            cx.warn(SECTION, key, format!("unknown smudge type {type_name:?}"));
            continue;
        }
        let smudge = Smudge {
            type_name: type_name.to_string(),
            position,
        };
        if let Err(e) = map.place_smudge(smudge) {
            cx.warn(SECTION, key, e.to_string());
        }
    }
}

fn decode_grid(cx: &mut LoadContext, section: &IniSection) -> Option<Vec<u8>> {
    let name = section.name().to_string();
    let bytes = match read_base64_section(section) {
        Ok(bytes) => bytes,
        Err(e) => {
            cx.diagnostics.warn(&name, None, format!("not valid base64: {e}"));
            return None;
        }
    };
    match decode_overlay_pack(&bytes) {
        Ok(grid) => Some(grid),
        Err(e) => {
            cx.diagnostics.warn(&name, None, format!("corrupt overlay pack: {e}"));
            None
        }
    }
}

/// Overlay types and frames come from two parallel 512x512 grids. A broken
/// frame grid leaves frames at zero; a broken type grid drops all overlays.
pub(super) fn load_overlays(cx: &mut LoadContext, map: &mut Map) {
    let ini = cx.ini;
    let Some(types) = ini.section("OverlayPack").and_then(|s| decode_grid(cx, s)) else {
        return;
    };
    let frames = ini
        .section("OverlayDataPack")
        .and_then(|s| decode_grid(cx, s))
        .unwrap_or_else(|| vec![0; OVERLAY_PACK_LEN]);

    let mut unknown = 0usize;
    let mut placed = 0usize;
    for tile in map.tiles.iter_mut() {
        let Some(index) = overlay_grid_index(tile.pos.x, tile.pos.y) else {
            continue;
        };
        let type_index = types[index];
        if type_index == NO_OVERLAY {
            continue;
        }
        if !cx.rules.is_overlay(type_index) {
            unknown += 1;
            continue;
        }
        tile.overlay = Some(Overlay {
            type_index,
            frame: frames[index],
        });
        placed += 1;
    }
    if unknown > 0 {
        cx.diagnostics.warn("OverlayPack", None, format!("{unknown} cells with unknown overlay types were cleared"));
    }
    tracing::debug!(placed, "overlays loaded");
}

pub(super) fn load_terrain_objects(cx: &mut LoadContext, map: &mut Map) {
    const SECTION: &str = "Terrain";
    let Some(list) = cx.ini.section(SECTION) else {
        return;
    };
    for (key, type_name) in list.iter() {
        let Some(position) = cell_key(cx, SECTION, key) else {
            continue;
        };
        if !cx.rules.is_terrain_object(type_name) {
            cx.warn(SECTION, key, format!("unknown terrain type {type_name:?}"));
            continue;
        }
        let object = TerrainObject {
            type_name: type_name.to_string(),
            position,
        };
        if let Err(e) = map.place_terrain_object(object) {
            cx.warn(SECTION, key, e.to_string());
        }
    }
}

/// `EX,EY,FACING,XX,XY,DIR...,-1`
pub(super) fn load_tubes(cx: &mut LoadContext, map: &mut Map) {
    const SECTION: &str = "Tubes";
    let Some(list) = cx.ini.section(SECTION) else {
        return;
    };
    for (key, value) in list.iter() {
        let Some(row) = Row::split(value, 5) else {
            cx.warn(SECTION, key, "expected EX,EY,FACING,XX,XY,...");
            continue;
        };
        let (Some(entry), Some(entry_facing), Some(exit)) = (row.cell(0, 1), row.num::<i8>(2), row.cell(3, 4)) else {
            cx.warn(SECTION, key, "malformed tube endpoints");
            continue;
        };
        if !map.is_valid(entry) || !map.is_valid(exit) {
            cx.warn(SECTION, key, "tube endpoint outside the map");
            continue;
        }

        let mut directions = Vec::new();
        let mut terminated = false;
        for i in 5..row.len() {
            match row.num::<i8>(i) {
                Some(-1) => {
                    terminated = true;
                    break;
                }
                Some(d) => directions.push(d),
                None => {
                    cx.warn(SECTION, key, format!("malformed direction {:?}", row.fields()[i]));
                    break;
                }
            }
        }
        if !terminated {
            cx.warn(SECTION, key, "direction list has no -1 terminator");
        }
        map.tubes.push(Tube {
            entry,
            entry_facing,
            exit,
            directions,
        });
    }
}

pub(super) fn load_waypoints(cx: &mut LoadContext, map: &mut Map) {
    const SECTION: &str = "Waypoints";
    let Some(list) = cx.ini.section(SECTION) else {
        return;
    };
    for (key, value) in list.iter() {
        let Ok(number) = key.parse::<u16>() else {
            cx.warn(SECTION, key, "malformed waypoint number");
            continue;
        };
        let Some(position) = value.parse::<i32>().ok().and_then(CellPos::from_cell_number) else {
            cx.warn(SECTION, key, "malformed cell number");
            continue;
        };
        if let Err(e) = map.add_waypoint(Waypoint { number, position }) {
            cx.warn(SECTION, key, e.to_string());
        }
    }
}

pub(super) fn load_cell_tags(cx: &mut LoadContext, map: &mut Map) {
    const SECTION: &str = "CellTags";
    let Some(list) = cx.ini.section(SECTION) else {
        return;
    };
    for (key, tag_id) in list.iter() {
        let Some(position) = cell_key(cx, SECTION, key) else {
            continue;
        };
        let Some(tag) = cx.tag(SECTION, key, tag_id) else {
            continue;
        };
        if let Err(e) = map.add_cell_tag(CellTag { position, tag }) {
            cx.warn(SECTION, key, e.to_string());
        }
    }
}

pub(super) fn load_local_variables(cx: &mut LoadContext, map: &mut Map) {
    const SECTION: &str = "VariableNames";
    let Some(list) = cx.ini.section(SECTION) else {
        return;
    };
    for (key, value) in list.iter() {
        let Some(row) = Row::split(value, 2) else {
            cx.warn(SECTION, key, "expected NAME,STATE");
            continue;
        };
        map.local_variables.push(LocalVariable {
            name: row.str(0).to_string(),
            initial: row.flag(1),
        });
    }
}
