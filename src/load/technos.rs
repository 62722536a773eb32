use crate::load::{LoadContext, Row, NONE_REF};
use crate::state::techno::{FULL_HEALTH, MAX_UPGRADES};
use crate::state::{Aircraft, Infantry, Map, Orders, Structure, SubCell, Techno, Unit, UnitId};
use crate::theater::Rules;

const STRUCTURES: &str = "Structures";
const UNITS: &str = "Units";
const INFANTRY: &str = "Infantry";
const AIRCRAFT: &str = "Aircraft";

/// Column positions of the fields every object row shares.
struct Columns {
    min_fields: usize,
    facing: usize,
    tag: usize,
}

/// Owner, type, health and position of an object row. Returns `None` (after
/// recording why) when the row cannot be placed at all.
fn read_techno(
    cx: &mut LoadContext,
    map: &mut Map,
    section: &str,
    key: &str,
    row: &Row,
    columns: &Columns,
    known: fn(&Rules, &str) -> bool,
) -> Option<Techno> {
    let type_name = row.str(1);
    if !known(cx.rules, type_name) {
        cx.warn(section, key, format!("unknown type {type_name:?}"));
        return None;
    }
    let Some(position) = row.cell(3, 4) else {
        cx.warn(section, key, "malformed position");
        return None;
    };
    if !map.is_valid(position) {
        cx.warn(section, key, format!("cell {position} is outside the map"));
        return None;
    }
    let owner = cx.owner(map, section, key, row.str(0));

    let mut techno = Techno::new(owner, type_name, position);
    match row.num::<i32>(2) {
        Some(health) => techno.health = health.clamp(0, FULL_HEALTH),
        None => cx.warn(section, key, "malformed health, using full health"),
    }
    match row.num::<u8>(columns.facing) {
        Some(facing) => techno.facing = facing,
        None => cx.warn(section, key, "malformed facing"),
    }
    techno.tag = cx.tag(section, key, row.str(columns.tag));
    Some(techno)
}

fn read_orders(row: &Row, mission: usize, veterancy: usize, high: Option<usize>, autocreate: usize) -> Orders {
    let defaults = Orders::default();
    Orders {
        mission: match row.str(mission) {
            "" => defaults.mission,
            m => m.to_string(),
        },
        veterancy: row.num(veterancy).unwrap_or(defaults.veterancy),
        group: row.num(veterancy + 1).unwrap_or(defaults.group),
        high: high.is_some_and(|i| row.flag(i)),
        autocreate_no_recruitable: row.flag(autocreate),
        autocreate_yes_recruitable: row.flag(autocreate + 1),
    }
}

pub(super) fn load_structures(cx: &mut LoadContext, map: &mut Map) {
    const COLUMNS: Columns = Columns {
        min_fields: 17,
        facing: 5,
        tag: 6,
    };
    let Some(list) = cx.ini.section(STRUCTURES) else {
        return;
    };
    for (key, value) in list.iter() {
        let Some(row) = Row::split(value, COLUMNS.min_fields) else {
            cx.warn(STRUCTURES, key, format!("expected {} fields", COLUMNS.min_fields));
            continue;
        };
        let Some(techno) = read_techno(cx, map, STRUCTURES, key, &row, &COLUMNS, Rules::is_building) else {
            continue;
        };
        let type_name = techno.type_name.clone();
        let mut structure = Structure::new(techno, cx.rules.foundation_of(&type_name));
        structure.ai_sellable = row.flag(7);
        structure.ai_rebuildable = row.flag(8);
        structure.powered = row.flag(9);
        structure.spotlight = row.num(11).unwrap_or(0);
        structure.ai_repairable = row.flag(15);
        structure.nominal = row.flag(16);

        let declared = row.num::<usize>(10).unwrap_or(0).min(MAX_UPGRADES);
        for upgrade in (12..12 + declared).map(|i| row.str(i)) {
            if upgrade.is_empty() || upgrade == NONE_REF {
                continue;
            }
            if cx.rules.is_valid_upgrade(&type_name, upgrade) {
                structure.upgrades.push(upgrade.to_string());
            } else {
                cx.warn(STRUCTURES, key, format!("{upgrade:?} is not an upgrade of {type_name:?}"));
            }
        }

        if let Err(e) = map.place_structure(structure) {
            cx.warn(STRUCTURES, key, e.to_string());
        }
    }
}

pub(super) fn load_aircraft(cx: &mut LoadContext, map: &mut Map) {
    const COLUMNS: Columns = Columns {
        min_fields: 12,
        facing: 5,
        tag: 7,
    };
    let Some(list) = cx.ini.section(AIRCRAFT) else {
        return;
    };
    for (key, value) in list.iter() {
        let Some(row) = Row::split(value, COLUMNS.min_fields) else {
            cx.warn(AIRCRAFT, key, format!("expected {} fields", COLUMNS.min_fields));
            continue;
        };
        let Some(techno) = read_techno(cx, map, AIRCRAFT, key, &row, &COLUMNS, Rules::is_aircraft) else {
            continue;
        };
        let aircraft = Aircraft {
            techno,
            orders: read_orders(&row, 6, 8, None, 10),
        };
        if let Err(e) = map.place_aircraft(aircraft) {
            cx.warn(AIRCRAFT, key, e.to_string());
        }
    }
}

const UNIT_COLUMNS: Columns = Columns {
    min_fields: 14,
    facing: 5,
    tag: 7,
};

/// Place one unit row. Returns the unit and the row position it follows, if any.
fn place_unit_row(cx: &mut LoadContext, map: &mut Map, key: &str, value: &str) -> Option<(UnitId, Option<usize>)> {
    let Some(row) = Row::split(value, UNIT_COLUMNS.min_fields) else {
        cx.warn(UNITS, key, format!("expected {} fields", UNIT_COLUMNS.min_fields));
        return None;
    };
    let techno = read_techno(cx, map, UNITS, key, &row, &UNIT_COLUMNS, Rules::is_vehicle)?;
    let unit = Unit {
        techno,
        orders: read_orders(&row, 6, 8, Some(10), 12),
        follower: None,
    };
    match map.place_unit(unit) {
        Ok(id) => Some((id, row.num::<i32>(11).and_then(|i| usize::try_from(i).ok()))),
        Err(e) => {
            cx.warn(UNITS, key, e.to_string());
            None
        }
    }
}

/// Units name the unit they follow by its position in the list of units
/// loaded so far, so rows skipped as malformed do not count. Followers are
/// linked only after the whole section has been placed.
pub(super) fn load_units(cx: &mut LoadContext, map: &mut Map) {
    let Some(list) = cx.ini.section(UNITS) else {
        return;
    };

    let mut loaded: Vec<UnitId> = Vec::with_capacity(list.len());
    let mut follows = Vec::new();
    for (key, value) in list.iter() {
        let Some((id, follows_index)) = place_unit_row(cx, map, key, value) else {
            continue;
        };
        if let Some(index) = follows_index {
            follows.push((key, id, index));
        }
        loaded.push(id);
    }

    for (key, id, index) in follows {
        match loaded.get(index).copied() {
            Some(target) if target != id => {
                map.set_follower(id, Some(target));
            }
            Some(_) => cx.warn(UNITS, key, "unit follows itself"),
            None => cx.warn(UNITS, key, format!("follows unit {index}, which was not loaded")),
        }
    }
}

pub(super) fn load_infantry(cx: &mut LoadContext, map: &mut Map) {
    const COLUMNS: Columns = Columns {
        min_fields: 14,
        facing: 7,
        tag: 8,
    };
    let Some(list) = cx.ini.section(INFANTRY) else {
        return;
    };
    for (key, value) in list.iter() {
        let Some(row) = Row::split(value, COLUMNS.min_fields) else {
            cx.warn(INFANTRY, key, format!("expected {} fields", COLUMNS.min_fields));
            continue;
        };
        let Some(sub_cell) = row.num::<u8>(5).and_then(SubCell::from_u8) else {
            cx.warn(INFANTRY, key, format!("unknown sub-cell {:?}", row.str(5)));
            continue;
        };
        let Some(techno) = read_techno(cx, map, INFANTRY, key, &row, &COLUMNS, Rules::is_infantry) else {
            continue;
        };
        let infantry = Infantry {
            techno,
            orders: read_orders(&row, 6, 9, Some(11), 12),
            sub_cell,
        };
        if let Err(e) = map.place_infantry(infantry) {
            cx.warn(INFANTRY, key, e.to_string());
        }
    }
}
