use crate::codec::fields::read_fields;
use crate::load::{LoadContext, Row};
use crate::state::house::HOUSE_FIELDS;
use crate::state::{BaseNode, House, HouseOrigin, Map, MAX_BASE_NODES};

const SECTION: &str = "Houses";

/// `[Houses]` lists house names; each has its own section. A map house with the
/// name of a standard house replaces it in place.
pub(super) fn load_houses(cx: &mut LoadContext, map: &mut Map) {
    let ini = cx.ini;
    let Some(list) = ini.section(SECTION) else {
        return;
    };

    for (key, name) in list.iter() {
        if name.is_empty() {
            continue;
        }
        if cx.rules.country_indexed_houses && key.parse::<usize>().is_err() {
            cx.warn(SECTION, key, "expected a country index as the key");
        }

        let section = ini.section(name);
        if section.is_none() {
            cx.warn(SECTION, key, format!("house {name:?} has no section, using defaults"));
        }
        let mut house = House::new(name, HouseOrigin::Map);
        for field in read_fields(&mut house, section, HOUSE_FIELDS) {
            cx.warn(name, field, "unreadable value, using the default");
        }
        if let Some(section) = section {
            house.base_nodes = read_base_nodes(cx, name, section);
        }
        map.define_house(house);
    }
    tracing::debug!(houses = map.houses().len(), "houses loaded");
}

fn read_base_nodes(cx: &mut LoadContext, house: &str, section: &crate::codec::IniSection) -> Vec<BaseNode> {
    let declared: usize = section.get_parsed("NodeCount").unwrap_or(0);
    let count = if declared > MAX_BASE_NODES {
        cx.warn(house, "NodeCount", format!("{declared} base nodes, keeping the first {MAX_BASE_NODES}"));
        MAX_BASE_NODES
    } else {
        declared
    };

    let mut nodes = Vec::with_capacity(count);
    for i in 0..count {
        let key = format!("{i:03}");
        let Some(value) = section.get(&key) else {
            cx.warn(house, &key, "missing base node");
            continue;
        };
        let Some(row) = Row::split(value, 3) else {
            cx.warn(house, &key, "base node needs TYPE,X,Y");
            continue;
        };
        let Some(position) = row.cell(1, 2) else {
            cx.warn(house, &key, "malformed base node position");
            continue;
        };
        let structure_type = row.str(0);
        if !cx.rules.is_building(structure_type) {
            cx.warn(house, &key, format!("unknown structure type {structure_type:?}"));
            continue;
        }
        nodes.push(BaseNode {
            structure_type: structure_type.to_string(),
            position,
        });
    }
    nodes
}
