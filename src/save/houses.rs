use ahash::AHashSet;

use crate::codec::fields::write_fields;
use crate::codec::IniSection;
use crate::save::SaveContext;
use crate::state::house::HOUSE_FIELDS;
use crate::state::{House, Map};

fn house_section(house: &House) -> IniSection {
    let mut section = IniSection::new(&house.name);
    write_fields(house, &mut section, HOUSE_FIELDS);
    section.set("NodeCount", house.base_nodes.len());
    for (i, node) in house.base_nodes.iter().enumerate() {
        section.set(
            format!("{i:03}"),
            format!("{},{},{}", node.structure_type, node.position.x, node.position.y),
        );
    }
    section
}

/// Only houses defined by the map are written; standard and placeholder houses
/// come back from the ruleset and the owning rows.
pub(super) fn write_houses(cx: &mut SaveContext, map: &Map) {
    let mut list = IniSection::new("Houses");
    let mut used = AHashSet::new();
    let mut bodies = Vec::new();

    for (position, house) in map.houses().values().filter(|h| h.is_written()).enumerate() {
        let key = if cx.rules.country_indexed_houses {
            match cx.rules.country_index(&house.country) {
                Some(index) if used.insert(index) => index,
                found => {
                    let fallback = (cx.rules.countries.len()..).find(|i| !used.contains(i)).unwrap_or(usize::MAX);
                    used.insert(fallback);
                    let reason = match found {
                        Some(index) => format!("country index {index} is already taken"),
                        None => format!("country {:?} is not in the ruleset", house.country),
                    };
                    cx.diagnostics.warn("Houses", Some(&house.name), format!("{reason}, written as {fallback}"));
                    fallback
                }
            }
        } else {
            position
        };
        list.set(key.to_string(), &house.name);
        bodies.push(house_section(house));
    }

    cx.emit(list);
    for body in bodies {
        cx.emit(body);
    }
}
