use crate::codec::IniSection;
use crate::save::{positional_section, row_flag, SaveContext};
use crate::state::Map;

pub(super) fn write_smudges(cx: &mut SaveContext, map: &Map) {
    let rows = map
        .smudges()
        .values()
        .map(|s| format!("{},{},{},0", s.type_name, s.position.x, s.position.y));
    cx.emit(positional_section("Smudge", rows));
}

pub(super) fn write_terrain_objects(cx: &mut SaveContext, map: &Map) {
    let mut section = IniSection::new("Terrain");
    for object in map.terrain_objects().values() {
        section.set(object.position.cell_number().to_string(), &object.type_name);
    }
    cx.emit(section);
}

pub(super) fn write_tubes(cx: &mut SaveContext, map: &Map) {
    let rows = map.tubes.iter().map(|tube| {
        let mut row = format!(
            "{},{},{},{},{}",
            tube.entry.x, tube.entry.y, tube.entry_facing, tube.exit.x, tube.exit.y
        );
        for direction in &tube.directions {
            row.push_str(&format!(",{direction}"));
        }
        row.push_str(",-1");
        row
    });
    cx.emit(positional_section("Tubes", rows));
}

pub(super) fn write_waypoints(cx: &mut SaveContext, map: &Map) {
    let mut waypoints: Vec<_> = map.waypoints().values().collect();
    waypoints.sort_by_key(|w| w.number);
    let mut section = IniSection::new("Waypoints");
    for waypoint in waypoints {
        section.set(waypoint.number.to_string(), waypoint.position.cell_number());
    }
    cx.emit(section);
}

pub(super) fn write_cell_tags(cx: &mut SaveContext, map: &Map) {
    let mut section = IniSection::new("CellTags");
    for cell_tag in map.cell_tags().values() {
        if let Some(tag) = map.tags().get(cell_tag.tag) {
            section.set(cell_tag.position.cell_number().to_string(), &tag.id);
        }
    }
    cx.emit(section);
}

pub(super) fn write_local_variables(cx: &mut SaveContext, map: &Map) {
    let rows = map
        .local_variables
        .iter()
        .map(|v| format!("{},{}", v.name, row_flag(v.initial)));
    cx.emit(positional_section("VariableNames", rows));
}
