use crate::load::NONE_REF;
use crate::save::{positional_section, row_flag, SaveContext};
use crate::state::techno::MAX_UPGRADES;
use crate::state::{Map, Orders, Techno};

/// Owner, type, health and position columns shared by every object row.
fn head(map: &Map, techno: &Techno) -> String {
    let owner = map.house(techno.owner).map_or(NONE_REF, |h| h.name.as_str());
    format!(
        "{},{},{},{},{}",
        owner, techno.type_name, techno.health, techno.position.x, techno.position.y
    )
}

fn tag<'a>(map: &'a Map, techno: &'a Techno) -> &'a str {
    techno
        .tag
        .and_then(|id| map.tags().get(id))
        .map_or(NONE_REF, |t| t.id.as_str())
}

fn recruit_flags(orders: &Orders) -> String {
    format!(
        "{},{}",
        row_flag(orders.autocreate_no_recruitable),
        row_flag(orders.autocreate_yes_recruitable)
    )
}

pub(super) fn write_structures(cx: &mut SaveContext, map: &Map) {
    let rows = map.structures().values().map(|s| {
        let mut upgrades: Vec<&str> = s.upgrades.iter().take(MAX_UPGRADES).map(String::as_str).collect();
        let count = upgrades.len();
        upgrades.resize(MAX_UPGRADES, NONE_REF);
        format!(
            "{},{},{},{},{},{},{},{},{},{},{}",
            head(map, &s.techno),
            s.techno.facing,
            tag(map, &s.techno),
            row_flag(s.ai_sellable),
            row_flag(s.ai_rebuildable),
            row_flag(s.powered),
            count,
            s.spotlight,
            upgrades.join(","),
            row_flag(s.ai_repairable),
            row_flag(s.nominal),
        )
    });
    cx.emit(positional_section("Structures", rows));
}

/// Followers are written as the list position of the followed unit.
pub(super) fn write_units(cx: &mut SaveContext, map: &Map) {
    let rows = map.units().values().map(|u| {
        let follows = u
            .follower
            .and_then(|id| map.units().position(id))
            .map_or(-1, |p| p as i64);
        format!(
            "{},{},{},{},{},{},{},{},{}",
            head(map, &u.techno),
            u.techno.facing,
            u.orders.mission,
            tag(map, &u.techno),
            u.orders.veterancy,
            u.orders.group,
            row_flag(u.orders.high),
            follows,
            recruit_flags(&u.orders),
        )
    });
    cx.emit(positional_section("Units", rows));
}

pub(super) fn write_infantry(cx: &mut SaveContext, map: &Map) {
    let rows = map.infantry().values().map(|i| {
        format!(
            "{},{},{},{},{},{},{},{},{}",
            head(map, &i.techno),
            i.sub_cell.index(),
            i.orders.mission,
            i.techno.facing,
            tag(map, &i.techno),
            i.orders.veterancy,
            i.orders.group,
            row_flag(i.orders.high),
            recruit_flags(&i.orders),
        )
    });
    cx.emit(positional_section("Infantry", rows));
}

pub(super) fn write_aircraft(cx: &mut SaveContext, map: &Map) {
    let rows = map.aircraft().values().map(|a| {
        format!(
            "{},{},{},{},{},{},{}",
            head(map, &a.techno),
            a.techno.facing,
            a.orders.mission,
            tag(map, &a.techno),
            a.orders.veterancy,
            a.orders.group,
            recruit_flags(&a.orders),
        )
    });
    cx.emit(positional_section("Aircraft", rows));
}
