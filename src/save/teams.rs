use crate::codec::fields::write_fields;
use crate::codec::IniSection;
use crate::save::{positional_section, row_flag, SaveContext};
use crate::state::team::TEAM_TYPE_FIELDS;
use crate::state::{AiTriggerType, Map, TeamType, TeamTypeId};

pub(super) fn write_task_forces(cx: &mut SaveContext, map: &Map) {
    cx.emit(positional_section(
        "TaskForces",
        map.task_forces().values().map(|t| t.id.clone()),
    ));
    for task_force in map.task_forces().values() {
        let mut section = IniSection::new(&task_force.id);
        section.set("Name", &task_force.name);
        section.set("Group", task_force.group);
        for (i, entry) in task_force.entries.iter().enumerate() {
            section.set(i.to_string(), format!("{},{}", entry.count, entry.unit_type));
        }
        cx.emit(section);
    }
}

pub(super) fn write_scripts(cx: &mut SaveContext, map: &Map) {
    cx.emit(positional_section("ScriptTypes", map.scripts().values().map(|s| s.id.clone())));
    for script in map.scripts().values() {
        let mut section = IniSection::new(&script.id);
        section.set("Name", &script.name);
        for (i, action) in script.actions.iter().enumerate() {
            section.set(i.to_string(), format!("{},{}", action.action, action.argument));
        }
        cx.emit(section);
    }
}

fn team_section(map: &Map, team: &TeamType) -> IniSection {
    let mut section = IniSection::new(&team.id);
    write_fields(team, &mut section, TEAM_TYPE_FIELDS);

    let house = team
        .house
        .and_then(|id| map.house(id))
        .map_or(team.house_name.as_str(), |h| h.name.as_str());
    if !house.is_empty() {
        section.set("House", house);
    }
    if let Some(script) = team.script.and_then(|id| map.scripts().get(id)) {
        section.set("Script", &script.id);
    }
    if let Some(task_force) = team.task_force.and_then(|id| map.task_forces().get(id)) {
        section.set("TaskForce", &task_force.id);
    }
    if let Some(tag) = team.tag.and_then(|id| map.tags().get(id)) {
        section.set("Tag", &tag.id);
    }
    section
}

pub(super) fn write_team_types(cx: &mut SaveContext, map: &Map) {
    cx.emit(positional_section("TeamTypes", map.team_types().values().map(|t| t.id.clone())));
    for team in map.team_types().values() {
        cx.emit(team_section(map, team));
    }
}

fn team_id(map: &Map, id: Option<TeamTypeId>) -> &str {
    id.and_then(|id| map.team_types().get(id))
        .map_or(crate::load::NONE_LINK, |t| t.id.as_str())
}

fn ai_trigger_row(map: &Map, trigger: &AiTriggerType) -> String {
    format!(
        "{},{},{},{},{},{},{},{},{:.6},{:.6},{:.6},{},0,{},{},{},{},{},{}",
        trigger.id,
        trigger.name,
        team_id(map, trigger.team_type),
        trigger.owner,
        trigger.tech_level,
        trigger.condition_type,
        trigger.comparison_object,
        trigger.comparator,
        trigger.initial_weight,
        trigger.min_weight,
        trigger.max_weight,
        row_flag(trigger.skirmish),
        trigger.side,
        row_flag(trigger.base_defense),
        team_id(map, trigger.second_team_type),
        row_flag(trigger.easy),
        row_flag(trigger.medium),
        row_flag(trigger.hard),
    )
}

pub(super) fn write_ai_triggers(cx: &mut SaveContext, map: &Map) {
    cx.emit(positional_section(
        "AITriggerTypes",
        map.ai_triggers().values().map(|t| ai_trigger_row(map, t)),
    ));
}
