use crate::codec::fields::read_fields;
use crate::codec::IniSection;
use crate::load::{LoadContext, Row, NONE_LINK, NONE_REF};
use crate::state::team::TEAM_TYPE_FIELDS;
use crate::state::team::{MAX_SCRIPT_ACTIONS, MAX_TASK_FORCE_ENTRIES};
use crate::state::{AiTriggerType, Map, Script, ScriptAction, TaskForce, TaskForceEntry, TeamType, TeamTypeId};

/// Sections listed by id in `list`, each paired with its own `[ID]` section.
fn listed_sections<'a>(cx: &mut LoadContext<'a>, list: &str) -> Vec<(&'a str, &'a IniSection)> {
    let ini = cx.ini;
    let Some(section) = ini.section(list) else {
        return Vec::new();
    };
    let mut found = Vec::new();
    for (key, id) in section.iter() {
        if id.is_empty() {
            continue;
        }
        match ini.section(id) {
            Some(body) => found.push((id, body)),
            None => cx.warn(list, key, format!("{id:?} has no section")),
        }
    }
    found
}

fn is_reference(value: &str) -> bool {
    !value.is_empty() && value != NONE_REF && value != NONE_LINK
}

pub(super) fn load_task_forces(cx: &mut LoadContext, map: &mut Map) {
    for (id, section) in listed_sections(cx, "TaskForces") {
        if cx.task_forces.contains_key(id) {
            cx.warn("TaskForces", id, "listed twice");
            continue;
        }
        let mut entries = Vec::new();
        for slot in 0..MAX_TASK_FORCE_ENTRIES {
            let key = slot.to_string();
            let Some(value) = section.get(&key) else {
                continue;
            };
            let row = Row::split(value, 2);
            match row.as_ref().and_then(|r| Some((r.num::<u32>(0)?, r.str(1)))) {
                Some((count, unit_type)) if !unit_type.is_empty() => entries.push(TaskForceEntry {
                    count,
                    unit_type: unit_type.to_string(),
                }),
                _ => cx.warn(id, &key, "expected COUNT,TYPE"),
            }
        }
        let task_force = TaskForce {
            id: id.to_string(),
            name: section.get_or("Name", "New task force").to_string(),
            group: section.get_parsed("Group").unwrap_or(-1),
            entries,
        };
        let handle = map.add_task_force(task_force);
        cx.task_forces.insert(id.to_string(), handle);
    }
}

pub(super) fn load_scripts(cx: &mut LoadContext, map: &mut Map) {
    for (id, section) in listed_sections(cx, "ScriptTypes") {
        if cx.scripts.contains_key(id) {
            cx.warn("ScriptTypes", id, "listed twice");
            continue;
        }
        let mut actions = Vec::new();
        for slot in 0..MAX_SCRIPT_ACTIONS {
            let key = slot.to_string();
            let Some(value) = section.get(&key) else {
                continue;
            };
            let row = Row::split(value, 2);
            match row.as_ref().and_then(|r| Some((r.num(0)?, r.num(1)?))) {
                Some((action, argument)) => actions.push(ScriptAction { action, argument }),
                None => cx.warn(id, &key, "expected ACTION,ARGUMENT"),
            }
        }
        let script = Script {
            id: id.to_string(),
            name: section.get_or("Name", "New script").to_string(),
            actions,
        };
        let handle = map.add_script(script);
        cx.scripts.insert(id.to_string(), handle);
    }
}

/// Team types carry references to a house, script, task force and tag. An
/// unresolved house keeps its text so it is written back; the others are dropped.
pub(super) fn load_team_types(cx: &mut LoadContext, map: &mut Map) {
    for (id, section) in listed_sections(cx, "TeamTypes") {
        if cx.team_types.contains_key(id) {
            cx.warn("TeamTypes", id, "listed twice");
            continue;
        }
        let mut team = TeamType::new(id);
        for key in read_fields(&mut team, Some(section), TEAM_TYPE_FIELDS) {
            cx.warn(id, key, "unreadable value, using the default");
        }

        if let Some(house) = section.get("House").filter(|h| is_reference(h)) {
            team.house_name = house.to_string();
            team.house = map.find_house(house);
            if team.house.is_none() {
                cx.warn(id, "House", format!("unknown house {house:?}"));
            }
        }
        if let Some(script) = section.get("Script").filter(|s| is_reference(s)) {
            team.script = cx.scripts.get(script).copied();
            if team.script.is_none() {
                cx.warn(id, "Script", format!("unknown script {script:?}"));
            }
        }
        if let Some(task_force) = section.get("TaskForce").filter(|t| is_reference(t)) {
            team.task_force = cx.task_forces.get(task_force).copied();
            if team.task_force.is_none() {
                cx.warn(id, "TaskForce", format!("unknown task force {task_force:?}"));
            }
        }
        if let Some(tag) = section.get("Tag") {
            team.tag = cx.tag(id, "Tag", tag);
        }

        let handle = map.add_team_type(team);
        cx.team_types.insert(id.to_string(), handle);
    }
}

fn team_reference(cx: &mut LoadContext, key: &str, value: &str) -> Option<TeamTypeId> {
    if !is_reference(value) {
        return None;
    }
    let found = cx.team_types.get(value).copied();
    if found.is_none() {
        cx.warn("AITriggerTypes", key, format!("unknown team type {value:?}"));
    }
    found
}

/// `ID,NAME,TEAM,OWNER,TECHLEVEL,CONDITION,OBJECT,COMPARATOR,WEIGHT,MIN,MAX,
/// SKIRMISH,0,SIDE,BASEDEFENSE,TEAM2,EASY,MEDIUM,HARD` under positional keys.
pub(super) fn load_ai_triggers(cx: &mut LoadContext, map: &mut Map) {
    const SECTION: &str = "AITriggerTypes";
    let Some(list) = cx.ini.section(SECTION) else {
        return;
    };
    for (key, value) in list.iter() {
        let Some(row) = Row::split(value, 19) else {
            cx.warn(SECTION, key, "expected 19 fields");
            continue;
        };
        let id = row.str(0);
        if id.is_empty() {
            cx.warn(SECTION, key, "missing id");
            continue;
        }
        let (Some(tech_level), Some(condition_type), Some(side)) = (row.num(4), row.num(5), row.num(13)) else {
            cx.warn(SECTION, key, "malformed numeric field");
            continue;
        };
        let weight = |i: usize| row.num::<f64>(i).unwrap_or(0.0);
        let trigger = AiTriggerType {
            id: id.to_string(),
            name: row.str(1).to_string(),
            team_type: team_reference(cx, key, row.str(2)),
            owner: row.str(3).to_string(),
            tech_level,
            condition_type,
            comparison_object: row.str(6).to_string(),
            comparator: row.str(7).to_string(),
            initial_weight: weight(8),
            min_weight: weight(9),
            max_weight: weight(10),
            skirmish: row.flag(11),
            side,
            base_defense: row.flag(14),
            second_team_type: team_reference(cx, key, row.str(15)),
            easy: row.flag(16),
            medium: row.flag(17),
            hard: row.flag(18),
        };
        map.add_ai_trigger(trigger);
    }
}
