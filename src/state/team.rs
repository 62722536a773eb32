use crate::codec::fields::{bool_text, set_bool, set_parsed, set_string, Field};
use crate::state::{HouseId, ScriptId, TagId, TaskForceId, TeamTypeId};

/// Most member lines in a task force.
pub const MAX_TASK_FORCE_ENTRIES: usize = 6;
/// Most actions in a script.
pub const MAX_SCRIPT_ACTIONS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForceEntry {
    pub count: u32,
    pub unit_type: String,
}

/// Group composition used by team types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForce {
    pub id: String,
    pub name: String,
    pub group: i32,
    pub entries: Vec<TaskForceEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptAction {
    pub action: i32,
    pub argument: i32,
}

/// Ordered AI instructions used by team types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub id: String,
    pub name: String,
    pub actions: Vec<ScriptAction>,
}

/// AI team definition
#[derive(Debug, Clone, PartialEq)]
pub struct TeamType {
    pub id: String,
    pub name: String,
    pub house: Option<HouseId>,
    pub script: Option<ScriptId>,
    pub task_force: Option<TaskForceId>,
    pub tag: Option<TagId>,
    /// Unresolved reference text, kept so an unknown house can be written back
    pub house_name: String,
    pub max: i32,
    pub priority: i32,
    pub tech_level: i32,
    pub veteran_level: i32,
    pub group: i32,
    pub waypoint: String,
    pub full: bool,
    pub whiner: bool,
    pub droppod: bool,
    pub suicide: bool,
    pub loadable: bool,
    pub prebuild: bool,
    pub annoyance: bool,
    pub recruiter: bool,
    pub reinforce: bool,
    pub aggressive: bool,
    pub autocreate: bool,
    pub guard_slower: bool,
    pub on_trans_only: bool,
    pub avoid_threats: bool,
    pub loose_recruit: bool,
    pub is_base_defense: bool,
    pub only_target_house_enemy: bool,
}

impl TeamType {
    pub fn new(id: impl Into<String>) -> Self {
        let mut team = Self {
            id: id.into(),
            name: String::new(),
            house: None,
            script: None,
            task_force: None,
            tag: None,
            house_name: String::new(),
            max: 0,
            priority: 0,
            tech_level: 0,
            veteran_level: 0,
            group: 0,
            waypoint: String::new(),
            full: false,
            whiner: false,
            droppod: false,
            suicide: false,
            loadable: false,
            prebuild: false,
            annoyance: false,
            recruiter: false,
            reinforce: false,
            aggressive: false,
            autocreate: false,
            guard_slower: false,
            on_trans_only: false,
            avoid_threats: false,
            loose_recruit: false,
            is_base_defense: false,
            only_target_house_enemy: false,
        };
        crate::codec::fields::read_fields(&mut team, None, TEAM_TYPE_FIELDS);
        team
    }
}

macro_rules! flag_field {
    ($key:literal, $field:ident, $default:literal) => {
        Field {
            key: $key,
            read: |t, v| set_bool(&mut t.$field, v),
            write: |t| bool_text(t.$field),
            default: $default,
        }
    };
}

macro_rules! int_field {
    ($key:literal, $field:ident, $default:literal) => {
        Field {
            key: $key,
            read: |t, v| set_parsed(&mut t.$field, v),
            write: |t| t.$field.to_string(),
            default: $default,
        }
    };
}

/// Plain keys of a team type section. `House`, `Script`, `TaskForce` and `Tag`
/// are references and handled by the loader and saver.
pub const TEAM_TYPE_FIELDS: &[Field<TeamType>] = &[
    Field {
        key: "Name",
        read: |t, v| set_string(&mut t.name, v),
        write: |t| t.name.clone(),
        default: "New Team",
    },
    int_field!("Max", max, "5"),
    int_field!("Priority", priority, "5"),
    int_field!("TechLevel", tech_level, "0"),
    int_field!("VeteranLevel", veteran_level, "1"),
    int_field!("Group", group, "-1"),
    Field {
        key: "Waypoint",
        read: |t, v| set_string(&mut t.waypoint, v),
        write: |t| t.waypoint.clone(),
        default: "A",
    },
    flag_field!("Full", full, "no"),
    flag_field!("Whiner", whiner, "no"),
    flag_field!("Droppod", droppod, "no"),
    flag_field!("Suicide", suicide, "no"),
    flag_field!("Loadable", loadable, "no"),
    flag_field!("Prebuild", prebuild, "no"),
    flag_field!("Annoyance", annoyance, "no"),
    flag_field!("Recruiter", recruiter, "no"),
    flag_field!("Reinforce", reinforce, "no"),
    flag_field!("Aggressive", aggressive, "no"),
    flag_field!("Autocreate", autocreate, "no"),
    flag_field!("GuardSlower", guard_slower, "no"),
    flag_field!("OnTransOnly", on_trans_only, "no"),
    flag_field!("AvoidThreats", avoid_threats, "no"),
    flag_field!("LooseRecruit", loose_recruit, "no"),
    flag_field!("IsBaseDefense", is_base_defense, "no"),
    flag_field!("OnlyTargetHouseEnemy", only_target_house_enemy, "no"),
];

/// Trigger that makes the AI build a team when its condition holds
#[derive(Debug, Clone, PartialEq)]
pub struct AiTriggerType {
    pub id: String,
    pub name: String,
    pub team_type: Option<TeamTypeId>,
    pub owner: String,
    pub tech_level: i32,
    pub condition_type: i32,
    pub comparison_object: String,
    pub comparator: String,
    pub initial_weight: f64,
    pub min_weight: f64,
    pub max_weight: f64,
    pub skirmish: bool,
    pub side: i32,
    pub base_defense: bool,
    pub second_team_type: Option<TeamTypeId>,
    pub easy: bool,
    pub medium: bool,
    pub hard: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_type_defaults() {
        let team = TeamType::new("01000003");
        assert_eq!(team.name, "New Team");
        assert_eq!(team.max, 5);
        assert_eq!(team.group, -1);
        assert_eq!(team.waypoint, "A");
        assert!(!team.full);
    }
}
