//! Advisory consistency checks. Nothing here blocks a save; the results are
//! shown to the user so they can decide whether to fix the map.

use ahash::AHashMap;
use serde::Serialize;

use crate::state::trigger::ACTION_ENABLE_TRIGGER;
use crate::state::{HouseOrigin, Map};
use crate::theater::Rules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IssueKind {
    /// Trigger links to itself
    SelfLinkedTrigger,
    /// Trigger has an action that enables the trigger itself
    SelfEnablingTrigger,
    /// Two written houses resolve to the same country index
    DuplicateCountryIndex,
    /// Team type or AI trigger points at something that no longer exists
    DanglingReference,
    /// Tag has no trigger to fire
    TagWithoutTrigger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    /// Id or name of the offending entity
    pub subject: String,
    pub message: String,
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

fn issue(kind: IssueKind, subject: &str, message: impl Into<String>) -> Issue {
    Issue {
        kind,
        subject: subject.to_string(),
        message: message.into(),
    }
}

fn check_triggers(map: &Map, issues: &mut Vec<Issue>) {
    for (id, trigger) in map.triggers().iter() {
        if trigger.linked == Some(id) {
            issues.push(issue(IssueKind::SelfLinkedTrigger, &trigger.id, "trigger is linked to itself"));
        }
        let enables_self = trigger
            .actions
            .iter()
            .any(|a| a.kind == ACTION_ENABLE_TRIGGER && a.params.iter().any(|p| p.trim() == trigger.id));
        if enables_self {
            issues.push(issue(
                IssueKind::SelfEnablingTrigger,
                &trigger.id,
                "trigger has an action that enables itself",
            ));
        }
    }
}

fn check_tags(map: &Map, issues: &mut Vec<Issue>) {
    for tag in map.tags().values() {
        if !tag.trigger.is_some_and(|id| map.triggers().contains(id)) {
            issues.push(issue(IssueKind::TagWithoutTrigger, &tag.id, "tag has no trigger"));
        }
    }
}

fn check_country_indices(map: &Map, rules: &Rules, issues: &mut Vec<Issue>) {
    if !rules.country_indexed_houses {
        return;
    }
    let mut claimed: AHashMap<usize, &str> = AHashMap::new();
    for house in map.houses().values().filter(|h| h.origin == HouseOrigin::Map) {
        let Some(index) = rules.country_index(&house.country) else {
            continue;
        };
        if let Some(first) = claimed.insert(index, &house.name) {
            issues.push(issue(
                IssueKind::DuplicateCountryIndex,
                &house.name,
                format!("country index {} already used by {}", index, first),
            ));
        }
    }
}

fn check_team_references(map: &Map, issues: &mut Vec<Issue>) {
    for team in map.team_types().values() {
        let mut dangling = Vec::new();
        if team.house.map_or(!team.house_name.is_empty(), |id| map.house(id).is_none()) {
            dangling.push("house");
        }
        if team.script.is_some_and(|id| !map.scripts().contains(id)) {
            dangling.push("script");
        }
        if team.task_force.is_some_and(|id| !map.task_forces().contains(id)) {
            dangling.push("task force");
        }
        if team.tag.is_some_and(|id| !map.tags().contains(id)) {
            dangling.push("tag");
        }
        if !dangling.is_empty() {
            issues.push(issue(
                IssueKind::DanglingReference,
                &team.id,
                format!("team type refers to a missing {}", dangling.join(", ")),
            ));
        }
    }

    for trigger in map.ai_triggers().values() {
        let missing = [trigger.team_type, trigger.second_team_type]
            .into_iter()
            .flatten()
            .any(|id| !map.team_types().contains(id));
        if missing {
            issues.push(issue(
                IssueKind::DanglingReference,
                &trigger.id,
                "AI trigger refers to a missing team type",
            ));
        }
    }
}

/// Run every check. Issues come out grouped by check, in entity order.
pub fn check_map(map: &Map, rules: &Rules) -> Vec<Issue> {
    let mut issues = Vec::new();
    check_triggers(map, &mut issues);
    check_tags(map, &mut issues);
    check_country_indices(map, rules, &mut issues);
    check_team_references(map, &mut issues);
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::trigger::ACTION_PARAMS;
    use crate::state::{Action, House, MapSize, Tag, TagRepeat, TeamType, Trigger};
    use crate::theater::rules::Country;

    fn test_map(rules: &Rules) -> Map {
        Map::new(MapSize { width: 10, height: 10 }, "TEMPERATE", rules)
    }

    fn kinds(issues: &[Issue]) -> Vec<IssueKind> {
        issues.iter().map(|i| i.kind).collect()
    }

    #[test]
    fn test_clean_map_has_no_issues() {
        let rules = Rules::default();
        assert!(check_map(&test_map(&rules), &rules).is_empty());
    }

    #[test]
    fn test_self_linked_and_self_enabling() {
        let rules = Rules::default();
        let mut map = test_map(&rules);
        let id = map.add_trigger(Trigger::new("01000000", "loop", "Neutral"));
        let trigger = map.trigger_mut(id).unwrap();
        trigger.linked = Some(id);
        let mut params: [String; ACTION_PARAMS] = Default::default();
        params[1] = "01000000".into();
        trigger.actions.push(Action {
            kind: ACTION_ENABLE_TRIGGER,
            params,
        });

        let issues = check_map(&map, &rules);
        assert_eq!(
            kinds(&issues),
            vec![IssueKind::SelfLinkedTrigger, IssueKind::SelfEnablingTrigger]
        );
        assert_eq!(issues[0].subject, "01000000");
    }

    #[test]
    fn test_tag_without_trigger() {
        let rules = Rules::default();
        let mut map = test_map(&rules);
        map.add_tag(Tag {
            id: "01000001".into(),
            name: "orphan".into(),
            repeat: TagRepeat::OnceAny,
            trigger: None,
        });
        assert_eq!(kinds(&check_map(&map, &rules)), vec![IssueKind::TagWithoutTrigger]);
    }

    #[test]
    fn test_duplicate_country_index() {
        let rules = Rules {
            countries: vec![Country {
                name: "Americans".into(),
                color: 0,
                side: "Allied".into(),
            }],
            country_indexed_houses: true,
            ..Rules::default()
        };
        let mut map = test_map(&Rules::default());
        for name in ["Player A", "Player B"] {
            let mut house = House::new(name, HouseOrigin::Map);
            house.country = "Americans".into();
            map.define_house(house);
        }
        let issues = check_map(&map, &rules);
        assert_eq!(kinds(&issues), vec![IssueKind::DuplicateCountryIndex]);
        assert_eq!(issues[0].subject, "Player B");
    }

    #[test]
    fn test_dangling_team_house() {
        let rules = Rules::default();
        let mut map = test_map(&rules);
        let mut team = TeamType::new("01000002");
        team.house_name = "Nobody".into();
        map.add_team_type(team);
        let issues = check_map(&map, &rules);
        assert_eq!(kinds(&issues), vec![IssueKind::DanglingReference]);
        assert!(issues[0].message.contains("house"));
    }
}
