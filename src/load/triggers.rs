use crate::load::{LoadContext, Row, NONE_LINK, NONE_REF};
use crate::state::trigger::{ACTION_PARAMS, CONDITION_PARAMS};
use crate::state::{Action, Condition, Map, Tag, TagRepeat, Trigger};

const TRIGGERS: &str = "Triggers";
const EVENTS: &str = "Events";
const ACTIONS: &str = "Actions";
const TAGS: &str = "Tags";

/// Split `COUNT,(KIND,P...)*` into `count` groups of `1 + params` fields.
fn grouped<'a>(value: &'a str, params: usize) -> Option<Vec<Vec<&'a str>>> {
    let fields: Vec<&str> = value.split(',').map(str::trim).collect();
    let (count, rest) = fields.split_first()?;
    let count: usize = count.parse().ok()?;
    let width = 1 + params;
    if rest.len() < count * width {
        return None;
    }
    Some(rest.chunks(width).take(count).map(<[&str]>::to_vec).collect())
}

fn parse_conditions(value: &str) -> Option<Vec<Condition>> {
    grouped(value, CONDITION_PARAMS)?
        .into_iter()
        .map(|g| {
            Some(Condition {
                kind: g[0].parse().ok()?,
                params: std::array::from_fn(|i| g[1 + i].to_string()),
            })
        })
        .collect()
}

fn parse_actions(value: &str) -> Option<Vec<Action>> {
    grouped(value, ACTION_PARAMS)?
        .into_iter()
        .map(|g| {
            Some(Action {
                kind: g[0].parse().ok()?,
                params: std::array::from_fn(|i| g[1 + i].to_string()),
            })
        })
        .collect()
}

/// Triggers plus their `[Events]` and `[Actions]` rows. Links may point forward
/// in the section, so they are resolved once every trigger exists.
pub(super) fn load_triggers(cx: &mut LoadContext, map: &mut Map) {
    let ini = cx.ini;
    let Some(list) = ini.section(TRIGGERS) else {
        return;
    };

    let mut links = Vec::new();
    for (key, value) in list.iter() {
        let Some(row) = Row::split(value, 8) else {
            cx.warn(TRIGGERS, key, "expected HOUSE,LINKED,NAME,DISABLED,EASY,MEDIUM,HARD,0");
            continue;
        };
        if cx.triggers.contains_key(key) {
            cx.warn(TRIGGERS, key, "duplicate trigger id, keeping the first");
            continue;
        }

        let mut trigger = Trigger::new(key, row.str(2), row.str(0));
        trigger.disabled = row.flag(3);
        trigger.easy = row.flag(4);
        trigger.medium = row.flag(5);
        trigger.hard = row.flag(6);

        if let Some(events) = ini.get(EVENTS, key) {
            match parse_conditions(events) {
                Some(conditions) => trigger.conditions = conditions,
                None => cx.warn(EVENTS, key, "malformed event list, trigger has no events"),
            }
        }
        if let Some(actions) = ini.get(ACTIONS, key) {
            match parse_actions(actions) {
                Some(actions) => trigger.actions = actions,
                None => cx.warn(ACTIONS, key, "malformed action list, trigger has no actions"),
            }
        }

        let linked = row.str(1);
        if !linked.is_empty() && linked != NONE_LINK && linked != NONE_REF {
            links.push((key, linked));
        }
        let id = map.add_trigger(trigger);
        cx.triggers.insert(key.to_string(), id);
    }

    for (key, linked) in links {
        let target = cx.triggers.get(linked).copied();
        if target.is_none() {
            cx.warn(TRIGGERS, key, format!("linked trigger {linked:?} does not exist"));
            continue;
        }
        if let Some(trigger) = cx.triggers.get(key).copied().and_then(|id| map.trigger_mut(id)) {
            trigger.linked = target;
        }
    }
    tracing::debug!(triggers = cx.triggers.len(), "triggers loaded");
}

pub(super) fn load_tags(cx: &mut LoadContext, map: &mut Map) {
    let Some(list) = cx.ini.section(TAGS) else {
        return;
    };
    for (key, value) in list.iter() {
        let Some(row) = Row::split(value, 3) else {
            cx.warn(TAGS, key, "expected REPEAT,NAME,TRIGGER");
            continue;
        };
        let repeat = match row.num::<u8>(0).and_then(TagRepeat::from_u8) {
            Some(repeat) => repeat,
            None => {
                cx.warn(TAGS, key, format!("unknown repeat type {:?}, using 0", row.str(0)));
                TagRepeat::default()
            }
        };
        let trigger_id = row.str(2);
        let trigger = cx.triggers.get(trigger_id).copied();
        if trigger.is_none() {
            cx.warn(TAGS, key, format!("tag fires unknown trigger {trigger_id:?}"));
        }
        let id = map.add_tag(Tag {
            id: key.to_string(),
            name: row.str(1).to_string(),
            repeat,
            trigger,
        });
        cx.tags.insert(key.to_string(), id);
    }
}
