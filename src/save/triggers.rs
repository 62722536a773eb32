use crate::codec::IniSection;
use crate::load::{NONE_LINK, NONE_REF};
use crate::save::{row_flag, SaveContext};
use crate::state::{Map, Trigger};

fn trigger_row(map: &Map, trigger: &Trigger) -> String {
    let linked = trigger
        .linked
        .and_then(|id| map.triggers().get(id))
        .map_or(NONE_LINK, |t| t.id.as_str());
    format!(
        "{},{},{},{},{},{},{},0",
        trigger.house,
        linked,
        trigger.name,
        row_flag(trigger.disabled),
        row_flag(trigger.easy),
        row_flag(trigger.medium),
        row_flag(trigger.hard),
    )
}

/// `COUNT` followed by each entry's kind and parameters.
fn counted_list<'a, I>(entries: I) -> String
where
    I: ExactSizeIterator<Item = (i32, &'a [String])>,
{
    let mut out = entries.len().to_string();
    for (kind, params) in entries {
        out.push_str(&format!(",{kind}"));
        for param in params {
            out.push(',');
            out.push_str(param);
        }
    }
    out
}

/// `[Triggers]`, `[Events]` and `[Actions]`, all keyed by trigger id.
pub(super) fn write_triggers(cx: &mut SaveContext, map: &Map) {
    let mut triggers = IniSection::new("Triggers");
    let mut events = IniSection::new("Events");
    let mut actions = IniSection::new("Actions");
    for trigger in map.triggers().values() {
        triggers.set(trigger.id.clone(), trigger_row(map, trigger));
        events.set(
            trigger.id.clone(),
            counted_list(trigger.conditions.iter().map(|c| (c.kind, &c.params[..]))),
        );
        actions.set(
            trigger.id.clone(),
            counted_list(trigger.actions.iter().map(|a| (a.kind, &a.params[..]))),
        );
    }
    cx.emit(triggers);
    cx.emit(events);
    cx.emit(actions);
}

pub(super) fn write_tags(cx: &mut SaveContext, map: &Map) {
    let mut section = IniSection::new("Tags");
    for tag in map.tags().values() {
        let trigger = tag
            .trigger
            .and_then(|id| map.triggers().get(id))
            .map_or(NONE_REF, |t| t.id.as_str());
        section.set(tag.id.clone(), format!("{},{},{}", tag.repeat as u8, tag.name, trigger));
    }
    cx.emit(section);
}
