//! Declarative key tables for sections whose keys map one-to-one onto struct fields.

use super::ini::{parse_bool, yes_no, IniSection};

/// One key of a section: how to read it into `T`, how to write it back out,
/// and the text used when the key is absent or unparseable.
pub struct Field<T> {
    pub key: &'static str,
    pub read: fn(&mut T, &str) -> bool,
    pub write: fn(&T) -> String,
    pub default: &'static str,
}

/// Apply every field of `fields` from `section`. Returns the keys whose values
/// could not be parsed; those fields take their defaults.
pub fn read_fields<T>(target: &mut T, section: Option<&IniSection>, fields: &[Field<T>]) -> Vec<&'static str> {
    let mut rejected = Vec::new();
    for field in fields {
        let value = section.and_then(|s| s.get(field.key));
        match value {
            Some(v) if (field.read)(target, v) => {}
            Some(_) => {
                rejected.push(field.key);
                (field.read)(target, field.default);
            }
            None => {
                (field.read)(target, field.default);
            }
        }
    }
    rejected
}

/// Write every field of `fields`. Empty values are left out; they read back as the default.
pub fn write_fields<T>(source: &T, section: &mut IniSection, fields: &[Field<T>]) {
    for field in fields {
        let value = (field.write)(source);
        if !value.is_empty() {
            section.set(field.key, value);
        }
    }
}

/// Whether `key` belongs to the table.
pub fn is_known<T>(fields: &[Field<T>], key: &str) -> bool {
    fields.iter().any(|f| f.key == key)
}

pub fn set_parsed<V: std::str::FromStr>(slot: &mut V, value: &str) -> bool {
    match value.trim().parse() {
        Ok(v) => {
            *slot = v;
            true
        }
        Err(_) => false,
    }
}

pub fn set_bool(slot: &mut bool, value: &str) -> bool {
    match parse_bool(value) {
        Some(v) => {
            *slot = v;
            true
        }
        None => false,
    }
}

pub fn set_string(slot: &mut String, value: &str) -> bool {
    *slot = value.to_string();
    true
}

pub fn bool_text(value: bool) -> String {
    yes_no(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Sample {
        name: String,
        credits: i32,
        active: bool,
    }

    const SAMPLE_FIELDS: &[Field<Sample>] = &[
        Field {
            key: "Name",
            read: |s, v| set_string(&mut s.name, v),
            write: |s| s.name.clone(),
            default: "No name",
        },
        Field {
            key: "Credits",
            read: |s, v| set_parsed(&mut s.credits, v),
            write: |s| s.credits.to_string(),
            default: "0",
        },
        Field {
            key: "Active",
            read: |s, v| set_bool(&mut s.active, v),
            write: |s| bool_text(s.active),
            default: "yes",
        },
    ];

    #[test]
    fn test_defaults_and_rejections() {
        let mut section = IniSection::new("X");
        section.set("Credits", "lots");
        let mut sample = Sample::default();
        let rejected = read_fields(&mut sample, Some(&section), SAMPLE_FIELDS);
        assert_eq!(rejected, vec!["Credits"]);
        assert_eq!(sample.name, "No name");
        assert_eq!(sample.credits, 0);
        assert!(sample.active);
    }

    #[test]
    fn test_write_back() {
        let sample = Sample {
            name: "Alpha".into(),
            credits: 2500,
            active: false,
        };
        let mut section = IniSection::new("X");
        write_fields(&sample, &mut section, SAMPLE_FIELDS);
        assert_eq!(section.get("Name"), Some("Alpha"));
        assert_eq!(section.get("Credits"), Some("2500"));
        assert_eq!(section.get("Active"), Some("no"));
        assert!(is_known(SAMPLE_FIELDS, "Credits"));
        assert!(!is_known(SAMPLE_FIELDS, "Other"));
    }
}
