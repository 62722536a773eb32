//! Sectioned key/value container that every map file is stored in.
//!
//! ```text
//! ; comment
//! [Section]
//! Key=Value
//! ```
//!
//! Sections and keys keep their first-seen order so that a load/save cycle
//! rewrites untouched content in place.

use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniSection {
    name: String,
    entries: IndexMap<String, String>,
}

impl IniSection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key).map_or(default, |v| parse_bool(v).unwrap_or(default))
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        self.entries.insert(key.into(), value.to_string());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniFile {
    sections: IndexMap<String, IniSection>,
}

impl IniFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse container text. Lines that are neither headers nor `key=value`
    /// pairs are ignored, as are pairs before the first header. A repeated
    /// header continues the earlier section; a repeated key keeps the last value.
    pub fn parse(text: &str) -> Self {
        let mut file = Self::new();
        let mut current: Option<String> = None;

        for raw in text.lines() {
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }
            if let Some(rest) = line.strip_prefix('[') {
                if let Some(end) = rest.find(']') {
                    let name = rest[..end].trim().to_string();
                    file.section_or_create(&name);
                    current = Some(name);
                }
                continue;
            }
            let (Some(section), Some((key, value))) = (current.as_ref(), line.split_once('=')) else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            file.section_or_create(section).set(key, value.trim());
        }
        file
    }

    pub fn read_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::parse(&String::from_utf8_lossy(&bytes)))
    }

    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_text())?;
        Ok(())
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for section in self.sections.values() {
            out.push('[');
            out.push_str(&section.name);
            out.push_str("]\n");
            for (key, value) in section.iter() {
                out.push_str(key);
                out.push('=');
                out.push_str(value);
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }

    pub fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections.get(name)
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut IniSection> {
        self.sections.get_mut(name)
    }

    pub fn section_or_create(&mut self, name: &str) -> &mut IniSection {
        self.sections
            .entry(name.to_string())
            .or_insert_with(|| IniSection::new(name))
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    pub fn remove_section(&mut self, name: &str) -> Option<IniSection> {
        self.sections.shift_remove(name)
    }

    /// Replace a section wholesale, keeping its position if it already existed.
    pub fn put_section(&mut self, section: IniSection) {
        self.sections.insert(section.name.clone(), section);
    }

    pub fn sections(&self) -> impl Iterator<Item = &IniSection> {
        self.sections.values()
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section).and_then(|s| s.get(key))
    }

    pub fn set(&mut self, section: &str, key: impl Into<String>, value: impl ToString) {
        self.section_or_create(section).set(key, value);
    }

    /// Values of a list section (`0=A`, `1=B`, ...) in file order.
    pub fn list_values(&self, section: &str) -> Vec<String> {
        self.section(section)
            .map(|s| s.values().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(i) => &line[..i],
        None => line,
    }
}

/// `yes`/`true`/`1` and `no`/`false`/`0`, by first character.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().chars().next()?.to_ascii_lowercase() {
        'y' | 't' | '1' => Some(true),
        'n' | 'f' | '0' => Some(false),
        _ => None,
    }
}

pub fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
