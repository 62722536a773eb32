//! Non-fatal problems found while loading or saving a map.

use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Warning,
    /// The map is usable but something had to be discarded or reset that a
    /// user would want to know about before saving over the original
    Severe,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub section: String,
    pub key: Option<String>,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.key {
            Some(key) => write!(f, "[{}] {}: {}", self.section, key, self.message),
            None => write!(f, "[{}] {}", self.section, self.message),
        }
    }
}

/// Collector threaded through one load or save call
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        warn!(
            section = %diagnostic.section,
            key = diagnostic.key.as_deref().unwrap_or(""),
            severity = ?diagnostic.severity,
            "{}",
            diagnostic.message
        );
        self.entries.push(diagnostic);
    }

    pub fn warn(&mut self, section: &str, key: Option<&str>, message: impl Into<String>) {
        self.push(Diagnostic {
            severity: Severity::Warning,
            section: section.to_string(),
            key: key.map(str::to_string),
            message: message.into(),
        });
    }

    pub fn severe(&mut self, section: &str, key: Option<&str>, message: impl Into<String>) {
        self.push(Diagnostic {
            severity: Severity::Severe,
            section: section.to_string(),
            key: key.map(str::to_string),
            message: message.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn in_section<'a>(&'a self, section: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.entries.iter().filter(move |d| d.section == section)
    }

    pub fn has_severe(&self) -> bool {
        self.entries.iter().any(|d| d.severity == Severity::Severe)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
