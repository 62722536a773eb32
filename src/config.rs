//! Editor settings persisted as JSON.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::edit::{CliffLimits, CliffOptions, CliffSide};
use crate::error::Result;
use crate::theater::Rules;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Rules JSON loaded when the CLI is not given `--rules`
    pub rules_path: Option<PathBuf>,
    /// Theater JSON loaded when the CLI is not given `--theater`
    pub theater_path: Option<PathBuf>,
    /// Overrides the ruleset's house keying when set
    pub country_indexed_houses: Option<bool>,
    pub max_height_level: Option<u8>,
    pub cliff: CliffLimits,
    /// Cliff and terrain painting leave non-clear cells alone
    pub paint_clear_ground_only: bool,
}

/// `<config dir>/isomap/config.json`, or `config.json` in the working directory
/// when the platform has no config dir.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|p| p.join("isomap").join("config.json"))
        .unwrap_or_else(|| PathBuf::from("config.json"))
}

impl EditorConfig {
    /// Read `path`. A missing file gives the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Apply the rule overrides to a loaded ruleset.
    pub fn apply_to_rules(&self, rules: &mut Rules) {
        if let Some(indexed) = self.country_indexed_houses {
            rules.country_indexed_houses = indexed;
        }
        if let Some(level) = self.max_height_level {
            rules.max_height_level = level;
        }
    }

    pub fn cliff_options(&self, side: CliffSide) -> CliffOptions {
        CliffOptions {
            side,
            clear_ground_only: self.paint_clear_ground_only,
            limits: self.cliff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EditorConfig::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.cliff.max_idle_expansions, 500);
    }

    #[test]
    fn test_partial_file_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"max_height_level": 8, "cliff": {"max_expansions": 50}}"#).unwrap();
        let config = EditorConfig::load(&path).unwrap();
        assert_eq!(config.cliff.max_expansions, 50);
        assert_eq!(config.cliff.close_enough, 1.0);

        let mut rules = Rules::default();
        config.apply_to_rules(&mut rules);
        assert_eq!(rules.max_height_level, 8);
        assert!(!rules.country_indexed_houses);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = EditorConfig {
            paint_clear_ground_only: true,
            country_indexed_houses: Some(true),
            ..EditorConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(EditorConfig::load(&path).unwrap(), config);
        assert!(config.cliff_options(CliffSide::Back).clear_ground_only);
    }

    #[test]
    fn test_default_path_file_name() {
        assert!(default_path().ends_with("config.json"));
    }
}
