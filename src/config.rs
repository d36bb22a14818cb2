//! JSON rule configuration.
//!
//! A config file declares rules in a readable form and may import other config
//! files:
//!
//! ```json
//! {
//!   "name": "biomedical",
//!   "import": ["greek.json"],
//!   "settings": { "cs": "0" },
//!   "split": [{ "where": "lmr", "value": "kappa" }],
//!   "token": [{ "to": "spelling", "from": "speling" }],
//!   "character": [{ "to": "t", "from": "f" }]
//! }
//! ```
//!
//! Imports are resolved relative to the importing file and merged before the
//! file's own entries. Entries from every file are unioned, so a setting given
//! different values in two files reaches the compiler with both values and is
//! reported as a conflict there.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::Matcher;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleConfig {
    pub name: Option<String>,
    /// Paths relative to this file.
    pub import: Vec<PathBuf>,
    pub settings: BTreeMap<String, String>,
    pub split: Vec<SplitEntry>,
    pub token: Vec<ReplaceEntry>,
    pub character: Vec<ReplaceEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplitEntry {
    /// Side letters, e.g. `"lmr"`.
    #[serde(rename = "where")]
    pub sides: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplaceEntry {
    pub to: String,
    pub from: String,
}

/// A config file flattened, imports included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedRules {
    pub name: String,
    pub rule_lines: String,
}

impl LoadedRules {
    pub fn compile(&self) -> Result<Matcher> {
        Matcher::compile(&self.rule_lines)
    }
}

impl FromStr for RuleConfig {
    type Err = Error;

    /// Parse one document. Imports are not followed.
    fn from_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

impl RuleConfig {
    /// Load `path` and everything it imports.
    pub fn load(path: impl AsRef<Path>) -> Result<LoadedRules> {
        let path = path.as_ref();
        let mut entries = Entries::default();
        let mut stack = Vec::new();
        let root = entries.merge_file(path, &mut stack)?;

        Ok(LoadedRules {
            name: root.name.unwrap_or_else(|| path.display().to_string()),
            rule_lines: entries.to_rule_lines(),
        })
    }

    /// Rule lines for this document's own entries.
    pub fn to_rule_lines(&self) -> Result<String> {
        let mut entries = Entries::default();
        entries.merge(self)?;
        Ok(entries.to_rule_lines())
    }
}

/// action -> key -> values, unioned across files.
#[derive(Debug, Default)]
struct Entries {
    settings: BTreeMap<String, BTreeSet<String>>,
    split: BTreeMap<String, BTreeSet<String>>,
    token: BTreeMap<String, BTreeSet<String>>,
    character: BTreeMap<String, BTreeSet<String>>,
}

impl Entries {
    fn merge_file(&mut self, path: &Path, stack: &mut Vec<PathBuf>) -> Result<RuleConfig> {
        let canonical = fs::canonicalize(path)?;
        if stack.contains(&canonical) {
            return Err(Error::ImportCycle { path: path.to_path_buf() });
        }

        let config: RuleConfig = fs::read_to_string(path)?.parse()?;

        stack.push(canonical);
        let base = path.parent().unwrap_or(Path::new(""));
        for import in &config.import {
            self.merge_file(&base.join(import), stack)?;
        }
        stack.pop();

        self.merge(&config)?;
        debug!(path = %path.display(), imports = config.import.len(), "merged rule config");
        Ok(config)
    }

    fn merge(&mut self, config: &RuleConfig) -> Result<()> {
        for (name, value) in &config.settings {
            add(&mut self.settings, "set", name, value)?;
        }
        for entry in &config.split {
            add(&mut self.split, "s", &entry.sides, &entry.value)?;
        }
        for entry in &config.token {
            add(&mut self.token, "r", &entry.to, &entry.from)?;
        }
        for entry in &config.character {
            add(&mut self.character, "c", &entry.to, &entry.from)?;
        }
        Ok(())
    }

    fn to_rule_lines(&self) -> String {
        let mut out = String::new();
        for (action, keys) in [("set", &self.settings), ("s", &self.split), ("r", &self.token), ("c", &self.character)]
        {
            for (key, values) in keys {
                for value in values {
                    out.push_str(&format!("{action}\t{key}\t{value}\n"));
                }
            }
        }
        out
    }
}

fn add(bucket: &mut BTreeMap<String, BTreeSet<String>>, action: &str, key: &str, value: &str) -> Result<()> {
    if [key, value].iter().any(|column| column.contains(['\t', '\n', '\r'])) {
        return Err(Error::InvalidRule {
            line: format!("{action}\t{key}\t{value}"),
            reason: "config entries may not contain tabs or line breaks".to_string(),
        });
    }
    bucket.entry(key.to_string()).or_default().insert(value.to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_document() {
        let config: RuleConfig = r#"{
            "name": "demo",
            "settings": { "cs": "1" },
            "split": [{ "where": "lmr", "value": "kappa" }],
            "token": [{ "to": "spelling", "from": "speling" }],
            "character": [{ "to": "t", "from": "f" }]
        }"#
        .parse()
        .unwrap();

        assert_eq!(config.name.as_deref(), Some("demo"));
        assert_eq!(config.split[0], SplitEntry { sides: "lmr".into(), value: "kappa".into() });
        assert!(config.import.is_empty());
        assert_eq!(
            config.to_rule_lines().unwrap(),
            "set\tcs\t1\ns\tlmr\tkappa\nr\tspelling\tspeling\nc\tt\tf\n"
        );
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let config: RuleConfig = "{}".parse().unwrap();
        assert_eq!(config, RuleConfig::default());
        assert_eq!(config.to_rule_lines().unwrap(), "");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!("{\"splits\": []}".parse::<RuleConfig>(), Err(Error::Json(_))));
    }

    #[test]
    fn tabs_in_entries_are_rejected() {
        let config = RuleConfig {
            token: vec![ReplaceEntry { to: "a\tb".into(), from: "c".into() }],
            ..RuleConfig::default()
        };
        assert!(matches!(config.to_rule_lines(), Err(Error::InvalidRule { .. })));
    }

    #[test]
    fn empty_replacement_target_is_kept() {
        let config = RuleConfig {
            token: vec![ReplaceEntry { to: String::new(), from: "nothing".into() }],
            ..RuleConfig::default()
        };
        assert_eq!(config.to_rule_lines().unwrap(), "r\t\tnothing\n");
    }
}
