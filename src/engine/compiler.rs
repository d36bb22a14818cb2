//! Rule compilation.
//!
//! Turns flat rule lines into a [`Matcher`]: engine settings, a character map
//! and a prefix tree of token patterns.
//!
//! ```text
//! rule lines ── parse_lines (lines.rs)
//!                  │
//!                  ├─ set  ──> settings          (conflicts: warning, dropped)
//!                  ├─ c    ──> closure ──> char_map
//!                  ├─ r    ──> closure ──> trie leaf: replacement
//!                  └─ s    ──────────────> trie leaf: split sides
//! ```
//!
//! Compilation happens in two phases. [`Plan::build`] does everything that can
//! fail (parsing, validation, closure resolution) without touching the
//! matcher; `Matcher::apply` then grafts the plan in. A failed compile or
//! update therefore leaves the matcher exactly as it was.
//!
//! Patterns and replacement texts are case-folded unless the `cs` setting is
//! on, then mapped through the character map, so the trie holds exactly the
//! characters the scanner will look up.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::closure::resolve_terminals;
use super::lines::{Action, RuleLine, parse_lines};
use super::text::{fold_char, fold_str};
use super::trie::Trie;
use crate::error::{CompileWarning, Result};
use crate::model::{RuleKind, Sides};

/// Engine settings carried by `set` lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// `cs`: match case-sensitively.
    pub case_sensitive: bool,
    /// `bypass`: scans return their input untouched.
    pub bypass: bool,
}

/// A compiled rule set, ready to scan with.
///
/// Immutable except through [`Matcher::update`]; scans only need `&Matcher`
/// and can run concurrently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Matcher {
    settings: Settings,
    char_map: FxHashMap<char, char>,
    trie: Trie,
    #[serde(skip)]
    warnings: Vec<CompileWarning>,
}

impl PartialEq for Matcher {
    fn eq(&self, other: &Self) -> bool {
        self.settings == other.settings && self.char_map == other.char_map && self.trie == other.trie
    }
}

impl Matcher {
    /// Compile rule lines into a fresh matcher.
    pub fn compile(rule_lines: &str) -> Result<Matcher> {
        let mut matcher = Matcher::default();
        matcher.update(rule_lines)?;
        Ok(matcher)
    }

    /// Graft more rule lines onto this matcher.
    ///
    /// Settings are merged, the character map is extended and leaves are added
    /// or overwritten; existing paths stay. Replacement chains are resolved
    /// among the new lines only and are not collapsed across updates: with
    /// `r def abc` compiled and `r ghi def` added later, `abc` still yields
    /// `def` and only `def` yields `ghi`.
    pub fn update(&mut self, rule_lines: &str) -> Result<()> {
        let lines = parse_lines(rule_lines)?;
        let plan = Plan::build(&lines, self.settings)?;
        self.apply(plan);
        Ok(())
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Non-fatal findings from every compile and update so far.
    pub fn warnings(&self) -> &[CompileWarning] {
        &self.warnings
    }

    /// Number of trie nodes, root included.
    pub fn node_count(&self) -> usize {
        self.trie.len()
    }

    /// Number of trie nodes carrying at least one marker.
    pub fn pattern_count(&self) -> usize {
        self.trie.leaf_count()
    }

    #[inline]
    pub(crate) fn map_char(&self, c: char) -> char {
        self.char_map.get(&c).copied().unwrap_or(c)
    }

    pub(crate) fn trie(&self) -> &Trie {
        &self.trie
    }

    fn apply(&mut self, plan: Plan) {
        self.settings = plan.settings;
        self.char_map.extend(plan.char_map);

        let tokens = plan.tokens.len();
        for (pattern, target) in plan.tokens {
            let path: Vec<char> = pattern.chars().map(|c| self.map_char(c)).collect();
            let target: String = target.chars().map(|c| self.map_char(c)).collect();
            self.trie.insert(path).replacement = Some(target);
        }

        let splits = plan.splits.len();
        for (pattern, sides) in plan.splits {
            let path: Vec<char> = pattern.chars().map(|c| self.map_char(c)).collect();
            self.trie.insert(path).splits |= sides;
        }

        self.warnings.extend(plan.warnings);

        debug!(
            case_sensitive = self.settings.case_sensitive,
            bypass = self.settings.bypass,
            chars = self.char_map.len(),
            tokens,
            splits,
            nodes = self.trie.len(),
            "compiled rule lines"
        );
    }
}

/// Everything a compile step will change, validated up front.
struct Plan {
    settings: Settings,
    warnings: Vec<CompileWarning>,
    char_map: Vec<(char, char)>,
    tokens: BTreeMap<String, String>,
    splits: Vec<(String, Sides)>,
}

impl Plan {
    fn build(lines: &[RuleLine<'_>], current: Settings) -> Result<Plan> {
        let (settings, warnings) = merge_settings(lines, current);
        let cs = settings.case_sensitive;

        let mut char_edges: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut token_edges: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut splits = Vec::new();

        for line in lines {
            let Action::Rule(kind) = line.action else {
                continue;
            };
            match kind {
                RuleKind::ReplaceCharacter => {
                    let (Some(target), Some(pattern)) = (single_char(line.key), single_char(line.value)) else {
                        return Err(line.invalid("character rules take exactly one character on each side"));
                    };
                    char_edges
                        .entry(fold_char(pattern, cs).to_string())
                        .or_default()
                        .insert(fold_char(target, cs).to_string());
                }
                RuleKind::ReplaceToken => {
                    if line.value.is_empty() {
                        return Err(line.invalid("token rules need a non-empty pattern"));
                    }
                    token_edges.entry(fold_str(line.value, cs)).or_default().insert(fold_str(line.key, cs));
                }
                RuleKind::Split => {
                    let sides = Sides::from_letters(line.key)
                        .ok_or_else(|| line.invalid("split sides must be a non-empty combination of l, m, r"))?;
                    if line.value.is_empty() {
                        return Err(line.invalid("split rules need a non-empty pattern"));
                    }
                    splits.push((fold_str(line.value, cs), sides));
                }
            }
        }

        let char_map = resolve_terminals(&char_edges)?
            .into_iter()
            .filter_map(|(pattern, target)| Some((single_char(&pattern)?, single_char(&target)?)))
            .collect();
        let tokens = resolve_terminals(&token_edges)?;

        Ok(Plan { settings, warnings, char_map, tokens, splits })
    }
}

fn merge_settings(lines: &[RuleLine<'_>], current: Settings) -> (Settings, Vec<CompileWarning>) {
    let mut values: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for line in lines.iter().filter(|line| line.action == Action::Set) {
        values.entry(line.key).or_default().insert(line.value);
    }

    let mut settings = current;
    let mut warnings = Vec::new();
    for (name, candidates) in values {
        let mut iter = candidates.iter();
        let value = match (iter.next(), iter.next()) {
            (Some(&value), None) => value,
            _ => {
                warn!(setting = name, values = ?candidates, "multiple values for setting; ignoring it");
                warnings.push(CompileWarning::SettingConflict {
                    setting: name.to_string(),
                    values: candidates.iter().map(|v| v.to_string()).collect(),
                });
                continue;
            }
        };

        match name {
            "cs" => settings.case_sensitive = value == "1",
            "bypass" => settings.bypass = value == "1",
            other => warn!(setting = other, "unknown setting ignored"),
        }
    }

    (settings, warnings)
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    let c = chars.next()?;
    if chars.next().is_some() { None } else { Some(c) }
}
