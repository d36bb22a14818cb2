//! Rules and rule sets.
//!
//! A [`Rule`] is one lexical instruction. A [`RuleSet`] is the editable
//! collection that callers build up by hand (or that the standard rules are
//! declared with) and then flatten into rule lines for the compiler:
//!
//! ```text
//! RuleSet::add / remove ──> RuleSet::to_rule_lines ──> compile
//!                           "set\tcs\t0\n"
//!                           "s\tlmr\talpha\n"
//!                           "r\tgood\tbad\n"
//!                           "c\tt\tf\n"
//! ```
//!
//! The flat line is always `action<TAB>key<TAB>value`. For replacements the
//! key is the *target* and the value is the *pattern* being replaced, so a
//! line reads "replace value with key". For splits the key lists the sides.
//!
//! ## Invariants
//!
//! - A replacement pattern has at most one live target per action. Adding a
//!   new target for a known pattern retracts the old rule first.
//! - Empty pattern buckets and empty action buckets are pruned on removal.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Sides of a matched pattern on which a split applies.
    ///
    /// Spelled `l`, `m`, `r` in rule lines.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Sides: u8 {
        const LEFT   = 1 << 0;
        const MIDDLE = 1 << 1;
        const RIGHT  = 1 << 2;
    }
}

impl Sides {
    /// Parse a side list such as `"lmr"` or `"r"`.
    ///
    /// Returns `None` for an empty list or an unknown letter.
    pub fn from_letters(letters: &str) -> Option<Sides> {
        let mut sides = Sides::empty();
        for letter in letters.chars() {
            sides |= match letter {
                'l' => Sides::LEFT,
                'm' => Sides::MIDDLE,
                'r' => Sides::RIGHT,
                _ => return None,
            };
        }
        if sides.is_empty() { None } else { Some(sides) }
    }

    /// Canonical letter form, always in `l`, `m`, `r` order.
    pub fn letters(self) -> String {
        let mut out = String::with_capacity(3);
        if self.contains(Sides::LEFT) {
            out.push('l');
        }
        if self.contains(Sides::MIDDLE) {
            out.push('m');
        }
        if self.contains(Sides::RIGHT) {
            out.push('r');
        }
        out
    }
}

/// Kind of a lexical rule. The declaration order is the order in which rule
/// lines are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RuleKind {
    Split,
    ReplaceToken,
    ReplaceCharacter,
}

impl RuleKind {
    /// Action letter used in rule lines.
    pub fn letter(self) -> &'static str {
        match self {
            RuleKind::Split => "s",
            RuleKind::ReplaceToken => "r",
            RuleKind::ReplaceCharacter => "c",
        }
    }

    pub fn from_letter(letter: &str) -> Option<RuleKind> {
        match letter {
            "s" => Some(RuleKind::Split),
            "r" => Some(RuleKind::ReplaceToken),
            "c" => Some(RuleKind::ReplaceCharacter),
            _ => None,
        }
    }

    pub fn is_replacement(self) -> bool {
        !matches!(self, RuleKind::Split)
    }
}

/// A single lexical instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rule {
    /// Insert boundaries around `pattern` on the given sides.
    Split { pattern: String, sides: Sides },
    /// Replace the token `pattern` with `target`.
    ReplaceToken { pattern: String, target: String },
    /// Replace every occurrence of the character `pattern` with `target`.
    ReplaceCharacter { pattern: char, target: char },
}

impl Rule {
    pub fn kind(&self) -> RuleKind {
        match self {
            Rule::Split { .. } => RuleKind::Split,
            Rule::ReplaceToken { .. } => RuleKind::ReplaceToken,
            Rule::ReplaceCharacter { .. } => RuleKind::ReplaceCharacter,
        }
    }

    /// Second column of the rule line: the target, or the side letters.
    pub fn key(&self) -> String {
        match self {
            Rule::Split { sides, .. } => sides.letters(),
            Rule::ReplaceToken { target, .. } => target.clone(),
            Rule::ReplaceCharacter { target, .. } => target.to_string(),
        }
    }

    /// Third column of the rule line: the pattern.
    pub fn value(&self) -> String {
        match self {
            Rule::Split { pattern, .. } | Rule::ReplaceToken { pattern, .. } => pattern.clone(),
            Rule::ReplaceCharacter { pattern, .. } => pattern.to_string(),
        }
    }

    /// Rebuild a rule from its flat columns.
    pub fn from_parts(kind: RuleKind, key: &str, value: &str) -> Option<Rule> {
        match kind {
            RuleKind::Split => {
                Some(Rule::Split { pattern: value.to_string(), sides: Sides::from_letters(key)? })
            }
            RuleKind::ReplaceToken => {
                Some(Rule::ReplaceToken { pattern: value.to_string(), target: key.to_string() })
            }
            RuleKind::ReplaceCharacter => Some(Rule::ReplaceCharacter {
                pattern: single_char(value)?,
                target: single_char(key)?,
            }),
        }
    }

    /// Render as one newline-terminated rule line.
    pub fn to_line(&self) -> String {
        format!("{}\t{}\t{}\n", self.kind().letter(), self.key(), self.value())
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    let c = chars.next()?;
    if chars.next().is_some() { None } else { Some(c) }
}

/// An editable, conflict-resolving collection of rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    /// Emitted as the `cs` setting.
    pub case_sensitive: bool,
    /// When set, the flattened output is a single `bypass` setting.
    pub bypass: bool,
    /// kind -> pattern -> keys
    rules: BTreeMap<RuleKind, BTreeMap<String, BTreeSet<String>>>,
    /// Live target of each replacement pattern.
    targets: BTreeMap<(RuleKind, String), String>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `rule`, retracting whatever it supersedes.
    pub fn add(&mut self, rule: Rule) {
        let kind = rule.kind();
        let key = rule.key();
        let value = rule.value();

        if kind.is_replacement() {
            if let Some(current) = self.targets.get(&(kind, value.clone())).cloned() {
                if current != key {
                    self.retract(kind, &current, &value);
                }
            }
        }
        self.retract(kind, &key, &value);

        self.rules.entry(kind).or_default().entry(value.clone()).or_default().insert(key.clone());
        if kind.is_replacement() {
            self.targets.insert((kind, value), key);
        }
    }

    /// Remove `rule`. Returns whether it was present.
    pub fn remove(&mut self, rule: &Rule) -> bool {
        self.retract(rule.kind(), &rule.key(), &rule.value())
    }

    pub fn contains(&self, rule: &Rule) -> bool {
        self.rules
            .get(&rule.kind())
            .and_then(|patterns| patterns.get(&rule.value()))
            .is_some_and(|keys| keys.contains(&rule.key()))
    }

    pub fn len(&self) -> usize {
        self.rules.values().flat_map(|patterns| patterns.values()).map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate over the rules in emission order.
    pub fn iter(&self) -> impl Iterator<Item = Rule> + '_ {
        self.rules.iter().flat_map(|(kind, patterns)| {
            patterns.iter().flat_map(move |(value, keys)| {
                keys.iter().filter_map(move |key| Rule::from_parts(*kind, key, value))
            })
        })
    }

    /// Flatten into the rule-line text accepted by the compiler.
    ///
    /// A bypassing set flattens to the bypass setting alone.
    pub fn to_rule_lines(&self) -> String {
        if self.bypass {
            return "set\tbypass\t1\n".to_string();
        }

        let mut out = format!("set\tcs\t{}\n", if self.case_sensitive { 1 } else { 0 });
        for (kind, patterns) in &self.rules {
            for (value, keys) in patterns {
                for key in keys {
                    out.push_str(kind.letter());
                    out.push('\t');
                    out.push_str(key);
                    out.push('\t');
                    out.push_str(value);
                    out.push('\n');
                }
            }
        }
        out
    }

    fn retract(&mut self, kind: RuleKind, key: &str, value: &str) -> bool {
        let Some(patterns) = self.rules.get_mut(&kind) else {
            return false;
        };
        let Some(keys) = patterns.get_mut(value) else {
            return false;
        };
        let removed = keys.remove(key);

        if keys.is_empty() {
            patterns.remove(value);
        }
        if patterns.is_empty() {
            self.rules.remove(&kind);
        }
        if removed && kind.is_replacement() {
            let slot = (kind, value.to_string());
            if self.targets.get(&slot).is_some_and(|current| current == key) {
                self.targets.remove(&slot);
            }
        }
        removed
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rule_lines())
    }
}

impl Extend<Rule> for RuleSet {
    fn extend<I: IntoIterator<Item = Rule>>(&mut self, iter: I) {
        for rule in iter {
            self.add(rule);
        }
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        let mut set = RuleSet::new();
        set.extend(iter);
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(pattern: &str, target: &str) -> Rule {
        Rule::ReplaceToken { pattern: pattern.into(), target: target.into() }
    }

    #[test]
    fn empty_set_emits_case_setting_only() {
        let set = RuleSet::new();
        assert_eq!(set.to_rule_lines(), "set\tcs\t0\n");
        assert!(set.is_empty());
    }

    #[test]
    fn add_rule_emits_line() {
        let mut set = RuleSet::new();
        set.add(token("bad", "good"));
        assert_eq!(set.to_string(), "set\tcs\t0\nr\tgood\tbad\n");
    }

    #[test]
    fn remove_rule_prunes_buckets() {
        let mut set = RuleSet::new();
        set.add(token("bad", "good"));
        set.add(token("worse", "better"));
        assert!(set.remove(&token("bad", "good")));
        assert_eq!(set.to_rule_lines(), "set\tcs\t0\nr\tbetter\tworse\n");

        assert!(set.remove(&token("worse", "better")));
        assert!(set.is_empty());
        assert!(!set.remove(&token("worse", "better")));
    }

    #[test]
    fn new_target_retracts_old_one() {
        let mut set = RuleSet::new();
        set.add(token("colour", "color"));
        set.add(token("colour", "hue"));
        assert!(!set.contains(&token("colour", "color")));
        assert!(set.contains(&token("colour", "hue")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn adding_twice_is_idempotent() {
        let mut set = RuleSet::new();
        set.add(token("bad", "good"));
        set.add(token("bad", "good"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn splits_on_one_pattern_accumulate() {
        let mut set = RuleSet::new();
        set.add(Rule::Split { pattern: "beta".into(), sides: Sides::LEFT });
        set.add(Rule::Split { pattern: "beta".into(), sides: Sides::RIGHT });
        assert_eq!(set.to_rule_lines(), "set\tcs\t0\ns\tl\tbeta\ns\tr\tbeta\n");
    }

    #[test]
    fn lines_are_grouped_by_kind() {
        let set: RuleSet = [
            Rule::ReplaceCharacter { pattern: 'f', target: 't' },
            token("bad", "good"),
            Rule::Split { pattern: "alpha".into(), sides: Sides::all() },
        ]
        .into_iter()
        .collect();
        assert_eq!(set.to_rule_lines(), "set\tcs\t0\ns\tlmr\talpha\nr\tgood\tbad\nc\tt\tf\n");
        assert_eq!(set.iter().count(), 3);
    }

    #[test]
    fn bypass_hides_rules() {
        let mut set = RuleSet::new();
        set.add(token("bad", "good"));
        set.bypass = true;
        assert_eq!(set.to_rule_lines(), "set\tbypass\t1\n");
    }

    #[test]
    fn case_sensitive_flag_is_emitted() {
        let set = RuleSet { case_sensitive: true, ..RuleSet::default() };
        assert_eq!(set.to_rule_lines(), "set\tcs\t1\n");
    }

    #[test]
    fn rule_renders_as_line() {
        let rule = Rule::ReplaceCharacter { pattern: 'f', target: 't' };
        assert_eq!(rule.to_line(), "c\tt\tf\n");
        assert_eq!(Rule::from_parts(RuleKind::ReplaceCharacter, "t", "f"), Some(rule));
    }

    #[test]
    fn side_letters_round_trip() {
        assert_eq!(Sides::from_letters("rl"), Some(Sides::LEFT | Sides::RIGHT));
        assert_eq!(Sides::from_letters("rl").map(Sides::letters).as_deref(), Some("lr"));
        assert_eq!(Sides::from_letters(""), None);
        assert_eq!(Sides::from_letters("lx"), None);
    }
}
