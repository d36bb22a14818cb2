use once_cell::sync::Lazy;

use crate::{Rule, RuleSet};

/// Greek letter names spelled out in running text, e.g. "nfkappab" or
/// "TNF-alpha". Each one is split off on every side.
const GREEK_LETTERS: &[&str] = &[
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "theta", "iota", "kappa", "lambda", "omicron", "sigma",
    "upsilon", "omega",
];

/// Flattened standard rule lines, built once.
pub(crate) static RULE_LINES: Lazy<String> = Lazy::new(|| get().to_rule_lines());

pub(crate) fn get() -> RuleSet {
    let mut set: RuleSet = GREEK_LETTERS.iter().map(|&name| greek(name)).collect();
    set.case_sensitive = false;
    set
}

fn greek(name: &str) -> Rule {
    rule!(split name, [LEFT, MIDDLE, RIGHT])
}
