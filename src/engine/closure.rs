//! Transitive closure of replacement rules.
//!
//! Replacement rules form a directed graph `pattern -> target`. Before the
//! trie is built, every pattern is rewritten to point straight at the end of
//! its chain, so a scan never needs more than one lookup:
//!
//! ```text
//! ghi -> def -> abc        ghi -> abc
//!        def -> abc   =>   def -> abc
//! ```
//!
//! A self-edge is a fixed point. A chain that comes back to a pattern already
//! on the current path is a cycle. A pattern whose chains end on two distinct
//! terminals is a conflict. Chains that converge on one terminal are fine.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};

/// Resolve every pattern in `edges` to its terminal target.
pub(crate) fn resolve_terminals(edges: &BTreeMap<String, BTreeSet<String>>) -> Result<BTreeMap<String, String>> {
    let mut resolver = Resolver { edges, resolved: BTreeMap::new(), path: Vec::new() };

    let mut out = BTreeMap::new();
    for pattern in edges.keys() {
        let terminal = resolver.terminal(pattern)?;
        out.insert(pattern.clone(), terminal.to_string());
    }
    Ok(out)
}

struct Resolver<'a> {
    edges: &'a BTreeMap<String, BTreeSet<String>>,
    resolved: BTreeMap<&'a str, &'a str>,
    path: Vec<&'a str>,
}

impl<'a> Resolver<'a> {
    fn terminal(&mut self, node: &'a str) -> Result<&'a str> {
        if let Some(&terminal) = self.resolved.get(node) {
            return Ok(terminal);
        }

        let next: Vec<&'a str> = match self.edges.get(node) {
            Some(targets) => targets.iter().map(String::as_str).filter(|t| *t != node).collect(),
            None => Vec::new(),
        };
        if next.is_empty() {
            return Ok(node);
        }

        if self.path.contains(&node) {
            return Err(Error::CircularReference { pattern: node.to_string() });
        }

        self.path.push(node);
        let mut terminals = BTreeSet::new();
        for target in next {
            terminals.insert(self.terminal(target)?);
        }
        self.path.pop();

        let mut iter = terminals.iter();
        match (iter.next(), iter.next()) {
            (Some(&terminal), None) => {
                self.resolved.insert(node, terminal);
                Ok(terminal)
            }
            _ => Err(Error::ConflictingRule {
                pattern: node.to_string(),
                targets: terminals.iter().map(|t| t.to_string()).collect(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges(pairs: &[(&str, &str)]) -> BTreeMap<String, BTreeSet<String>> {
        let mut out: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (pattern, target) in pairs {
            out.entry(pattern.to_string()).or_default().insert(target.to_string());
        }
        out
    }

    #[test]
    fn chains_collapse_to_terminal() {
        let resolved = resolve_terminals(&edges(&[("abc", "def"), ("def", "ghi"), ("ghi", "jkl")])).unwrap();
        assert_eq!(resolved["abc"], "jkl");
        assert_eq!(resolved["def"], "jkl");
        assert_eq!(resolved["ghi"], "jkl");
    }

    #[test]
    fn converging_chains_are_allowed() {
        let resolved = resolve_terminals(&edges(&[("abc", "jkl"), ("def", "jkl"), ("ghi", "def")])).unwrap();
        assert_eq!(resolved["ghi"], "jkl");
    }

    #[test]
    fn self_edge_is_fixed_point() {
        let resolved = resolve_terminals(&edges(&[("b", "b"), ("a", "b")])).unwrap();
        assert_eq!(resolved["a"], "b");
        assert_eq!(resolved["b"], "b");
    }

    #[test]
    fn cycle_is_reported() {
        let err = resolve_terminals(&edges(&[("x", "y"), ("y", "x")])).unwrap_err();
        assert!(matches!(err, Error::CircularReference { ref pattern } if pattern == "x"));
    }

    #[test]
    fn diverging_targets_conflict() {
        let err = resolve_terminals(&edges(&[("x", "a"), ("x", "b")])).unwrap_err();
        match err {
            Error::ConflictingRule { pattern, targets } => {
                assert_eq!(pattern, "x");
                assert_eq!(targets, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
