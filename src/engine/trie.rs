//! Prefix tree over rule patterns.
//!
//! Nodes live in a flat arena and refer to each other by [`NodeId`]. Node 0 is
//! the root (the empty prefix). A node reached by a complete pattern carries
//! the pattern's leaf markers: split sides and, for token rules, the
//! replacement text.
//!
//! ## Invariants
//!
//! - Every `NodeId` stored in a child map indexes `Trie::nodes`.
//! - The root never carries markers (empty patterns are rejected upstream).

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::model::Sides;

/// Node identifier (index into the node arena).
pub(crate) type NodeId = usize;

pub(crate) const ROOT: NodeId = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Node {
    children: FxHashMap<char, NodeId>,
    /// Split markers.
    pub splits: Sides,
    /// Replace-token marker.
    pub replacement: Option<String>,
}

impl Node {
    fn empty() -> Self {
        Node { children: FxHashMap::default(), splits: Sides::empty(), replacement: None }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        !self.splits.is_empty() || self.replacement.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Trie {
    nodes: Vec<Node>,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl Trie {
    pub(crate) fn new() -> Self {
        Trie { nodes: vec![Node::empty()] }
    }

    #[inline]
    pub(crate) fn child(&self, node: NodeId, c: char) -> Option<NodeId> {
        self.nodes[node].children.get(&c).copied()
    }

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Walk `pattern` from the root, creating missing nodes, and return the
    /// node it ends on.
    pub(crate) fn insert(&mut self, pattern: impl IntoIterator<Item = char>) -> &mut Node {
        let mut node = ROOT;
        for c in pattern {
            let existing = self.nodes[node].children.get(&c).copied();
            node = match existing {
                Some(next) => next,
                None => {
                    let next = self.nodes.len();
                    self.nodes.push(Node::empty());
                    self.nodes[node].children.insert(c, next);
                    next
                }
            };
        }
        &mut self.nodes[node]
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Check the arena invariants. Used on snapshots, which may come from
    /// anywhere.
    pub(crate) fn is_consistent(&self) -> bool {
        let len = self.nodes.len();
        len > 0 && !self.nodes[ROOT].is_leaf() && self.nodes.iter().all(|n| n.children.values().all(|&id| id < len))
    }
}
