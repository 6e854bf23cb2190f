//! The package import graph and its reachability queries.
//!
//! A [`Graph`] maps package identifiers to their import edges. It is a pure
//! value: edges may point at identifiers that have no node of their own
//! (unscanned external libraries, the standard library). Those dangling
//! targets are legal and act as leaves during traversal.
//!
//! ## Edge kinds
//!
//! | Edge | Followed by closures |
//! |------|----------------------|
//! | `imports` | yes |
//! | `test_imports` | no |
//!
//! Test-only imports are kept in the graph but never traversed: a downstream
//! consumer of a package does not need the dependencies of its tests.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::types::{Node, PackageId};

/// Mapping from package identifier to its import edges.
///
/// Built by the scanner and the multi-root builder, read-only afterwards.
/// Concurrent queries are safe without locking: every traversal keeps its
/// visited-set local to the call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Graph {
    nodes: BTreeMap<PackageId, Node>,
}

impl Graph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, replacing any existing node for the same identifier.
    ///
    /// Returns the replaced node, if any.
    pub fn insert(&mut self, id: PackageId, node: Node) -> Option<Node> {
        self.nodes.insert(id, node)
    }

    /// Get the node for a package.
    #[must_use]
    pub fn get(&self, id: &PackageId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Whether a package has a node of its own.
    #[must_use]
    pub fn contains(&self, id: &PackageId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of packages with a node.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over nodes in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&PackageId, &Node)> {
        self.nodes.iter()
    }

    /// Iterate over identifiers that have a node.
    pub fn packages(&self) -> impl Iterator<Item = &PackageId> {
        self.nodes.keys()
    }

    /// Total number of regular and test edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes
            .values()
            .map(|n| n.imports.len() + n.test_imports.len())
            .sum()
    }

    /// Produce a new graph with every key and edge target passed through `rewrite`.
    ///
    /// When two keys rewrite to the same identifier their edge sets are
    /// unioned, even if only one of them had any edges. Edges whose rewritten
    /// targets coincide collapse into one.
    #[must_use]
    pub fn normalize<F>(&self, rewrite: F) -> Graph
    where
        F: Fn(&PackageId) -> PackageId,
    {
        let mut nodes: BTreeMap<PackageId, Node> = BTreeMap::new();

        for (id, node) in &self.nodes {
            let rewritten = Node {
                imports: node.imports.iter().map(&rewrite).collect(),
                test_imports: node.test_imports.iter().map(&rewrite).collect(),
            };
            match nodes.entry(rewrite(id)) {
                Entry::Vacant(slot) => {
                    slot.insert(rewritten);
                }
                Entry::Occupied(mut slot) => {
                    slot.get_mut().absorb(rewritten);
                }
            }
        }

        Graph { nodes }
    }

    /// Every identifier reachable from `start` over regular import edges.
    ///
    /// Includes reached identifiers that have no node of their own. `start`
    /// is never part of its own closure, even when a cycle leads back to it.
    #[must_use]
    pub fn recursive_transitive_closure(&self, start: &PackageId) -> BTreeSet<PackageId> {
        self.closure_of_all(std::iter::once(start))
    }

    /// Union of the closures of several starting identifiers.
    ///
    /// The starting identifiers themselves are excluded from the result.
    #[must_use]
    pub fn closure_of_all<'a, I>(&'a self, starts: I) -> BTreeSet<PackageId>
    where
        I: IntoIterator<Item = &'a PackageId>,
    {
        let starts: BTreeSet<&PackageId> = starts.into_iter().collect();
        let mut visited: BTreeSet<&PackageId> = BTreeSet::new();
        let mut stack: Vec<&PackageId> = starts
            .iter()
            .filter_map(|s| self.nodes.get(*s))
            .flat_map(|n| n.imports.iter())
            .collect();

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            if let Some(node) = self.nodes.get(id) {
                stack.extend(node.imports.iter().filter(|t| !visited.contains(*t)));
            }
        }

        visited
            .into_iter()
            .filter(|id| !starts.contains(id))
            .cloned()
            .collect()
    }

    pub(crate) fn into_nodes(self) -> impl Iterator<Item = (PackageId, Node)> {
        self.nodes.into_iter()
    }
}

impl FromIterator<(PackageId, Node)> for Graph {
    /// Later entries replace earlier ones with the same identifier.
    fn from_iter<T: IntoIterator<Item = (PackageId, Node)>>(iter: T) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Graph {
    type Item = (PackageId, Node);
    type IntoIter = std::collections::btree_map::IntoIter<PackageId, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}
