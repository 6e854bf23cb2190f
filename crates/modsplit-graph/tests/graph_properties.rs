//! Property tests for graph normalization and closures.

use std::collections::BTreeSet;

use modsplit_graph::{Graph, Node, PackageId};
use proptest::prelude::*;

/// Small alphabet so generated graphs have collisions, cycles and dangling edges.
fn package_id() -> impl Strategy<Value = PackageId> {
    prop::sample::select(vec![
        "a", "b", "c", "ab", "ba", "x/a", "x/b", "y/a", "y/c", "z",
    ])
    .prop_map(|s| PackageId::new(s).expect("valid package id"))
}

fn node() -> impl Strategy<Value = Node> {
    (
        prop::collection::btree_set(package_id(), 0..4),
        prop::collection::btree_set(package_id(), 0..3),
    )
        .prop_map(|(imports, test_imports)| Node {
            imports,
            test_imports,
        })
}

fn graph() -> impl Strategy<Value = Graph> {
    prop::collection::vec((package_id(), node()), 0..8)
        .prop_map(|entries| entries.into_iter().collect())
}

/// Drops the first segment of nested identifiers, merging `x/a` and `y/a` into `a`.
fn flatten(p: &PackageId) -> PackageId {
    match p.as_str().split_once('/') {
        Some((_, rest)) => PackageId::new(rest).expect("valid package id"),
        None => p.clone(),
    }
}

proptest! {
    #[test]
    fn normalized_edges_are_images_of_original_edges(g in graph()) {
        let n = g.normalize(flatten);

        for (key, node) in n.iter() {
            let sources: Vec<&Node> = g
                .iter()
                .filter(|(k, _)| flatten(k) == *key)
                .map(|(_, node)| node)
                .collect();
            prop_assert!(!sources.is_empty(), "normalized key {key} has no preimage");

            let expected_imports: BTreeSet<PackageId> = sources
                .iter()
                .flat_map(|s| s.imports.iter().map(flatten))
                .collect();
            let expected_tests: BTreeSet<PackageId> = sources
                .iter()
                .flat_map(|s| s.test_imports.iter().map(flatten))
                .collect();

            prop_assert_eq!(&node.imports, &expected_imports);
            prop_assert_eq!(&node.test_imports, &expected_tests);
        }

        let expected_keys: BTreeSet<PackageId> = g.packages().map(flatten).collect();
        let actual_keys: BTreeSet<PackageId> = n.packages().cloned().collect();
        prop_assert_eq!(actual_keys, expected_keys);
    }

    #[test]
    fn identity_normalization_is_a_no_op(g in graph()) {
        prop_assert_eq!(g.normalize(Clone::clone), g);
    }

    #[test]
    fn closure_never_contains_start_and_only_follows_regular_edges(
        g in graph(),
        start in package_id(),
    ) {
        let closure = g.recursive_transitive_closure(&start);

        prop_assert!(!closure.contains(&start));

        // Every member is a regular-edge target of the start or of another member.
        for member in &closure {
            let reached = std::iter::once(&start)
                .chain(closure.iter())
                .filter_map(|p| g.get(p))
                .any(|n| n.imports.contains(member));
            prop_assert!(reached, "{member} is not reachable");
        }
    }

    #[test]
    fn closure_is_transitively_closed(g in graph(), start in package_id()) {
        let closure = g.recursive_transitive_closure(&start);

        for member in &closure {
            if let Some(node) = g.get(member) {
                for target in &node.imports {
                    prop_assert!(
                        target == &start || closure.contains(target),
                        "{target} reachable from {member} but missing"
                    );
                }
            }
        }
    }
}
