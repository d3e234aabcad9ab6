//! Property-based tests for path reduction and the RelativePath type.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::path::RelativePath;
    use crate::reduce::{fetch_requests, minimal_paths};
    use proptest::prelude::*;

    /// Strategy: a relative path of 1..=4 segments drawn from a small
    /// alphabet, so generated sets contain plenty of ancestor/descendant
    /// and shared-prefix pairs.
    fn arb_path() -> impl Strategy<Value = RelativePath> {
        prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "ab", "deep"]), 1..=4)
            .prop_map(|segments| RelativePath::parse(&segments.join("/")).unwrap())
    }

    fn arb_path_set() -> impl Strategy<Value = Vec<RelativePath>> {
        prop::collection::vec(arb_path(), 0..12)
    }

    // ============================================================================
    // minimal_paths property tests
    // ============================================================================

    proptest! {
        /// Property: the reduced set is a subset of the input.
        #[test]
        fn reduction_selects_a_subset(paths in arb_path_set()) {
            let minimal = minimal_paths(paths.clone());
            for selected in minimal.keys() {
                prop_assert!(
                    paths.contains(selected),
                    "reduced set contains '{}' which was not an input",
                    selected
                );
            }
        }

        /// Property: every input path is either selected or has a selected
        /// ancestor (the set covers the input).
        #[test]
        fn reduction_covers_every_input(paths in arb_path_set()) {
            let minimal = minimal_paths(paths.clone());
            for path in &paths {
                let covered = minimal.contains_key(path)
                    || minimal.keys().any(|root| root.is_ancestor_of(path));
                prop_assert!(covered, "input '{}' is not covered", path);
            }
        }

        /// Property: no two selected paths are in an ancestor/descendant
        /// relationship (the set is an antichain).
        #[test]
        fn reduction_is_an_antichain(paths in arb_path_set()) {
            let minimal = minimal_paths(paths);
            for a in minimal.keys() {
                for b in minimal.keys() {
                    prop_assert!(
                        !a.is_ancestor_of(b),
                        "'{}' and '{}' are both selected but related",
                        a,
                        b
                    );
                }
            }
        }

        /// Property: reduction is idempotent, reducing the reduced set
        /// changes nothing except that every entry becomes a leaf.
        #[test]
        fn reduction_is_idempotent(paths in arb_path_set()) {
            let first = minimal_paths(paths);
            let second = minimal_paths(first.keys().cloned());
            prop_assert_eq!(first.len(), second.len());
            for (path, wildcard) in &second {
                prop_assert!(first.contains_key(path));
                prop_assert!(!wildcard);
            }
        }

        /// Property: one fetch request per reduced folder plus one per file.
        #[test]
        fn fetch_requests_count(paths in arb_path_set(), files in arb_path_set()) {
            let minimal = minimal_paths(paths);
            let requests = fetch_requests(&minimal, &files);
            prop_assert_eq!(requests.len(), minimal.len() + files.len());
        }
    }

    // ============================================================================
    // RelativePath property tests
    // ============================================================================

    proptest! {
        /// Property: parsing is idempotent, reparsing a normalized path
        /// yields the same path.
        #[test]
        fn parse_is_idempotent(path in arb_path()) {
            let reparsed = RelativePath::parse(path.as_str()).unwrap();
            prop_assert_eq!(path, reparsed);
        }

        /// Property: the ancestor relation is irreflexive and asymmetric.
        #[test]
        fn ancestor_relation_is_a_strict_order(a in arb_path(), b in arb_path()) {
            prop_assert!(!a.is_ancestor_of(&a));
            if a.is_ancestor_of(&b) {
                prop_assert!(!b.is_ancestor_of(&a));
            }
        }

        /// Property: a parent is always a strict ancestor of its child.
        #[test]
        fn join_produces_descendant(base in arb_path(), child in "[a-z]{1,8}") {
            let joined = base.join(&child).unwrap();
            prop_assert!(base.is_ancestor_of(&joined));
            prop_assert_eq!(joined.parent().unwrap(), base);
        }
    }
}
