// tests/manifest_properties.rs

use std::collections::BTreeSet;
use std::path::Path;

use hookwise::manifest::Manifest;
use hookwise::project::path_utils::{directory_key, project_slug};
use proptest::prelude::*;

// Relative paths built from a small alphabet so prefixes collide often.
fn rel_path() -> impl Strategy<Value = String> {
    proptest::collection::vec("[ab]{1,2}", 1..4).prop_map(|segments| segments.join("/"))
}

fn manifest() -> impl Strategy<Value = Manifest> {
    proptest::collection::btree_map(rel_path(), "[0-9a-f]{4}", 0..12)
        .prop_map(|entries| entries.into_iter().collect())
}

proptest! {
    #[test]
    fn diff_against_itself_is_empty(m in manifest()) {
        prop_assert!(m.diff(&m).is_empty());
        prop_assert_eq!(m.aggregate_hash(), m.clone().aggregate_hash());
    }

    #[test]
    fn diff_partitions_the_union_of_paths(before in manifest(), after in manifest()) {
        let diff = before.diff(&after);

        let mut seen = BTreeSet::new();
        for path in diff.added.iter().chain(&diff.removed).chain(&diff.modified) {
            prop_assert!(seen.insert(path.clone()), "{} reported twice", path);
        }
        for path in &diff.added {
            prop_assert!(after.contains(path) && !before.contains(path));
        }
        for path in &diff.removed {
            prop_assert!(before.contains(path) && !after.contains(path));
        }
        for path in &diff.modified {
            prop_assert_ne!(before.get(path), after.get(path));
        }

        // Paths present on both sides with the same digest are never reported.
        for (path, digest) in before.iter() {
            if after.get(path) == Some(digest) {
                prop_assert!(!seen.contains(path));
            }
        }

        prop_assert_eq!(diff.is_empty(), before == after);
        prop_assert_eq!(diff.is_empty(), before.aggregate_hash() == after.aggregate_hash());
    }

    #[test]
    fn projection_keeps_exactly_the_entries_under_the_prefix(m in manifest(), prefix in rel_path()) {
        let projected = m.project(&prefix);
        let dir = format!("{prefix}/");

        for (path, digest) in projected.iter() {
            let full = format!("{dir}{path}");
            prop_assert_eq!(m.get(&full), Some(digest));
        }
        let expected = m.paths().filter(|p| p.starts_with(&dir)).count();
        prop_assert_eq!(projected.len(), expected);

        prop_assert_eq!(m.project(""), m.clone());
    }

    #[test]
    fn directory_keys_are_single_segments(rel in rel_path()) {
        let key = directory_key(&rel);
        prop_assert!(!key.contains('/'));
        prop_assert!(!key.is_empty());
        prop_assert_eq!(directory_key(&format!("/{rel}/")), key);
    }

    #[test]
    fn distinct_directories_never_share_a_key(
        a in "[a_.%/]{1,6}",
        b in "[a_.%/]{1,6}",
    ) {
        // Both spellings of the root are the same directory.
        let norm = |s: &str| match s.trim_matches('/') {
            "." => String::new(),
            t => t.to_string(),
        };
        prop_assume!(norm(&a) != norm(&b));
        prop_assert_ne!(directory_key(&a), directory_key(&b));
    }

    #[test]
    fn project_slugs_are_filesystem_safe(path in "(/[a-zA-Z0-9 ._-]{1,8}){1,4}") {
        let slug = project_slug(Path::new(&path));
        prop_assert!(slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
        prop_assert_eq!(slug.len(), path.len());
    }
}
