// src/change/mod.rs

//! Change detection against a stored checkpoint.
//!
//! One checkpoint captured at the project root can answer "did anything
//! change?" for any nested directory (e.g. a monorepo package): the
//! checkpoint manifest is projected onto the directory before comparing.
//!
//! Any failure along the way reports "changed".

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use tracing::debug;

use crate::checkpoint::Checkpoint;
use crate::fs::FileSystem;
use crate::manifest::{build_manifest, collect_matching_files, Manifest, ManifestDiff, PatternSet};
use crate::project::path_utils::relative_str;

/// Whether the files matching `patterns` under `directory` differ from what
/// `checkpoint` recorded for them.
pub fn has_changed(
    fs: &dyn FileSystem,
    project_root: &Path,
    checkpoint: &Checkpoint,
    directory: &Path,
    patterns: &[String],
) -> bool {
    match compare(fs, project_root, checkpoint, directory, patterns) {
        Ok((baseline, current)) => {
            let changed = manifests_differ(&baseline, &current);
            debug!(
                ?directory,
                changed,
                baseline = baseline.len(),
                current = current.len(),
                "compared against checkpoint"
            );
            changed
        }
        Err(err) => {
            debug!(?directory, error = %err, "change detection failed; assuming changed");
            true
        }
    }
}

/// Which files under `directory` were added, removed or modified since the
/// checkpoint.
pub fn changed_files(
    fs: &dyn FileSystem,
    project_root: &Path,
    checkpoint: &Checkpoint,
    directory: &Path,
    patterns: &[String],
) -> Result<ManifestDiff> {
    let (baseline, current) = compare(fs, project_root, checkpoint, directory, patterns)?;
    Ok(baseline.diff(&current))
}

/// Build the (checkpoint view, current state) pair, both relative to
/// `directory` and restricted to `patterns`.
fn compare(
    fs: &dyn FileSystem,
    project_root: &Path,
    checkpoint: &Checkpoint,
    directory: &Path,
    patterns: &[String],
) -> Result<(Manifest, Manifest)> {
    let directory = absolute(project_root, directory);
    let set = PatternSet::new(patterns)?;

    let files = collect_matching_files(fs, &directory, &set)?;
    let current = build_manifest(fs, &files, &directory);

    let rel_dir = relative_str(project_root, &directory).ok_or_else(|| {
        anyhow!(
            "directory {:?} is not inside project root {:?}",
            directory,
            project_root
        )
    })?;

    // The checkpoint may cover more than this hook cares about (it is
    // captured with the union of every plugin's patterns).
    let baseline: Manifest = checkpoint
        .files
        .project(&rel_dir)
        .iter()
        .filter(|(path, _)| set.is_match(path))
        .map(|(path, digest)| (path.to_string(), digest.to_string()))
        .collect();

    Ok((baseline, current))
}

fn absolute(project_root: &Path, directory: &Path) -> PathBuf {
    if directory.is_absolute() {
        directory.to_path_buf()
    } else {
        project_root.join(directory)
    }
}

fn manifests_differ(baseline: &Manifest, current: &Manifest) -> bool {
    if baseline.len() != current.len() {
        return true;
    }

    for (path, digest) in baseline.iter() {
        match current.get(path) {
            Some(now) if now == digest => {}
            _ => return true,
        }
    }

    current.paths().any(|path| !baseline.contains(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::types::CheckpointKind;
    use chrono::Utc;

    fn patterns(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn capture(fs: &MockFileSystem, pats: &[String]) -> Checkpoint {
        let root = Path::new("/repo");
        let files = crate::manifest::find_files_with_glob(fs, root, pats).unwrap();
        Checkpoint {
            created_at: Utc::now(),
            kind: CheckpointKind::Session,
            patterns: pats.to_vec(),
            files: build_manifest(fs, &files, root),
        }
    }

    fn monorepo() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_file("/repo/packages/a/index.ts", b"a1");
        fs.add_file("/repo/packages/a/util.ts", b"a2");
        fs.add_file("/repo/packages/b/index.ts", b"b1");
        fs.add_file("/repo/packages/b/notes.md", b"notes");
        fs
    }

    #[test]
    fn unchanged_tree_reports_no_change() {
        let fs = monorepo();
        let pats = patterns(&["**/*.ts"]);
        let cp = capture(&fs, &pats);

        assert!(!has_changed(&fs, Path::new("/repo"), &cp, Path::new("/repo"), &pats));
    }

    #[test]
    fn subdirectory_ignores_sibling_changes() {
        let fs = monorepo();
        let pats = patterns(&["**/*.ts"]);
        let cp = capture(&fs, &pats);

        fs.add_file("/repo/packages/b/index.ts", b"b1-edited");

        let a = Path::new("/repo/packages/a");
        let b = Path::new("/repo/packages/b");
        assert!(!has_changed(&fs, Path::new("/repo"), &cp, a, &pats));
        assert!(has_changed(&fs, Path::new("/repo"), &cp, b, &pats));
    }

    #[test]
    fn files_outside_patterns_never_flip() {
        let fs = monorepo();
        let cp = capture(&fs, &patterns(&["**/*"]));

        fs.add_file("/repo/packages/b/notes.md", b"edited");
        fs.add_file("/repo/packages/b/new.md", b"new");

        let ts = patterns(&["**/*.ts"]);
        assert!(!has_changed(&fs, Path::new("/repo"), &cp, Path::new("/repo"), &ts));
    }

    #[test]
    fn add_and_delete_with_equal_cardinality_is_detected() {
        let fs = monorepo();
        let pats = patterns(&["*.ts"]);
        let cp = capture(&fs, &patterns(&["**/*.ts"]));

        let a = Path::new("/repo/packages/a");
        fs.remove_file(Path::new("/repo/packages/a/util.ts")).unwrap();
        fs.add_file("/repo/packages/a/other.ts", b"a2");

        assert!(has_changed(&fs, Path::new("/repo"), &cp, a, &pats));
        let diff = changed_files(&fs, Path::new("/repo"), &cp, a, &pats).unwrap();
        assert_eq!(diff.added, vec!["other.ts"]);
        assert_eq!(diff.removed, vec!["util.ts"]);
        assert!(diff.modified.is_empty());
    }

    #[test]
    fn relative_directory_is_taken_from_root() {
        let fs = monorepo();
        let pats = patterns(&["**/*.ts"]);
        let cp = capture(&fs, &pats);

        assert!(!has_changed(&fs, Path::new("/repo"), &cp, Path::new("packages/a"), &pats));
    }

    #[test]
    fn errors_assume_changed() {
        let fs = monorepo();
        let pats = patterns(&["**/*.ts"]);
        let cp = capture(&fs, &pats);

        // Inaccessible directory.
        assert!(has_changed(&fs, Path::new("/repo"), &cp, Path::new("/repo/missing"), &pats));
        // Outside the project root.
        fs.add_dir("/elsewhere");
        assert!(has_changed(&fs, Path::new("/repo"), &cp, Path::new("/elsewhere"), &pats));
        // Invalid pattern.
        assert!(has_changed(&fs, Path::new("/repo"), &cp, Path::new("/repo"), &patterns(&["[x"])));
    }
}
