// src/manifest/glob.rs

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::fs::FileSystem;
use crate::project::path_utils::relative_str;

/// Directories that are never descended into while resolving patterns.
const SKIPPED_DIRS: &[&str] = &[".git"];

/// A compiled list of glob patterns, matched against paths relative to some
/// root (e.g. `"src/main.ts"`).
///
/// `*` and `?` never cross a `/`; `**` spans any number of directories,
/// including none.
#[derive(Clone)]
pub struct PatternSet {
    patterns: Vec<String>,
    set: GlobSet,
}

impl fmt::Debug for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternSet")
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl PatternSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns: Vec<String> = patterns
            .iter()
            .map(|p| normalize_pattern(p.as_ref()))
            .collect();
        let set = build_globset(&patterns)?;
        Ok(Self { patterns, set })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn is_match(&self, rel_path: &str) -> bool {
        self.set.is_match(rel_path)
    }
}

/// Strip a leading `./`, which callers often write but which never appears in
/// the relative paths we match against.
fn normalize_pattern(pattern: &str) -> String {
    let trimmed = pattern.trim();
    trimmed.strip_prefix("./").unwrap_or(trimmed).to_string()
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Expand `patterns` against `root` and return every matching regular file,
/// deduplicated and sorted.
///
/// Patterns that match nothing contribute nothing. An invalid pattern or an
/// unreadable `root` is an error; unreadable nested directories are skipped.
/// Symlinks are not followed.
pub fn find_files_with_glob<S: AsRef<str>>(
    fs: &dyn FileSystem,
    root: &Path,
    patterns: &[S],
) -> Result<Vec<PathBuf>> {
    let set = PatternSet::new(patterns)?;
    collect_matching_files(fs, root, &set)
}

/// Collect all files under `root` that match `set`.
pub fn collect_matching_files(
    fs: &dyn FileSystem,
    root: &Path,
    set: &PatternSet,
) -> Result<Vec<PathBuf>> {
    if set.is_empty() {
        return Ok(Vec::new());
    }

    let files: BTreeSet<PathBuf> = fs
        .walk_files(root, SKIPPED_DIRS)
        .with_context(|| format!("listing pattern root {:?}", root))?
        .into_iter()
        .filter(|path| relative_str(root, path).is_some_and(|rel| set.is_match(&rel)))
        .collect();

    debug!(?root, patterns = ?set.patterns(), matched = files.len(), "resolved glob patterns");
    Ok(files.into_iter().collect())
}
