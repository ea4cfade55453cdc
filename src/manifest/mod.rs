// src/manifest/mod.rs

//! File manifests: content digests keyed by relative path.
//!
//! - [`glob`] expands pattern lists into concrete files under a root.
//! - [`hash`] digests files and assembles them into a [`Manifest`].
//!
//! A manifest is built fresh for every capture or comparison and replaced
//! wholesale; callers never patch one in place.

pub mod glob;
pub mod hash;

use std::collections::BTreeMap;

use blake3::Hasher;
use serde::{Deserialize, Serialize};

pub use glob::{collect_matching_files, find_files_with_glob, PatternSet};
pub use hash::{build_manifest, compute_file_hash};

/// Mapping of POSIX-style relative path to lowercase hex content digest.
///
/// Serializes as a plain JSON object (`{"src/a.ts": "<hex>"}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(BTreeMap<String, String>);

/// Per-path differences between two manifests. Each list is sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManifestDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<String>,
}

impl ManifestDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, path: impl Into<String>, digest: impl Into<String>) {
        self.0.insert(path.into(), digest.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Restrict to the entries under `prefix` and strip it, so the result is
    /// relative to that subdirectory.
    ///
    /// An empty prefix returns a copy of the whole manifest.
    pub fn project(&self, prefix: &str) -> Manifest {
        let prefix = prefix.trim_matches('/');
        if prefix.is_empty() {
            return self.clone();
        }

        let dir_prefix = format!("{prefix}/");
        self.0
            .iter()
            .filter_map(|(path, digest)| {
                path.strip_prefix(&dir_prefix)
                    .map(|rest| (rest.to_string(), digest.clone()))
            })
            .collect()
    }

    /// Differences going from `self` (the earlier state) to `current`.
    pub fn diff(&self, current: &Manifest) -> ManifestDiff {
        let mut diff = ManifestDiff::default();

        for (path, digest) in &self.0 {
            match current.0.get(path) {
                None => diff.removed.push(path.clone()),
                Some(now) if now != digest => diff.modified.push(path.clone()),
                Some(_) => {}
            }
        }
        for path in current.0.keys() {
            if !self.0.contains_key(path) {
                diff.added.push(path.clone());
            }
        }

        diff
    }

    /// One digest summarising the whole manifest.
    ///
    /// Entries are visited in path order, so the result only depends on the
    /// path set and the per-file digests.
    pub fn aggregate_hash(&self) -> String {
        let mut hasher = Hasher::new();
        for (path, digest) in &self.0 {
            hasher.update(path.as_bytes());
            hasher.update(&[0]);
            hasher.update(digest.as_bytes());
            hasher.update(&[b'\n']);
        }
        hasher.finalize().to_hex().to_string()
    }
}

impl FromIterator<(String, String)> for Manifest {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Manifest(iter.into_iter().collect())
    }
}
