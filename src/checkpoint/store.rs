// src/checkpoint/store.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::checkpoint::model::{
    checkpoint_file_name, parse_checkpoint_file_name, Checkpoint, CheckpointId,
    CheckpointSummary,
};
use crate::fs::FileSystem;
use crate::manifest::{build_manifest, find_files_with_glob};
use crate::project::ProjectContext;
use crate::types::CheckpointKind;

/// Default age after which `cleanup` removes a checkpoint (24h).
pub const DEFAULT_MAX_AGE: Duration = Duration::from_millis(86_400_000);

/// Per-project checkpoint storage under `<cache dir>/checkpoints/`.
///
/// The public operations never fail: capture reports `false`, load reports
/// `None`, cleanup skips what it cannot delete. They run inside hook
/// lifecycles, which must not be aborted by a caching problem.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    fs: Arc<dyn FileSystem>,
    ctx: ProjectContext,
}

impl CheckpointStore {
    pub fn new(fs: Arc<dyn FileSystem>, ctx: ProjectContext) -> Self {
        Self { fs, ctx }
    }

    pub fn dir(&self) -> PathBuf {
        self.ctx.checkpoint_dir()
    }

    pub fn path_for(&self, kind: CheckpointKind, id: &CheckpointId) -> PathBuf {
        self.dir().join(checkpoint_file_name(kind, id))
    }

    /// Snapshot the files matching `patterns` under the project root and
    /// persist them for `(kind, id)`, replacing any previous checkpoint.
    pub fn capture(&self, kind: CheckpointKind, id: &CheckpointId, patterns: &[String]) -> bool {
        match self.capture_checkpoint(kind, id, patterns) {
            Ok(checkpoint) => {
                info!(
                    kind = %kind,
                    id = %id,
                    files = checkpoint.files.len(),
                    "captured checkpoint"
                );
                true
            }
            Err(err) => {
                warn!(kind = %kind, id = %id, error = %err, "checkpoint capture failed");
                false
            }
        }
    }

    /// Fallible form of [`CheckpointStore::capture`], returning what was written.
    pub fn capture_checkpoint(
        &self,
        kind: CheckpointKind,
        id: &CheckpointId,
        patterns: &[String],
    ) -> Result<Checkpoint> {
        let root = self.ctx.root();
        let files = find_files_with_glob(self.fs.as_ref(), root, patterns)
            .with_context(|| format!("resolving checkpoint patterns under {:?}", root))?;
        let manifest = build_manifest(self.fs.as_ref(), &files, root);

        let checkpoint = Checkpoint {
            created_at: Utc::now(),
            kind,
            patterns: patterns.to_vec(),
            files: manifest,
        };

        let path = self.path_for(kind, id);
        let body = serde_json::to_vec_pretty(&checkpoint).context("serializing checkpoint")?;
        self.fs
            .write(&path, &body)
            .with_context(|| format!("writing checkpoint {:?}", path))?;

        Ok(checkpoint)
    }

    /// Load the checkpoint for `(kind, id)`.
    ///
    /// Missing, unreadable and malformed files all yield `None`.
    pub fn load(&self, kind: CheckpointKind, id: &CheckpointId) -> Option<Checkpoint> {
        let path = self.path_for(kind, id);
        match self.read_checkpoint(&path) {
            Ok(checkpoint) => checkpoint,
            Err(err) => {
                debug!(?path, error = %err, "ignoring unreadable checkpoint");
                None
            }
        }
    }

    fn read_checkpoint(&self, path: &Path) -> Result<Option<Checkpoint>> {
        if !self.fs.exists(path) {
            return Ok(None);
        }
        let raw = self.fs.read_to_string(path)?;
        let checkpoint = serde_json::from_str(&raw)
            .with_context(|| format!("parsing checkpoint {:?}", path))?;
        Ok(Some(checkpoint))
    }

    /// Delete every checkpoint file last modified more than `max_age` ago.
    ///
    /// Returns how many were removed; `0` when the directory does not exist.
    pub fn cleanup(&self, max_age: Duration) -> usize {
        let now = SystemTime::now();
        let mut removed = 0;

        for path in self.checkpoint_files() {
            let age = match self.fs.modified(&path) {
                // An mtime in the future counts as brand new.
                Ok(mtime) => now.duration_since(mtime).unwrap_or(Duration::ZERO),
                Err(err) => {
                    debug!(?path, error = %err, "skipping checkpoint without mtime");
                    continue;
                }
            };
            if age <= max_age {
                continue;
            }

            match self.fs.remove_file(&path) {
                Ok(()) => {
                    debug!(?path, age_ms = age.as_millis() as u64, "removed stale checkpoint");
                    removed += 1;
                }
                Err(err) => debug!(?path, error = %err, "failed to remove stale checkpoint"),
            }
        }

        if removed > 0 {
            info!(removed, max_age_ms = max_age.as_millis() as u64, "cleaned up checkpoints");
        }
        removed
    }

    /// Every loadable checkpoint, newest first.
    pub fn list(&self) -> Vec<CheckpointSummary> {
        let mut summaries: Vec<CheckpointSummary> = self
            .checkpoint_files()
            .into_iter()
            .filter_map(|path| {
                let name = path.file_name()?.to_str()?;
                let (kind, id) = parse_checkpoint_file_name(name)?;
                let checkpoint = self.read_checkpoint(&path).ok().flatten()?;
                Some(CheckpointSummary {
                    kind,
                    id,
                    created_at: checkpoint.created_at,
                    pattern_count: checkpoint.patterns.len(),
                    file_count: checkpoint.files.len(),
                })
            })
            .collect();

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        summaries
    }

    fn checkpoint_files(&self) -> Vec<PathBuf> {
        let dir = self.dir();
        if !self.fs.is_dir(&dir) {
            return Vec::new();
        }
        match self.fs.read_dir(&dir) {
            Ok(entries) => entries
                .into_iter()
                .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                .filter(|p| self.fs.is_file(p))
                .collect(),
            Err(err) => {
                debug!(?dir, error = %err, "cannot list checkpoint directory");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn store(fs: &MockFileSystem) -> CheckpointStore {
        CheckpointStore::new(
            Arc::new(fs.clone()),
            ProjectContext::new("/repo", "/cache/projects/-repo"),
        )
    }

    fn id(s: &str) -> CheckpointId {
        CheckpointId::new(s).unwrap()
    }

    fn patterns(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn capture_then_load_round_trips() {
        let fs = MockFileSystem::new();
        fs.add_file("/repo/src/a.ts", b"a");
        fs.add_file("/repo/src/b.ts", b"b");
        fs.add_file("/repo/notes.md", b"n");
        let store = store(&fs);

        assert!(store.capture(CheckpointKind::Session, &id("s1"), &patterns(&["src/**/*.ts"])));

        let cp = store.load(CheckpointKind::Session, &id("s1")).unwrap();
        assert_eq!(cp.kind, CheckpointKind::Session);
        assert_eq!(cp.patterns, vec!["src/**/*.ts"]);
        assert_eq!(cp.files.paths().collect::<Vec<_>>(), vec!["src/a.ts", "src/b.ts"]);
        assert!(fs.is_file(Path::new("/cache/projects/-repo/checkpoints/session_s1.json")));
    }

    #[test]
    fn capture_overwrites_same_key() {
        let fs = MockFileSystem::new();
        fs.add_file("/repo/a.ts", b"v1");
        let store = store(&fs);

        assert!(store.capture(CheckpointKind::Agent, &id("x"), &patterns(&["*.ts"])));
        fs.add_file("/repo/a.ts", b"v2");
        assert!(store.capture(CheckpointKind::Agent, &id("x"), &patterns(&["*.ts"])));

        let cp = store.load(CheckpointKind::Agent, &id("x")).unwrap();
        let expected = crate::manifest::compute_file_hash(&fs, Path::new("/repo/a.ts")).unwrap();
        assert_eq!(cp.files.get("a.ts"), Some(expected.as_str()));
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn capture_reports_false_when_root_is_missing() {
        let fs = MockFileSystem::new();
        let store = CheckpointStore::new(
            Arc::new(fs.clone()),
            ProjectContext::new("/missing", "/cache"),
        );
        assert!(!store.capture(CheckpointKind::Session, &id("s"), &patterns(&["**/*"])));
    }

    #[test]
    fn corrupt_or_incomplete_checkpoints_load_as_none() {
        let fs = MockFileSystem::new();
        fs.add_dir("/repo");
        let store = store(&fs);

        fs.add_file(store.path_for(CheckpointKind::Session, &id("bad")), b"{ not json");
        fs.add_file(
            store.path_for(CheckpointKind::Session, &id("partial")),
            br#"{"created_at":"2025-01-01T00:00:00.000Z","type":"session","files":{}}"#.to_vec(),
        );

        assert!(store.load(CheckpointKind::Session, &id("bad")).is_none());
        assert!(store.load(CheckpointKind::Session, &id("partial")).is_none());
        assert!(store.load(CheckpointKind::Session, &id("absent")).is_none());
    }

    #[test]
    fn cleanup_removes_only_stale_checkpoints() {
        let fs = MockFileSystem::new();
        fs.add_file("/repo/a.ts", b"a");
        let store = store(&fs);

        assert!(store.capture(CheckpointKind::Session, &id("old"), &patterns(&["*.ts"])));
        assert!(store.capture(CheckpointKind::Session, &id("new"), &patterns(&["*.ts"])));
        fs.set_modified(
            store.path_for(CheckpointKind::Session, &id("old")),
            SystemTime::now() - Duration::from_secs(2 * 86_400),
        );

        assert_eq!(store.cleanup(DEFAULT_MAX_AGE), 1);
        assert!(store.load(CheckpointKind::Session, &id("old")).is_none());
        assert!(store.load(CheckpointKind::Session, &id("new")).is_some());
    }

    #[test]
    fn cleanup_without_directory_is_zero() {
        let fs = MockFileSystem::new();
        assert_eq!(store(&fs).cleanup(Duration::from_millis(1)), 0);
    }

    #[test]
    fn list_skips_foreign_and_corrupt_files() {
        let fs = MockFileSystem::new();
        fs.add_file("/repo/a.ts", b"a");
        let store = store(&fs);

        assert!(store.capture(CheckpointKind::Agent, &id("a1"), &patterns(&["*.ts"])));
        fs.add_file(store.dir().join("README.txt"), b"hi");
        fs.add_file(store.dir().join("session_broken.json"), b"{");

        let listed = store.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].kind, CheckpointKind::Agent);
        assert_eq!(listed[0].id, "a1");
        assert_eq!(listed[0].file_count, 1);
    }
}
