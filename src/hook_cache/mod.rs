// src/hook_cache/mod.rs

//! Per-(plugin, hook, directory) cache of the files a hook declared in its
//! `if_changed` scope.
//!
//! An entry is the manifest recorded after the hook last passed in that
//! directory. The next invocation is a hit only if a freshly built manifest
//! is identical: same paths, same digests. This cache is consulted on every
//! hook invocation and is kept independent from checkpoints.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info, warn};

use crate::fs::FileSystem;
use crate::manifest::{build_manifest, find_files_with_glob, Manifest};
use crate::project::path_utils::directory_key;
use crate::project::ProjectContext;

/// Identity of a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub plugin: String,
    pub hook: String,
    /// Root-relative directory folded into one segment (`"root"` for the
    /// project root).
    pub directory: String,
}

impl CacheKey {
    pub fn new(plugin: &str, hook: &str, rel_dir: &str) -> Self {
        Self {
            plugin: plugin.to_string(),
            hook: hook.to_string(),
            directory: directory_key(rel_dir),
        }
    }

    /// `<plugin with / as _>_<hook>_<directory key>.json`
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}.json",
            self.plugin.replace(['/', '\\'], "_"),
            self.hook.replace(['/', '\\'], "_"),
            self.directory
        )
    }
}

/// File-backed hook cache under `<cache dir>/hook-cache/`.
#[derive(Debug, Clone)]
pub struct HookCache {
    fs: Arc<dyn FileSystem>,
    ctx: ProjectContext,
}

impl HookCache {
    pub fn new(fs: Arc<dyn FileSystem>, ctx: ProjectContext) -> Self {
        Self { fs, ctx }
    }

    pub fn dir(&self) -> PathBuf {
        self.ctx.hook_cache_dir()
    }

    pub fn key_for(&self, plugin: &str, hook: &str, directory: &Path) -> Result<CacheKey> {
        let rel = self.ctx.relative_dir(directory).ok_or_else(|| {
            anyhow!(
                "directory {:?} is not inside project root {:?}",
                directory,
                self.ctx.root()
            )
        })?;
        Ok(CacheKey::new(plugin, hook, &rel))
    }

    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir().join(key.file_name())
    }

    /// Manifest of the files matching `patterns` under `directory`, keyed
    /// relative to `directory`.
    pub fn current_manifest(&self, directory: &Path, patterns: &[String]) -> Result<Manifest> {
        let directory = self.ctx.absolute_dir(Some(directory));
        let files = find_files_with_glob(self.fs.as_ref(), &directory, patterns)?;
        Ok(build_manifest(self.fs.as_ref(), &files, &directory))
    }

    /// True when nothing in the hook's scope changed since the last
    /// successful run in `directory`. Any error is a miss.
    pub fn is_cache_hit(&self, plugin: &str, hook: &str, directory: &Path, patterns: &[String]) -> bool {
        let result = self.key_for(plugin, hook, directory).and_then(|key| {
            let Some(cached) = self.load_entry(&key) else {
                debug!(file = %key.file_name(), "no hook cache entry");
                return Ok(false);
            };
            let current = self.current_manifest(directory, patterns)?;
            Ok(cached == current)
        });

        match result {
            Ok(hit) => {
                debug!(plugin, hook, ?directory, hit, "hook cache lookup");
                hit
            }
            Err(err) => {
                debug!(plugin, hook, ?directory, error = %err, "hook cache lookup failed; treating as miss");
                false
            }
        }
    }

    /// Persist `manifest` as the entry for `(plugin, hook, directory)`.
    pub fn update_cache(&self, plugin: &str, hook: &str, directory: &Path, manifest: &Manifest) -> bool {
        match self.write_entry(plugin, hook, directory, manifest) {
            Ok(path) => {
                debug!(?path, files = manifest.len(), "updated hook cache");
                true
            }
            Err(err) => {
                warn!(plugin, hook, ?directory, error = %err, "failed to update hook cache");
                false
            }
        }
    }

    fn write_entry(&self, plugin: &str, hook: &str, directory: &Path, manifest: &Manifest) -> Result<PathBuf> {
        let key = self.key_for(plugin, hook, directory)?;
        let path = self.entry_path(&key);
        let body = serde_json::to_vec_pretty(manifest).context("serializing hook cache entry")?;
        self.fs
            .write(&path, &body)
            .with_context(|| format!("writing hook cache entry {:?}", path))?;
        Ok(path)
    }

    /// Build the current manifest for `patterns` and store it in one step.
    pub fn track_files(&self, plugin: &str, hook: &str, directory: &Path, patterns: &[String]) -> bool {
        match self.current_manifest(directory, patterns) {
            Ok(manifest) => self.update_cache(plugin, hook, directory, &manifest),
            Err(err) => {
                warn!(plugin, hook, ?directory, error = %err, "failed to hash hook scope");
                false
            }
        }
    }

    /// Stored manifest for `key`; missing or corrupt entries are `None`.
    pub fn load_entry(&self, key: &CacheKey) -> Option<Manifest> {
        let path = self.entry_path(key);
        if !self.fs.exists(&path) {
            return None;
        }
        let parsed = self
            .fs
            .read_to_string(&path)
            .and_then(|raw| serde_json::from_str(&raw).map_err(anyhow::Error::from));
        match parsed {
            Ok(manifest) => Some(manifest),
            Err(err) => {
                debug!(?path, error = %err, "ignoring corrupt hook cache entry");
                None
            }
        }
    }

    /// Drop the entry for one hook and directory. Returns whether one existed.
    pub fn invalidate(&self, plugin: &str, hook: &str, directory: &Path) -> bool {
        let Ok(key) = self.key_for(plugin, hook, directory) else {
            return false;
        };
        let path = self.entry_path(&key);
        if !self.fs.exists(&path) {
            return false;
        }
        match self.fs.remove_file(&path) {
            Ok(()) => true,
            Err(err) => {
                debug!(?path, error = %err, "failed to invalidate hook cache entry");
                false
            }
        }
    }

    /// Remove every entry; returns how many were deleted.
    pub fn clear(&self) -> usize {
        let dir = self.dir();
        if !self.fs.is_dir(&dir) {
            return 0;
        }
        let entries = match self.fs.read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(?dir, error = %err, "cannot list hook cache directory");
                return 0;
            }
        };

        let removed = entries
            .into_iter()
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .filter(|p| self.fs.remove_file(p).is_ok())
            .count();
        info!(removed, "cleared hook cache");
        removed
    }
}
