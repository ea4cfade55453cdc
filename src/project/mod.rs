// src/project/mod.rs

//! Project root and per-project storage locations.
//!
//! A [`ProjectContext`] is resolved once per process and passed explicitly to
//! every store, so two contexts (e.g. in tests) never share state.

pub mod path_utils;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{HookwiseError, Result};

/// Environment variable overriding the shared configuration directory.
pub const CONFIG_DIR_ENV: &str = "HOOKWISE_CONFIG_DIR";

/// Environment variables consulted (in order) for the project root.
pub const PROJECT_DIR_ENVS: &[&str] = &["HOOKWISE_PROJECT_DIR", "CLAUDE_PROJECT_DIR"];

/// Project root plus the cache directory derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    root: PathBuf,
    cache_dir: PathBuf,
}

impl ProjectContext {
    /// Build a context from explicit locations.
    pub fn new(root: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache_dir: cache_dir.into(),
        }
    }

    /// Resolve the project root and its cache directory.
    ///
    /// Root priority:
    /// 1. `explicit_root` (the `--project-root` flag)
    /// 2. `HOOKWISE_PROJECT_DIR`, then `CLAUDE_PROJECT_DIR`
    /// 3. the current working directory
    ///
    /// The cache directory is `<config dir>/projects/<slug of root>`.
    pub fn resolve(explicit_root: Option<&Path>) -> Result<Self> {
        let candidate = match explicit_root {
            Some(root) => root.to_path_buf(),
            None => PROJECT_DIR_ENVS
                .iter()
                .filter_map(|var| std::env::var_os(var))
                .find(|v| !v.is_empty())
                .map(PathBuf::from)
                .map_or_else(std::env::current_dir, Ok)?,
        };

        let root = candidate.canonicalize().map_err(|e| {
            HookwiseError::InvalidArgument(format!(
                "project root {:?} is not accessible: {e}",
                candidate
            ))
        })?;

        let cache_dir = config_dir()?
            .join("projects")
            .join(path_utils::project_slug(&root));

        debug!(?root, ?cache_dir, "resolved project context");
        Ok(Self { root, cache_dir })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn checkpoint_dir(&self) -> PathBuf {
        self.cache_dir.join("checkpoints")
    }

    pub fn hook_cache_dir(&self) -> PathBuf {
        self.cache_dir.join("hook-cache")
    }

    pub fn metrics_dir(&self) -> PathBuf {
        self.cache_dir.join("metrics")
    }

    /// Directory relative to the project root, `""` for the root itself.
    ///
    /// Relative inputs are taken relative to the root.
    pub fn relative_dir(&self, directory: &Path) -> Option<String> {
        let absolute = if directory.is_absolute() {
            directory.to_path_buf()
        } else {
            self.root.join(directory)
        };
        path_utils::relative_str(&self.root, &absolute)
    }

    /// Absolute form of a directory given on the command line.
    pub fn absolute_dir(&self, directory: Option<&Path>) -> PathBuf {
        match directory {
            Some(dir) if dir.is_absolute() => dir.to_path_buf(),
            Some(dir) => self.root.join(dir),
            None => self.root.clone(),
        }
    }
}

/// Shared configuration directory: `HOOKWISE_CONFIG_DIR`, else `~/.hookwise`.
pub fn config_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".hookwise"))
        .ok_or_else(|| {
            HookwiseError::ConfigError(format!(
                "cannot determine home directory; set {CONFIG_DIR_ENV}"
            ))
        })
}
