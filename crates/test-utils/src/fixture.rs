#![allow(dead_code)]

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use hookwise::project::ProjectContext;
use tempfile::TempDir;

/// A throwaway project root plus its own cache directory.
///
/// Both live in one temp dir that is removed on drop, so fixtures never
/// share checkpoint, cache or metrics state.
pub struct ProjectFixture {
    _tmp: TempDir,
    root: PathBuf,
    cache: PathBuf,
}

impl ProjectFixture {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        // Canonical paths keep root-relative computations stable on systems
        // where the temp dir is behind a symlink.
        let base = tmp.path().canonicalize().expect("canonicalize temp dir");
        let root = base.join("project");
        let cache = base.join("cache");
        fs::create_dir_all(&root).expect("create project root");
        Self {
            _tmp: tmp,
            root,
            cache,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache
    }

    pub fn context(&self) -> ProjectContext {
        ProjectContext::new(&self.root, &self.cache)
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Write `content` at `rel`, creating parent directories.
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, content).expect("write fixture file");
        path
    }

    pub fn remove(&self, rel: &str) {
        fs::remove_file(self.path(rel)).expect("remove fixture file");
    }

    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let path = self.path(rel);
        fs::create_dir_all(&path).expect("create fixture dir");
        path
    }

    /// Backdate the modification time of an arbitrary file.
    pub fn set_age(path: &Path, age: Duration) {
        let file = File::options().write(true).open(path).expect("open for mtime");
        file.set_modified(SystemTime::now() - age)
            .expect("set modification time");
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}
