// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{HookwiseError, Result};

pub const CONFIG_FILE_NAME: &str = "hookwise.toml";

/// Read and deserialize a configuration file without validating it.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Read, deserialize and validate a configuration file.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// `hookwise.toml` at the project root.
pub fn default_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_FILE_NAME)
}

/// Load the configuration for a run.
///
/// An explicit path must exist. Without one, `<project root>/hookwise.toml`
/// is used when present and the default (empty) configuration otherwise.
pub fn load_or_default(explicit: Option<&Path>, project_root: &Path) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(HookwiseError::ConfigError(format!(
                "config file {:?} does not exist",
                path
            )));
        }
        return load_and_validate(path);
    }

    let path = default_config_path(project_root);
    if path.is_file() {
        debug!(?path, "loading config");
        load_and_validate(&path)
    } else {
        debug!(?path, "no config file; using defaults");
        Ok(ConfigFile::default())
    }
}
