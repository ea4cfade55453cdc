// src/config/mod.rs

//! `hookwise.toml`: plugins, their hooks, and defaults for the CLI.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default, CONFIG_FILE_NAME};
pub use model::{ConfigFile, ConfigSection, HookConfig, PluginConfig, RawConfigFile};
