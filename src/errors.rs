// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Only user-facing entry points surface these. The checkpoint, change and
//! cache layers collapse their internal failures into `None`/`false`/"changed"
//! before anything reaches a caller.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HookwiseError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown hook: {plugin}/{hook}")]
    UnknownHook { plugin: String, hook: String },

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, HookwiseError>;
