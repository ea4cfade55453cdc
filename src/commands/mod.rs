// src/commands/mod.rs

//! Subcommand implementations.
//!
//! Each handler writes its human-readable result to the given writer and
//! returns the process exit code; user errors come back as `HookwiseError`.

pub mod cache;
pub mod checkpoint;
pub mod hook;
pub mod metrics;
pub mod patterns;

use std::sync::Arc;
use std::time::Duration;

use crate::config::ConfigFile;
use crate::errors::{HookwiseError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::metrics::JsonlMetricsStore;
use crate::project::ProjectContext;

/// Resolved state shared by every subcommand.
#[derive(Debug, Clone)]
pub struct App {
    pub ctx: ProjectContext,
    pub config: ConfigFile,
    pub fs: Arc<dyn FileSystem>,
}

impl App {
    pub fn new(ctx: ProjectContext, config: ConfigFile) -> Self {
        Self {
            ctx,
            config,
            fs: Arc::new(RealFileSystem),
        }
    }

    pub fn metrics_store(&self) -> JsonlMetricsStore {
        JsonlMetricsStore::for_project(&self.ctx)
    }
}

/// Convert a `--max-age` value in hours into a duration.
///
/// NaN, infinite, zero and negative values are rejected.
pub fn max_age_from_hours(hours: f64) -> Result<Duration> {
    if !hours.is_finite() || hours <= 0.0 {
        return Err(HookwiseError::InvalidArgument(format!(
            "--max-age must be a positive number of hours (got {hours})"
        )));
    }
    Duration::try_from_secs_f64(hours * 3600.0).map_err(|e| {
        HookwiseError::InvalidArgument(format!("--max-age {hours} is out of range: {e}"))
    })
}
