// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::types::{CheckpointKind, Period, Severity, TaskOutcome};

/// Command-line arguments for `hookwise`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "hookwise",
    version,
    about = "Skip validation hooks when nothing they care about changed.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `hookwise.toml` in the project root, if present.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Project root. Defaults to `HOOKWISE_PROJECT_DIR`, then
    /// `CLAUDE_PROJECT_DIR`, then the current directory.
    #[arg(long, global = true, value_name = "DIR")]
    pub project_root: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `HOOKWISE_LOG` or `warn` is used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Capture, inspect and clean file-state checkpoints.
    #[command(subcommand)]
    Checkpoint(CheckpointCommand),

    /// Inspect or maintain the per-hook cache.
    #[command(subcommand)]
    Cache(CacheCommand),

    /// Run configured hooks.
    #[command(subcommand)]
    Hook(HookCommand),

    /// Record task lifecycle events and hook executions.
    #[command(subcommand)]
    Metrics(MetricsCommand),

    /// Report behavioral patterns found in the recorded history.
    Patterns(PatternsArgs),
}

#[derive(Debug, Clone, Subcommand)]
pub enum CheckpointCommand {
    /// Snapshot the current file state for a session or agent.
    Capture {
        #[arg(long = "type", value_name = "TYPE", value_parser = parse_kind)]
        kind: CheckpointKind,
        #[arg(long, value_name = "ID")]
        id: String,
        /// Glob to include (repeatable). Defaults to every plugin's
        /// `if_changed` patterns, or `**/*` when there are none.
        #[arg(long = "pattern", value_name = "GLOB")]
        patterns: Vec<String>,
    },

    /// List stored checkpoints, newest first.
    List {
        #[arg(long)]
        json: bool,
    },

    /// Delete checkpoints older than the given age.
    Clean {
        /// Maximum age in hours (fractions allowed). Defaults to
        /// `[config].checkpoint_max_age_hours`.
        #[arg(long, value_name = "HOURS", allow_negative_numbers = true)]
        max_age: Option<f64>,
    },

    /// Show which files changed since a checkpoint.
    Diff {
        #[arg(long = "type", value_name = "TYPE", value_parser = parse_kind)]
        kind: CheckpointKind,
        #[arg(long, value_name = "ID")]
        id: String,
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
        #[arg(long = "pattern", value_name = "GLOB")]
        patterns: Vec<String>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct CacheTarget {
    #[arg(long, value_name = "PLUGIN")]
    pub plugin: String,
    #[arg(long, value_name = "HOOK")]
    pub hook: String,
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CacheCommand {
    /// Exit 0 on a cache hit, 1 on a miss.
    Check(CacheTarget),
    /// Record the hook's current file state as passing.
    Update(CacheTarget),
    /// Drop one entry (with `--plugin`/`--hook`) or every entry.
    Clear {
        #[arg(long, value_name = "PLUGIN", requires = "hook")]
        plugin: Option<String>,
        #[arg(long, value_name = "HOOK", requires = "plugin")]
        hook: Option<String>,
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum HookCommand {
    /// Run one hook in its target directories.
    Run {
        plugin: String,
        hook: String,
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
        /// Skip directories unchanged since this session's checkpoint.
        #[arg(long, value_name = "ID", conflicts_with = "agent")]
        session: Option<String>,
        /// Skip directories unchanged since this agent's checkpoint.
        #[arg(long, value_name = "ID")]
        agent: Option<String>,
        /// Task the execution is attributed to.
        #[arg(long, value_name = "ID")]
        task: Option<String>,
        /// Ignore the hook cache.
        #[arg(long)]
        no_cache: bool,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum MetricsCommand {
    /// Record the start of a task.
    TaskStart {
        #[arg(long, value_name = "ID")]
        id: String,
        #[arg(long = "type", value_name = "TYPE")]
        task_type: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, value_name = "ID")]
        session: Option<String>,
    },

    /// Record the outcome of a task.
    TaskComplete {
        #[arg(long, value_name = "ID")]
        id: String,
        #[arg(long, value_parser = parse_outcome)]
        outcome: TaskOutcome,
        #[arg(long)]
        confidence: f64,
    },

    /// Read one hook event (JSON) from stdin and record it.
    RecordHook,

    /// Delete all recorded metrics for this project.
    Reset,
}

#[derive(Debug, Clone, Args)]
pub struct PatternsArgs {
    /// Emit JSON instead of markdown.
    #[arg(long)]
    pub json: bool,

    #[arg(long, value_name = "SEVERITY", value_parser = parse_severity, default_value = "low")]
    pub min_severity: Severity,

    /// Trailing window. Defaults to `[config].period`.
    #[arg(long, value_parser = parse_period)]
    pub period: Option<Period>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_kind(s: &str) -> Result<CheckpointKind, String> {
    s.parse()
}

fn parse_outcome(s: &str) -> Result<TaskOutcome, String> {
    s.parse()
}

fn parse_severity(s: &str) -> Result<Severity, String> {
    s.parse()
}

fn parse_period(s: &str) -> Result<Period, String> {
    s.parse()
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
