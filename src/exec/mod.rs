// src/exec/mod.rs

//! Process execution layer.
//!
//! [`runner`] resolves a hook's target directories, decides per directory
//! whether the hook can be skipped (checkpoint unchanged, cache hit), runs
//! the command with `tokio::process::Command` and records the outcome.

pub mod runner;

pub use runner::{HookRunOptions, HookRunOutcome, HookRunResult, HookRunner};
