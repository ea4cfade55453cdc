// src/commands/checkpoint.rs

use std::io::Write;
use std::path::Path;

use crate::change::changed_files;
use crate::checkpoint::{CheckpointId, CheckpointStore};
use crate::commands::{max_age_from_hours, App};
use crate::errors::{HookwiseError, Result};
use crate::types::CheckpointKind;

/// Pattern used when neither the command line nor any plugin names one.
pub const FALLBACK_PATTERN: &str = "**/*";

fn store(app: &App) -> CheckpointStore {
    CheckpointStore::new(app.fs.clone(), app.ctx.clone())
}

/// Patterns for a capture: explicit ones, else every enabled plugin's
/// `if_changed`, else everything.
pub fn capture_patterns(app: &App, explicit: &[String]) -> Vec<String> {
    if !explicit.is_empty() {
        return explicit.to_vec();
    }
    let declared = app.config.collect_if_changed_patterns();
    if declared.is_empty() {
        vec![FALLBACK_PATTERN.to_string()]
    } else {
        declared
    }
}

pub fn capture(
    app: &App,
    kind: CheckpointKind,
    id: &str,
    patterns: &[String],
    out: &mut dyn Write,
) -> Result<i32> {
    let id = CheckpointId::new(id)?;
    let patterns = capture_patterns(app, patterns);
    let checkpoint = store(app).capture_checkpoint(kind, &id, &patterns)?;

    writeln!(
        out,
        "Captured {kind} checkpoint {id} ({} files)",
        checkpoint.files.len()
    )?;
    Ok(0)
}

pub fn list(app: &App, json: bool, out: &mut dyn Write) -> Result<i32> {
    let summaries = store(app).list();

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&summaries)?)?;
        return Ok(0);
    }
    if summaries.is_empty() {
        writeln!(out, "No checkpoints.")?;
        return Ok(0);
    }
    for s in &summaries {
        writeln!(
            out,
            "{:<8} {:<36} {}  {} files",
            s.kind.as_str(),
            s.id,
            crate::timestamp::format(&s.created_at),
            s.file_count
        )?;
    }
    Ok(0)
}

pub fn clean(app: &App, max_age_hours: Option<f64>, out: &mut dyn Write) -> Result<i32> {
    let hours = max_age_hours.unwrap_or(app.config.config.checkpoint_max_age_hours);
    let max_age = max_age_from_hours(hours)?;

    let removed = store(app).cleanup(max_age);
    writeln!(out, "Removed {removed} checkpoint(s) older than {hours}h")?;
    Ok(0)
}

pub fn diff(
    app: &App,
    kind: CheckpointKind,
    id: &str,
    dir: Option<&Path>,
    patterns: &[String],
    out: &mut dyn Write,
) -> Result<i32> {
    let id = CheckpointId::new(id)?;
    let checkpoint = store(app).load(kind, &id).ok_or_else(|| {
        HookwiseError::InvalidArgument(format!("no {kind} checkpoint named '{id}'"))
    })?;

    let patterns = if patterns.is_empty() {
        checkpoint.patterns.clone()
    } else {
        patterns.to_vec()
    };
    let directory = app.ctx.absolute_dir(dir);
    let changes = changed_files(
        app.fs.as_ref(),
        app.ctx.root(),
        &checkpoint,
        &directory,
        &patterns,
    )?;

    if changes.is_empty() {
        writeln!(out, "No changes since {kind} checkpoint {id}.")?;
        return Ok(0);
    }
    for path in &changes.added {
        writeln!(out, "+ {path}")?;
    }
    for path in &changes.removed {
        writeln!(out, "- {path}")?;
    }
    for path in &changes.modified {
        writeln!(out, "~ {path}")?;
    }
    Ok(0)
}
