// src/commands/hook.rs

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use crate::checkpoint::CheckpointId;
use crate::commands::App;
use crate::errors::Result;
use crate::exec::{HookRunOptions, HookRunOutcome, HookRunner};
use crate::metrics::MetricsStore;
use crate::types::CheckpointKind;

#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub plugin: String,
    pub hook: String,
    pub dir: Option<PathBuf>,
    pub session: Option<String>,
    pub agent: Option<String>,
    pub task: Option<String>,
    pub no_cache: bool,
}

/// Run a hook and report per directory. Exit code 1 when any run failed.
pub async fn run(
    app: &App,
    metrics: Arc<dyn MetricsStore>,
    request: &RunRequest,
    out: &mut dyn Write,
) -> Result<i32> {
    let hook = app.config.hook(&request.plugin, &request.hook)?;

    let checkpoint = match (&request.session, &request.agent) {
        (Some(id), _) => Some((CheckpointKind::Session, CheckpointId::new(id)?)),
        (None, Some(id)) => Some((CheckpointKind::Agent, CheckpointId::new(id)?)),
        (None, None) => None,
    };
    let options = HookRunOptions {
        directory: request.dir.clone(),
        checkpoint,
        no_cache: request.no_cache,
        session_id: request.session.clone(),
        task_id: request.task.clone(),
    };

    let runner = HookRunner::new(app.fs.clone(), app.ctx.clone(), metrics);
    let results = runner
        .run_hook(&request.plugin, &request.hook, hook, &options)
        .await?;

    let mut failed = false;
    for result in &results {
        let dir = if result.relative_dir.is_empty() {
            "."
        } else {
            result.relative_dir.as_str()
        };
        let status = match result.outcome {
            HookRunOutcome::Passed => format!("passed ({} ms)", result.duration_ms),
            HookRunOutcome::Failed { exit_code } => {
                format!("failed with exit code {exit_code} ({} ms)", result.duration_ms)
            }
            HookRunOutcome::TimedOut => "timed out".to_string(),
            HookRunOutcome::SkippedUnchanged => "skipped (no changes since checkpoint)".to_string(),
            HookRunOutcome::SkippedCached => "skipped (cached)".to_string(),
        };
        writeln!(out, "{}/{} [{dir}]: {status}", request.plugin, request.hook)?;

        if result.outcome.is_failure() {
            failed = true;
            if !result.output.is_empty() {
                write!(out, "{}", result.output)?;
            }
        }
    }

    Ok(if failed { 1 } else { 0 })
}
