// src/exec/runner.rs

//! Runs one configured hook across its target directories.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::change::has_changed;
use crate::checkpoint::{CheckpointId, CheckpointStore};
use crate::config::HookConfig;
use crate::fs::FileSystem;
use crate::hook_cache::HookCache;
use crate::manifest::find_files_with_glob;
use crate::metrics::{HookExecution, MetricsStore};
use crate::project::ProjectContext;
use crate::types::CheckpointKind;

/// Exit code recorded when the process was killed or ended by a signal.
pub const ABNORMAL_EXIT: i32 = -1;

#[derive(Debug, Clone, Default)]
pub struct HookRunOptions {
    /// Run only in this directory instead of the `dirs_with` targets.
    pub directory: Option<PathBuf>,
    /// Skip directories with no changes since this checkpoint.
    pub checkpoint: Option<(CheckpointKind, CheckpointId)>,
    pub no_cache: bool,
    pub session_id: Option<String>,
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookRunOutcome {
    Passed,
    Failed { exit_code: i32 },
    TimedOut,
    /// Nothing in scope changed since the checkpoint.
    SkippedUnchanged,
    /// Nothing in scope changed since the last successful run.
    SkippedCached,
}

impl HookRunOutcome {
    pub fn is_failure(self) -> bool {
        matches!(self, HookRunOutcome::Failed { .. } | HookRunOutcome::TimedOut)
    }

    pub fn is_skipped(self) -> bool {
        matches!(
            self,
            HookRunOutcome::SkippedUnchanged | HookRunOutcome::SkippedCached
        )
    }
}

#[derive(Debug, Clone)]
pub struct HookRunResult {
    pub directory: PathBuf,
    /// Root-relative form of `directory` (`""` for the root).
    pub relative_dir: String,
    pub outcome: HookRunOutcome,
    pub duration_ms: u64,
    /// Combined stdout and stderr of the command.
    pub output: String,
}

/// Everything a hook run touches, resolved once per invocation.
#[derive(Debug, Clone)]
pub struct HookRunner {
    fs: Arc<dyn FileSystem>,
    ctx: ProjectContext,
    checkpoints: CheckpointStore,
    cache: HookCache,
    metrics: Arc<dyn MetricsStore>,
}

impl HookRunner {
    pub fn new(fs: Arc<dyn FileSystem>, ctx: ProjectContext, metrics: Arc<dyn MetricsStore>) -> Self {
        Self {
            checkpoints: CheckpointStore::new(fs.clone(), ctx.clone()),
            cache: HookCache::new(fs.clone(), ctx.clone()),
            fs,
            ctx,
            metrics,
        }
    }

    /// Directories the hook runs in: the explicit one, else every directory
    /// containing a `dirs_with` marker, else the project root.
    pub fn target_directories(&self, hook: &HookConfig, explicit: Option<&Path>) -> Result<Vec<PathBuf>> {
        if let Some(dir) = explicit {
            let dir = self.ctx.absolute_dir(Some(dir));
            if !self.fs.is_dir(&dir) {
                return Err(anyhow!("directory {:?} does not exist", dir));
            }
            if self.ctx.relative_dir(&dir).is_none() {
                return Err(anyhow!(
                    "directory {:?} is not inside project root {:?}",
                    dir,
                    self.ctx.root()
                ));
            }
            return Ok(vec![dir]);
        }

        if hook.dirs_with.is_empty() {
            return Ok(vec![self.ctx.root().to_path_buf()]);
        }

        // A bare marker name matches at any depth.
        let markers: Vec<String> = hook
            .dirs_with
            .iter()
            .map(|m| {
                if m.contains('/') {
                    m.clone()
                } else {
                    format!("**/{m}")
                }
            })
            .collect();

        let dirs: BTreeSet<PathBuf> = find_files_with_glob(self.fs.as_ref(), self.ctx.root(), &markers)?
            .into_iter()
            .filter_map(|file| file.parent().map(Path::to_path_buf))
            .collect();

        Ok(dirs.into_iter().collect())
    }

    /// Run `hook` in each target directory, in order.
    pub async fn run_hook(
        &self,
        plugin: &str,
        hook_name: &str,
        hook: &HookConfig,
        options: &HookRunOptions,
    ) -> Result<Vec<HookRunResult>> {
        let dirs = self.target_directories(hook, options.directory.as_deref())?;
        debug!(plugin, hook = hook_name, dirs = dirs.len(), "resolved hook targets");

        let checkpoint = options
            .checkpoint
            .as_ref()
            .and_then(|(kind, id)| {
                let loaded = self.checkpoints.load(*kind, id);
                if loaded.is_none() {
                    debug!(kind = %kind, id = %id, "no checkpoint to compare against");
                }
                loaded
            });

        let mut results = Vec::with_capacity(dirs.len());
        for dir in dirs {
            let relative_dir = self.ctx.relative_dir(&dir).unwrap_or_default();

            if let Some(outcome) = self.skip_reason(plugin, hook_name, hook, &dir, checkpoint.as_ref(), options) {
                info!(plugin, hook = hook_name, dir = %relative_dir, ?outcome, "skipping hook");
                results.push(HookRunResult {
                    directory: dir,
                    relative_dir,
                    outcome,
                    duration_ms: 0,
                    output: String::new(),
                });
                continue;
            }

            let started = Instant::now();
            let status = run_command(&hook.command, &dir, hook.timeout_secs.map(Duration::from_secs))
                .await
                .with_context(|| format!("running hook '{plugin}/{hook_name}' in {:?}", dir))?;
            let duration_ms = started.elapsed().as_millis() as u64;

            let outcome = match status.exit_code {
                _ if status.timed_out => HookRunOutcome::TimedOut,
                Some(0) => HookRunOutcome::Passed,
                Some(code) => HookRunOutcome::Failed { exit_code: code },
                None => HookRunOutcome::Failed { exit_code: ABNORMAL_EXIT },
            };
            info!(plugin, hook = hook_name, dir = %relative_dir, ?outcome, duration_ms, "hook finished");

            self.record(plugin, hook_name, &relative_dir, outcome, duration_ms, options);

            if outcome == HookRunOutcome::Passed && !hook.if_changed.is_empty() {
                self.cache.track_files(plugin, hook_name, &dir, &hook.if_changed);
            }

            results.push(HookRunResult {
                directory: dir,
                relative_dir,
                outcome,
                duration_ms,
                output: status.output,
            });
        }

        Ok(results)
    }

    fn skip_reason(
        &self,
        plugin: &str,
        hook_name: &str,
        hook: &HookConfig,
        dir: &Path,
        checkpoint: Option<&crate::checkpoint::Checkpoint>,
        options: &HookRunOptions,
    ) -> Option<HookRunOutcome> {
        if hook.if_changed.is_empty() {
            return None;
        }
        if let Some(cp) = checkpoint {
            if !has_changed(self.fs.as_ref(), self.ctx.root(), cp, dir, &hook.if_changed) {
                return Some(HookRunOutcome::SkippedUnchanged);
            }
        }
        if !options.no_cache && self.cache.is_cache_hit(plugin, hook_name, dir, &hook.if_changed) {
            return Some(HookRunOutcome::SkippedCached);
        }
        None
    }

    fn record(
        &self,
        plugin: &str,
        hook_name: &str,
        relative_dir: &str,
        outcome: HookRunOutcome,
        duration_ms: u64,
        options: &HookRunOptions,
    ) {
        let exit_code = match outcome {
            HookRunOutcome::Failed { exit_code } => exit_code,
            HookRunOutcome::TimedOut => ABNORMAL_EXIT,
            _ => 0,
        };
        let execution = HookExecution {
            hook_name: hook_name.to_string(),
            hook_source: Some(plugin.to_string()),
            session_id: options.session_id.clone(),
            task_id: options.task_id.clone(),
            directory: Some(relative_dir.to_string()),
            duration_ms,
            exit_code,
            passed: outcome == HookRunOutcome::Passed,
            timestamp: Utc::now(),
        };
        if let Err(err) = self.metrics.append_hook_execution(&execution) {
            warn!(plugin, hook = hook_name, error = %err, "failed to record hook execution");
        }
    }
}

#[derive(Debug)]
struct CommandStatus {
    exit_code: Option<i32>,
    timed_out: bool,
    output: String,
}

async fn run_command(command: &str, dir: &Path, timeout: Option<Duration>) -> Result<CommandStatus> {
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    };

    cmd.current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(%command, ?dir, "spawning hook process");
    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning `{command}`"))?;

    let stdout = tokio::spawn(collect_lines(child.stdout.take(), false));
    let stderr = tokio::spawn(collect_lines(child.stderr.take(), true));

    let wait = match timeout {
        Some(limit) => tokio::time::timeout(limit, child.wait()).await.ok(),
        None => Some(child.wait().await),
    };

    let Some(status) = wait else {
        warn!(%command, ?dir, "hook timed out; killing process");
        if let Err(err) = child.kill().await {
            warn!(error = %err, "failed to kill timed out hook process");
        }
        stdout.abort();
        stderr.abort();
        return Ok(CommandStatus {
            exit_code: None,
            timed_out: true,
            output: String::new(),
        });
    };
    let status = status.context("waiting for hook process")?;

    let mut output = stdout.await.unwrap_or_default();
    output.push_str(&stderr.await.unwrap_or_default());

    Ok(CommandStatus {
        exit_code: status.code(),
        timed_out: false,
        output,
    })
}

async fn collect_lines<R: AsyncRead + Unpin>(reader: Option<R>, is_stderr: bool) -> String {
    let Some(reader) = reader else {
        return String::new();
    };

    let mut collected = String::new();
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if is_stderr {
            debug!("stderr: {}", line);
        }
        collected.push_str(&line);
        collected.push('\n');
    }
    collected
}
