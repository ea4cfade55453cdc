// src/lib.rs

pub mod change;
pub mod checkpoint;
pub mod cli;
pub mod commands;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod hook_cache;
pub mod logging;
pub mod manifest;
pub mod metrics;
pub mod patterns;
pub mod project;
pub mod timestamp;
pub mod types;

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::cli::{CacheCommand, CheckpointCommand, CliArgs, Command, HookCommand, MetricsCommand};
use crate::commands::App;
use crate::config::load_or_default;
use crate::project::ProjectContext;

/// High-level entry point used by `main.rs`.
///
/// Resolves the project, loads the config and dispatches the subcommand.
/// Returns the process exit code.
pub async fn run(args: CliArgs) -> Result<i32> {
    let ctx = ProjectContext::resolve(args.project_root.as_deref())?;
    let config = load_or_default(args.config.as_deref(), ctx.root())?;
    debug!(root = ?ctx.root(), plugins = config.plugin.len(), "starting");

    let app = App::new(ctx, config);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let code = dispatch(&app, args.command, &mut out).await?;
    out.flush()?;
    Ok(code)
}

async fn dispatch(app: &App, command: Command, out: &mut dyn Write) -> errors::Result<i32> {
    match command {
        Command::Checkpoint(cmd) => match cmd {
            CheckpointCommand::Capture { kind, id, patterns } => {
                commands::checkpoint::capture(app, kind, &id, &patterns, out)
            }
            CheckpointCommand::List { json } => commands::checkpoint::list(app, json, out),
            CheckpointCommand::Clean { max_age } => commands::checkpoint::clean(app, max_age, out),
            CheckpointCommand::Diff {
                kind,
                id,
                dir,
                patterns,
            } => commands::checkpoint::diff(app, kind, &id, dir.as_deref(), &patterns, out),
        },

        Command::Cache(cmd) => match cmd {
            CacheCommand::Check(target) => commands::cache::check(app, &target, out),
            CacheCommand::Update(target) => commands::cache::update(app, &target, out),
            CacheCommand::Clear { plugin, hook, dir } => commands::cache::clear(
                app,
                plugin.as_deref(),
                hook.as_deref(),
                dir.as_deref(),
                out,
            ),
        },

        Command::Hook(HookCommand::Run {
            plugin,
            hook,
            dir,
            session,
            agent,
            task,
            no_cache,
        }) => {
            let request = commands::hook::RunRequest {
                plugin,
                hook,
                dir,
                session,
                agent,
                task,
                no_cache,
            };
            let metrics = Arc::new(app.metrics_store());
            commands::hook::run(app, metrics, &request, out).await
        }

        Command::Metrics(cmd) => {
            let store = app.metrics_store();
            match cmd {
                MetricsCommand::TaskStart {
                    id,
                    task_type,
                    description,
                    session,
                } => commands::metrics::task_start(
                    &store,
                    &id,
                    &task_type,
                    &description,
                    session.as_deref(),
                    out,
                ),
                MetricsCommand::TaskComplete {
                    id,
                    outcome,
                    confidence,
                } => commands::metrics::task_complete(&store, &id, outcome, confidence, out),
                MetricsCommand::RecordHook => {
                    let mut stdin = std::io::stdin().lock();
                    commands::metrics::record_hook(&store, &mut stdin, out)
                }
                MetricsCommand::Reset => commands::metrics::reset(&store, out),
            }
        }

        Command::Patterns(args) => {
            let store = app.metrics_store();
            commands::patterns::run(&app.config, &store, &args, out)
        }
    }
}
