// tests/hook_runner.rs
#![cfg(unix)]

mod common;

use std::sync::Arc;

use common::{checkpoint_store, id, patterns, TestResult};
use hookwise::exec::{HookRunOptions, HookRunOutcome, HookRunner};
use hookwise::fs::RealFileSystem;
use hookwise::metrics::{MemoryMetricsStore, MetricsStore};
use hookwise::types::CheckpointKind;
use hookwise_test_utils::builders::HookConfigBuilder;
use hookwise_test_utils::{init_tracing, with_timeout, ProjectFixture};

fn project() -> ProjectFixture {
    let fx = ProjectFixture::new();
    fx.write("packages/web/package.json", "{}");
    fx.write("packages/web/index.ts", "web");
    fx.write("packages/api/package.json", "{}");
    fx.write("packages/api/index.ts", "api");
    fx
}

fn runner(fx: &ProjectFixture, metrics: Arc<MemoryMetricsStore>) -> HookRunner {
    HookRunner::new(Arc::new(RealFileSystem), fx.context(), metrics)
}

#[tokio::test]
async fn runs_once_per_marker_directory_and_records_executions() -> TestResult {
    init_tracing();
    let fx = project();
    let metrics = Arc::new(MemoryMetricsStore::new());
    let hook = HookConfigBuilder::new("test -f package.json")
        .if_changed("**/*.ts")
        .dirs_with("package.json")
        .build();

    let results = with_timeout(runner(&fx, metrics.clone()).run_hook(
        "jutsu-bun",
        "check",
        &hook,
        &HookRunOptions::default(),
    ))
    .await?;

    let dirs: Vec<_> = results.iter().map(|r| r.relative_dir.as_str()).collect();
    assert_eq!(dirs, vec!["packages/api", "packages/web"]);
    assert!(results.iter().all(|r| r.outcome == HookRunOutcome::Passed));

    let recorded = metrics.load_hook_executions()?;
    assert_eq!(recorded.len(), 2);
    assert!(recorded.iter().all(|e| e.passed && e.hook_source.as_deref() == Some("jutsu-bun")));
    Ok(())
}

#[tokio::test]
async fn passing_runs_are_cached_until_files_change() -> TestResult {
    init_tracing();
    let fx = project();
    let metrics = Arc::new(MemoryMetricsStore::new());
    let runner = runner(&fx, metrics.clone());
    let hook = HookConfigBuilder::new("true").if_changed("**/*.ts").build();
    let options = HookRunOptions {
        directory: Some(fx.path("packages/web")),
        ..Default::default()
    };

    let first = with_timeout(runner.run_hook("p", "lint", &hook, &options)).await?;
    assert_eq!(first[0].outcome, HookRunOutcome::Passed);

    let second = with_timeout(runner.run_hook("p", "lint", &hook, &options)).await?;
    assert_eq!(second[0].outcome, HookRunOutcome::SkippedCached);

    let forced = HookRunOptions {
        no_cache: true,
        ..options.clone()
    };
    let third = with_timeout(runner.run_hook("p", "lint", &hook, &forced)).await?;
    assert_eq!(third[0].outcome, HookRunOutcome::Passed);

    fx.write("packages/web/index.ts", "web v2");
    let fourth = with_timeout(runner.run_hook("p", "lint", &hook, &options)).await?;
    assert_eq!(fourth[0].outcome, HookRunOutcome::Passed);

    // Skipped runs are not recorded.
    assert_eq!(metrics.load_hook_executions()?.len(), 3);
    Ok(())
}

#[tokio::test]
async fn failures_are_reported_recorded_and_never_cached() -> TestResult {
    init_tracing();
    let fx = project();
    let metrics = Arc::new(MemoryMetricsStore::new());
    let runner = runner(&fx, metrics.clone());
    let hook = HookConfigBuilder::new("echo broken >&2; exit 3")
        .if_changed("**/*.ts")
        .build();

    for _ in 0..2 {
        let results = with_timeout(runner.run_hook("p", "lint", &hook, &HookRunOptions::default())).await?;
        assert_eq!(results[0].outcome, HookRunOutcome::Failed { exit_code: 3 });
        assert!(results[0].output.contains("broken"));
    }

    let recorded = metrics.load_hook_executions()?;
    assert_eq!(recorded.len(), 2);
    assert_eq!(recorded[0].exit_code, 3);
    assert!(!recorded[0].passed);
    Ok(())
}

#[tokio::test]
async fn unchanged_checkpoint_skips_the_run() -> TestResult {
    init_tracing();
    let fx = project();
    let metrics = Arc::new(MemoryMetricsStore::new());
    let runner = runner(&fx, metrics.clone());
    let hook = HookConfigBuilder::new("true")
        .if_changed("**/*.ts")
        .dirs_with("package.json")
        .build();

    assert!(checkpoint_store(&fx).capture(CheckpointKind::Session, &id("s1"), &patterns(&["**/*.ts"])));
    fx.write("packages/api/index.ts", "api v2");

    let options = HookRunOptions {
        checkpoint: Some((CheckpointKind::Session, id("s1"))),
        session_id: Some("s1".into()),
        ..Default::default()
    };
    let results = with_timeout(runner.run_hook("p", "lint", &hook, &options)).await?;

    assert_eq!(results[0].relative_dir, "packages/api");
    assert_eq!(results[0].outcome, HookRunOutcome::Passed);
    assert_eq!(results[1].relative_dir, "packages/web");
    assert_eq!(results[1].outcome, HookRunOutcome::SkippedUnchanged);

    let recorded = metrics.load_hook_executions()?;
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].session_id.as_deref(), Some("s1"));
    Ok(())
}

#[tokio::test]
async fn hooks_without_if_changed_always_run() -> TestResult {
    init_tracing();
    let fx = project();
    let runner = runner(&fx, Arc::new(MemoryMetricsStore::new()));
    let hook = HookConfigBuilder::new("true").build();

    for _ in 0..2 {
        let results = with_timeout(runner.run_hook("p", "always", &hook, &HookRunOptions::default())).await?;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].relative_dir, "");
        assert_eq!(results[0].outcome, HookRunOutcome::Passed);
    }
    Ok(())
}

#[tokio::test]
async fn slow_hooks_time_out() -> TestResult {
    init_tracing();
    let fx = project();
    let metrics = Arc::new(MemoryMetricsStore::new());
    let hook = HookConfigBuilder::new("sleep 5").timeout_secs(1).build();

    let results = with_timeout(runner(&fx, metrics.clone()).run_hook(
        "p",
        "slow",
        &hook,
        &HookRunOptions::default(),
    ))
    .await?;

    assert_eq!(results[0].outcome, HookRunOutcome::TimedOut);
    assert!(!metrics.load_hook_executions()?[0].passed);
    Ok(())
}
