// src/commands/metrics.rs

use std::io::{Read, Write};

use crate::errors::Result;
use crate::metrics::{normalize_hook_json, MetricsStore};
use crate::types::TaskOutcome;

pub fn task_start(
    store: &dyn MetricsStore,
    id: &str,
    task_type: &str,
    description: &str,
    session: Option<&str>,
    out: &mut dyn Write,
) -> Result<i32> {
    let task = store.start_task(id, task_type, description, session)?;
    writeln!(out, "Started task {}", task.task_id)?;
    Ok(0)
}

pub fn task_complete(
    store: &dyn MetricsStore,
    id: &str,
    outcome: TaskOutcome,
    confidence: f64,
    out: &mut dyn Write,
) -> Result<i32> {
    let task = store.complete_task(id, outcome, confidence)?;
    writeln!(out, "Completed task {} ({outcome})", task.task_id)?;
    Ok(0)
}

/// Read one JSON hook event from `input`, normalize it and append it.
pub fn record_hook(store: &dyn MetricsStore, input: &mut dyn Read, out: &mut dyn Write) -> Result<i32> {
    let mut raw = String::new();
    input.read_to_string(&mut raw)?;

    let execution = normalize_hook_json(&raw)?;
    store.append_hook_execution(&execution)?;
    writeln!(
        out,
        "Recorded {} ({})",
        execution.hook_name,
        if execution.passed { "passed" } else { "failed" }
    )?;
    Ok(0)
}

pub fn reset(store: &dyn MetricsStore, out: &mut dyn Write) -> Result<i32> {
    store.reset()?;
    writeln!(out, "Metrics reset")?;
    Ok(0)
}
