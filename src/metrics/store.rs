// src/metrics/store.rs

use std::collections::BTreeMap;
use std::fmt::Debug;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::errors::HookwiseError;
use crate::metrics::model::{HookExecution, HookStats, TaskRecord};
use crate::types::TaskOutcome;

/// Storage for task records and hook executions.
///
/// Implementations provide the raw reads and writes; the queries used by
/// pattern detection and the task lifecycle operations are built on top.
pub trait MetricsStore: Send + Sync + Debug {
    /// Every task, one record per `task_id`, in first-start order.
    fn load_tasks(&self) -> Result<Vec<TaskRecord>>;

    /// Every hook execution in append order.
    fn load_hook_executions(&self) -> Result<Vec<HookExecution>>;

    /// Insert or replace the record with the same `task_id`.
    fn save_task(&self, task: &TaskRecord) -> Result<()>;

    fn append_hook_execution(&self, execution: &HookExecution) -> Result<()>;

    /// Forget everything.
    fn reset(&self) -> Result<()>;

    fn find_task(&self, task_id: &str) -> Result<Option<TaskRecord>> {
        Ok(self.load_tasks()?.into_iter().find(|t| t.task_id == task_id))
    }

    /// The `limit` most recently started tasks, newest first.
    fn recent_tasks(&self, limit: usize) -> Result<Vec<TaskRecord>> {
        let mut tasks = self.load_tasks()?;
        tasks.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        tasks.truncate(limit);
        Ok(tasks)
    }

    /// Completed tasks whose completion falls at or after `since`.
    fn completed_tasks_since(&self, since: DateTime<Utc>) -> Result<Vec<TaskRecord>> {
        Ok(self
            .load_tasks()?
            .into_iter()
            .filter(|t| t.is_completed() && t.completed_at.is_some_and(|at| at >= since))
            .collect())
    }

    /// Per-hook totals over executions at or after `since`, sorted by name.
    fn hook_stats_since(&self, since: DateTime<Utc>) -> Result<Vec<HookStats>> {
        let mut by_hook: BTreeMap<String, (usize, usize, u64)> = BTreeMap::new();
        for exec in self.load_hook_executions()? {
            if exec.timestamp < since {
                continue;
            }
            let entry = by_hook.entry(exec.hook_name).or_default();
            entry.0 += 1;
            if !exec.passed {
                entry.1 += 1;
            }
            entry.2 += exec.duration_ms;
        }

        Ok(by_hook
            .into_iter()
            .map(|(hook_name, (total, failures, duration))| HookStats {
                hook_name,
                total,
                failures,
                avg_duration_ms: duration as f64 / total as f64,
            })
            .collect())
    }

    /// `1 − mean |confidence − actual|` over completed tasks that reported a
    /// confidence; `None` when there are none. `actual` is 1 for success,
    /// 0.5 for partial and 0 for failure.
    fn calibration_score_since(&self, since: DateTime<Utc>) -> Result<Option<f64>> {
        let errors: Vec<f64> = self
            .completed_tasks_since(since)?
            .iter()
            .filter_map(|t| Some((t.confidence? - t.outcome?.actual_score()).abs()))
            .collect();

        if errors.is_empty() {
            return Ok(None);
        }
        let mean = errors.iter().sum::<f64>() / errors.len() as f64;
        Ok(Some(1.0 - mean))
    }

    /// Record the start of a task. Starting an existing id begins it afresh.
    fn start_task(
        &self,
        task_id: &str,
        task_type: &str,
        description: &str,
        session_id: Option<&str>,
    ) -> crate::errors::Result<TaskRecord> {
        let task_id = task_id.trim();
        if task_id.is_empty() {
            return Err(HookwiseError::InvalidArgument(
                "task id must not be empty".to_string(),
            ));
        }

        let mut task = TaskRecord::new(task_id, task_type, Utc::now());
        task.description = description.to_string();
        task.session_id = session_id.map(str::to_string);
        self.save_task(&task)?;

        info!(task = %task.task_id, task_type, "task started");
        Ok(task)
    }

    /// Record the outcome of a started task.
    fn complete_task(
        &self,
        task_id: &str,
        outcome: TaskOutcome,
        confidence: f64,
    ) -> crate::errors::Result<TaskRecord> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(HookwiseError::InvalidArgument(format!(
                "confidence must be between 0 and 1 (got {confidence})"
            )));
        }

        let mut task = self
            .find_task(task_id.trim())?
            .ok_or_else(|| HookwiseError::UnknownTask(task_id.to_string()))?;
        task.outcome = Some(outcome);
        task.confidence = Some(confidence);
        task.completed_at = Some(Utc::now());
        self.save_task(&task)?;

        info!(task = %task.task_id, outcome = %outcome, confidence, "task completed");
        Ok(task)
    }
}
