// src/metrics/model.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::TaskOutcome;

/// One unit of agent work, from `task-start` to `task-complete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub description: String,
    pub task_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<TaskOutcome>,
    /// Self-reported confidence in `[0, 1]`, given on completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(with = "crate::timestamp")]
    pub started_at: DateTime<Utc>,
    #[serde(
        default,
        with = "crate::timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskRecord {
    pub fn new(task_id: impl Into<String>, task_type: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            task_id: task_id.into(),
            session_id: None,
            description: String::new(),
            task_type: task_type.into(),
            outcome: None,
            confidence: None,
            started_at,
            completed_at: None,
        }
    }

    /// A task is completed once it has both an outcome and a completion time.
    pub fn is_completed(&self) -> bool {
        self.outcome.is_some() && self.completed_at.is_some()
    }
}

/// Canonical record of one hook run. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookExecution {
    pub hook_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    pub duration_ms: u64,
    pub exit_code: i32,
    pub passed: bool,
    #[serde(with = "crate::timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Aggregated executions of one hook over a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HookStats {
    pub hook_name: String,
    pub total: usize,
    pub failures: usize,
    pub avg_duration_ms: f64,
}

impl HookStats {
    /// Failure rate as a percentage (`0.0` when there were no runs).
    pub fn failure_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.failures as f64 / self.total as f64 * 100.0
    }
}
