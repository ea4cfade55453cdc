// src/metrics/memory.rs

use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};

use crate::metrics::model::{HookExecution, TaskRecord};
use crate::metrics::store::MetricsStore;

/// In-process store, used by tests and by callers that do not persist.
#[derive(Debug, Default)]
pub struct MemoryMetricsStore {
    tasks: Mutex<Vec<TaskRecord>>,
    executions: Mutex<Vec<HookExecution>>,
}

impl MemoryMetricsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn guard<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    m.lock().map_err(|_| anyhow!("metrics store lock poisoned"))
}

impl MetricsStore for MemoryMetricsStore {
    fn load_tasks(&self) -> Result<Vec<TaskRecord>> {
        Ok(guard(&self.tasks)?.clone())
    }

    fn load_hook_executions(&self) -> Result<Vec<HookExecution>> {
        Ok(guard(&self.executions)?.clone())
    }

    fn save_task(&self, task: &TaskRecord) -> Result<()> {
        let mut tasks = guard(&self.tasks)?;
        match tasks.iter_mut().find(|t| t.task_id == task.task_id) {
            Some(existing) => *existing = task.clone(),
            None => tasks.push(task.clone()),
        }
        Ok(())
    }

    fn append_hook_execution(&self, execution: &HookExecution) -> Result<()> {
        guard(&self.executions)?.push(execution.clone());
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        guard(&self.tasks)?.clear();
        guard(&self.executions)?.clear();
        Ok(())
    }
}
