// src/metrics/jsonl.rs

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::metrics::model::{HookExecution, TaskRecord};
use crate::metrics::store::MetricsStore;
use crate::project::ProjectContext;

pub const TASKS_FILE: &str = "tasks.jsonl";
pub const HOOK_EXECUTIONS_FILE: &str = "hook_executions.jsonl";

/// Append-only JSON Lines store under `<cache dir>/metrics/`.
///
/// Every `save_task` appends the full record; reads fold rows by `task_id`
/// with the last row winning. Lines that do not parse are skipped.
#[derive(Debug, Clone)]
pub struct JsonlMetricsStore {
    dir: PathBuf,
}

/// Whether `file` is empty or its last byte is a newline.
fn ends_with_newline(file: &mut fs::File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

impl JsonlMetricsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn for_project(ctx: &ProjectContext) -> Self {
        Self::new(ctx.metrics_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn tasks_path(&self) -> PathBuf {
        self.dir.join(TASKS_FILE)
    }

    fn executions_path(&self) -> PathBuf {
        self.dir.join(HOOK_EXECUTIONS_FILE)
    }

    fn append_line<T: Serialize>(&self, path: &Path, row: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating metrics directory {:?}", self.dir))?;
        let mut line = serde_json::to_string(row).context("serializing metrics row")?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening {:?}", path))?;

        // A writer that died mid-row leaves no trailing newline.
        if !ends_with_newline(&mut file).with_context(|| format!("reading tail of {:?}", path))? {
            line.insert(0, '\n');
        }
        file.write_all(line.as_bytes())
            .with_context(|| format!("appending to {:?}", path))?;
        Ok(())
    }

    fn read_rows<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err).with_context(|| format!("reading {:?}", path)),
        };

        let mut rows = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<T>(line) {
                Ok(row) => rows.push(row),
                Err(err) => debug!(?path, line = idx + 1, error = %err, "skipping malformed metrics row"),
            }
        }
        Ok(rows)
    }
}

impl MetricsStore for JsonlMetricsStore {
    fn load_tasks(&self) -> Result<Vec<TaskRecord>> {
        let rows: Vec<TaskRecord> = self.read_rows(&self.tasks_path())?;

        let mut order: Vec<TaskRecord> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for row in rows {
            match index.get(&row.task_id) {
                Some(&i) => order[i] = row,
                None => {
                    index.insert(row.task_id.clone(), order.len());
                    order.push(row);
                }
            }
        }
        Ok(order)
    }

    fn load_hook_executions(&self) -> Result<Vec<HookExecution>> {
        self.read_rows(&self.executions_path())
    }

    fn save_task(&self, task: &TaskRecord) -> Result<()> {
        self.append_line(&self.tasks_path(), task)
    }

    fn append_hook_execution(&self, execution: &HookExecution) -> Result<()> {
        self.append_line(&self.executions_path(), execution)
    }

    fn reset(&self) -> Result<()> {
        for path in [self.tasks_path(), self.executions_path()] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    warn!(?path, error = %err, "failed to reset metrics file");
                    return Err(err).with_context(|| format!("removing {:?}", path));
                }
            }
        }
        Ok(())
    }
}
