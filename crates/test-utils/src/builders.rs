#![allow(dead_code)]

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use hookwise::config::{ConfigFile, ConfigSection, HookConfig, PluginConfig, RawConfigFile};
use hookwise::metrics::{HookExecution, TaskRecord};
use hookwise::types::{Period, TaskOutcome};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                plugin: BTreeMap::new(),
            },
        }
    }

    /// Add (or extend) an enabled plugin with one hook.
    pub fn with_hook(mut self, plugin: &str, hook: &str, cfg: HookConfig) -> Self {
        self.config
            .plugin
            .entry(plugin.to_string())
            .or_insert_with(|| PluginConfig {
                enabled: true,
                hook: BTreeMap::new(),
            })
            .hook
            .insert(hook.to_string(), cfg);
        self
    }

    pub fn disable_plugin(mut self, plugin: &str) -> Self {
        if let Some(p) = self.config.plugin.get_mut(plugin) {
            p.enabled = false;
        }
        self
    }

    pub fn with_max_age_hours(mut self, hours: f64) -> Self {
        self.config.config.checkpoint_max_age_hours = hours;
        self
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.config.config.period = period;
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `HookConfig`.
pub struct HookConfigBuilder {
    hook: HookConfig,
}

impl HookConfigBuilder {
    pub fn new(command: &str) -> Self {
        Self {
            hook: HookConfig {
                command: command.to_string(),
                if_changed: vec![],
                dirs_with: vec![],
                tip: None,
                timeout_secs: None,
            },
        }
    }

    pub fn if_changed(mut self, pattern: &str) -> Self {
        self.hook.if_changed.push(pattern.to_string());
        self
    }

    pub fn dirs_with(mut self, marker: &str) -> Self {
        self.hook.dirs_with.push(marker.to_string());
        self
    }

    pub fn tip(mut self, tip: &str) -> Self {
        self.hook.tip = Some(tip.to_string());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.hook.timeout_secs = Some(secs);
        self
    }

    pub fn build(self) -> HookConfig {
        self.hook
    }
}

/// A task that started `minutes_ago` and, when `outcome` is set, finished a
/// minute later.
pub fn task_record(
    id: &str,
    outcome: Option<TaskOutcome>,
    confidence: Option<f64>,
    now: DateTime<Utc>,
    minutes_ago: i64,
) -> TaskRecord {
    let started = now - Duration::minutes(minutes_ago);
    let mut task = TaskRecord::new(id, "implementation", started);
    task.outcome = outcome;
    task.confidence = confidence;
    task.completed_at = outcome.map(|_| started + Duration::minutes(1));
    task
}

pub fn hook_execution(name: &str, passed: bool, at: DateTime<Utc>) -> HookExecution {
    HookExecution {
        hook_name: name.to_string(),
        hook_source: None,
        session_id: None,
        task_id: None,
        directory: None,
        duration_ms: 50,
        exit_code: if passed { 0 } else { 1 },
        passed,
        timestamp: at,
    }
}
