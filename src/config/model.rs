// src/config/model.rs

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use serde::Deserialize;

use crate::errors::{HookwiseError, Result};
use crate::types::Period;

/// Configuration as deserialized from `hookwise.toml`, before validation.
///
/// ```toml
/// [config]
/// checkpoint_max_age_hours = 24.0
/// period = "week"
///
/// [plugin."jutsu-biome"]
/// enabled = true
///
/// [plugin."jutsu-biome".hook.lint]
/// command = "npx biome check"
/// if_changed = ["**/*.ts"]
/// dirs_with = ["package.json"]
/// tip = "Run `npx biome check --write` to auto-fix."
/// ```
///
/// Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// Plugins by name, from `[plugin."<name>"]`.
    #[serde(default)]
    pub plugin: BTreeMap<String, PluginConfig>,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`
/// or [`ConfigFile::default`].
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub plugin: BTreeMap<String, PluginConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Default threshold for `checkpoint clean`, in hours.
    #[serde(default = "default_checkpoint_max_age_hours")]
    pub checkpoint_max_age_hours: f64,

    /// Default trailing window for `patterns`.
    #[serde(default)]
    pub period: Period,
}

fn default_checkpoint_max_age_hours() -> f64 {
    24.0
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            checkpoint_max_age_hours: default_checkpoint_max_age_hours(),
            period: Period::default(),
        }
    }
}

/// `[plugin."<name>"]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Hooks by name, from `[plugin."<name>".hook.<hook>]`.
    #[serde(default)]
    pub hook: BTreeMap<String, HookConfig>,
}

fn default_enabled() -> bool {
    true
}

/// `[plugin."<name>".hook.<hook>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct HookConfig {
    /// Shell command run in each target directory.
    pub command: String,

    /// Files the hook validates. When empty the hook always runs.
    #[serde(default)]
    pub if_changed: Vec<String>,

    /// Marker files; the hook runs once per directory containing one.
    #[serde(default)]
    pub dirs_with: Vec<String>,

    /// Remediation shown when this hook fails often.
    #[serde(default)]
    pub tip: Option<String>,

    /// Kill the command after this many seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        plugin: BTreeMap<String, PluginConfig>,
    ) -> Self {
        Self { config, plugin }
    }

    pub fn enabled_plugins(&self) -> impl Iterator<Item = (&str, &PluginConfig)> {
        self.plugin
            .iter()
            .filter(|(_, p)| p.enabled)
            .map(|(name, p)| (name.as_str(), p))
    }

    /// Look up a hook of an enabled plugin.
    pub fn hook(&self, plugin: &str, hook: &str) -> Result<&HookConfig> {
        let unknown = || HookwiseError::UnknownHook {
            plugin: plugin.to_string(),
            hook: hook.to_string(),
        };
        let p = self.plugin.get(plugin).ok_or_else(unknown)?;
        if !p.enabled {
            return Err(HookwiseError::ConfigError(format!(
                "plugin '{plugin}' is disabled"
            )));
        }
        p.hook.get(hook).ok_or_else(unknown)
    }

    /// Union of `if_changed` across enabled plugins' hooks, deduplicated in
    /// first-seen order.
    pub fn collect_if_changed_patterns(&self) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut patterns = Vec::new();
        for (_, plugin) in self.enabled_plugins() {
            for hook in plugin.hook.values() {
                for pattern in &hook.if_changed {
                    if seen.insert(pattern) {
                        patterns.push(pattern.clone());
                    }
                }
            }
        }
        patterns
    }

    /// Hook name to plugin-declared tip. The first enabled plugin declaring
    /// a tip for a hook name wins.
    pub fn hook_tips(&self) -> HashMap<String, String> {
        let mut tips = HashMap::new();
        for (_, plugin) in self.enabled_plugins() {
            for (name, hook) in &plugin.hook {
                if let Some(tip) = &hook.tip {
                    tips.entry(name.clone()).or_insert_with(|| tip.clone());
                }
            }
        }
        tips
    }

    pub fn checkpoint_max_age(&self) -> Duration {
        Duration::from_secs_f64(self.config.checkpoint_max_age_hours * 3600.0)
    }
}
