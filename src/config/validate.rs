// src/config/validate.rs

use std::sync::LazyLock;

use regex::Regex;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{HookwiseError, Result};
use crate::manifest::PatternSet;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9@._/-]+$").expect("name pattern is valid"));

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::HookwiseError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.plugin))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_plugins(cfg)?;
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    let hours = cfg.config.checkpoint_max_age_hours;
    if !hours.is_finite() || hours <= 0.0 {
        return Err(HookwiseError::ConfigError(format!(
            "[config].checkpoint_max_age_hours must be a positive number (got {hours})"
        )));
    }
    Ok(())
}

fn validate_plugins(cfg: &RawConfigFile) -> Result<()> {
    for (plugin, plugin_cfg) in cfg.plugin.iter() {
        validate_name("plugin", plugin)?;

        for (hook, hook_cfg) in plugin_cfg.hook.iter() {
            validate_name("hook", hook)?;

            if hook_cfg.command.trim().is_empty() {
                return Err(HookwiseError::ConfigError(format!(
                    "hook '{plugin}/{hook}' has an empty `command`"
                )));
            }
            if hook_cfg.timeout_secs == Some(0) {
                return Err(HookwiseError::ConfigError(format!(
                    "hook '{plugin}/{hook}' has `timeout_secs = 0`"
                )));
            }

            for (field, patterns) in [
                ("if_changed", &hook_cfg.if_changed),
                ("dirs_with", &hook_cfg.dirs_with),
            ] {
                for pattern in patterns {
                    PatternSet::new(&[pattern]).map_err(|e| {
                        HookwiseError::ConfigError(format!(
                            "hook '{plugin}/{hook}' has an invalid `{field}` glob '{pattern}': {e}"
                        ))
                    })?;
                }
            }
        }
    }
    Ok(())
}

fn validate_name(what: &str, name: &str) -> Result<()> {
    if !NAME_RE.is_match(name) {
        return Err(HookwiseError::ConfigError(format!(
            "invalid {what} name '{name}' (allowed: letters, digits, '@', '.', '_', '/', '-')"
        )));
    }
    Ok(())
}
