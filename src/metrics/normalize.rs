// src/metrics/normalize.rs

//! Normalization of loosely typed hook events into [`HookExecution`].
//!
//! Hook runners report the same facts under different names. Each logical
//! field has an ordered alias list and the first alias present (and not
//! `null`) wins:
//!
//! | field        | aliases                                   | fallback          |
//! |--------------|-------------------------------------------|-------------------|
//! | hook name    | `hook_name`, `hookName`, `hook`           | rejected          |
//! | hook source  | `hook_source`, `hookSource`, `plugin`     | none              |
//! | duration     | `duration_ms`, `durationMs`, `duration`   | `0`               |
//! | exit code    | `exit_code`, `exitCode`                   | from `passed`     |
//! | passed       | `passed`                                  | `exit_code == 0`  |
//! | timestamp    | `timestamp`, `executed_at`, `executedAt`  | now               |
//! | session      | `session_id`, `sessionId`                 | none              |
//! | task         | `task_id`, `taskId`                       | none              |
//! | directory    | `directory`, `cwd`                        | none              |
//!
//! An event with neither `passed` nor an exit code is rejected.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::errors::{HookwiseError, Result};
use crate::metrics::model::HookExecution;

const HOOK_NAME: &[&str] = &["hook_name", "hookName", "hook"];
const HOOK_SOURCE: &[&str] = &["hook_source", "hookSource", "plugin"];
const DURATION: &[&str] = &["duration_ms", "durationMs", "duration"];
const EXIT_CODE: &[&str] = &["exit_code", "exitCode"];
const PASSED: &[&str] = &["passed"];
const TIMESTAMP: &[&str] = &["timestamp", "executed_at", "executedAt"];
const SESSION: &[&str] = &["session_id", "sessionId"];
const TASK: &[&str] = &["task_id", "taskId"];
const DIRECTORY: &[&str] = &["directory", "cwd"];

/// Parse one JSON event and normalize it.
pub fn normalize_hook_json(raw: &str) -> Result<HookExecution> {
    let value: Value = serde_json::from_str(raw)?;
    normalize_hook_event(&value, Utc::now())
}

/// Normalize an already parsed event; `now` stands in for a missing timestamp.
pub fn normalize_hook_event(event: &Value, now: DateTime<Utc>) -> Result<HookExecution> {
    let obj = event
        .as_object()
        .ok_or_else(|| invalid("hook event must be a JSON object".to_string()))?;

    let hook_name = match lookup(obj, HOOK_NAME) {
        Some((_, v)) => text(v).filter(|s| !s.is_empty()),
        None => None,
    }
    .ok_or_else(|| invalid("hook event has no hook name".to_string()))?;

    let duration_ms = match lookup(obj, DURATION) {
        Some((key, v)) => duration(v).ok_or_else(|| invalid(format!("invalid `{key}`: {v}")))?,
        None => 0,
    };

    let exit_code = match lookup(obj, EXIT_CODE) {
        Some((key, v)) => Some(
            v.as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .ok_or_else(|| invalid(format!("invalid `{key}`: {v}")))?,
        ),
        None => None,
    };

    let passed = match lookup(obj, PASSED) {
        Some((key, v)) => Some(v.as_bool().ok_or_else(|| invalid(format!("invalid `{key}`: {v}")))?),
        None => None,
    };

    let (exit_code, passed) = match (exit_code, passed) {
        (Some(code), Some(passed)) => (code, passed),
        (Some(code), None) => (code, code == 0),
        (None, Some(passed)) => (if passed { 0 } else { 1 }, passed),
        (None, None) => {
            return Err(invalid(format!(
                "hook event for {hook_name:?} has neither `passed` nor an exit code"
            )));
        }
    };

    let timestamp = match lookup(obj, TIMESTAMP) {
        Some((key, v)) => instant(v).ok_or_else(|| invalid(format!("invalid `{key}`: {v}")))?,
        None => now,
    };

    Ok(HookExecution {
        hook_name,
        hook_source: optional_text(obj, HOOK_SOURCE),
        session_id: optional_text(obj, SESSION),
        task_id: optional_text(obj, TASK),
        directory: optional_text(obj, DIRECTORY),
        duration_ms,
        exit_code,
        passed,
        timestamp,
    })
}

fn invalid(msg: String) -> HookwiseError {
    HookwiseError::InvalidArgument(msg)
}

/// First alias present with a non-null value.
fn lookup<'a>(obj: &'a Map<String, Value>, aliases: &[&'static str]) -> Option<(&'static str, &'a Value)> {
    aliases
        .iter()
        .find_map(|key| obj.get(*key).filter(|v| !v.is_null()).map(|v| (*key, v)))
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn optional_text(obj: &Map<String, Value>, aliases: &[&'static str]) -> Option<String> {
    lookup(obj, aliases)
        .and_then(|(_, v)| text(v))
        .filter(|s| !s.is_empty())
}

fn duration(value: &Value) -> Option<u64> {
    if let Some(ms) = value.as_u64() {
        return Some(ms);
    }
    match value.as_f64() {
        Some(ms) if ms.is_finite() && ms >= 0.0 => Some(ms.round() as u64),
        _ => None,
    }
}

/// RFC 3339 string or epoch milliseconds.
fn instant(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => crate::timestamp::parse(s),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        crate::timestamp::parse("2025-03-01T10:00:00Z").unwrap()
    }

    #[test]
    fn snake_case_event_maps_directly() {
        let exec = normalize_hook_event(
            &json!({
                "hook_name": "lint",
                "hook_source": "jutsu-biome",
                "session_id": "s1",
                "task_id": "t1",
                "directory": "packages/web",
                "duration_ms": 1200,
                "exit_code": 2,
                "timestamp": "2025-02-28T08:00:00Z"
            }),
            now(),
        )
        .unwrap();

        assert_eq!(exec.hook_name, "lint");
        assert_eq!(exec.hook_source.as_deref(), Some("jutsu-biome"));
        assert_eq!(exec.directory.as_deref(), Some("packages/web"));
        assert_eq!(exec.duration_ms, 1200);
        assert_eq!(exec.exit_code, 2);
        assert!(!exec.passed);
        assert_eq!(crate::timestamp::format(&exec.timestamp), "2025-02-28T08:00:00.000Z");
    }

    #[test]
    fn camel_case_aliases_and_fallbacks() {
        let exec = normalize_hook_event(
            &json!({
                "hookName": "test",
                "plugin": "jutsu-bun",
                "durationMs": 12.6,
                "passed": true,
                "cwd": "/repo"
            }),
            now(),
        )
        .unwrap();

        assert_eq!(exec.hook_name, "test");
        assert_eq!(exec.hook_source.as_deref(), Some("jutsu-bun"));
        assert_eq!(exec.duration_ms, 13);
        assert_eq!(exec.exit_code, 0);
        assert!(exec.passed);
        assert_eq!(exec.directory.as_deref(), Some("/repo"));
        assert_eq!(exec.timestamp, now());
    }

    #[test]
    fn earlier_alias_wins_and_nulls_are_skipped() {
        let exec = normalize_hook_event(
            &json!({
                "hook_name": null,
                "hookName": "fmt",
                "hook": "ignored",
                "duration_ms": 5,
                "duration": 999,
                "exitCode": 0,
                "passed": false
            }),
            now(),
        )
        .unwrap();

        assert_eq!(exec.hook_name, "fmt");
        assert_eq!(exec.duration_ms, 5);
        // An explicit `passed` overrides what the exit code implies.
        assert!(!exec.passed);
        assert_eq!(exec.exit_code, 0);
    }

    #[test]
    fn missing_name_or_outcome_is_rejected() {
        assert!(normalize_hook_event(&json!({"exit_code": 0}), now()).is_err());
        assert!(normalize_hook_event(&json!({"hook": "  ", "exit_code": 0}), now()).is_err());
        assert!(normalize_hook_event(&json!({"hook": "lint"}), now()).is_err());
        assert!(normalize_hook_event(&json!(["lint"]), now()).is_err());
        assert!(normalize_hook_json("not json").is_err());
    }

    #[test]
    fn malformed_values_are_rejected() {
        let bad_duration = json!({"hook": "lint", "exit_code": 0, "duration": -4});
        assert!(normalize_hook_event(&bad_duration, now()).is_err());

        let bad_time = json!({"hook": "lint", "exit_code": 0, "executedAt": "later"});
        assert!(normalize_hook_event(&bad_time, now()).is_err());

        let epoch = json!({"hook": "lint", "exit_code": 0, "executedAt": 1_700_000_000_000i64});
        let exec = normalize_hook_event(&epoch, now()).unwrap();
        assert_eq!(exec.timestamp.timestamp_millis(), 1_700_000_000_000);
    }
}
