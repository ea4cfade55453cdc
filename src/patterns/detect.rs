// src/patterns/detect.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::metrics::{HookStats, MetricsStore, TaskRecord};
use crate::types::{Period, Severity, TaskOutcome};

/// Number of most recent tasks inspected for a failure streak.
pub const CONSECUTIVE_FAILURE_WINDOW: usize = 3;
/// Failure rate (percent) above which a hook is reported as `high`.
pub const HOOK_FAILURE_HIGH: f64 = 50.0;
/// Failure rate (percent) above which a hook is reported as `medium`.
pub const HOOK_FAILURE_MEDIUM: f64 = 30.0;
/// Completed tasks required before calibration is judged.
pub const MIN_CALIBRATION_TASKS: usize = 5;
pub const CALIBRATION_DRIFT: f64 = 0.5;
pub const CALIBRATION_DRIFT_HIGH: f64 = 0.3;

const CONSECUTIVE_FAILURE_GUIDANCE: &str = "Stop and re-read the task requirements before another attempt. \
     Break the work into smaller steps and verify each one.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    ConsecutiveFailures,
    HookFailureRate,
    CalibrationDrift,
}

/// A finding derived from the metrics history. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pattern {
    #[serde(rename = "type")]
    pub kind: PatternKind,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationDirection {
    Overconfident,
    Underconfident,
    Neutral,
}

impl CalibrationDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            CalibrationDirection::Overconfident => "overconfident",
            CalibrationDirection::Underconfident => "underconfident",
            CalibrationDirection::Neutral => "neutral",
        }
    }

    fn guidance(self) -> &'static str {
        match self {
            CalibrationDirection::Overconfident => {
                "Confidence has been running ahead of results. Run the validation hooks \
                 and check edge cases before reporting high confidence."
            }
            CalibrationDirection::Underconfident => {
                "Results have been better than the reported confidence. \
                 Trust passing validation and report confidence accordingly."
            }
            CalibrationDirection::Neutral => {
                "Confidence does not track outcomes well. Base the reported confidence \
                 on what was actually verified."
            }
        }
    }
}

/// Read-only analysis over a [`MetricsStore`].
#[derive(Debug)]
pub struct PatternDetector<'a> {
    store: &'a dyn MetricsStore,
    tips: HashMap<String, String>,
    now: DateTime<Utc>,
}

impl<'a> PatternDetector<'a> {
    pub fn new(store: &'a dyn MetricsStore) -> Self {
        Self {
            store,
            tips: HashMap::new(),
            now: Utc::now(),
        }
    }

    /// Plugin-declared remediation tips, keyed by hook name.
    pub fn with_tips(mut self, tips: HashMap<String, String>) -> Self {
        self.tips = tips;
        self
    }

    /// Evaluate windows relative to `now` instead of the current time.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Every pattern at or above `min_severity` for the trailing `period`.
    pub fn detect_patterns(&self, min_severity: Severity, period: Period) -> Vec<Pattern> {
        let since = self.now - period.duration();

        let mut patterns = Vec::new();
        patterns.extend(self.consecutive_failures());
        patterns.extend(self.hook_failure_rates(since));
        patterns.extend(self.calibration_drift(since));

        patterns.retain(|p| p.severity >= min_severity);
        debug!(count = patterns.len(), %min_severity, %period, "detected patterns");
        patterns
    }

    fn consecutive_failures(&self) -> Option<Pattern> {
        let recent = match self.store.recent_tasks(CONSECUTIVE_FAILURE_WINDOW) {
            Ok(tasks) => tasks,
            Err(err) => {
                warn!(error = %err, "cannot read recent tasks; skipping failure streak check");
                return None;
            }
        };

        if recent.len() < CONSECUTIVE_FAILURE_WINDOW
            || !recent.iter().all(|t| t.outcome == Some(TaskOutcome::Failure))
        {
            return None;
        }

        Some(Pattern {
            kind: PatternKind::ConsecutiveFailures,
            severity: Severity::High,
            message: format!("Last {CONSECUTIVE_FAILURE_WINDOW} tasks all failed"),
            guidance: Some(CONSECUTIVE_FAILURE_GUIDANCE.to_string()),
        })
    }

    fn hook_failure_rates(&self, since: DateTime<Utc>) -> Vec<Pattern> {
        let stats = match self.store.hook_stats_since(since) {
            Ok(stats) => stats,
            Err(err) => {
                warn!(error = %err, "cannot read hook statistics; skipping failure rate check");
                return Vec::new();
            }
        };

        stats.iter().filter_map(|s| self.hook_pattern(s)).collect()
    }

    fn hook_pattern(&self, stats: &HookStats) -> Option<Pattern> {
        let rate = stats.failure_rate();
        let severity = if rate > HOOK_FAILURE_HIGH {
            Severity::High
        } else if rate > HOOK_FAILURE_MEDIUM {
            Severity::Medium
        } else {
            return None;
        };

        let name = &stats.hook_name;
        let guidance = self.tips.get(name).cloned().unwrap_or_else(|| {
            format!("The {name} hook fails often. Run it locally and fix what it reports before finishing a task.")
        });

        Some(Pattern {
            kind: PatternKind::HookFailureRate,
            severity,
            message: format!(
                "Hook \"{name}\" has a {rate:.1}% failure rate ({}/{})",
                stats.failures, stats.total
            ),
            guidance: Some(guidance),
        })
    }

    fn calibration_drift(&self, since: DateTime<Utc>) -> Option<Pattern> {
        let completed = match self.store.completed_tasks_since(since) {
            Ok(tasks) => tasks,
            Err(err) => {
                warn!(error = %err, "cannot read completed tasks; skipping calibration check");
                return None;
            }
        };
        if completed.len() < MIN_CALIBRATION_TASKS {
            return None;
        }

        let score = match self.store.calibration_score_since(since) {
            Ok(Some(score)) => score,
            Ok(None) => return None,
            Err(err) => {
                warn!(error = %err, "cannot compute calibration score; skipping calibration check");
                return None;
            }
        };
        if score >= CALIBRATION_DRIFT {
            return None;
        }

        let direction = calibration_direction(&completed);
        let severity = if score < CALIBRATION_DRIFT_HIGH {
            Severity::High
        } else {
            Severity::Medium
        };

        Some(Pattern {
            kind: PatternKind::CalibrationDrift,
            severity,
            message: format!(
                "Calibration score {score:.2} over {} completed tasks ({})",
                completed.len(),
                direction.as_str()
            ),
            guidance: Some(direction.guidance().to_string()),
        })
    }
}

/// Majority direction of confidence errors. Only a clear (1.5x) majority
/// counts; anything closer is neutral.
pub fn calibration_direction(tasks: &[TaskRecord]) -> CalibrationDirection {
    let mut over = 0usize;
    let mut under = 0usize;

    for task in tasks {
        let (Some(outcome), Some(confidence)) = (task.outcome, task.confidence) else {
            continue;
        };
        let actual = if outcome == TaskOutcome::Success { 1.0 } else { 0.0 };
        let diff = confidence - actual;
        if diff > 0.2 {
            over += 1;
        } else if diff < -0.2 {
            under += 1;
        }
    }

    let (over, under) = (over as f64, under as f64);
    if over > 1.5 * under {
        CalibrationDirection::Overconfident
    } else if under > 1.5 * over {
        CalibrationDirection::Underconfident
    } else {
        CalibrationDirection::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{HookExecution, MemoryMetricsStore};
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        crate::timestamp::parse("2025-06-15T12:00:00Z").unwrap()
    }

    fn task(id: &str, outcome: Option<TaskOutcome>, confidence: Option<f64>, minutes_ago: i64) -> TaskRecord {
        let started = now() - Duration::minutes(minutes_ago);
        let mut t = TaskRecord::new(id, "implementation", started);
        t.outcome = outcome;
        t.confidence = confidence;
        t.completed_at = outcome.map(|_| started + Duration::minutes(1));
        t
    }

    fn runs(store: &MemoryMetricsStore, hook: &str, failures: usize, total: usize) {
        for i in 0..total {
            let passed = i >= failures;
            store
                .append_hook_execution(&HookExecution {
                    hook_name: hook.to_string(),
                    hook_source: Some("jutsu-biome".into()),
                    session_id: None,
                    task_id: None,
                    directory: None,
                    duration_ms: 100,
                    exit_code: if passed { 0 } else { 1 },
                    passed,
                    timestamp: now() - Duration::hours(1),
                })
                .unwrap();
        }
    }

    fn detect(store: &MemoryMetricsStore, min: Severity) -> Vec<Pattern> {
        PatternDetector::new(store).at(now()).detect_patterns(min, Period::Week)
    }

    #[test]
    fn three_failed_tasks_form_a_streak() {
        let store = MemoryMetricsStore::new();
        for (i, id) in ["a", "b", "c"].iter().enumerate() {
            store.save_task(&task(id, Some(TaskOutcome::Failure), None, 10 + i as i64)).unwrap();
        }

        let patterns = detect(&store, Severity::Low);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].kind, PatternKind::ConsecutiveFailures);
        assert_eq!(patterns[0].severity, Severity::High);
        assert_eq!(patterns[0].message, "Last 3 tasks all failed");
        assert!(patterns[0].guidance.is_some());
    }

    #[test]
    fn a_recent_success_breaks_the_streak() {
        let store = MemoryMetricsStore::new();
        store.save_task(&task("old-1", Some(TaskOutcome::Failure), None, 30)).unwrap();
        store.save_task(&task("old-2", Some(TaskOutcome::Failure), None, 20)).unwrap();
        store.save_task(&task("latest", Some(TaskOutcome::Success), None, 10)).unwrap();
        assert!(detect(&store, Severity::Low).is_empty());

        let two = MemoryMetricsStore::new();
        two.save_task(&task("x", Some(TaskOutcome::Failure), None, 2)).unwrap();
        two.save_task(&task("y", Some(TaskOutcome::Failure), None, 1)).unwrap();
        assert!(detect(&two, Severity::Low).is_empty());
    }

    #[test]
    fn an_unfinished_latest_task_breaks_the_streak() {
        let store = MemoryMetricsStore::new();
        store.save_task(&task("a", Some(TaskOutcome::Failure), None, 30)).unwrap();
        store.save_task(&task("b", Some(TaskOutcome::Failure), None, 20)).unwrap();
        store.save_task(&task("c", None, None, 1)).unwrap();
        assert!(detect(&store, Severity::Low).is_empty());
    }

    #[test]
    fn hook_failure_rate_thresholds() {
        let store = MemoryMetricsStore::new();
        runs(&store, "lint", 3, 5);
        runs(&store, "test", 2, 5);
        runs(&store, "typecheck", 1, 5);

        let patterns = detect(&store, Severity::Low);
        assert_eq!(patterns.len(), 2);

        assert_eq!(patterns[0].kind, PatternKind::HookFailureRate);
        assert_eq!(patterns[0].severity, Severity::High);
        assert_eq!(patterns[0].message, "Hook \"lint\" has a 60.0% failure rate (3/5)");

        assert_eq!(patterns[1].severity, Severity::Medium);
        assert!(patterns[1].message.contains("40.0%"));
        assert!(patterns[1].message.contains("(2/5)"));
    }

    #[test]
    fn hook_guidance_prefers_plugin_tip() {
        let store = MemoryMetricsStore::new();
        runs(&store, "lint", 4, 5);
        runs(&store, "test", 4, 5);

        let tips = HashMap::from([("lint".to_string(), "Run `npx biome check --write`.".to_string())]);
        let patterns = PatternDetector::new(&store)
            .with_tips(tips)
            .at(now())
            .detect_patterns(Severity::Low, Period::Week);

        assert_eq!(patterns[0].guidance.as_deref(), Some("Run `npx biome check --write`."));
        assert!(patterns[1].guidance.as_deref().unwrap().contains("test"));
    }

    #[test]
    fn executions_outside_the_period_are_ignored() {
        let store = MemoryMetricsStore::new();
        runs(&store, "lint", 5, 5);
        let patterns = PatternDetector::new(&store)
            .at(now() + Duration::days(2))
            .detect_patterns(Severity::Low, Period::Day);
        assert!(patterns.is_empty());
    }

    #[test]
    fn severity_filter_drops_lower_patterns() {
        let store = MemoryMetricsStore::new();
        runs(&store, "lint", 3, 5);
        runs(&store, "test", 2, 5);

        let high = detect(&store, Severity::High);
        assert_eq!(high.len(), 1);
        assert!(high.iter().all(|p| p.severity == Severity::High));
        assert_eq!(detect(&store, Severity::Medium).len(), 2);
    }

    #[test]
    fn poor_calibration_is_reported_with_direction() {
        let store = MemoryMetricsStore::new();
        for i in 0..4 {
            let id = format!("over-{i}");
            store.save_task(&task(&id, Some(TaskOutcome::Failure), Some(0.9), 100 + i)).unwrap();
        }
        store.save_task(&task("ok", Some(TaskOutcome::Success), Some(0.9), 1)).unwrap();

        let patterns = detect(&store, Severity::Low);
        let drift = patterns
            .iter()
            .find(|p| p.kind == PatternKind::CalibrationDrift)
            .expect("calibration pattern");
        // mean error = (4 * 0.9 + 0.1) / 5 = 0.74, score 0.26
        assert_eq!(drift.severity, Severity::High);
        assert!(drift.message.contains("0.26"));
        assert!(drift.message.contains("overconfident"));
    }

    #[test]
    fn calibration_needs_five_completed_tasks() {
        let store = MemoryMetricsStore::new();
        for i in 0..4 {
            let id = format!("t{i}");
            store.save_task(&task(&id, Some(TaskOutcome::Failure), Some(1.0), 100 + i)).unwrap();
        }
        assert!(detect(&store, Severity::Low)
            .iter()
            .all(|p| p.kind != PatternKind::CalibrationDrift));
    }

    #[test]
    fn direction_needs_a_clear_majority() {
        let over = task("o", Some(TaskOutcome::Failure), Some(0.8), 1);
        let under = task("u", Some(TaskOutcome::Success), Some(0.2), 1);
        let neutral = task("n", Some(TaskOutcome::Success), Some(0.9), 1);

        assert_eq!(
            calibration_direction(&[over.clone(), over.clone(), under.clone()]),
            CalibrationDirection::Overconfident
        );
        assert_eq!(
            calibration_direction(&[over.clone(), under.clone()]),
            CalibrationDirection::Neutral
        );
        assert_eq!(
            calibration_direction(&[under.clone(), neutral]),
            CalibrationDirection::Underconfident
        );
        assert_eq!(calibration_direction(&[]), CalibrationDirection::Neutral);
    }
}
