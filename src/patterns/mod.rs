// src/patterns/mod.rs

//! Behavioral pattern detection over task and hook history: failure
//! streaks, flaky hooks and confidence calibration drift.

pub mod detect;
pub mod render;

pub use detect::{calibration_direction, CalibrationDirection, Pattern, PatternDetector, PatternKind};
pub use render::{render_json, render_markdown, EMPTY_MESSAGE};
