// src/metrics/mod.rs

//! Task and hook-execution history.
//!
//! Stores are plain values passed to whoever needs them (the CLI, the hook
//! runner, the pattern detector); nothing here is global.

pub mod jsonl;
pub mod memory;
pub mod model;
pub mod normalize;
pub mod store;

pub use jsonl::JsonlMetricsStore;
pub use memory::MemoryMetricsStore;
pub use model::{HookExecution, HookStats, TaskRecord};
pub use normalize::{normalize_hook_event, normalize_hook_json};
pub use store::MetricsStore;
