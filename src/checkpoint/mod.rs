// src/checkpoint/mod.rs

//! Named file-state snapshots for sessions and agents.
//!
//! A checkpoint is captured once when a lifecycle unit starts and read many
//! times by the change detector (`crate::change`) to decide whether a hook
//! still has anything to validate.

pub mod model;
pub mod store;

pub use model::{
    checkpoint_file_name, parse_checkpoint_file_name, Checkpoint, CheckpointId,
    CheckpointSummary,
};
pub use store::{CheckpointStore, DEFAULT_MAX_AGE};
