// src/checkpoint/model.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{HookwiseError, Result};
use crate::manifest::Manifest;
use crate::types::CheckpointKind;

/// File state captured at one instant for a session or agent.
///
/// On disk:
///
/// ```json
/// {
///   "created_at": "2025-01-31T12:00:00.000Z",
///   "type": "session",
///   "patterns": ["**/*.ts"],
///   "files": { "src/index.ts": "<hex digest>" }
/// }
/// ```
///
/// Every field is required; a file missing one does not deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: CheckpointKind,
    pub patterns: Vec<String>,
    pub files: Manifest,
}

/// Validated session or agent identifier.
///
/// Identifiers containing a path separator are rejected, along with empty
/// ids, `.`/`..` and control characters. Storage still maps separators to
/// `_` (the on-disk naming), which is therefore the identity on every
/// accepted id: two distinct ids can never share a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CheckpointId(String);

impl CheckpointId {
    pub fn new(raw: &str) -> Result<Self> {
        let id = raw.trim();
        let reason = if id.is_empty() {
            Some("must not be empty")
        } else if id == "." || id == ".." {
            Some("must not be a relative path component")
        } else if id.contains(['/', '\\']) {
            Some("must not contain path separators")
        } else if id.chars().any(char::is_control) {
            Some("must not contain control characters")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(HookwiseError::InvalidArgument(format!(
                "checkpoint id {raw:?} {reason}"
            ))),
            None => Ok(Self(id.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Storage form of the id: path separators replaced with `_`.
    pub fn sanitized(&self) -> String {
        self.0.replace(['/', '\\'], "_")
    }
}

impl fmt::Display for CheckpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CheckpointId {
    type Err = HookwiseError;

    fn from_str(s: &str) -> Result<Self> {
        CheckpointId::new(s)
    }
}

/// `<kind>_<sanitized id>.json`
pub fn checkpoint_file_name(kind: CheckpointKind, id: &CheckpointId) -> String {
    format!("{}_{}.json", kind.as_str(), id.sanitized())
}

/// Inverse of [`checkpoint_file_name`] for names written by this crate.
pub fn parse_checkpoint_file_name(name: &str) -> Option<(CheckpointKind, String)> {
    let stem = name.strip_suffix(".json")?;
    let (kind, id) = stem.split_once('_')?;
    let kind = kind.parse::<CheckpointKind>().ok()?;
    if id.is_empty() {
        return None;
    }
    Some((kind, id.to_string()))
}

/// One row of `checkpoint list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckpointSummary {
    pub kind: CheckpointKind,
    pub id: String,
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
    pub pattern_count: usize,
    pub file_count: usize,
}
