//! Change operations: the typed form of a multi-file change set.

use serde::{Deserialize, Serialize};

/// What to do with one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "lowercase")]
pub enum ChangeKind {
    /// Replace the whole file with this content (creating it if needed)
    Write(String),
    /// Remove the file
    Delete,
}

/// One per-file operation from a change set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeOperation {
    /// Path relative to the project root, exactly as the model wrote it
    pub path: String,
    pub kind: ChangeKind,
}

impl ChangeOperation {
    pub fn write(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ChangeKind::Write(content.into()),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ChangeKind::Delete,
        }
    }

    pub fn is_delete(&self) -> bool {
        matches!(self.kind, ChangeKind::Delete)
    }
}

/// How a single operation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    /// Existing file replaced; a backup was written first
    Modified,
    /// New file written
    Created,
    /// Existing file removed
    Deleted,
    /// Delete of a file that was not there
    AlreadyAbsent,
    /// Path failed containment checks; nothing touched
    Rejected(String),
    /// I/O failure while applying
    Failed(String),
}

/// Per-operation record kept for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub path: String,
    pub status: OperationStatus,
}

/// Aggregate result of applying a change set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyResult {
    /// Number of operations that modified, created or deleted a file
    pub files_changed: usize,
    /// True iff a delete removed an existing file or a write created a new path
    pub structure_changed: bool,
    pub records: Vec<OperationRecord>,
}

impl ApplyResult {
    pub fn rejected(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.status, OperationStatus::Rejected(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.status, OperationStatus::Failed(_)))
            .count()
    }
}
