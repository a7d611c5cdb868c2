//! Project snapshot and the introspection seam.
//!
//! A snapshot is what the model is told about the project: the text of a
//! handful of key configuration files, plus lists of source files under the
//! conventional front-end directories.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ProjectError;

/// One snapshot value: either file text or a list of project-relative paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotEntry {
    Content(String),
    Files(Vec<String>),
}

/// Ordered map of key file / directory name to its [`SnapshotEntry`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectSnapshot {
    pub entries: BTreeMap<String, SnapshotEntry>,
}

impl ProjectSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: SnapshotEntry) {
        self.entries.insert(key.into(), entry);
    }

    pub fn get(&self, key: &str) -> Option<&SnapshotEntry> {
        self.entries.get(key)
    }

    /// Every source file listed anywhere in the snapshot, deduplicated.
    pub fn source_files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = self
            .entries
            .values()
            .filter_map(|e| match e {
                SnapshotEntry::Files(list) => Some(list.iter().map(String::as_str)),
                SnapshotEntry::Content(_) => None,
            })
            .flatten()
            .collect();
        files.sort_unstable();
        files.dedup();
        files
    }

    /// Pretty JSON rendering embedded in prompts.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Produces a [`ProjectSnapshot`] for a project root.
pub trait ProjectIntrospector: Send + Sync {
    /// The directory being introspected.
    fn root(&self) -> &Path;

    /// Scan the project and build a fresh snapshot.
    fn analyze(&self) -> Result<ProjectSnapshot, ProjectError>;
}
