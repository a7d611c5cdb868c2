//! Human confirmation gate for proposed change sets.
//!
//! Before anything touches the project the operator sees which files the
//! model wants to create, modify or delete, with a line-count diff for each,
//! and answers yes or no.

use async_trait::async_trait;
use frontsmith_core::change::{ChangeKind, ChangeOperation};
use frontsmith_tools::ProjectFs;
use similar::{ChangeTag, TextDiff};

/// What one operation would do to its file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSummary {
    Create { lines: usize },
    Modify { added: usize, removed: usize },
    Delete,
    /// Delete of a file that is not there; applying it is a no-op
    DeleteMissing,
    /// Path fails containment; applying it will be refused
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChangeSummary {
    pub path: String,
    pub summary: ChangeSummary,
}

/// Everything the operator is asked to approve.
#[derive(Debug, Clone, Default)]
pub struct ChangeProposal {
    pub files: Vec<FileChangeSummary>,
    /// Malformed blocks dropped by the parser
    pub skipped_blocks: usize,
}

impl ChangeProposal {
    /// Summarize `operations` against the current state of the project.
    pub async fn build(fs: &ProjectFs, operations: &[ChangeOperation], skipped_blocks: usize) -> Self {
        let mut files = Vec::with_capacity(operations.len());

        for op in operations {
            let summary = match fs.resolve(&op.path) {
                Err(e) => ChangeSummary::Rejected(e.to_string()),
                Ok(_) => {
                    let current = fs.read(&op.path).await.ok().flatten();
                    match (&op.kind, current) {
                        (ChangeKind::Delete, Some(_)) => ChangeSummary::Delete,
                        (ChangeKind::Delete, None) => {
                            // Empty files read as None; still a real delete if present.
                            if fs.exists(&op.path).await.unwrap_or(false) {
                                ChangeSummary::Delete
                            } else {
                                ChangeSummary::DeleteMissing
                            }
                        }
                        (ChangeKind::Write(new), Some(old)) => diff_summary(&old, new),
                        (ChangeKind::Write(new), None) => {
                            if fs.exists(&op.path).await.unwrap_or(false) {
                                diff_summary("", new)
                            } else {
                                ChangeSummary::Create { lines: new.lines().count() }
                            }
                        }
                    }
                }
            };
            files.push(FileChangeSummary { path: op.path.clone(), summary });
        }

        Self { files, skipped_blocks }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> Vec<String> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    /// Plain-text listing for the terminal.
    pub fn render(&self) -> String {
        let mut out = String::from("Proposed changes:\n");
        for f in &self.files {
            let line = match &f.summary {
                ChangeSummary::Create { lines } => format!("  create  {} ({lines} lines)", f.path),
                ChangeSummary::Modify { added, removed } => {
                    format!("  modify  {} (+{added} -{removed})", f.path)
                }
                ChangeSummary::Delete => format!("  delete  {}", f.path),
                ChangeSummary::DeleteMissing => format!("  delete  {} (not present, nothing to do)", f.path),
                ChangeSummary::Rejected(reason) => format!("  refuse  {} ({reason})", f.path),
            };
            out.push_str(&line);
            out.push('\n');
        }
        if self.skipped_blocks > 0 {
            out.push_str(&format!("  ({} malformed block(s) ignored)\n", self.skipped_blocks));
        }
        out
    }
}

fn diff_summary(old: &str, new: &str) -> ChangeSummary {
    let diff = TextDiff::from_lines(old, new);
    let (mut added, mut removed) = (0, 0);
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => added += 1,
            ChangeTag::Delete => removed += 1,
            ChangeTag::Equal => {}
        }
    }
    ChangeSummary::Modify { added, removed }
}

/// Decides whether a proposal is applied.
#[async_trait]
pub trait ChangeConfirmer: Send + Sync {
    async fn confirm(&self, proposal: &ChangeProposal) -> bool;
}

/// Answers every proposal the same way. Used for `--yes` and in tests.
pub struct AutoConfirmer {
    approve: bool,
}

impl AutoConfirmer {
    pub fn approve() -> Self {
        Self { approve: true }
    }

    pub fn decline() -> Self {
        Self { approve: false }
    }
}

#[async_trait]
impl ChangeConfirmer for AutoConfirmer {
    async fn confirm(&self, _proposal: &ChangeProposal) -> bool {
        self.approve
    }
}
