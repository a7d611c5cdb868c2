//! Change applicator: executes a parsed change set against the project.
//!
//! Operations run one after another. A rejected path or an I/O failure is
//! recorded and logged, then the next operation runs; a bad block never
//! aborts the set. When the set of files in the project changed (a file was
//! created or removed) the project is re-analyzed so the next prompt sees
//! the new layout.

use std::sync::Arc;

use frontsmith_core::change::{ApplyResult, ChangeKind, ChangeOperation, OperationRecord, OperationStatus};
use frontsmith_core::error::ProjectError;
use frontsmith_core::project::{ProjectIntrospector, ProjectSnapshot};
use tracing::{info, warn};

use crate::project_fs::ProjectFs;

/// What [`ChangeApplicator::apply`] produced.
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    pub result: ApplyResult,
    /// Fresh snapshot, present only when the structure changed and
    /// re-analysis succeeded
    pub snapshot: Option<ProjectSnapshot>,
}

#[derive(Clone)]
pub struct ChangeApplicator {
    fs: ProjectFs,
    introspector: Arc<dyn ProjectIntrospector>,
}

impl ChangeApplicator {
    pub fn new(fs: ProjectFs, introspector: Arc<dyn ProjectIntrospector>) -> Self {
        Self { fs, introspector }
    }

    pub async fn apply(&self, operations: &[ChangeOperation]) -> ApplyOutcome {
        let mut result = ApplyResult::default();

        for op in operations {
            let status = self.apply_one(op).await;
            match &status {
                OperationStatus::Created | OperationStatus::Deleted => {
                    result.files_changed += 1;
                    result.structure_changed = true;
                }
                OperationStatus::Modified => result.files_changed += 1,
                OperationStatus::AlreadyAbsent => {
                    info!(path = %op.path, "Delete requested for a file that does not exist");
                }
                OperationStatus::Rejected(reason) => {
                    warn!(path = %op.path, %reason, "Change rejected");
                }
                OperationStatus::Failed(reason) => {
                    warn!(path = %op.path, %reason, "Change failed");
                }
            }
            result.records.push(OperationRecord {
                path: op.path.clone(),
                status,
            });
        }

        let snapshot = if result.structure_changed {
            info!(files_changed = result.files_changed, "Project structure changed, re-analyzing");
            match self.introspector.analyze() {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    warn!(error = %e, "Re-analysis after structure change failed");
                    None
                }
            }
        } else {
            if result.files_changed > 0 {
                info!(files_changed = result.files_changed, "File content updated");
            }
            None
        };

        ApplyOutcome { result, snapshot }
    }

    async fn apply_one(&self, op: &ChangeOperation) -> OperationStatus {
        let outcome = match &op.kind {
            ChangeKind::Delete => self.fs.delete(&op.path).await.map(|removed| {
                if removed {
                    OperationStatus::Deleted
                } else {
                    OperationStatus::AlreadyAbsent
                }
            }),
            ChangeKind::Write(content) => self.fs.write(&op.path, content).await.map(|w| {
                if w.created {
                    OperationStatus::Created
                } else {
                    OperationStatus::Modified
                }
            }),
        };

        match outcome {
            Ok(status) => status,
            Err(ProjectError::PathRejected { reason, .. }) => OperationStatus::Rejected(reason),
            Err(e) => OperationStatus::Failed(e.to_string()),
        }
    }
}
