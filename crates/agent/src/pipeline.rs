//! File-operations pipeline.
//!
//! A requirement that changes the project goes through two model
//! interactions on the session transcript:
//!
//! 1. **File list**: which paths must change, one per line
//! 2. **Change set**: full new content for each path, in block format
//!
//! The parsed change set is shown to the operator and applied only on
//! approval. A declined proposal is removed from the transcript so the
//! model does not treat it as accepted work.
//!
//! Approved operations run on a spawned task. Once started, an apply
//! finishes even if the requirement future is dropped;
//! [`AgentSession::wait_for_pending_changes`] waits for it.

use chrono::Utc;
use frontsmith_core::change::{ApplyResult, ChangeOperation};
use frontsmith_core::error::InteractionError;
use frontsmith_core::event::DomainEvent;
use frontsmith_protocol::{parse_change_set, parse_file_list, render_blocks};
use frontsmith_tools::ApplyOutcome;
use tracing::{error, info, warn};

use crate::confirm::ChangeProposal;
use crate::prompts;
use crate::session::AgentSession;

/// Placeholder content for listed files that do not exist yet.
pub const MISSING_FILE_PLACEHOLDER: &str = "(file does not exist, please generate new content)";

/// How a file-operations request ended.
#[derive(Debug, Clone)]
pub enum FileOperationsReport {
    /// The model listed no files
    NoFiles,
    /// The change interaction produced no usable block
    NoChanges { skipped_blocks: usize },
    Applied(ApplyResult),
    Declined { files: Vec<String> },
    /// The apply task died before reporting
    ApplyAborted { reason: String },
}

impl FileOperationsReport {
    /// Observation text handed back to the model.
    pub fn summary(&self) -> String {
        match self {
            Self::NoFiles => "No files were identified for modification".to_string(),
            Self::NoChanges { skipped_blocks } => {
                format!("No valid file changes were produced ({skipped_blocks} malformed block(s) skipped)")
            }
            Self::Applied(result) => {
                let mut text = format!(
                    "Project modifications completed: {} file(s) changed",
                    result.files_changed
                );
                if result.structure_changed {
                    text.push_str(", project structure updated");
                }
                let refused = result.rejected() + result.failed();
                if refused > 0 {
                    text.push_str(&format!(", {refused} operation(s) not applied"));
                }
                text
            }
            Self::Declined { .. } => "Project modifications skipped by user".to_string(),
            Self::ApplyAborted { reason } => {
                format!("Applying project modifications was aborted: {reason}")
            }
        }
    }
}

impl AgentSession {
    /// List files, gather their contents, request a change set, confirm, apply.
    pub async fn perform_file_operations(
        &mut self,
        requirement: &str,
    ) -> Result<FileOperationsReport, InteractionError> {
        let list_prompt = prompts::file_list(requirement, &self.snapshot);
        let listed = self.run_interaction(&list_prompt).await?;
        let paths = parse_file_list(&listed.answer);
        info!(files = paths.len(), "Model listed files to change");

        if paths.is_empty() {
            warn!("File list was empty, nothing to change");
            return Ok(FileOperationsReport::NoFiles);
        }

        let mut contents = Vec::with_capacity(paths.len());
        for path in &paths {
            let content = match self.fs.read(path).await {
                Ok(Some(content)) => content,
                Ok(None) => MISSING_FILE_PLACEHOLDER.to_string(),
                Err(e) => {
                    warn!(%path, error = %e, "Listed file could not be read");
                    MISSING_FILE_PLACEHOLDER.to_string()
                }
            };
            contents.push(content);
        }
        let blob = render_blocks(paths.iter().map(String::as_str).zip(contents.iter().map(String::as_str)));

        let change_prompt = prompts::modification(requirement, &blob);
        let proposed = self.run_interaction(&change_prompt).await?;
        let change_set = parse_change_set(&proposed.answer);

        if change_set.is_empty() {
            warn!(skipped = change_set.skipped.len(), "Change interaction produced no operations");
            return Ok(FileOperationsReport::NoChanges {
                skipped_blocks: change_set.skipped.len(),
            });
        }

        let proposal =
            ChangeProposal::build(&self.fs, &change_set.operations, change_set.skipped.len()).await;
        self.event_bus.publish(DomainEvent::ChangeSetProposed {
            files: proposal.paths(),
            skipped_blocks: proposal.skipped_blocks,
            timestamp: Utc::now(),
        });

        if !self.confirmer.confirm(&proposal).await {
            let files = proposal.paths();
            self.decline_rollback();
            info!(files = files.len(), "Change set declined");
            self.event_bus.publish(DomainEvent::ChangeSetDeclined {
                files: files.clone(),
                timestamp: Utc::now(),
            });
            return Ok(FileOperationsReport::Declined { files });
        }

        match self.apply_detached(change_set.operations).await {
            Ok(result) => Ok(FileOperationsReport::Applied(result)),
            Err(reason) => Ok(FileOperationsReport::ApplyAborted { reason }),
        }
    }

    /// Apply `operations` on a task of its own and adopt any fresh snapshot.
    ///
    /// Dropping the returned future does not stop the task. The
    /// `ChangeSetApplied` event is published from the task itself.
    pub(crate) async fn apply_detached(
        &mut self,
        operations: Vec<ChangeOperation>,
    ) -> Result<ApplyResult, String> {
        let guard = self.apply_lock.clone().lock_owned().await;
        let applicator = self.applicator.clone();
        let event_bus = self.event_bus.clone();

        let task = tokio::spawn(async move {
            let outcome: ApplyOutcome = applicator.apply(&operations).await;
            event_bus.publish(DomainEvent::ChangeSetApplied {
                files_changed: outcome.result.files_changed,
                structure_changed: outcome.result.structure_changed,
                rejected: outcome.result.rejected(),
                timestamp: Utc::now(),
            });
            drop(guard);
            outcome
        });

        match task.await {
            Ok(outcome) => {
                if let Some(snapshot) = outcome.snapshot {
                    self.snapshot = snapshot;
                }
                Ok(outcome.result)
            }
            Err(e) => {
                error!(error = %e, "Apply task failed");
                Err(e.to_string())
            }
        }
    }

    /// Resolve once no apply task is running.
    pub async fn wait_for_pending_changes(&self) {
        let _idle = self.apply_lock.lock().await;
    }

    /// Drop the change exchange, and the file-list exchange if configured.
    ///
    /// Each exchange removes the two most recent turns, whatever they are.
    fn decline_rollback(&mut self) {
        let mut removed = self.transcript.rollback_last_exchange();
        if self.settings.rollback_file_list_on_reject {
            removed += self.transcript.rollback_last_exchange();
        }
        info!(removed, "Rolled back declined exchange");
    }
}
