//! Action executor: runs one model-requested action and describes the result.
//!
//! Nothing here returns an error to the loop. Failures are reported back to
//! the model as observation text so it can adjust its next turn.

use frontsmith_core::change::{ChangeOperation, OperationStatus};
use tracing::{info, warn};

use crate::action::Action;
use crate::prompts;
use crate::session::AgentSession;

impl AgentSession {
    pub async fn execute(&mut self, action: Action) -> String {
        info!(action = action.name(), "Executing action");

        match action {
            Action::AnalyzeProject => match self.refresh_snapshot() {
                Ok(()) => "Project structure analyzed and updated".to_string(),
                Err(e) => error_text(e),
            },

            Action::ReadFile { path } => match self.fs.read(&path).await {
                Ok(Some(content)) => format!(
                    "Content of file {path}:\n{}...",
                    preview(&content, self.settings.read_preview_chars)
                ),
                Ok(None) => format!("File {path} does not exist"),
                Err(e) => {
                    warn!(%path, error = %e, "read_file refused");
                    format!("File {path} does not exist")
                }
            },

            Action::WriteFile { path, content } => {
                // Same path as change sets, so backups and re-analysis behave identically.
                match self.apply_detached(vec![ChangeOperation::write(&path, content)]).await {
                    Err(reason) => format!("Failed to write file {path}: {reason}"),
                    Ok(result) => match result.records.first().map(|r| &r.status) {
                        Some(OperationStatus::Rejected(reason) | OperationStatus::Failed(reason)) => {
                            format!("Failed to write file {path}: {reason}")
                        }
                        _ => format!("File {path} written"),
                    },
                }
            }

            Action::PerformAnalysisTask { requirement } => {
                let prompt = prompts::analysis(&requirement, &self.snapshot);
                match self.run_interaction(&prompt).await {
                    Ok(outcome) => outcome.answer,
                    Err(e) => error_text(e),
                }
            }

            Action::PerformFileOperations { requirement } => {
                match self.perform_file_operations(&requirement).await {
                    Ok(report) => report.summary(),
                    Err(e) => error_text(e),
                }
            }

            Action::Unknown { name } => format!("Unknown action: {name} or insufficient parameters"),
        }
    }
}

fn error_text(e: impl std::fmt::Display) -> String {
    warn!(error = %e, "Action failed");
    format!("Error executing action: {e}")
}

/// The first `max_chars` characters of `content`.
fn preview(content: &str, max_chars: usize) -> &str {
    match content.char_indices().nth(max_chars) {
        Some((idx, _)) => &content[..idx],
        None => content,
    }
}
