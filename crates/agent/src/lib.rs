//! The frontsmith agent: a conversational loop over a front-end project.
//!
//! An [`AgentSession`] owns the transcript and the current project
//! snapshot. For each requirement it:
//!
//! 1. **Decides** with the model whether files must change
//! 2. **Reasons and acts** in a bounded `Thought` / `Action` / `Observation` loop
//! 3. **Proposes** a multi-file change set and asks the operator to confirm
//! 4. **Applies** approved changes with backups, then re-analyzes if the layout changed
//!
//! Every model call goes through the same retry policy, and every action
//! result is fed back to the model as text.

pub mod action;
pub mod confirm;
pub mod executor;
pub mod pipeline;
pub mod prompts;
pub mod react;
pub mod session;
pub mod trace;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use action::Action;
pub use confirm::{AutoConfirmer, ChangeConfirmer, ChangeProposal, ChangeSummary, FileChangeSummary};
pub use pipeline::{FileOperationsReport, MISSING_FILE_PLACEHOLDER};
pub use react::{InteractionExit, InteractionOutcome};
pub use session::{is_dependency_issue, AgentSession, SessionSettings};
pub use trace::{InteractionTrace, TraceEntry, TraceKind};
