//! Process lifecycle seam: check, install, run and stop the project.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RunnerError;

/// Why a project could not be test-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No package manager or manifest to work with
    Environment,
    /// Modules could not be resolved; `install` is likely to help
    MissingDependencies,
    /// The script itself reported an error
    ScriptError,
}

/// Outcome of a test run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnableStatus {
    pub runnable: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl RunnableStatus {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            runnable: true,
            message: message.into(),
            failure: None,
        }
    }

    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            runnable: false,
            message: message.into(),
            failure: Some(kind),
        }
    }
}

#[async_trait]
pub trait ProjectRunner: Send + Sync {
    /// Briefly run the project's build/start script to see whether it works.
    async fn check_runnable(&self) -> RunnableStatus;

    /// Install dependencies. `Ok(false)` means the installer ran and failed.
    async fn install(&self) -> Result<bool, RunnerError>;

    /// Start the dev server in the background.
    async fn run(&self) -> Result<(), RunnerError>;

    /// Stop the dev server if one is running.
    async fn stop(&self) -> Result<(), RunnerError>;

    async fn is_running(&self) -> bool;
}
