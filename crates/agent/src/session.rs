//! The agent session: one transcript, one project snapshot, one provider.
//!
//! Everything the model is told and everything it answers lives in the
//! session's [`Transcript`], shared by every interaction (including nested
//! ones started by actions) for the lifetime of the session.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use frontsmith_config::AppConfig;
use frontsmith_core::error::{Error, ProjectError};
use frontsmith_core::event::{DomainEvent, EventBus};
use frontsmith_core::message::Transcript;
use frontsmith_core::project::{ProjectIntrospector, ProjectSnapshot};
use frontsmith_core::provider::Provider;
use frontsmith_protocol::DegradedFilter;
use frontsmith_tools::{ChangeApplicator, ProjectFs};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::confirm::{AutoConfirmer, ChangeConfirmer};
use crate::prompts;

/// Substring of the failure analysis that means "install dependencies".
const DEPENDENCY_MARKER: &str = "dependency";

/// Loop and pipeline knobs, usually taken from `[agent]` and `[heuristics]`.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub max_iterations: u32,
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub read_preview_chars: usize,
    pub rollback_file_list_on_reject: bool,
    pub degraded_filter: DegradedFilter,
}

impl SessionSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_iterations: config.agent.max_iterations,
            max_retries: config.agent.max_retries,
            backoff_base: Duration::from_millis(config.agent.backoff_base_ms),
            read_preview_chars: config.agent.read_preview_chars,
            rollback_file_list_on_reject: config.agent.rollback_file_list_on_reject,
            degraded_filter: config.heuristics.degraded_filter,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
            read_preview_chars: 1000,
            rollback_file_list_on_reject: true,
            degraded_filter: DegradedFilter::Permissive,
        }
    }
}

pub struct AgentSession {
    pub(crate) transcript: Transcript,
    pub(crate) provider: Arc<dyn Provider>,
    pub(crate) model: String,
    pub(crate) temperature: f32,
    pub(crate) max_tokens: Option<u32>,
    pub(crate) settings: SessionSettings,
    pub(crate) fs: ProjectFs,
    pub(crate) introspector: Arc<dyn ProjectIntrospector>,
    pub(crate) applicator: ChangeApplicator,
    pub(crate) snapshot: ProjectSnapshot,
    pub(crate) confirmer: Arc<dyn ChangeConfirmer>,
    pub(crate) event_bus: Arc<EventBus>,
    /// Held by a running apply task for its whole duration
    pub(crate) apply_lock: Arc<Mutex<()>>,
}

impl AgentSession {
    /// Create a session and take the first project snapshot.
    ///
    /// The confirmer defaults to declining every change set until one is
    /// attached with [`with_confirmer`](Self::with_confirmer).
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        fs: ProjectFs,
        introspector: Arc<dyn ProjectIntrospector>,
    ) -> Result<Self, ProjectError> {
        let snapshot = introspector.analyze()?;
        let applicator = ChangeApplicator::new(fs.clone(), introspector.clone());
        Ok(Self {
            transcript: Transcript::new(),
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            settings: SessionSettings::default(),
            fs,
            introspector,
            applicator,
            snapshot,
            confirmer: Arc::new(AutoConfirmer::decline()),
            event_bus: Arc::new(EventBus::default()),
            apply_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_confirmer(mut self, confirmer: Arc<dyn ChangeConfirmer>) -> Self {
        self.confirmer = confirmer;
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn snapshot(&self) -> &ProjectSnapshot {
        &self.snapshot
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    pub fn project_fs(&self) -> &ProjectFs {
        &self.fs
    }

    /// Re-run introspection and replace the snapshot.
    pub fn refresh_snapshot(&mut self) -> Result<(), ProjectError> {
        self.snapshot = self.introspector.analyze()?;
        debug!(entries = self.snapshot.entries.len(), "Project snapshot refreshed");
        Ok(())
    }

    /// Insert the system prompt if this session has not sent it yet.
    pub fn ensure_context(&mut self) {
        if self.transcript.init_system(prompts::system(&self.snapshot)) {
            info!(transcript = %self.transcript.id, "Session context initialized");
        }
    }

    /// Handle one user requirement: the model decides whether it needs file
    /// operations or only analysis, and the matching action carries it out.
    pub async fn process_requirement(&mut self, requirement: &str) -> Result<String, Error> {
        self.refresh_snapshot()?;
        self.ensure_context();
        let prompt = prompts::decision(requirement, &self.snapshot);
        match self.run_interaction(&prompt).await {
            Ok(outcome) => Ok(outcome.answer),
            Err(e) => {
                self.event_bus.publish(DomainEvent::ErrorOccurred {
                    context: "process_requirement".into(),
                    error_message: e.to_string(),
                    timestamp: Utc::now(),
                });
                Err(e.into())
            }
        }
    }

    /// Ask the model why the project does not run.
    pub async fn analyze_failure_reason(&mut self, message: &str) -> Result<String, Error> {
        self.refresh_snapshot()?;
        self.ensure_context();
        let prompt = prompts::failure_analysis(message, &self.snapshot);
        let answer = self.run_interaction(&prompt).await?.answer;
        Ok(answer.trim().to_string())
    }
}

/// Whether a failure analysis points at missing dependencies.
pub fn is_dependency_issue(analysis: &str) -> bool {
    analysis.to_lowercase().contains(DEPENDENCY_MARKER)
}
