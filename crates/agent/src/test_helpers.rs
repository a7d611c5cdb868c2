//! Shared test helpers for session tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use frontsmith_config::ProjectConfig;
use frontsmith_core::error::ProviderError;
use frontsmith_core::message::Message;
use frontsmith_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use frontsmith_tools::{FsProjectAnalyzer, ProjectFs};

use crate::confirm::{ChangeConfirmer, ChangeProposal};
use crate::session::{AgentSession, SessionSettings};

/// A mock provider that plays back scripted results in order.
///
/// Every request is recorded. Panics if more calls are made than results
/// provided.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<String, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Only successful replies.
    pub fn texts(replies: &[&str]) -> Arc<Self> {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(make_text_response(&text)),
            Some(Err(e)) => Err(e),
            None => panic!("ScriptedProvider: no more responses (call #{call})"),
        }
    }
}

pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Approves or declines, remembering every proposal it saw.
pub struct RecordingConfirmer {
    approve: bool,
    seen: Mutex<Vec<ChangeProposal>>,
}

impl RecordingConfirmer {
    pub fn new(approve: bool) -> Self {
        Self {
            approve,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn proposals(&self) -> Vec<ChangeProposal> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ChangeConfirmer for RecordingConfirmer {
    async fn confirm(&self, proposal: &ChangeProposal) -> bool {
        self.seen.lock().unwrap().push(proposal.clone());
        self.approve
    }
}

/// A small Vite-style project in a temp dir, with a session over it.
///
/// Backoff is shortened so retry tests that do not pause time stay fast.
pub fn session_with(provider: Arc<ScriptedProvider>) -> (AgentSession, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("src/components")).unwrap();
    std::fs::write(
        root.join("package.json"),
        r#"{"name":"demo","scripts":{"dev":"vite","build":"vite build"}}"#,
    )
    .unwrap();
    std::fs::write(
        root.join("src/App.jsx"),
        "export default function App() { return <h1>Hello</h1>; }\n",
    )
    .unwrap();
    std::fs::write(root.join("src/main.jsx"), "import App from './App';\n").unwrap();

    let fs = ProjectFs::new(root).unwrap();
    let analyzer = Arc::new(FsProjectAnalyzer::new(fs.root().to_path_buf(), ProjectConfig::default()));
    let session = AgentSession::new(provider, "mock-model", fs, analyzer)
        .unwrap()
        .with_settings(SessionSettings {
            backoff_base: Duration::from_millis(1),
            ..Default::default()
        });
    (session, dir)
}
