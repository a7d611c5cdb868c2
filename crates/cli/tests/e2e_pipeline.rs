//! End-to-end tests for the frontsmith agent.
//!
//! These drive a full requirement through a scripted model: the decision
//! turn, the file-list and change-set interactions, confirmation, and the
//! resulting changes on disk.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use frontsmith_agent::{AgentSession, AutoConfirmer, SessionSettings};
use frontsmith_config::{AppConfig, ProjectConfig};
use frontsmith_core::change::ChangeOperation;
use frontsmith_core::error::ProviderError;
use frontsmith_core::event::DomainEvent;
use frontsmith_core::message::{Message, Role};
use frontsmith_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use frontsmith_protocol::{render_block, render_change_set};
use frontsmith_tools::{FsProjectAnalyzer, ProjectFs};

// ── Mock Provider ────────────────────────────────────────────────────────

/// Plays back scripted replies and keeps every request.
struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(replies: Vec<Result<String, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn texts(replies: Vec<String>) -> Arc<Self> {
        Self::new(replies.into_iter().map(Ok).collect())
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn last_prompt(&self, call: usize) -> String {
        let requests = self.requests.lock().unwrap();
        requests[call]
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(ProviderResponse {
                message: Message::assistant(text),
                usage: Some(Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                }),
                model: "mock-model".into(),
            }),
            Some(Err(e)) => Err(e),
            None => panic!("ScriptedProvider exhausted after {} call(s)", self.calls()),
        }
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────

fn react_project(root: &Path) {
    std::fs::create_dir_all(root.join("src/components")).unwrap();
    std::fs::write(
        root.join("package.json"),
        r#"{"name":"shop","scripts":{"dev":"vite","build":"vite build"}}"#,
    )
    .unwrap();
    std::fs::write(root.join("vite.config.js"), "export default {};\n").unwrap();
    std::fs::write(
        root.join("src/App.jsx"),
        "import Header from './components/Header';\n\nexport default function App() {\n  return <Header />;\n}\n",
    )
    .unwrap();
    std::fs::write(
        root.join("src/components/Header.jsx"),
        "export default function Header() {\n  return <h1>Shop</h1>;\n}\n",
    )
    .unwrap();
    std::fs::write(root.join("src/components/Legacy.jsx"), "export default null;\n").unwrap();
}

fn session(provider: Arc<ScriptedProvider>, root: &Path, approve: bool) -> AgentSession {
    let config = AppConfig::default();
    let fs = ProjectFs::new(root).unwrap();
    let analyzer = Arc::new(FsProjectAnalyzer::new(fs.root().to_path_buf(), ProjectConfig::default()));
    let confirmer = if approve {
        AutoConfirmer::approve()
    } else {
        AutoConfirmer::decline()
    };
    AgentSession::new(provider, "mock-model", fs, analyzer)
        .unwrap()
        .with_settings(SessionSettings {
            backoff_base: std::time::Duration::from_millis(1),
            ..SessionSettings::from_config(&config)
        })
        .with_confirmer(Arc::new(confirmer))
}

fn footer_change_set() -> String {
    let ops = vec![
        ChangeOperation::write(
            "src/App.jsx",
            "import Header from './components/Header';\nimport Footer from './components/Footer';\n\nexport default function App() {\n  return (<><Header /><Footer /></>);\n}",
        ),
        ChangeOperation::write(
            "src/components/Footer.jsx",
            "export default function Footer() {\n  return <footer>© Shop</footer>;\n}",
        ),
        ChangeOperation::delete("src/components/Legacy.jsx"),
    ];
    format!("Thought: ready\nFinal Answer:\n{}", render_change_set(&ops))
}

// ── Tests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn requirement_flows_from_decision_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    react_project(dir.path());

    let provider = ScriptedProvider::texts(vec![
        "Thought: this needs new files\nAction: perform_file_operations(\"Add a footer and drop Legacy\")".into(),
        "Thought: check the app first\nAction: read_file(\"src/App.jsx\")".into(),
        "Final Answer:\nsrc/App.jsx\nsrc/components/Footer.jsx\nsrc/components/Legacy.jsx".into(),
        footer_change_set(),
        "Final Answer: Added a footer and removed the legacy component.".into(),
    ]);
    let mut session = session(provider.clone(), dir.path(), true);
    let mut events = session.event_bus().subscribe();

    let answer = session
        .process_requirement("Add a footer and drop Legacy")
        .await
        .unwrap();
    assert_eq!(answer, "Added a footer and removed the legacy component.");
    assert_eq!(provider.calls(), 5);

    // Files on disk
    let root = dir.path();
    let app = std::fs::read_to_string(root.join("src/App.jsx")).unwrap();
    assert!(app.contains("<Footer />"));
    let backup = std::fs::read_to_string(root.join("src/App.jsx.backup")).unwrap();
    assert!(backup.contains("return <Header />;"));
    assert!(root.join("src/components/Footer.jsx").exists());
    assert!(!root.join("src/components/Legacy.jsx").exists());

    // Structure changed, so the snapshot was refreshed
    let files = session.snapshot().source_files();
    assert!(files.contains(&"src/components/Footer.jsx"));
    assert!(!files.contains(&"src/components/Legacy.jsx"));

    // The change prompt embedded current contents and a placeholder for the new file
    let change_prompt = provider.last_prompt(3);
    assert!(change_prompt.contains("return <Header />;"));
    assert!(change_prompt.contains(frontsmith_agent::MISSING_FILE_PLACEHOLDER));

    // The final turn saw the pipeline's observation
    let final_prompt = provider.last_prompt(4);
    assert!(final_prompt.starts_with("Observation: Project modifications completed"));

    let mut applied = false;
    while let Ok(event) = events.try_recv() {
        if let DomainEvent::ChangeSetApplied { files_changed, structure_changed, .. } = event.as_ref() {
            assert_eq!(*files_changed, 3);
            assert!(*structure_changed);
            applied = true;
        }
    }
    assert!(applied);
}

#[tokio::test]
async fn declined_changes_leave_project_and_transcript_clean() {
    let dir = tempfile::tempdir().unwrap();
    react_project(dir.path());

    let provider = ScriptedProvider::texts(vec![
        "Action: perform_file_operations(\"Add a footer\")".into(),
        "Final Answer:\nsrc/App.jsx\nsrc/components/Footer.jsx".into(),
        footer_change_set(),
        "Final Answer: Nothing was changed.".into(),
    ]);
    let mut session = session(provider.clone(), dir.path(), false);

    let answer = session.process_requirement("Add a footer").await.unwrap();
    assert_eq!(answer, "Nothing was changed.");

    assert!(!dir.path().join("src/components/Footer.jsx").exists());
    assert!(!dir.path().join("src/App.jsx.backup").exists());

    // Both pipeline exchanges are gone; the model only saw the decline.
    assert_eq!(provider.last_prompt(3), "Observation: Project modifications skipped by user");
    let roles: Vec<Role> = session.transcript().messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::System, Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
}

#[tokio::test]
async fn analysis_requirement_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    react_project(dir.path());

    let provider = ScriptedProvider::texts(vec![
        "Action: perform_analysis_task(\"Explain the header\")".into(),
        "Final Answer: The header renders the shop title.".into(),
        "Final Answer: The header renders the shop title.".into(),
    ]);
    let mut session = session(provider.clone(), dir.path(), true);

    let answer = session.process_requirement("Explain the header").await.unwrap();
    assert_eq!(answer, "The header renders the shop title.");
    assert!(!dir.path().join("src/App.jsx.backup").exists());
    assert!(provider.last_prompt(1).contains("must not change any files"));
}

#[tokio::test]
async fn escaping_paths_are_refused() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("project");
    std::fs::create_dir_all(&project).unwrap();
    react_project(&project);
    std::fs::write(dir.path().join("secret.txt"), "keep").unwrap();

    let evil = format!(
        "Final Answer:\n{}{}",
        render_block("../secret.txt", "overwritten"),
        render_block("src/ok.js", "export const ok = true;"),
    );
    let provider = ScriptedProvider::texts(vec![
        "Action: perform_file_operations(\"tweak\")".into(),
        "Final Answer:\n../secret.txt\nsrc/ok.js".into(),
        evil,
        "Final Answer: done".into(),
    ]);
    let mut session = session(provider.clone(), &project, true);

    session.process_requirement("tweak").await.unwrap();

    assert_eq!(std::fs::read_to_string(dir.path().join("secret.txt")).unwrap(), "keep");
    assert!(project.join("src/ok.js").exists());
    assert!(provider.last_prompt(3).contains("1 operation(s) not applied"));
}

#[tokio::test]
async fn transport_exhaustion_ends_requirement_not_session() {
    let dir = tempfile::tempdir().unwrap();
    react_project(dir.path());

    let mut replies: Vec<Result<String, ProviderError>> =
        (0..4).map(|_| Err(ProviderError::Network("connection reset".into()))).collect();
    replies.push(Ok("Final Answer: back online".into()));
    let provider = ScriptedProvider::new(replies);
    let mut session = session(provider.clone(), dir.path(), true);

    let err = session.process_requirement("anything").await.unwrap_err();
    assert!(err.to_string().contains("4 attempt"));

    let answer = session.process_requirement("anything").await.unwrap();
    assert_eq!(answer, "back online");
}
