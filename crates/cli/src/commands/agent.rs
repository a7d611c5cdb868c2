//! `frontsmith agent`: interactive or single-requirement mode.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use frontsmith_agent::{
    is_dependency_issue, AgentSession, AutoConfirmer, ChangeConfirmer, ChangeProposal,
    SessionSettings,
};
use frontsmith_config::AppConfig;
use frontsmith_core::event::{DomainEvent, EventBus};
use frontsmith_core::runner::{FailureKind, ProjectRunner};
use frontsmith_tools::{FsProjectAnalyzer, NpmRunner, ProjectFs};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Mutex;
use tracing::info;

type StdinLines = Arc<Mutex<Lines<BufReader<Stdin>>>>;

pub async fn run(
    config_path: Option<&Path>,
    path: Option<PathBuf>,
    message: Option<String>,
    yes: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    FRONTSMITH_API_KEY   (generic)");
        eprintln!("    DASHSCOPE_API_KEY    (for DashScope / Qwen)");
        eprintln!("    OPENAI_API_KEY       (for OpenAI)");
        eprintln!();
        eprintln!("  Or add api_key to your config file:");
        eprintln!("    {}", super::config_file(config_path).display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let root = super::project_root(path)?;
    let stdin: StdinLines = Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines()));

    let confirmer: Arc<dyn ChangeConfirmer> = if yes {
        Arc::new(AutoConfirmer::approve())
    } else {
        Arc::new(StdinConfirmer { stdin: stdin.clone() })
    };

    let event_bus = Arc::new(EventBus::default());
    spawn_progress_printer(&event_bus);

    let mut session = build_session(&config, &root, confirmer, event_bus)?;

    if let Some(requirement) = message {
        eprint!("  Thinking...");
        let result = session.process_requirement(&requirement).await;
        eprint!("\r              \r");
        println!("{}", result?);
        return Ok(());
    }

    let runner = NpmRunner::new(session.project_fs().root().to_path_buf(), config.runner.clone());

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        frontsmith Agent: Interactive Mode     ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Project:   {}", session.project_fs().root().display());
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", frontsmith_providers::router::model_for(&config, &config.default_provider));
    println!("  Files:     {} source files", session.snapshot().source_files().len());
    println!();

    startup(&mut session, &runner, &stdin).await?;

    println!();
    println!("  Describe a requirement and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = next_line(&stdin) => line,
            _ = tokio::signal::ctrl_c() => {
                println!();
                None
            }
        };

        let Some(line) = line else { break };
        let requirement = line.trim();
        if requirement.is_empty() {
            continue;
        }
        if requirement.eq_ignore_ascii_case("exit") {
            break;
        }

        // First Ctrl-C lets the current step finish, a second one abandons it.
        let mut interrupted = false;
        let result = {
            let processing = session.process_requirement(requirement);
            tokio::pin!(processing);
            loop {
                tokio::select! {
                    result = &mut processing => break Some(result),
                    _ = tokio::signal::ctrl_c() => {
                        if interrupted {
                            break None;
                        }
                        interrupted = true;
                        eprintln!();
                        eprintln!("  Finishing the current step, press Ctrl+C again to abort.");
                    }
                }
            }
        };
        let Some(result) = result else {
            println!();
            println!("  Interrupted, waiting for file changes in progress...");
            session.wait_for_pending_changes().await;
            println!("  Interrupted.");
            break;
        };

        match result {
            Ok(answer) => {
                println!();
                println!("  {}", "=".repeat(50));
                for line in answer.lines() {
                    println!("  Assistant > {line}");
                }
                println!("  {}", "=".repeat(50));
                println!();
            }
            Err(e) => {
                eprintln!("  [Error] {e}");
                println!();
            }
        }

        if interrupted {
            break;
        }
    }

    if runner.is_running().await {
        println!("  Stopping project...");
    }
    runner.stop().await?;

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}

fn build_session(
    config: &AppConfig,
    root: &Path,
    confirmer: Arc<dyn ChangeConfirmer>,
    event_bus: Arc<EventBus>,
) -> Result<AgentSession, Box<dyn std::error::Error>> {
    let router = frontsmith_providers::router::build_from_config(config);
    let provider = router.default().ok_or("No default provider configured")?;
    let model = frontsmith_providers::router::model_for(config, &config.default_provider);

    let fs = ProjectFs::new(root)?;
    let analyzer = Arc::new(FsProjectAnalyzer::new(fs.root().to_path_buf(), config.project.clone()));

    info!(root = %fs.root().display(), provider = provider.name(), %model, "Starting agent session");

    let session = AgentSession::new(provider, model, fs, analyzer)?
        .with_settings(SessionSettings::from_config(config))
        .with_temperature(config.default_temperature)
        .with_max_tokens(config.default_max_tokens)
        .with_confirmer(confirmer)
        .with_event_bus(event_bus);
    Ok(session)
}

/// Check the project, offer to install dependencies or start it.
async fn startup(
    session: &mut AgentSession,
    runner: &NpmRunner,
    stdin: &StdinLines,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("  Checking whether the project runs...");
    let status = runner.check_runnable().await;

    if status.runnable {
        println!("  Project check completed: {}", status.message);
        if ask_yes_no(stdin, "Do you want to run the project?").await {
            start(runner).await;
        }
        return Ok(());
    }

    println!("  Project cannot be run: {}", status.message);
    if status.failure == Some(FailureKind::Environment) {
        return Ok(());
    }

    eprint!("  Analyzing the failure...");
    let analysis = session.analyze_failure_reason(&status.message).await;
    eprint!("\r                          \r");

    if let Err(e) = &analysis {
        eprintln!("  [Error] Failure analysis unavailable: {e}");
    }

    if offer_after_failure(analysis.as_deref().ok(), status.failure) == StartupOffer::TryRunAnyway {
        if let Ok(text) = analysis {
            println!("  Analysis: {text}");
        }
        if ask_yes_no(stdin, "Do you still want to try running the project?").await {
            start(runner).await;
        }
        return Ok(());
    }

    println!("  Missing dependencies detected.");
    if !ask_yes_no(stdin, "Install dependencies now?").await {
        return Ok(());
    }

    println!("  Installing dependencies...");
    match runner.install().await {
        Ok(true) => {
            println!("  Dependencies installed.");
            if ask_yes_no(stdin, "Do you want to run the project?").await {
                start(runner).await;
            }
        }
        Ok(false) => println!("  Dependency installation failed."),
        Err(e) => eprintln!("  [Error] {e}"),
    }
    Ok(())
}

/// What startup offers once a non-environment failure has been analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StartupOffer {
    InstallDependencies,
    TryRunAnyway,
}

fn offer_after_failure(analysis: Option<&str>, failure: Option<FailureKind>) -> StartupOffer {
    if failure == Some(FailureKind::MissingDependencies) || analysis.is_some_and(is_dependency_issue) {
        StartupOffer::InstallDependencies
    } else {
        StartupOffer::TryRunAnyway
    }
}

async fn start(runner: &NpmRunner) {
    match runner.run().await {
        Ok(()) => println!("  Project started in the background."),
        Err(e) => eprintln!("  [Error] Could not start project: {e}"),
    }
}

async fn next_line(stdin: &StdinLines) -> Option<String> {
    stdin.lock().await.next_line().await.ok().flatten()
}

async fn ask_yes_no(stdin: &StdinLines, question: &str) -> bool {
    print!("  {question} (y/n): ");
    if std::io::stdout().flush().is_err() {
        return false;
    }
    next_line(stdin)
        .await
        .is_some_and(|answer| answer.trim().eq_ignore_ascii_case("y"))
}

/// Asks on the terminal before a change set is applied.
struct StdinConfirmer {
    stdin: StdinLines,
}

#[async_trait]
impl ChangeConfirmer for StdinConfirmer {
    async fn confirm(&self, proposal: &ChangeProposal) -> bool {
        println!();
        for line in proposal.render().lines() {
            println!("  {line}");
        }
        ask_yes_no(&self.stdin, "Apply the above modifications to the project?").await
    }
}

/// Print retry notices while the agent works.
fn spawn_progress_printer(event_bus: &EventBus) {
    let mut rx = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            };
            match event.as_ref() {
                DomainEvent::ModelCallFailed { attempt, error_message, will_retry: true, .. } => {
                    eprintln!("  [Retry] attempt {attempt} failed: {error_message}");
                }
                DomainEvent::ChangeSetApplied { files_changed, structure_changed, .. } => {
                    eprintln!(
                        "  [Applied] {files_changed} file(s) changed{}",
                        if *structure_changed { ", structure updated" } else { "" }
                    );
                }
                _ => {}
            }
        }
    });
}
