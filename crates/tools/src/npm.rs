//! npm runner: check, install, run and stop a Node project.
//!
//! Commands run through `tokio::process` in the project root. The check run
//! is bounded by a timeout; a script still running when the timeout fires
//! (a dev server, a watcher) counts as runnable.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use frontsmith_config::RunnerConfig;
use frontsmith_core::error::RunnerError;
use frontsmith_core::runner::{FailureKind, ProjectRunner, RunnableStatus};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Scripts tried, in order, for the check run.
const CHECK_SCRIPTS: [&str; 4] = ["build", "start", "dev", "serve"];
/// Scripts tried, in order, to start the dev server.
const RUN_SCRIPTS: [&str; 3] = ["start", "dev", "serve"];

const MISSING_DEPENDENCY_MARKERS: [&str; 3] = ["enoent", "module not found", "cannot find module"];

pub struct NpmRunner {
    root: PathBuf,
    config: RunnerConfig,
    child: Mutex<Option<Child>>,
}

impl NpmRunner {
    pub fn new(root: impl Into<PathBuf>, config: RunnerConfig) -> Self {
        Self {
            root: root.into(),
            config,
            child: Mutex::new(None),
        }
    }

    fn package_manager(&self) -> Result<PathBuf, RunnerError> {
        find_executable(&self.config.package_manager)
            .ok_or_else(|| RunnerError::PackageManagerMissing(self.config.package_manager.clone()))
    }

    async fn read_scripts(&self) -> Result<Vec<String>, RunnerError> {
        let path = self.root.join("package.json");
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| RunnerError::InvalidManifest(format!("{}: {e}", path.display())))?;
        script_names(&text)
    }

    fn command(&self, program: &Path, args: &[&str]) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(&self.root).stdin(Stdio::null());
        cmd
    }
}

/// Names under `scripts` in a `package.json` body.
pub fn script_names(manifest: &str) -> Result<Vec<String>, RunnerError> {
    let value: serde_json::Value =
        serde_json::from_str(manifest).map_err(|e| RunnerError::InvalidManifest(e.to_string()))?;
    Ok(value["scripts"]
        .as_object()
        .map(|scripts| scripts.keys().cloned().collect())
        .unwrap_or_default())
}

/// npm arguments for the first script in `preference` that exists, else `start`.
pub fn script_args<'a>(scripts: &[String], preference: &[&'a str]) -> Vec<&'a str> {
    match preference.iter().find(|p| scripts.iter().any(|s| s == *p)) {
        Some(script) => vec!["run", *script],
        None => vec!["start"],
    }
}

/// Classify a finished check run from its exit status and stderr.
pub fn classify_check_run(success: bool, stderr: &str) -> RunnableStatus {
    let lower = stderr.to_lowercase();
    if MISSING_DEPENDENCY_MARKERS.iter().any(|m| lower.contains(m)) {
        return RunnableStatus::failed(
            FailureKind::MissingDependencies,
            format!("Missing dependencies: {}", stderr.trim()),
        );
    }
    if !success {
        return RunnableStatus::failed(
            FailureKind::ScriptError,
            format!("Project failed to run: {}", stderr.trim()),
        );
    }
    RunnableStatus::ok("Project ran successfully")
}

/// Locate `name` on `PATH`; names containing a separator are checked as given.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let suffixes: &[&str] = if cfg!(windows) { &[".cmd", ".exe", ""] } else { &[""] };
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths).find_map(|dir| {
        suffixes.iter().find_map(|suffix| {
            let path = dir.join(format!("{name}{suffix}"));
            path.is_file().then_some(path)
        })
    })
}

#[async_trait]
impl ProjectRunner for NpmRunner {
    async fn check_runnable(&self) -> RunnableStatus {
        let pm = match self.package_manager() {
            Ok(pm) => pm,
            Err(e) => return RunnableStatus::failed(FailureKind::Environment, e.to_string()),
        };
        let scripts = match self.read_scripts().await {
            Ok(scripts) => scripts,
            Err(e) => return RunnableStatus::failed(FailureKind::Environment, e.to_string()),
        };

        let args = script_args(&scripts, &CHECK_SCRIPTS);
        debug!(?args, "Test-running project");

        let child = match self
            .command(&pm, &args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => return RunnableStatus::failed(FailureKind::Environment, e.to_string()),
        };

        let timeout = Duration::from_secs(self.config.test_run_timeout_secs);
        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                classify_check_run(output.status.success(), &stderr)
            }
            Ok(Err(e)) => RunnableStatus::failed(FailureKind::Environment, e.to_string()),
            // The dropped future kills the child.
            Err(_) => RunnableStatus::ok(format!(
                "Project still running after {}s, assuming it works",
                timeout.as_secs()
            )),
        }
    }

    async fn install(&self) -> Result<bool, RunnerError> {
        let pm = self.package_manager()?;
        info!(root = %self.root.display(), "Installing dependencies");

        let output = self
            .command(&pm, &["install"])
            .output()
            .await
            .map_err(|e| RunnerError::SpawnFailed {
                command: format!("{} install", self.config.package_manager),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            warn!(
                exit_code = output.status.code().unwrap_or(-1),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Dependency install failed"
            );
        }
        Ok(output.status.success())
    }

    async fn run(&self) -> Result<(), RunnerError> {
        let mut guard = self.child.lock().await;
        if let Some(child) = guard.as_mut()
            && matches!(child.try_wait(), Ok(None))
        {
            return Err(RunnerError::AlreadyRunning);
        }

        let pm = self.package_manager()?;
        let scripts = self.read_scripts().await?;
        let args = script_args(&scripts, &RUN_SCRIPTS);

        let child = self
            .command(&pm, &args)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RunnerError::SpawnFailed {
                command: format!("{} {}", self.config.package_manager, args.join(" ")),
                reason: e.to_string(),
            })?;

        info!(pid = child.id(), ?args, "Dev server started");
        *guard = Some(child);
        Ok(())
    }

    async fn stop(&self) -> Result<(), RunnerError> {
        let Some(mut child) = self.child.lock().await.take() else {
            return Ok(());
        };

        let grace = Duration::from_secs(self.config.stop_grace_secs);
        if terminate(&child).await {
            if tokio::time::timeout(grace, child.wait()).await.is_ok() {
                info!("Dev server stopped");
                return Ok(());
            }
            warn!(grace_secs = grace.as_secs(), "Dev server ignored terminate, killing");
        }

        if let Err(e) = child.kill().await {
            warn!(error = %e, "Failed to kill dev server");
        }
        Ok(())
    }

    async fn is_running(&self) -> bool {
        let mut guard = self.child.lock().await;
        guard
            .as_mut()
            .is_some_and(|child| matches!(child.try_wait(), Ok(None)))
    }
}

/// Ask the process to exit. Returns false when no polite signal could be sent.
#[cfg(unix)]
async fn terminate(child: &Child) -> bool {
    let Some(pid) = child.id() else {
        return false;
    };
    Command::new("kill")
        .args(["-TERM", &pid.to_string()])
        .status()
        .await
        .is_ok_and(|s| s.success())
}

#[cfg(not(unix))]
async fn terminate(_child: &Child) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_script_preference() {
        let scripts = vec!["dev".to_string(), "build".to_string()];
        assert_eq!(script_args(&scripts, &CHECK_SCRIPTS), vec!["run", "build"]);
        assert_eq!(script_args(&scripts, &RUN_SCRIPTS), vec!["run", "dev"]);
        assert_eq!(script_args(&[], &RUN_SCRIPTS), vec!["start"]);
    }

    #[test]
    fn manifest_scripts_parsed() {
        let names = script_names(r#"{"scripts":{"dev":"vite","build":"vite build"}}"#).unwrap();
        assert!(names.contains(&"dev".to_string()));
        assert!(script_names(r#"{"name":"x"}"#).unwrap().is_empty());
        assert!(script_names("not json").is_err());
    }

    #[test]
    fn missing_module_is_a_dependency_problem() {
        let status = classify_check_run(false, "Error: Cannot find module 'react'");
        assert!(!status.runnable);
        assert_eq!(status.failure, Some(FailureKind::MissingDependencies));
    }

    #[test]
    fn nonzero_exit_is_a_script_error() {
        let status = classify_check_run(false, "SyntaxError: Unexpected token");
        assert_eq!(status.failure, Some(FailureKind::ScriptError));
        assert!(classify_check_run(true, "").runnable);
    }

    #[tokio::test]
    async fn missing_package_manager_reported() {
        let dir = tempfile::tempdir().unwrap();
        let runner = NpmRunner::new(
            dir.path(),
            RunnerConfig {
                package_manager: "frontsmith-no-such-pm".into(),
                ..RunnerConfig::default()
            },
        );
        let status = runner.check_runnable().await;
        assert!(!status.runnable);
        assert_eq!(status.failure, Some(FailureKind::Environment));
        assert!(status.message.contains("frontsmith-no-such-pm"));
    }

    #[cfg(unix)]
    mod with_fake_pm {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        /// A package-manager stand-in that runs `body` as a shell script.
        fn fake_pm(dir: &Path, body: &str) -> RunnerConfig {
            let path = dir.join("fake-pm");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            std::fs::write(dir.join("package.json"), r#"{"scripts":{"dev":"vite"}}"#).unwrap();
            RunnerConfig {
                package_manager: path.to_string_lossy().into_owned(),
                test_run_timeout_secs: 1,
                stop_grace_secs: 1,
            }
        }

        #[tokio::test]
        async fn dependency_failure_detected() {
            let dir = tempfile::tempdir().unwrap();
            let config = fake_pm(dir.path(), "echo \"Error: Cannot find module 'vite'\" >&2\nexit 1");
            let status = NpmRunner::new(dir.path(), config).check_runnable().await;
            assert_eq!(status.failure, Some(FailureKind::MissingDependencies));
        }

        #[tokio::test]
        async fn long_running_script_counts_as_runnable() {
            let dir = tempfile::tempdir().unwrap();
            let config = fake_pm(dir.path(), "sleep 10");
            let status = NpmRunner::new(dir.path(), config).check_runnable().await;
            assert!(status.runnable, "{}", status.message);
        }

        #[tokio::test]
        async fn install_reports_exit_status() {
            let dir = tempfile::tempdir().unwrap();
            let ok = NpmRunner::new(dir.path(), fake_pm(dir.path(), "exit 0"));
            assert!(ok.install().await.unwrap());

            let failing = NpmRunner::new(dir.path(), fake_pm(dir.path(), "exit 3"));
            assert!(!failing.install().await.unwrap());
        }

        #[tokio::test]
        async fn run_then_stop() {
            let dir = tempfile::tempdir().unwrap();
            let runner = NpmRunner::new(dir.path(), fake_pm(dir.path(), "exec sleep 30"));

            runner.run().await.unwrap();
            assert!(runner.is_running().await);
            assert!(matches!(runner.run().await, Err(RunnerError::AlreadyRunning)));

            runner.stop().await.unwrap();
            assert!(!runner.is_running().await);
        }
    }
}
