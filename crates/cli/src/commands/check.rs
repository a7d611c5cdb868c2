//! `frontsmith check`: test-run the project once and report.

use std::path::{Path, PathBuf};

use frontsmith_core::runner::{FailureKind, ProjectRunner};
use frontsmith_tools::NpmRunner;

pub async fn run(config_path: Option<&Path>, path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let root = super::project_root(path)?;

    println!("Checking {}", root.display());
    let runner = NpmRunner::new(root, config.runner.clone());
    let status = runner.check_runnable().await;

    if status.runnable {
        println!("  ✅ {}", status.message);
        return Ok(());
    }

    println!("  ❌ {}", status.message);
    match status.failure {
        Some(FailureKind::MissingDependencies) => {
            println!("  Dependencies look missing. Run `{} install`.", config.runner.package_manager);
        }
        Some(FailureKind::Environment) => {
            println!("  Make sure `{}` is installed and package.json exists.", config.runner.package_manager);
        }
        Some(FailureKind::ScriptError) | None => {
            println!("  Run `frontsmith agent` to have the failure analyzed.");
        }
    }

    Err("Project is not runnable".into())
}
