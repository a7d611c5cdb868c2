pub mod agent;
pub mod check;
pub mod doctor;
pub mod onboard;

use std::path::{Path, PathBuf};

use frontsmith_config::AppConfig;

/// Load config from `--config` when given, else from the default location.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => AppConfig::load_with_overrides(path),
        None => AppConfig::load(),
    };
    Ok(config.map_err(|e| format!("Failed to load config: {e}"))?)
}

pub fn config_file(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

/// Resolve the project root argument, defaulting to the current directory.
pub fn project_root(path: Option<PathBuf>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => p,
        None => std::env::current_dir()?,
    };
    if !path.is_dir() {
        return Err(format!("Project path does not exist: {}", path.display()).into());
    }
    Ok(path)
}
