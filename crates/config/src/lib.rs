//! Configuration loading, validation, and management for frontsmith.
//!
//! Loads configuration from `~/.frontsmith/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use frontsmith_protocol::DegradedFilter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.frontsmith/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Interaction loop limits
    #[serde(default)]
    pub agent: AgentConfig,

    /// What the project introspector looks at
    #[serde(default)]
    pub project: ProjectConfig,

    /// Package-manager driven run/install settings
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Recovery behavior for unstructured model output
    #[serde(default)]
    pub heuristics: HeuristicsConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "dashscope".into()
}
fn default_model() -> String {
    "qwen3-coder-plus".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    8192
}
fn default_true() -> bool {
    true
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("agent", &self.agent)
            .field("project", &self.project)
            .field("runner", &self.runner)
            .field("heuristics", &self.heuristics)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum model turns per interaction
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Retries after the first failed model call (so `max_retries + 1` attempts)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff before retry `n` is `backoff_base_ms * 2^n`
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Characters of a file shown in a `read_file` observation
    #[serde(default = "default_read_preview_chars")]
    pub read_preview_chars: usize,

    /// Also drop the file-list exchange when a change set is declined
    #[serde(default = "default_true")]
    pub rollback_file_list_on_reject: bool,
}

fn default_max_iterations() -> u32 {
    10
}
fn default_max_retries() -> u32 {
    3
}
fn default_backoff_base_ms() -> u64 {
    1000
}
fn default_read_preview_chars() -> usize {
    1000
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            read_preview_chars: default_read_preview_chars(),
            rollback_file_list_on_reject: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Config files whose full text goes into the snapshot
    #[serde(default = "default_key_files")]
    pub key_files: Vec<String>,

    /// Top-level directories whose source files are listed
    #[serde(default = "default_key_directories")]
    pub key_directories: Vec<String>,

    /// Subdirectories of `src/` listed under their own key
    #[serde(default = "default_src_subdirectories")]
    pub src_subdirectories: Vec<String>,

    /// Extensions (with the dot) counted as source files
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_key_files() -> Vec<String> {
    strings(&[
        "package.json",
        "vite.config.js",
        "webpack.config.js",
        "tsconfig.json",
        "babel.config.js",
        "next.config.js",
        "nuxt.config.js",
    ])
}
fn default_key_directories() -> Vec<String> {
    strings(&["src", "public", "assets", "components", "pages", "routes", "views"])
}
fn default_src_subdirectories() -> Vec<String> {
    strings(&["components", "pages", "views", "routes", "utils", "hooks", "services"])
}
fn default_source_extensions() -> Vec<String> {
    strings(&[".js", ".jsx", ".ts", ".tsx", ".vue"])
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            key_files: default_key_files(),
            key_directories: default_key_directories(),
            src_subdirectories: default_src_subdirectories(),
            source_extensions: default_source_extensions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default = "default_package_manager")]
    pub package_manager: String,

    /// How long the check run may take; still running after this counts as success
    #[serde(default = "default_test_run_timeout_secs")]
    pub test_run_timeout_secs: u64,

    /// Grace period between terminate and kill when stopping the dev server
    #[serde(default = "default_stop_grace_secs")]
    pub stop_grace_secs: u64,
}

fn default_package_manager() -> String {
    "npm".into()
}
fn default_test_run_timeout_secs() -> u64 {
    30
}
fn default_stop_grace_secs() -> u64 {
    5
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            package_manager: default_package_manager(),
            test_run_timeout_secs: default_test_run_timeout_secs(),
            stop_grace_secs: default_stop_grace_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeuristicsConfig {
    #[serde(default)]
    pub degraded_filter: DegradedFilter,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.frontsmith/config.toml).
    ///
    /// Also checks environment variables for API keys:
    /// - `FRONTSMITH_API_KEY` (highest priority)
    /// - `DASHSCOPE_API_KEY`
    /// - `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from `path` and apply environment overrides.
    pub fn load_with_overrides(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("FRONTSMITH_API_KEY")
                .or_else(|| lookup("DASHSCOPE_API_KEY"))
                .or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(provider) = lookup("FRONTSMITH_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("FRONTSMITH_MODEL") {
            self.default_model = model;
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".frontsmith")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }

        if self.project.source_extensions.iter().any(|e| !e.starts_with('.')) {
            return Err(ConfigError::ValidationError(
                "project.source_extensions entries must start with '.'".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            agent: AgentConfig::default(),
            project: ProjectConfig::default(),
            runner: RunnerConfig::default(),
            heuristics: HeuristicsConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
