//! Error types for the frontsmith domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all frontsmith operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Interaction loop errors ---
    #[error("Interaction error: {0}")]
    Interaction(#[from] InteractionError),

    // --- Project errors ---
    #[error("Project error: {0}")]
    Project(#[from] ProjectError),

    // --- Process runner errors ---
    #[error("Runner error: {0}")]
    Runner(#[from] RunnerError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Whether another attempt at the same request could succeed.
    ///
    /// Credential and configuration problems will fail identically on every
    /// attempt, so the interaction loop gives up on them immediately.
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            ProviderError::AuthenticationFailed(_)
                | ProviderError::NotConfigured(_)
                | ProviderError::ModelNotFound(_)
        )
    }
}

#[derive(Debug, Clone, Error)]
pub enum InteractionError {
    #[error("Model call failed after {attempts} attempt(s): {last_error}")]
    RetriesExhausted {
        attempts: u32,
        last_error: ProviderError,
    },

    #[error("Model call failed: {0}")]
    Fatal(ProviderError),
}

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Project root not found: {0}")]
    RootNotFound(String),

    #[error("Path rejected: {path}: {reason}")]
    PathRejected { path: String, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Package manager not found: {0}")]
    PackageManagerMissing(String),

    #[error("Failed to spawn {command}: {reason}")]
    SpawnFailed { command: String, reason: String },

    #[error("Project is already running")]
    AlreadyRunning,

    #[error("Invalid package manifest: {0}")]
    InvalidManifest(String),
}
