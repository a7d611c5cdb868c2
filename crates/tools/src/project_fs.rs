//! Project filesystem: path-validated reads, backed-up writes and deletes.
//!
//! All paths are project-relative strings as the model wrote them. Each one
//! is resolved through [`frontsmith_security::resolve_in_root`] before any I/O.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use frontsmith_core::error::ProjectError;
use tracing::debug;

/// Suffix appended to a file's name for its single-level backup.
pub const BACKUP_SUFFIX: &str = ".backup";

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub path: PathBuf,
    /// The file did not exist before this write
    pub created: bool,
    /// Where the previous content was copied, for overwrites
    pub backup: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ProjectFs {
    root: PathBuf,
}

impl ProjectFs {
    /// Open a project rooted at `root`, which must be an existing directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ProjectError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(ProjectError::RootNotFound(root.display().to_string()));
        }
        let root = root.canonicalize().map_err(|source| ProjectError::Io {
            path: root.display().to_string(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a project-relative path, rejecting anything outside the root.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, ProjectError> {
        frontsmith_security::resolve_in_root(&self.root, relative).map_err(|e| {
            ProjectError::PathRejected {
                path: relative.to_string(),
                reason: e.to_string(),
            }
        })
    }

    /// Read a file. `Ok(None)` when it is missing, not a regular file, or empty.
    pub async fn read(&self, relative: &str) -> Result<Option<String>, ProjectError> {
        let path = self.resolve(relative)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(io_error(&path, source)),
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| io_error(&path, source))?;
        Ok((!content.is_empty()).then_some(content))
    }

    /// Whether `relative` currently names an existing regular file.
    pub async fn exists(&self, relative: &str) -> Result<bool, ProjectError> {
        let path = self.resolve(relative)?;
        Ok(tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_file()))
    }

    /// Replace a file's full content, creating parent directories as needed.
    ///
    /// An existing file is first copied to `<path>.backup`, overwriting any
    /// earlier backup.
    pub async fn write(&self, relative: &str, content: &str) -> Result<WriteOutcome, ProjectError> {
        let path = self.resolve(relative)?;
        let existed = tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_file());

        let backup = if existed {
            let backup = backup_path(&path);
            tokio::fs::copy(&path, &backup)
                .await
                .map_err(|source| io_error(&backup, source))?;
            debug!(path = %path.display(), backup = %backup.display(), "Backed up file");
            Some(backup)
        } else {
            None
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| io_error(parent, source))?;
        }

        tokio::fs::write(&path, content)
            .await
            .map_err(|source| io_error(&path, source))?;

        Ok(WriteOutcome {
            path,
            created: !existed,
            backup,
        })
    }

    /// Remove a file. `Ok(false)` when there was nothing to remove.
    pub async fn delete(&self, relative: &str) -> Result<bool, ProjectError> {
        let path = self.resolve(relative)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(io_error(&path, source)),
        }
    }
}

/// `<path>.backup` next to `path`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

fn io_error(path: &Path, source: std::io::Error) -> ProjectError {
    ProjectError::Io {
        path: path.display().to_string(),
        source,
    }
}
