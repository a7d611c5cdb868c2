//! Path containment: keep every model-supplied path inside the project root.
//!
//! Paths arrive as free text from the model. They are joined onto the
//! project root, normalized lexically, and then resolved through the deepest
//! ancestor that exists on disk so symlinks cannot point the final path
//! somewhere else. Containment is checked component-wise against the
//! canonical root, never by string prefix.

use std::path::{Component, Path, PathBuf};

/// Error returned when path validation fails.
#[derive(Debug, thiserror::Error)]
pub enum PathValidationError {
    #[error("Path '{path}' is empty")]
    Empty { path: String },

    #[error("Path '{path}' resolves outside the project root")]
    OutsideRoot { path: String },

    #[error("Path '{path}' refers to the project root itself")]
    IsRoot { path: String },

    #[error("Path '{path}' goes through a symlink whose target does not exist")]
    DanglingSymlink { path: String },

    #[error("Failed to canonicalize path '{path}': {reason}")]
    CanonicalizeFailed { path: String, reason: String },
}

/// Resolve `relative` against `root` and require the result to stay inside it.
///
/// `root` must exist. `relative` need not: for a file that will be created,
/// the nearest existing ancestor is canonicalized and the rest re-attached.
/// Absolute inputs are accepted only if they land inside the root.
///
/// Returns the resolved absolute path on success.
pub fn resolve_in_root(root: &Path, relative: &str) -> Result<PathBuf, PathValidationError> {
    let trimmed = relative.trim();
    if trimmed.is_empty() {
        return Err(PathValidationError::Empty { path: relative.into() });
    }

    let canonical_root = root
        .canonicalize()
        .map_err(|e| PathValidationError::CanonicalizeFailed {
            path: root.display().to_string(),
            reason: e.to_string(),
        })?;

    let joined = canonical_root.join(trimmed);
    let normalized = normalize_lexically(&joined).ok_or_else(|| PathValidationError::OutsideRoot {
        path: relative.into(),
    })?;

    let resolved = resolve_existing_prefix(&normalized, relative)?;

    if !resolved.starts_with(&canonical_root) {
        return Err(PathValidationError::OutsideRoot { path: relative.into() });
    }
    if resolved == canonical_root {
        return Err(PathValidationError::IsRoot { path: relative.into() });
    }

    Ok(resolved)
}

/// Collapse `.` and `..` without touching the filesystem.
///
/// Returns `None` when `..` would climb above the filesystem root.
fn normalize_lexically(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(p) => out.push(p.as_os_str()),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            Component::Normal(part) => out.push(part),
        }
    }
    Some(out)
}

/// Canonicalize the deepest existing ancestor of `path` and re-attach the tail.
///
/// Existence is checked without following the last component, so a dangling
/// symlink counts as present and is refused rather than written through.
fn resolve_existing_prefix(path: &Path, relative: &str) -> Result<PathBuf, PathValidationError> {
    let mut existing = path.to_path_buf();
    let mut tail: Vec<std::ffi::OsString> = Vec::new();

    let meta = loop {
        match std::fs::symlink_metadata(&existing) {
            Ok(meta) => break meta,
            Err(_) => match (existing.file_name(), existing.parent()) {
                (Some(name), Some(parent)) => {
                    tail.push(name.to_os_string());
                    existing = parent.to_path_buf();
                }
                _ => {
                    return Err(PathValidationError::CanonicalizeFailed {
                        path: relative.into(),
                        reason: format!("no existing ancestor for {}", path.display()),
                    });
                }
            },
        }
    };

    if meta.file_type().is_symlink() && !existing.exists() {
        return Err(PathValidationError::DanglingSymlink { path: relative.into() });
    }

    let mut resolved = existing
        .canonicalize()
        .map_err(|e| PathValidationError::CanonicalizeFailed {
            path: relative.into(),
            reason: e.to_string(),
        })?;
    for part in tail.iter().rev() {
        resolved.push(part);
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src/components")).unwrap();
        std::fs::write(dir.path().join("src/App.jsx"), "app").unwrap();
        dir
    }

    #[test]
    fn existing_file_resolves_inside_root() {
        let dir = project();
        let resolved = resolve_in_root(dir.path(), "src/App.jsx").unwrap();
        assert!(resolved.ends_with("src/App.jsx"));
        assert!(resolved.starts_with(dir.path().canonicalize().unwrap()));
    }

    #[test]
    fn new_file_in_new_directory_is_allowed() {
        let dir = project();
        let resolved = resolve_in_root(dir.path(), "src/hooks/useAuth.ts").unwrap();
        assert!(resolved.ends_with("src/hooks/useAuth.ts"));
    }

    #[test]
    fn parent_escape_rejected() {
        let dir = project();
        let err = resolve_in_root(dir.path(), "../../etc/passwd").unwrap_err();
        assert!(matches!(err, PathValidationError::OutsideRoot { .. }));
    }

    #[test]
    fn inner_parent_segments_that_stay_inside_are_fine() {
        let dir = project();
        let resolved = resolve_in_root(dir.path(), "src/components/../App.jsx").unwrap();
        assert!(resolved.ends_with("src/App.jsx"));
    }

    #[test]
    fn absolute_path_outside_root_rejected() {
        let dir = project();
        let err = resolve_in_root(dir.path(), "/etc/passwd").unwrap_err();
        assert!(matches!(err, PathValidationError::OutsideRoot { .. }));
    }

    #[test]
    fn absolute_path_inside_root_accepted() {
        let dir = project();
        let inside = dir.path().canonicalize().unwrap().join("src/App.jsx");
        assert!(resolve_in_root(dir.path(), &inside.to_string_lossy()).is_ok());
    }

    #[test]
    fn sibling_with_shared_prefix_rejected() {
        let parent = tempfile::tempdir().unwrap();
        let root = parent.path().join("app");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::create_dir_all(parent.path().join("app-secrets")).unwrap();

        let err = resolve_in_root(&root, "../app-secrets/key.txt").unwrap_err();
        assert!(matches!(err, PathValidationError::OutsideRoot { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_pointing_outside_rejected() {
        let dir = project();
        let outside = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("src/link")).unwrap();

        let err = resolve_in_root(dir.path(), "src/link/evil.js").unwrap_err();
        assert!(matches!(err, PathValidationError::OutsideRoot { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_leaf_rejected() {
        let dir = project();
        let outside = tempfile::tempdir().unwrap();
        let target = outside.path().join("escaped.js");
        std::os::unix::fs::symlink(&target, dir.path().join("src/link.js")).unwrap();

        let err = resolve_in_root(dir.path(), "src/link.js").unwrap_err();
        assert!(matches!(err, PathValidationError::DanglingSymlink { .. }));
        assert!(!target.exists());
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_directory_rejected() {
        let dir = project();
        let outside = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path().join("gone"), dir.path().join("src/linked")).unwrap();

        let err = resolve_in_root(dir.path(), "src/linked/new/file.js").unwrap_err();
        assert!(matches!(err, PathValidationError::DanglingSymlink { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_to_file_inside_root_accepted() {
        let dir = project();
        std::os::unix::fs::symlink(dir.path().join("src/App.jsx"), dir.path().join("src/alias.jsx"))
            .unwrap();

        let resolved = resolve_in_root(dir.path(), "src/alias.jsx").unwrap();
        assert!(resolved.ends_with("src/App.jsx"));
    }

    #[test]
    fn empty_and_root_paths_rejected() {
        let dir = project();
        assert!(matches!(
            resolve_in_root(dir.path(), "   ").unwrap_err(),
            PathValidationError::Empty { .. }
        ));
        assert!(matches!(
            resolve_in_root(dir.path(), ".").unwrap_err(),
            PathValidationError::IsRoot { .. }
        ));
    }
}
