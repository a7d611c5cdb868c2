//! Filesystem-backed project introspection.
//!
//! Walks the conventional front-end directories with `walkdir` and records
//! source files by extension. Dependency and VCS directories are never
//! entered.

use std::path::{Path, PathBuf};

use frontsmith_config::ProjectConfig;
use frontsmith_core::error::ProjectError;
use frontsmith_core::project::{ProjectIntrospector, ProjectSnapshot, SnapshotEntry};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

const SKIPPED_DIRS: [&str; 4] = ["node_modules", ".git", "dist", "build"];

pub struct FsProjectAnalyzer {
    root: PathBuf,
    config: ProjectConfig,
}

impl FsProjectAnalyzer {
    pub fn new(root: impl Into<PathBuf>, config: ProjectConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    fn is_source_file(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        self.config
            .source_extensions
            .iter()
            .any(|ext| name.ends_with(ext.as_str()))
    }

    /// Source files under `dir`, as sorted `/`-separated project-relative paths.
    fn list_sources(&self, dir: &Path) -> Vec<String> {
        let mut files: Vec<String> = WalkDir::new(dir)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e))
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file() && self.is_source_file(e.path()))
            .filter_map(|e| relative_slash_path(&self.root, e.path()))
            .collect();
        files.sort();
        files
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = rel.components().filter_map(|c| c.as_os_str().to_str()).collect();
    Some(parts.join("/"))
}

impl ProjectIntrospector for FsProjectAnalyzer {
    fn root(&self) -> &Path {
        &self.root
    }

    fn analyze(&self) -> Result<ProjectSnapshot, ProjectError> {
        if !self.root.is_dir() {
            return Err(ProjectError::RootNotFound(self.root.display().to_string()));
        }

        let mut snapshot = ProjectSnapshot::new();

        for name in &self.config.key_files {
            let path = self.root.join(name);
            let content = if path.is_file() {
                std::fs::read_to_string(&path).map_err(|source| ProjectError::Io {
                    path: path.display().to_string(),
                    source,
                })?
            } else {
                String::new()
            };
            snapshot.insert(name.clone(), SnapshotEntry::Content(content));
        }

        for dir in &self.config.key_directories {
            let path = self.root.join(dir);
            if path.is_dir() {
                snapshot.insert(dir.clone(), SnapshotEntry::Files(self.list_sources(&path)));
            }
        }

        let src = self.root.join("src");
        for sub in &self.config.src_subdirectories {
            let path = src.join(sub);
            if path.is_dir() {
                snapshot.insert(format!("src/{sub}"), SnapshotEntry::Files(self.list_sources(&path)));
            }
        }

        debug!(
            root = %self.root.display(),
            entries = snapshot.entries.len(),
            source_files = snapshot.source_files().len(),
            "Project analyzed"
        );
        Ok(snapshot)
    }
}
