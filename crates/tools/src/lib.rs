//! Project-side implementations for frontsmith.
//!
//! These give the agent its hands on the project:
//! read and write files inside the root, scan the project layout,
//! apply multi-file change sets, and drive the package manager.

pub mod analyzer;
pub mod applicator;
pub mod npm;
pub mod project_fs;

pub use analyzer::FsProjectAnalyzer;
pub use applicator::{ApplyOutcome, ChangeApplicator};
pub use npm::NpmRunner;
pub use project_fs::{backup_path, ProjectFs, WriteOutcome};
