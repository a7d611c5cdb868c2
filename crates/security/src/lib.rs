//! Security module for frontsmith: confine model-driven file access to the project.
//!
//! Every path the model proposes, whether for reading or for a change
//! operation, goes through [`resolve_in_root`] before touching the disk.

pub mod path;

pub use path::{resolve_in_root, PathValidationError};
