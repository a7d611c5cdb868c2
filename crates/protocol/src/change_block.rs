//! Multi-file change blocks.
//!
//! The model answers a change request with any number of blocks:
//!
//! ```text
//! ---file-start---
//! src/components/Header.jsx
//! ---code-start---
//! export default function Header() { ... }
//! ---code-end---
//! ---file-end---
//! ```
//!
//! A body of `delete` (any case) deletes the file. Text before the first
//! block is ignored. A malformed block is skipped with a warning and the
//! rest of the set still parses.

use frontsmith_core::{ChangeKind, ChangeOperation};
use tracing::warn;

pub const FILE_START: &str = "---file-start---";
pub const CODE_START: &str = "---code-start---";
pub const CODE_END: &str = "---code-end---";
pub const FILE_END: &str = "---file-end---";

/// Body that turns a block into a delete.
pub const DELETE_DIRECTIVE: &str = "delete";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingCodeStart,
    MissingCodeEnd,
    EmptyPath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedBlock {
    /// 1-based position of the block in the answer
    pub index: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub operations: Vec<ChangeOperation>,
    pub skipped: Vec<SkippedBlock>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn paths(&self) -> Vec<&str> {
        self.operations.iter().map(|op| op.path.as_str()).collect()
    }
}

/// Parse every block in `text`.
pub fn parse_change_set(text: &str) -> ChangeSet {
    let mut set = ChangeSet::default();

    for (i, block) in text.split(FILE_START).skip(1).enumerate() {
        let index = i + 1;
        match parse_block(block) {
            Ok(op) => set.operations.push(op),
            Err(reason) => {
                warn!(block = index, ?reason, "Skipping malformed change block");
                set.skipped.push(SkippedBlock { index, reason });
            }
        }
    }

    set
}

fn parse_block(block: &str) -> Result<ChangeOperation, SkipReason> {
    let (header, rest) = block.split_once(CODE_START).ok_or(SkipReason::MissingCodeStart)?;
    let (code, _) = rest.split_once(CODE_END).ok_or(SkipReason::MissingCodeEnd)?;

    let path = header
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or(SkipReason::EmptyPath)?;

    let content = code.trim();
    let kind = if content.eq_ignore_ascii_case(DELETE_DIRECTIVE) {
        ChangeKind::Delete
    } else {
        ChangeKind::Write(content.to_string())
    };

    Ok(ChangeOperation { path: path.to_string(), kind })
}

/// Render one block.
pub fn render_block(path: &str, content: &str) -> String {
    format!("{FILE_START}\n{path}\n{CODE_START}\n{content}\n{CODE_END}\n{FILE_END}\n")
}

/// Render a list of `(path, content)` pairs as consecutive blocks.
pub fn render_blocks<'a>(files: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    files
        .into_iter()
        .map(|(path, content)| render_block(path, content))
        .collect()
}

/// Render operations back into the wire format.
pub fn render_change_set(operations: &[ChangeOperation]) -> String {
    operations
        .iter()
        .map(|op| match &op.kind {
            ChangeKind::Write(content) => render_block(&op.path, content),
            ChangeKind::Delete => render_block(&op.path, DELETE_DIRECTIVE),
        })
        .collect()
}
