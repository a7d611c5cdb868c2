//! # frontsmith Protocol
//!
//! Text formats exchanged with the language model:
//!
//! - **Reasoning-action replies**: `Thought:` / `Action: name(args)` /
//!   `Final Answer:` ([`react`])
//! - **Action arguments**: comma separated, optionally quoted ([`args`])
//! - **Change blocks**: `---file-start---` delimited per-file edits ([`change_block`])
//! - **File lists**: one path per line ([`file_list`])
//!
//! Everything here is pure string processing. Nothing in this crate fails;
//! malformed input is classified, skipped or passed through with a warning.

pub mod args;
pub mod change_block;
pub mod file_list;
pub mod react;

pub use args::parse_arguments;
pub use change_block::{
    parse_change_set, render_block, render_blocks, render_change_set, ChangeSet, SkipReason,
    SkippedBlock,
};
pub use file_list::parse_file_list;
pub use react::{
    extract_final_answer, parse_reply, DegradedFilter, Directive, FinalTier, ParsedAction,
    ParsedReply,
};
