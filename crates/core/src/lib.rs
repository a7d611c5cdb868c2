//! # frontsmith Core
//!
//! Domain types, traits, and error definitions for the frontsmith project
//! agent. This crate has **no framework dependencies**: it defines the model
//! that the other crates implement against.
//!
//! ## Seams
//!
//! - [`Provider`]: the language-model transport
//! - [`ProjectIntrospector`]: builds a [`ProjectSnapshot`] of the project
//! - [`ProjectRunner`]: check/install/run/stop the project's scripts

pub mod error;
pub mod message;
pub mod provider;
pub mod project;
pub mod change;
pub mod runner;
pub mod event;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{Message, Role, Transcript, TranscriptId};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use project::{ProjectIntrospector, ProjectSnapshot, SnapshotEntry};
pub use change::{ApplyResult, ChangeKind, ChangeOperation, OperationRecord, OperationStatus};
pub use runner::{FailureKind, ProjectRunner, RunnableStatus};
pub use event::{DomainEvent, EventBus};
