//! Domain event system: decoupled observation of the interaction loop.
//!
//! The session publishes events as turns are generated, actions run and
//! change sets are decided. The CLI (or a test) subscribes to watch progress
//! without the loop knowing who is listening.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// The model produced an assistant turn
    ModelResponded {
        transcript_id: String,
        model: String,
        attempt: u32,
        chars: usize,
        timestamp: DateTime<Utc>,
    },

    /// A model call failed; `will_retry` tells whether the loop backs off and tries again
    ModelCallFailed {
        attempt: u32,
        error_message: String,
        will_retry: bool,
        timestamp: DateTime<Utc>,
    },

    /// An action from the model's turn was executed
    ActionExecuted {
        action: String,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A change set was parsed and is awaiting confirmation
    ChangeSetProposed {
        files: Vec<String>,
        skipped_blocks: usize,
        timestamp: DateTime<Utc>,
    },

    /// A change set was applied to the project
    ChangeSetApplied {
        files_changed: usize,
        structure_changed: bool,
        rejected: usize,
        timestamp: DateTime<Utc>,
    },

    /// The human declined a proposed change set
    ChangeSetDeclined {
        files: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// An error occurred
    ErrorOccurred {
        context: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
