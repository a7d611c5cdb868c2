//! Message and Transcript domain types.
//!
//! A [`Transcript`] is the conversational memory of one agent session:
//! system prompt first, then alternating model turns and user turns
//! (requirements and observations).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a session transcript.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TranscriptId(pub String);

impl TranscriptId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for TranscriptId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TranscriptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (protocol, project context)
    System,
    /// The user, or the loop speaking for the user (observations)
    User,
    /// The language model
    Assistant,
}

/// A single turn in a transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }
}

/// Ordered turns shared by every interaction of one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Unique transcript ID
    pub id: TranscriptId,

    /// Ordered messages
    pub messages: Vec<Message>,

    /// Set once the system prompt has been inserted
    #[serde(default)]
    pub context_initialized: bool,

    /// When the last message was added
    pub updated_at: DateTime<Utc>,
}

impl Transcript {
    /// Create a new empty transcript.
    pub fn new() -> Self {
        Self {
            id: TranscriptId::new(),
            messages: Vec::new(),
            context_initialized: false,
            updated_at: Utc::now(),
        }
    }

    /// Insert the system prompt at the front, at most once per transcript.
    ///
    /// Returns `true` if the prompt was inserted by this call.
    pub fn init_system(&mut self, prompt: impl Into<String>) -> bool {
        if self.context_initialized {
            return false;
        }
        self.messages.insert(0, Message::system(prompt));
        self.context_initialized = true;
        self.updated_at = Utc::now();
        true
    }

    /// Add a message to the transcript.
    pub fn push(&mut self, message: Message) {
        self.updated_at = Utc::now();
        self.messages.push(message);
    }

    /// Remove the two most recent entries regardless of role.
    ///
    /// Does nothing when fewer than two entries exist. Returns the number of
    /// removed entries (0 or 2).
    pub fn rollback_last_exchange(&mut self) -> usize {
        if self.messages.len() < 2 {
            return 0;
        }
        let keep = self.messages.len() - 2;
        self.messages.truncate(keep);
        self.updated_at = Utc::now();
        2
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}
