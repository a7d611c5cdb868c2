//! Interaction trace: what the loop saw and did, turn by turn.
//!
//! Kept for display and debugging only; control flow never reads it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TraceKind {
    Thought,
    Action,
    Observation,
    Answer,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub kind: TraceKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionTrace {
    pub entries: Vec<TraceEntry>,
}

impl InteractionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: TraceKind, content: impl Into<String>) {
        self.entries.push(TraceEntry {
            kind,
            content: content.into(),
            timestamp: Utc::now(),
        });
    }

    pub fn count(&self, kind: TraceKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    /// `Kind: content` lines, the way the model would have written them.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{:?}: {}", e.kind, e.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_and_count() {
        let mut trace = InteractionTrace::new();
        trace.push(TraceKind::Thought, "look first");
        trace.push(TraceKind::Action, "read_file(src/App.jsx)");
        trace.push(TraceKind::Observation, "File src/App.jsx does not exist");

        assert_eq!(trace.count(TraceKind::Action), 1);
        assert_eq!(
            trace.render(),
            "Thought: look first\nAction: read_file(src/App.jsx)\nObservation: File src/App.jsx does not exist"
        );
    }
}
