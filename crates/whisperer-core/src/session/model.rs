//! Session domain model.

use crate::turn::{Attempt, Turn, TurnOutcome};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A completed turn together with the attempt chosen as its final output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// The submitted turn (immutable).
    pub turn: Turn,
    /// The attempt selected for the terminal output.
    pub attempt: Attempt,
    /// The terminal outcome the turn resolved to.
    pub outcome: TurnOutcome,
    /// Timestamp when the turn completed (ISO 8601 format).
    pub completed_at: String,
}

/// One chat session's conversational memory.
///
/// Owned exclusively by the controller driving the session for its
/// lifetime; records are appended only when a turn reaches a terminal
/// outcome, and cleared on session reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier (UUID format).
    pub id: String,
    /// Timestamp when the session was created (ISO 8601 format).
    pub created_at: String,
    /// Timestamp when the session was last updated (ISO 8601 format).
    pub updated_at: String,
    /// Completed turns in submission order.
    pub records: Vec<TurnRecord>,
}

impl Session {
    /// Creates an empty session with a fresh UUID.
    pub fn new() -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now.clone(),
            updated_at: now,
            records: Vec::new(),
        }
    }

    /// Appends a completed turn and bumps the update timestamp.
    pub fn push_record(&mut self, record: TurnRecord) {
        self.records.push(record);
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }

    /// Clears conversational memory (session reset).
    pub fn clear(&mut self) {
        self.records.clear();
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
