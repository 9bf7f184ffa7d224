use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The author of a [`ChatMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human end-user refining the plan.
    User,
    /// The planning assistant.
    Assistant,
}

/// A single message in a plan's conversation transcript.
///
/// The session store exclusively owns the in-memory ordered sequence
/// (insertion order is chronological order); the backend owns the
/// durable copy. The `id` is client-generated — the backend does not
/// echo it back, so it defaults to a fresh one on deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Client-generated identifier for this message.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Who authored the message.
    pub role: Role,
    /// The textual content.
    pub content: String,
    /// UTC timestamp of when the message was created.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Creates a new message with the given role and content.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Creates a new message with [`Role::User`].
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates a new message with [`Role::Assistant`].
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}
