use crate::message::ChatMessage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Resource ids are backend-assigned opaque strings; only chat message
// ids are client-generated (see `message::ChatMessage`).

// --- Repositories ---

/// A repository registered with the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    /// Backend-assigned identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Filesystem path the backend plans against.
    pub path: String,
    /// Optional remote URL.
    #[serde(default)]
    pub git_url: Option<String>,
    /// Branch plans target by default.
    pub default_branch: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Payload for registering a repository.
#[derive(Debug, Clone, Serialize)]
pub struct NewRepository {
    /// Display name.
    pub name: String,
    /// Filesystem path the backend plans against.
    pub path: String,
    /// Optional remote URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_url: Option<String>,
    /// Branch plans target by default.
    pub default_branch: String,
}

/// Partial update of a repository. Unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RepositoryUpdate {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New filesystem path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// New remote URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_url: Option<String>,
    /// New default branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
}

// --- Plans ---

/// Lifecycle state of a [`Plan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    /// Still being drafted with the assistant.
    Draft,
    /// Accepted and being worked on.
    Active,
    /// Work finished.
    Completed,
    /// Kept for reference only.
    Archived,
}

/// A plan document tracked by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Backend-assigned identifier.
    pub id: String,
    /// Repository this plan belongs to.
    pub repository_id: String,
    /// Display name. May be rewritten mid-generation by a
    /// `name_update` stream event.
    pub name: String,
    /// Optional free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Branch the plan targets.
    pub target_branch: String,
    /// Lifecycle state.
    pub status: PlanStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a plan under a repository.
#[derive(Debug, Clone, Serialize)]
pub struct NewPlan {
    /// Display name.
    pub name: String,
    /// Optional free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Branch the plan targets.
    pub target_branch: String,
    /// Initial lifecycle state.
    pub status: PlanStatus,
}

/// Partial update of a plan. Unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanUpdate {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New target branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_branch: Option<String>,
    /// New lifecycle state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PlanStatus>,
}

// --- Plan versions ---

/// An immutable, numbered snapshot of plan content.
///
/// Version numbers are non-decreasing over a plan's lifetime and only
/// the backend fabricates them; the "current" version is the maximum
/// seen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanVersion {
    /// Backend-assigned identifier.
    pub id: String,
    /// The plan this version snapshots.
    pub plan_id: String,
    /// Monotonically increasing version number, per plan.
    pub version: i64,
    /// Snapshot content. Usually markdown text, but older backends
    /// stored structured JSON.
    pub content: serde_json::Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl PlanVersion {
    /// The version content normalized to plain text: string content
    /// passes through, anything else is pretty-printed JSON.
    pub fn content_text(&self) -> String {
        match &self.content {
            serde_json::Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_default(),
        }
    }
}

/// Payload for creating a plan version.
#[derive(Debug, Clone, Serialize)]
pub struct NewPlanVersion {
    /// Snapshot content.
    pub content: serde_json::Value,
    /// Version number to record.
    pub version: i64,
}

// --- Chat sessions ---

/// Lifecycle state of a [`ChatSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatStatus {
    /// Conversation still open.
    Active,
    /// Conversation closed.
    Completed,
}

/// The backend's durable copy of a plan's conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    /// Backend-assigned identifier.
    pub id: String,
    /// The plan this conversation refines.
    pub plan_id: String,
    /// Durable message transcript.
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// Lifecycle state.
    pub status: ChatStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a chat session.
#[derive(Debug, Clone, Serialize)]
pub struct NewChatSession {
    /// Initial transcript.
    pub messages: Vec<ChatMessage>,
    /// Initial lifecycle state.
    pub status: ChatStatus,
}

/// Partial update of a chat session. Unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatUpdate {
    /// Replacement transcript.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatMessage>>,
    /// New lifecycle state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ChatStatus>,
}

// --- Transcription ---

/// Result of transcribing an encoded audio buffer.
///
/// Audio capture and encoding are a black box on the caller's side; the
/// client only ships the encoded bytes and hands back the transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    /// Verbatim transcript.
    pub raw_text: String,
    /// Transcript after vocabulary correction.
    pub corrected_text: String,
    /// Provider confidence in `[0, 1]`.
    pub confidence: f64,
    /// Share of domain-vocabulary terms recognized.
    pub vocab_hit_rate: f64,
}
