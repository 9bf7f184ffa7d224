//! Core types and error definitions for the Planor client.
//!
//! This crate provides the foundational types shared across all Planor
//! crates: the unified error enum, chat message representations, the plan
//! and repository resource types, and the streaming event union consumed
//! from the generation wire protocol.
//!
//! # Main types
//!
//! - [`PlanorError`] — Unified error enum for all Planor subsystems.
//! - [`PlanorResult`] — Convenience alias for `Result<T, PlanorError>`.
//! - [`Role`] / [`ChatMessage`] — A single message in a plan's conversation.
//! - [`StreamEvent`] — One typed event from the generation stream.
//! - [`Plan`] / [`PlanVersion`] / [`Repository`] — Backend resource snapshots.

/// Streaming event union for the generation wire protocol.
pub mod event;
/// Chat message types.
pub mod message;
/// Plan, repository and version resource types.
pub mod plan;

pub use event::StreamEvent;
pub use message::{ChatMessage, Role};
pub use plan::{
    ChatSession, ChatStatus, ChatUpdate, NewChatSession, NewPlan, NewPlanVersion, NewRepository,
    Plan, PlanStatus, PlanUpdate, PlanVersion, Repository, RepositoryUpdate, Transcription,
};

// --- Error types ---

/// Top-level error type for the Planor client.
///
/// Each variant corresponds to a failure class the client distinguishes:
/// transport failures, normalized API errors, timeouts, cancellation,
/// wire-protocol violations, and session-state misuse.
#[derive(Debug, thiserror::Error)]
pub enum PlanorError {
    /// A network-level failure (connection refused, TLS, read error).
    #[error("HTTP error: {0}")]
    Http(String),

    /// A non-2xx response from the backend, normalized from its body.
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Message extracted from the error body (`detail`, `message` or
        /// `error` field, falling back to the raw text).
        message: String,
        /// The JSON error body, when the backend sent one.
        details: Option<serde_json::Value>,
    },

    /// A request or stream exceeded its configured timeout tier.
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The caller cancelled the stream before a terminal event arrived.
    #[error("stream aborted")]
    Aborted,

    /// The backend reported a generation failure through the stream.
    #[error("generation failed: {0}")]
    Generation(String),

    /// The stream violated the wire protocol (e.g. closed mid-generation).
    #[error("stream error: {0}")]
    Stream(String),

    /// An error related to session state or lifecycle.
    #[error("session error: {0}")]
    Session(String),

    /// An error in configuration parsing or validation.
    #[error("config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A convenience `Result` alias using [`PlanorError`].
pub type PlanorResult<T> = Result<T, PlanorError>;
