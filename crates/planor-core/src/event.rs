use serde::{Deserialize, Serialize};

/// Events emitted by the plan-generation stream.
///
/// These are the typed decoding of the `data:`-framed wire protocol.
/// Exactly one terminal event ([`Complete`] or [`Error`]) ends a given
/// stream; nothing is delivered after it.
///
/// [`Complete`]: StreamEvent::Complete
/// [`Error`]: StreamEvent::Error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// An incremental piece of assistant text.
    Chunk {
        /// The text fragment to append.
        content: String,
    },

    /// Terminal: the generation finished successfully.
    Complete,

    /// Terminal: the backend reported a failure.
    Error {
        /// Server-provided failure description.
        message: String,
    },

    /// The plan being generated was renamed. Non-terminal; affects the
    /// plan's display name only.
    NameUpdate {
        /// The new display name.
        name: String,
    },

    /// An event kind this client does not know. Treated as a
    /// non-terminal continue signal so newer servers stay compatible.
    #[serde(other)]
    Unknown,
}

impl StreamEvent {
    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Complete | StreamEvent::Error { .. })
    }
}
