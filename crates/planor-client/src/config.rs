use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Immutable configuration for a [`RequestClient`](crate::RequestClient).
///
/// Constructed by the caller and passed down; there is no global client
/// instance. The three timeout tiers are selected per call site, not
/// globally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base address of the backend, e.g. `http://127.0.0.1:8000`.
    pub base_url: String,
    /// Milliseconds allowed for interactive reads and writes.
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
    /// Milliseconds allowed for long-running operations (plan creation,
    /// version updates).
    #[serde(default = "long_timeout_ms")]
    pub long_timeout_ms: u64,
    /// Milliseconds allowed for a whole streaming generation call.
    #[serde(default = "streaming_timeout_ms")]
    pub streaming_timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn long_timeout_ms() -> u64 {
    60_000
}

fn streaming_timeout_ms() -> u64 {
    300_000
}

impl ClientConfig {
    /// Configuration pointing at `base_url` with the default timeout
    /// tiers.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            default_timeout_ms: default_timeout_ms(),
            long_timeout_ms: long_timeout_ms(),
            streaming_timeout_ms: streaming_timeout_ms(),
        }
    }

    /// The timeout duration for a tier.
    pub fn timeout(&self, tier: TimeoutTier) -> Duration {
        let ms = match tier {
            TimeoutTier::Default => self.default_timeout_ms,
            TimeoutTier::Long => self.long_timeout_ms,
            TimeoutTier::Streaming => self.streaming_timeout_ms,
        };
        Duration::from_millis(ms)
    }
}

/// Which timeout class a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutTier {
    /// Interactive reads and writes.
    Default,
    /// Long-running CRUD operations.
    Long,
    /// Long-lived chunked generation responses. The longest tier.
    Streaming,
}
