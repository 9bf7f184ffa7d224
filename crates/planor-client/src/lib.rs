//! HTTP and streaming transport for the Planor backend.
//!
//! This crate owns the wire side of the client: reassembling `data:`
//! frames from an arbitrarily-chunked byte stream, decoding frames into
//! typed [`StreamEvent`](planor_core::StreamEvent)s, driving one
//! streaming request end-to-end with timeout and cancellation, and the
//! uniform request/response plumbing the CRUD surface rides on.
//!
//! # Main types
//!
//! - [`ClientConfig`] / [`TimeoutTier`] — Immutable per-client configuration.
//! - [`RequestClient`] — Request/response calls with tiered timeouts and
//!   normalized errors; also initiates streaming calls.
//! - [`FrameAssembler`] — Chunked bytes → complete frame payloads.
//! - [`StreamTransport`] — One streaming call: pump, timeout, cancel,
//!   terminal dispatch.

/// Typed wrappers over the backend's CRUD surface.
pub mod api;
/// Client configuration and timeout tiers.
pub mod config;
/// Frame payload → typed stream event.
pub mod decode;
/// Incremental frame reassembly.
pub mod frame;
/// Request/response plumbing.
pub mod request;
/// Streaming request lifecycle.
pub mod transport;

pub use config::{ClientConfig, TimeoutTier};
pub use decode::decode_event;
pub use frame::FrameAssembler;
pub use request::{ApiBody, RequestClient};
pub use transport::{StreamCallbacks, StreamHandle, StreamTransport};
