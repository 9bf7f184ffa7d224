//! Client-side session state for the Planor assistant.
//!
//! The [`SessionStore`] is the canonical in-memory view of "what the
//! assistant has said so far" and "what the current plan version is".
//! It consumes typed stream events through callbacks registered with
//! the transport, folds them through a pure reducer, and issues the
//! ordinary request/response CRUD calls for everything else.

/// Pure fold from stream events to generation state.
pub mod reduce;
/// The canonical client-side state container.
pub mod store;

pub use reduce::{reduce, GenerationFold};
pub use store::SessionStore;
