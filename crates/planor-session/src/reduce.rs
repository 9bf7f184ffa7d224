use planor_core::StreamEvent;

/// Accumulated state of one in-flight generation.
///
/// The fold is a pure function of (prior state, event); the store
/// applies the result to its maps after every event. Keeping the fold
/// free of I/O makes the accumulation testable without a transport.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationFold {
    /// Assistant text streamed so far. Grows monotonically: at every
    /// intermediate point it is a strict prefix of the final content.
    pub buffer: String,
    /// New display name for the plan, when the server renamed it.
    pub renamed: Option<String>,
}

/// Applies one non-terminal event to the fold.
///
/// Terminal events never reach the fold — the transport routes them to
/// the terminal callbacks instead — but passing one through anyway
/// leaves the state unchanged.
pub fn reduce(mut fold: GenerationFold, event: &StreamEvent) -> GenerationFold {
    match event {
        StreamEvent::Chunk { content } => fold.buffer.push_str(content),
        StreamEvent::NameUpdate { name } => fold.renamed = Some(name.clone()),
        // Unknown kinds are continue signals with no visible effect.
        _ => {}
    }
    fold
}
