//! Incremental reassembly of `data:`-framed text from an
//! arbitrarily-chunked byte stream.

/// Marker that starts a payload-bearing line inside a frame.
const DATA_MARKER: &str = "data:";

/// Separator that terminates a complete frame.
const FRAME_SEPARATOR: &str = "\n\n";

/// Reassembles complete frames from successive opaque byte chunks.
///
/// The assembler keeps a single growable text buffer. Each [`push`]
/// appends the chunk through a streaming UTF-8 decode — a multi-byte
/// sequence split across chunk boundaries is carried over intact, never
/// decoded piecewise — then splits off every complete frame terminated
/// by a blank line. Feeding the same bytes in different fragmentations
/// yields the same frames in the same order.
///
/// Malformed input never errors here: an invalid byte sequence is
/// replaced, and payloads that fail to parse as JSON are dropped
/// downstream at the decode step.
///
/// [`push`]: FrameAssembler::push
#[derive(Debug, Default)]
pub struct FrameAssembler {
    /// Decoded text not yet consumed by a complete frame.
    text: String,
    /// Trailing bytes of an incomplete UTF-8 sequence from the last chunk.
    partial: Vec<u8>,
}

impl FrameAssembler {
    /// Creates an empty assembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk of raw bytes, returning the payloads of every
    /// frame it completes, in order. Frames with empty payloads are
    /// discarded.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.decode(chunk);

        let mut payloads = Vec::new();
        while let Some(end) = self.text.find(FRAME_SEPARATOR) {
            let frame = self.text[..end].to_string();
            self.text.drain(..end + FRAME_SEPARATOR.len());
            if let Some(payload) = frame_payload(&frame) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flushes a trailing partial frame at end-of-stream.
    ///
    /// Servers that omit the final blank-line separator are tolerated:
    /// whatever remains in the buffer is run through the same splitting
    /// logic. An incomplete multi-byte sequence left at end-of-stream
    /// cannot be completed and is dropped.
    pub fn finish(&mut self) -> Vec<String> {
        self.partial.clear();
        let rest = std::mem::take(&mut self.text);
        rest.split(FRAME_SEPARATOR).filter_map(frame_payload).collect()
    }

    /// Appends `chunk` to the carried-over partial sequence and decodes
    /// as far as the data allows, keeping any new incomplete tail.
    fn decode(&mut self, chunk: &[u8]) {
        let mut bytes = std::mem::take(&mut self.partial);
        bytes.extend_from_slice(chunk);

        let mut rest: &[u8] = &bytes;
        loop {
            match std::str::from_utf8(rest) {
                Ok(s) => {
                    self.text.push_str(s);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    if let Ok(s) = std::str::from_utf8(valid) {
                        self.text.push_str(s);
                    }
                    match e.error_len() {
                        // Incomplete trailing sequence: carry it into the
                        // next chunk.
                        None => {
                            self.partial = after.to_vec();
                            break;
                        }
                        // Invalid sequence: replace it and keep decoding.
                        Some(len) => {
                            self.text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                    }
                }
            }
        }
    }
}

/// Builds a frame's payload: every `data:`-marked line, marker stripped
/// and at most one leading space removed, joined with newlines and
/// trimmed. Lines without the marker are ignored. `None` for an empty
/// payload.
fn frame_payload(frame: &str) -> Option<String> {
    let mut parts = Vec::new();
    for line in frame.lines() {
        if let Some(rest) = line.strip_prefix(DATA_MARKER) {
            parts.push(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }
    if parts.is_empty() {
        return None;
    }
    let payload = parts.join("\n").trim().to_string();
    if payload.is_empty() {
        None
    } else {
        Some(payload)
    }
}
