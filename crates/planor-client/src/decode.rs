use planor_core::StreamEvent;

/// Parses a frame payload into a [`StreamEvent`].
///
/// Returns `None` when the payload is not valid JSON in any event
/// shape; the caller skips the frame and keeps reading — a parse
/// failure never aborts the stream. Payloads whose `type` is not
/// recognized decode to [`StreamEvent::Unknown`].
pub fn decode_event(payload: &str) -> Option<StreamEvent> {
    serde_json::from_str(payload).ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn decodes_chunk_payload() {
        let event = decode_event(r###"{"type": "chunk", "content": "## Overview"}"###).unwrap();
        assert_eq!(
            event,
            StreamEvent::Chunk {
                content: "## Overview".into()
            }
        );
    }

    #[test]
    fn malformed_json_yields_no_event() {
        assert_eq!(decode_event("{not json"), None);
        assert_eq!(decode_event(""), None);
        assert_eq!(decode_event("plain text line"), None);
    }

    #[test]
    fn missing_required_field_yields_no_event() {
        // A chunk without content is malformed, not an empty chunk.
        assert_eq!(decode_event(r#"{"type": "chunk"}"#), None);
    }

    #[test]
    fn unknown_type_decodes_to_unknown() {
        let event = decode_event(r#"{"type": "heartbeat"}"#).unwrap();
        assert_eq!(event, StreamEvent::Unknown);
    }

    #[test]
    fn server_error_event_decodes() {
        let event = decode_event(r#"{"type": "error", "message": "model overloaded"}"#).unwrap();
        assert_eq!(
            event,
            StreamEvent::Error {
                message: "model overloaded".into()
            }
        );
    }
}
