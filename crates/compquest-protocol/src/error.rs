//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire messages.
///
/// The codec draws a deliberate line: an *unrecognized* event tag is not an
/// error (it decodes to [`ServerEvent::Unknown`](crate::ServerEvent::Unknown)),
/// but a payload that isn't a tagged object, or a recognized tag with a
/// broken payload, fails closed with one of these.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization of an outbound command failed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// An inbound payload was not valid JSON, or a recognized event's
    /// payload was missing required fields.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// An inbound payload parsed as JSON but is not a message this protocol
    /// can interpret (not an object, or no event tag and no error field).
    #[error("malformed message: {0}")]
    Malformed(String),
}
