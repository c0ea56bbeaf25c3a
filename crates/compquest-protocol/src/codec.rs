//! Codec for converting between wire bytes and protocol types.
//!
//! Decoding is not a plain serde call because the protocol has two shapes
//! that fall outside the tagged-enum happy path: a bare `{"error": …}`
//! object signalling an authentication rejection, and forward-compatible
//! tolerance of event tags this client predates. [`JsonCodec`] handles the
//! dispatch; the [`WireCodec`] trait keeps the session loop testable
//! against alternative codecs.

use crate::{ClientCommand, ProtocolError, ServerEvent};

/// Converts inbound bytes to [`ServerEvent`]s and outbound
/// [`ClientCommand`]s to bytes.
///
/// `Send + Sync + 'static` because the codec is held by the long-lived
/// client driver task.
pub trait WireCodec: Send + Sync + 'static {
    /// Decodes one inbound message.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Malformed`] when the payload is not a JSON
    /// object carrying either an `event` tag or a bare `error` field, and
    /// [`ProtocolError::Decode`] when a recognized event's payload doesn't
    /// match its schema. Unrecognized tags are *not* errors — they decode
    /// to [`ServerEvent::Unknown`].
    fn decode_event(&self, data: &[u8]) -> Result<ServerEvent, ProtocolError>;

    /// Serializes one outbound command.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode_command(&self, command: &ClientCommand) -> Result<Vec<u8>, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// The production codec: JSON objects with an `event` discriminator.
///
/// Field order is not significant; there is no bit-exact wire contract
/// beyond "valid JSON object with the right fields".
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl WireCodec for JsonCodec {
    fn decode_event(&self, data: &[u8]) -> Result<ServerEvent, ProtocolError> {
        let value: serde_json::Value =
            serde_json::from_slice(data).map_err(ProtocolError::Decode)?;

        let Some(object) = value.as_object() else {
            return Err(ProtocolError::Malformed("payload is not an object".into()));
        };

        let Some(tag) = object.get("event") else {
            // No event tag: a bare error object is the server's way of
            // rejecting the handshake credential. Anything else is garbage.
            if let Some(err) = object.get("error") {
                let message = err
                    .as_str()
                    .map(str::to_owned)
                    .unwrap_or_else(|| err.to_string());
                return Ok(ServerEvent::AuthRejected { message });
            }
            return Err(ProtocolError::Malformed(
                "object has no event tag and no error field".into(),
            ));
        };

        let Some(tag) = tag.as_str() else {
            return Err(ProtocolError::Malformed("event tag is not a string".into()));
        };

        if !ServerEvent::recognized_tag(tag) {
            return Ok(ServerEvent::Unknown {
                event: tag.to_owned(),
                payload: value,
            });
        }

        serde_json::from_value(value).map_err(ProtocolError::Decode)
    }

    fn encode_command(&self, command: &ClientCommand) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(command).map_err(ProtocolError::Encode)
    }
}

// =========================================================================
// Tests
// =========================================================================
