//! Codec trait and implementations for converting values to text frames.
//!
//! The connection handler never calls `serde_json` directly; it goes
//! through a [`Codec`], so the frame format lives in exactly one place.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values into text frames and decodes text frames back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a text frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Parses a text frame into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the text is malformed or does not
    /// match the expected shape.
    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ```rust
/// use tether_protocol::{Codec, CommandEnvelope, JsonCodec};
///
/// let codec = JsonCodec;
/// let envelope: CommandEnvelope = codec
///     .decode(r#"{"syncId":"7","command":"friendList"}"#)
///     .unwrap();
/// assert_eq!(envelope.command, "friendList");
/// assert!(envelope.content.is_none());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}
