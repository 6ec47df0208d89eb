//! Codec trait and implementations for turning wire types into bytes.
//!
//! The server never hard-codes a format: the session encodes each state
//! snapshot through whatever [`Codec`] it was spawned with, and the
//! connection handler decodes player messages the same way.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to bytes and decodes bytes back.
///
/// Implementations must be deterministic: encoding the same value twice
/// yields the same bytes. Players compare consecutive snapshots, and a
/// format that reorders fields between encodings makes that noisy.
///
/// `Send + Sync + 'static` because one codec instance is shared by the
/// session actor and every connection task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented
    /// in this format.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Struct fields are written in declaration order, so output is stable.
///
/// ```rust
/// use tictac_protocol::{ClientMessage, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let msg = ClientMessage::MakeTurn { x: 0, y: 2 };
///
/// let bytes = codec.encode(&msg).unwrap();
/// assert_eq!(bytes, br#"{"type":"make_turn","x":0,"y":2}"#);
///
/// let decoded: ClientMessage = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, msg);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
