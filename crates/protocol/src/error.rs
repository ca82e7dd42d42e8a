//! Error types for the protocol crate.

use thiserror::Error;

/// Protocol error type covering all possible wire failure modes.
#[derive(Debug, Error)]
pub enum ProtocolError {
    // Frame errors
    /// A text frame arrived with no packet type byte.
    #[error("empty frame")]
    EmptyFrame,

    /// The leading packet type byte is outside the defined set.
    #[error("unknown packet type: {packet:?}")]
    UnknownPacketType {
        /// The unrecognized type byte.
        packet: char,
    },

    /// A message packet carried a nested type byte outside the defined set.
    #[error("unknown message type: {packet:?}")]
    UnknownMessageType {
        /// The unrecognized nested type byte.
        packet: char,
    },

    /// A binary frame arrived on the text-only wallet channel.
    #[error("unexpected binary frame: {size} bytes")]
    UnexpectedBinaryFrame {
        /// Size of the rejected frame.
        size: usize,
    },

    // Payload errors
    /// The open packet payload is not a valid handshake document.
    #[error("malformed handshake: {0}")]
    MalformedHandshake(String),

    /// An event packet body is not a `[name, payload]` array.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    // Serialization errors
    /// Failed to serialize a packet or envelope to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Failed to deserialize a packet or envelope from JSON.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

// Conversions from underlying crate errors

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_eof() || err.is_syntax() {
            ProtocolError::Deserialization(err.to_string())
        } else {
            ProtocolError::Serialization(err.to_string())
        }
    }
}
