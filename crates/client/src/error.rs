//! Error types for the client crate.

use scatter_protocol::types::ApiError;
use scatter_protocol::ProtocolError;
use thiserror::Error;

use crate::config::ConfigError;

/// Client error type covering connection, request, and session failures.
#[derive(Debug, Error)]
pub enum ScatterError {
    // Connection errors
    /// Every configured wallet endpoint failed to connect.
    #[error("no wallet endpoint reachable")]
    ConnectionUnavailable,

    /// An operation was attempted before a connection was established.
    #[error("not connected to a wallet")]
    NotConnected,

    /// The connection was torn down while the request was still pending.
    #[error("connection closed while the request was pending")]
    Disconnected,

    // Request errors
    /// No response arrived within the per-request deadline.
    #[error("request timed out: {kind}")]
    Timeout {
        /// Operation selector of the abandoned request.
        kind: String,
    },

    /// The caller aborted the operation.
    #[error("request cancelled")]
    Cancelled,

    /// The wallet explicitly reported a failure. The remote message is
    /// carried unmodified and the request is never retried.
    #[error("wallet error: {0}")]
    Remote(ApiError),

    // Protocol errors
    /// An inbound or outbound frame violated the wire protocol.
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolError),

    /// The WebSocket transport failed while connecting or writing.
    /// Recovered by endpoint fallback during connect; otherwise escalated.
    #[error("transport failure: {0}")]
    Transport(String),

    // Session errors
    /// No identity has been granted by the wallet yet.
    #[error("no identity granted by the wallet")]
    NotAuthenticated,

    // Configuration and storage errors
    /// The client configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The storage provider failed to load or persist a value.
    #[error("storage operation failed: {0}")]
    Storage(String),
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ScatterError>;

// Conversions from underlying crate errors

impl From<serde_json::Error> for ScatterError {
    fn from(err: serde_json::Error) -> Self {
        ScatterError::Protocol(ProtocolError::from(err))
    }
}

impl From<std::io::Error> for ScatterError {
    fn from(err: std::io::Error) -> Self {
        ScatterError::Storage(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ScatterError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ScatterError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_unavailable_display() {
        let err = ScatterError::ConnectionUnavailable;
        assert_eq!(err.to_string(), "no wallet endpoint reachable");
    }

    #[test]
    fn test_not_connected_display() {
        let err = ScatterError::NotConnected;
        assert_eq!(err.to_string(), "not connected to a wallet");
    }

    #[test]
    fn test_disconnected_display() {
        let err = ScatterError::Disconnected;
        assert_eq!(
            err.to_string(),
            "connection closed while the request was pending"
        );
    }

    #[test]
    fn test_timeout_display() {
        let err = ScatterError::Timeout {
            kind: "requestSignature".to_string(),
        };
        assert_eq!(err.to_string(), "request timed out: requestSignature");
    }

    #[test]
    fn test_cancelled_display() {
        let err = ScatterError::Cancelled;
        assert_eq!(err.to_string(), "request cancelled");
    }

    #[test]
    fn test_remote_error_display_keeps_message() {
        let err = ScatterError::Remote(ApiError {
            kind: "identity_rejected".to_string(),
            message: "User rejected the provision of an Identity".to_string(),
            code: 402,
            is_error: true,
        });
        assert_eq!(
            err.to_string(),
            "wallet error: User rejected the provision of an Identity (identity_rejected)"
        );

        // The remote detail survives untouched for programmatic handling.
        let ScatterError::Remote(api) = err else {
            panic!("expected remote variant");
        };
        assert_eq!(api.message, "User rejected the provision of an Identity");
        assert_eq!(api.code, 402);
    }

    #[test]
    fn test_not_authenticated_display() {
        let err = ScatterError::NotAuthenticated;
        assert_eq!(err.to_string(), "no identity granted by the wallet");
    }

    #[test]
    fn test_storage_display() {
        let err = ScatterError::Storage("permission denied".to_string());
        assert_eq!(err.to_string(), "storage operation failed: permission denied");
    }

    #[test]
    fn test_from_protocol_error() {
        let err: ScatterError = ProtocolError::EmptyFrame.into();
        assert!(matches!(err, ScatterError::Protocol(_)));
        assert_eq!(err.to_string(), "protocol violation: empty frame");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ScatterError = json_err.into();
        assert!(matches!(
            err,
            ScatterError::Protocol(ProtocolError::Deserialization(_))
        ));
    }

    #[test]
    fn test_transport_display() {
        let err = ScatterError::Transport("connection reset".to_string());
        assert_eq!(err.to_string(), "transport failure: connection reset");
    }

    #[test]
    fn test_from_websocket_error() {
        let ws_err = tokio_tungstenite::tungstenite::Error::ConnectionClosed;
        let err: ScatterError = ws_err.into();
        assert!(matches!(err, ScatterError::Transport(_)));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ScatterError = io_err.into();
        assert!(matches!(err, ScatterError::Storage(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ScatterError>();
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<()> {
            Ok(())
        }
        assert!(returns_result().is_ok());
    }
}
