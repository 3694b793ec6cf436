//! Error types for the realtime channels.
//!
//! Nothing here is thrown across the session task: transport and heartbeat
//! failures surface as lifecycle events, only `connect()` and `send()` return
//! these errors to callers.

use std::time::Duration;

use thiserror::Error;

/// Why a `connect()` call failed.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// No valid token (missing, malformed, or expired).
    #[error("Missing authentication credentials")]
    AuthenticationUnavailable,

    /// The per-game channel was asked to connect with no game selected.
    #[error("No active game selected")]
    NoActiveGame,

    #[error("Connection timeout after {0:?}")]
    HandshakeTimeout(Duration),

    #[error("Failed to establish WebSocket connection: {0}")]
    Handshake(#[from] TransportError),

    #[error("Invalid WebSocket endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// `disconnect()` was called while the attempt was pending.
    #[error("Connection attempt cancelled by disconnect")]
    Cancelled,
}

impl ConnectError {
    /// Whether retrying later could succeed without user action.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ConnectError::HandshakeTimeout(_) | ConnectError::Handshake(_)
        )
    }
}

/// Failure reported by the underlying transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("handshake rejected: {0}")]
    Handshake(String),

    #[error("connection closed: {0}")]
    Closed(String),

    #[error("io error: {0}")]
    Io(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;

        match error {
            WsError::ConnectionClosed | WsError::AlreadyClosed => {
                TransportError::Closed(error.to_string())
            }
            WsError::Io(e) => TransportError::Io(e.to_string()),
            other => TransportError::Handshake(other.to_string()),
        }
    }
}

/// Why a `send()` call did not transmit.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("WebSocket is not connected")]
    NotConnected,

    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}
