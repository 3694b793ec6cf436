//! Transport seam between the connection engine and the socket library.
//!
//! A [`Connector`] performs the handshake and hands back a pair of channels.
//! The engine never sees tungstenite types, which keeps the state machine
//! testable against a scripted in-memory server.

use async_trait::async_trait;
use tokio::sync::mpsc;
use url::Url;

use crate::error::TransportError;

/// Frame written by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    /// Normal-closure close frame; the writer stops after sending it.
    Close,
}

/// Event read from the socket.
#[derive(Debug)]
pub enum TransportEvent {
    Text(String),
    Closed { code: Option<u16>, reason: String },
    Error(TransportError),
}

/// An open socket.
///
/// Dropping `outbound` closes the write half; `inbound` ends after a
/// `Closed` or `Error` event.
#[derive(Debug)]
pub struct Transport {
    pub outbound: mpsc::UnboundedSender<Frame>,
    pub inbound: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Opens sockets. Implementations must not enforce their own handshake
/// timeout; the engine applies the configured one.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, url: &Url) -> Result<Transport, TransportError>;
}

/// Render a target URL for logs without its query (which carries the token).
pub fn redact(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_strips_token_query() {
        let url = Url::parse("wss://builder.nethos.xyz/ws/u1?token=a.b.c&game_id=g1")
            .expect("valid url");
        assert_eq!(redact(&url), "wss://builder.nethos.xyz/ws/u1");
    }
}
