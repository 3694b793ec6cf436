//! tokio-tungstenite implementation of [`Connector`].

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use url::Url;

use crate::error::TransportError;
use crate::infrastructure::websocket::transport::{
    redact, Connector, Frame, Transport, TransportEvent,
};

/// Opens real WebSocket connections (`ws://` and, with the `tls` feature, `wss://`).
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

impl TungsteniteConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn open(&self, url: &Url) -> Result<Transport, TransportError> {
        let (ws_stream, _response) = connect_async(url.as_str()).await?;
        tracing::debug!(url = %redact(url), "WebSocket handshake completed");

        let (mut write, mut read) = ws_stream.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Frame>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<TransportEvent>();

        tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                let result = match frame {
                    Frame::Text(text) => write.send(WsMessage::Text(text)).await,
                    Frame::Close => {
                        let close = CloseFrame {
                            code: CloseCode::Normal,
                            reason: "client disconnect".into(),
                        };
                        if let Err(e) = write.send(WsMessage::Close(Some(close))).await {
                            tracing::debug!("Failed to send close frame: {}", e);
                        }
                        break;
                    }
                };
                if let Err(e) = result {
                    tracing::error!("Failed to send message: {}", e);
                    break;
                }
            }
            let _ = write.close().await;
        });

        tokio::spawn(async move {
            loop {
                let next = tokio::select! {
                    _ = in_tx.closed() => break,
                    next = read.next() => next,
                };

                let event = match next {
                    Some(Ok(WsMessage::Text(text))) => TransportEvent::Text(text),
                    Some(Ok(WsMessage::Close(frame))) => {
                        let (code, reason) = frame
                            .map(|f| (Some(u16::from(f.code)), f.reason.into_owned()))
                            .unwrap_or((None, String::new()));
                        let _ = in_tx.send(TransportEvent::Closed { code, reason });
                        break;
                    }
                    // Pings are answered by tungstenite; binary frames are not part of the protocol.
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        let _ = in_tx.send(TransportEvent::Error(e.into()));
                        break;
                    }
                    None => {
                        let _ = in_tx.send(TransportEvent::Closed {
                            code: None,
                            reason: String::new(),
                        });
                        break;
                    }
                };

                if in_tx.send(event).is_err() {
                    break;
                }
            }
        });

        Ok(Transport {
            outbound: out_tx,
            inbound: in_rx,
        })
    }
}
