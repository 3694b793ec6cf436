//! Scripted in-memory [`Connector`].
//!
//! Each `open()` consumes the next scripted [`Handshake`] (or the fallback once
//! the script is empty). Accepted handshakes publish a [`MockServer`] that the
//! test uses to play the server side of the socket.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gamebuilder_shared::Message;
use tokio::sync::mpsc;
use tokio::time::Instant;
use url::Url;

use crate::error::TransportError;
use crate::infrastructure::websocket::core::lock;
use crate::infrastructure::websocket::{Connector, Frame, Transport, TransportEvent};

/// Outcome of one scripted handshake.
#[derive(Debug, Clone)]
pub enum Handshake {
    Accept,
    AcceptAfter(Duration),
    Reject(String),
    /// Never completes; exercises the handshake timeout.
    Hang,
}

/// Server side of an accepted mock socket.
pub struct MockServer {
    pub url: Url,
    client_frames: mpsc::UnboundedReceiver<Frame>,
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl MockServer {
    pub fn send_text(&self, text: impl Into<String>) {
        let _ = self.events.send(TransportEvent::Text(text.into()));
    }

    pub fn send_message(&self, message: impl Into<Message>) {
        if let Ok(text) = message.into().encode() {
            self.send_text(text);
        }
    }

    /// Close from the server side with an optional close code.
    pub fn close(&self, code: Option<u16>) {
        let _ = self.events.send(TransportEvent::Closed {
            code,
            reason: String::new(),
        });
    }

    pub fn error(&self, error: TransportError) {
        let _ = self.events.send(TransportEvent::Error(error));
    }

    /// Next frame written by the client; `None` once the client dropped the socket.
    pub async fn next_frame(&mut self) -> Option<Frame> {
        self.client_frames.recv().await
    }

    /// Next text frame decoded as a [`Message`], skipping anything else.
    pub async fn next_message(&mut self) -> Option<Message> {
        while let Some(frame) = self.next_frame().await {
            if let Frame::Text(text) = frame {
                if let Ok(message) = serde_json::from_str(&text) {
                    return Some(message);
                }
            }
        }
        None
    }
}

struct Script {
    queue: VecDeque<Handshake>,
    fallback: Handshake,
    attempts: Vec<(Instant, Url)>,
}

/// In-memory connector driven by a handshake script.
#[derive(Clone)]
pub struct MockConnector {
    script: Arc<Mutex<Script>>,
    servers_tx: mpsc::UnboundedSender<MockServer>,
    servers_rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<MockServer>>>,
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConnector {
    /// Accepts every handshake.
    pub fn new() -> Self {
        Self::scripted(Vec::new(), Handshake::Accept)
    }

    pub fn scripted(script: impl IntoIterator<Item = Handshake>, fallback: Handshake) -> Self {
        let (servers_tx, servers_rx) = mpsc::unbounded_channel();
        Self {
            script: Arc::new(Mutex::new(Script {
                queue: script.into_iter().collect(),
                fallback,
                attempts: Vec::new(),
            })),
            servers_tx,
            servers_rx: Arc::new(tokio::sync::Mutex::new(servers_rx)),
        }
    }

    /// Number of `open()` calls so far.
    pub fn attempts(&self) -> usize {
        lock(&self.script).attempts.len()
    }

    /// When each `open()` call started.
    pub fn attempt_times(&self) -> Vec<Instant> {
        lock(&self.script).attempts.iter().map(|(at, _)| *at).collect()
    }

    /// Wait for the next accepted socket.
    pub async fn next_server(&self) -> Option<MockServer> {
        self.servers_rx.lock().await.recv().await
    }

    /// Socket accepted since the last call, without waiting.
    pub fn try_next_server(&self) -> Option<MockServer> {
        self.servers_rx.try_lock().ok()?.try_recv().ok()
    }

    fn accept(&self, url: &Url) -> Transport {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let _ = self.servers_tx.send(MockServer {
            url: url.clone(),
            client_frames: out_rx,
            events: in_tx,
        });
        Transport {
            outbound: out_tx,
            inbound: in_rx,
        }
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn open(&self, url: &Url) -> Result<Transport, TransportError> {
        let step = {
            let mut script = lock(&self.script);
            script.attempts.push((Instant::now(), url.clone()));
            let fallback = script.fallback.clone();
            script.queue.pop_front().unwrap_or(fallback)
        };

        match step {
            Handshake::Accept => Ok(self.accept(url)),
            Handshake::AcceptAfter(delay) => {
                tokio::time::sleep(delay).await;
                Ok(self.accept(url))
            }
            Handshake::Reject(reason) => Err(TransportError::Handshake(reason)),
            Handshake::Hang => std::future::pending().await,
        }
    }
}
