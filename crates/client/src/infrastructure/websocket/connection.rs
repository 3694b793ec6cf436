//! Connection engine shared by both channel clients.
//!
//! One [`Connection`] owns at most one live transport. `connect()` performs
//! the authenticated handshake under a timeout; once open, a single spawned
//! supervisor task drives the session (inbound frames, heartbeat, pong
//! deadline) and, when the session is lost without `disconnect()`, runs the
//! reconnection sequence. `disconnect()` cancels the session's token, which
//! every timer and wait in the supervisor observes, and reports the close
//! itself so a following `connect()` never sees a stale one.

use std::sync::{Arc, Mutex};

use gamebuilder_shared::{decode_frame, Inbound, Message, Ping};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::error::{ConnectError, SendError};
use crate::infrastructure::credentials::CredentialSource;
use crate::infrastructure::websocket::core::{lock, Backoff, BackoffState};
use crate::infrastructure::websocket::transport::{
    redact, Connector, Frame, TransportEvent,
};

/// Phase of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Idle,
    Connecting,
    Open,
    Closing,
}

/// Receives session events, synchronously on the supervisor task. A close
/// caused by `disconnect()` is reported on the caller instead.
pub trait SessionObserver: Send + Sync {
    fn on_open(&self);

    fn on_message(&self, message: Message);

    /// An open session ended, for any reason.
    fn on_close(&self);

    fn on_error(&self);

    /// A reconnection attempt was scheduled after a lost session.
    fn on_reconnecting(&self);

    /// Reconnection stopped without restoring the session.
    fn on_gave_up(&self);
}

struct State {
    phase: ConnectionPhase,
    /// Bumped on every successful open; stale sessions compare against it.
    generation: u64,
    /// Open session whose close has not been reported yet.
    unclosed: Option<u64>,
    outbound: Option<mpsc::UnboundedSender<Frame>>,
    cancel: CancellationToken,
    backoff: BackoffState,
}

struct Session {
    generation: u64,
    inbound: mpsc::UnboundedReceiver<TransportEvent>,
}

enum SessionEnd {
    Cancelled,
    Lost,
}

struct Inner {
    channel: &'static str,
    endpoint: String,
    config: ClientConfig,
    backoff: Backoff,
    credentials: Arc<dyn CredentialSource>,
    connector: Arc<dyn Connector>,
    observer: Arc<dyn SessionObserver>,
    state: Mutex<State>,
    connect_lock: tokio::sync::Mutex<()>,
}

/// Resilient WebSocket connection parameterised by endpoint and credential policy.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<Inner>,
}

impl Connection {
    pub fn new(
        channel: &'static str,
        endpoint: impl Into<String>,
        config: ClientConfig,
        credentials: Arc<dyn CredentialSource>,
        connector: Arc<dyn Connector>,
        observer: Arc<dyn SessionObserver>,
    ) -> Self {
        let config = config.sanitized();
        Self {
            inner: Arc::new(Inner {
                channel,
                endpoint: endpoint.into(),
                backoff: Backoff::from_config(&config),
                config,
                credentials,
                connector,
                observer,
                state: Mutex::new(State {
                    phase: ConnectionPhase::Idle,
                    generation: 0,
                    unclosed: None,
                    outbound: None,
                    cancel: CancellationToken::new(),
                    backoff: BackoffState::default(),
                }),
                connect_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn channel(&self) -> &'static str {
        self.inner.channel
    }

    pub fn phase(&self) -> ConnectionPhase {
        lock(&self.inner.state).phase
    }

    pub fn is_open(&self) -> bool {
        self.phase() == ConnectionPhase::Open
    }

    /// Open the connection. Resolves immediately if already open; a call made
    /// while another is in flight waits for it and resolves against its outcome.
    pub async fn connect(&self) -> Result<(), ConnectError> {
        let cancel = lock(&self.inner.state).cancel.clone();

        if let Some(session) = self.inner.open_session(&cancel).await? {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move { inner.supervise(session, cancel).await });
        }
        Ok(())
    }

    /// Close the connection intentionally. Idempotent; never reconnects.
    pub fn disconnect(&self) {
        let (outbound, was_open) = {
            let mut state = lock(&self.inner.state);
            state.cancel.cancel();
            state.cancel = CancellationToken::new();
            state.backoff.reset();

            let outbound = state.outbound.take();
            state.phase = if outbound.is_some() {
                ConnectionPhase::Closing
            } else {
                ConnectionPhase::Idle
            };
            (outbound, state.unclosed.take().is_some())
        };

        if let Some(outbound) = outbound {
            let _ = outbound.send(Frame::Close);
            tracing::info!(channel = self.inner.channel, "WebSocket disconnected");
        }
        if was_open {
            self.inner.observer.on_close();
        }
    }

    /// Queue an encoded frame on the open transport.
    pub fn send_text(&self, text: String) -> Result<(), SendError> {
        self.inner.send_frame(Frame::Text(text))
    }
}

impl Inner {
    fn send_frame(&self, frame: Frame) -> Result<(), SendError> {
        let state = lock(&self.state);
        match (&state.phase, &state.outbound) {
            (ConnectionPhase::Open, Some(outbound)) => {
                outbound.send(frame).map_err(|_| SendError::NotConnected)
            }
            _ => Err(SendError::NotConnected),
        }
    }

    /// Perform one handshake. `Ok(None)` means a session is already open.
    async fn open_session(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<Session>, ConnectError> {
        let _guard = self.connect_lock.lock().await;

        if cancel.is_cancelled() {
            return Err(ConnectError::Cancelled);
        }
        if lock(&self.state).phase == ConnectionPhase::Open {
            return Ok(None);
        }

        let credentials = self
            .credentials
            .resolve()?
            .ok_or(ConnectError::AuthenticationUnavailable)?;
        let url = credentials.target_url(&self.endpoint)?;

        lock(&self.state).phase = ConnectionPhase::Connecting;
        tracing::info!(channel = self.channel, url = %redact(&url), "Connecting WebSocket");

        let timeout = self.config.connect_timeout;
        let opened = tokio::select! {
            _ = cancel.cancelled() => Err(ConnectError::Cancelled),
            result = tokio::time::timeout(timeout, self.connector.open(&url)) => match result {
                Ok(Ok(transport)) => Ok(transport),
                Ok(Err(e)) => Err(ConnectError::Handshake(e)),
                Err(_) => Err(ConnectError::HandshakeTimeout(timeout)),
            },
        };

        let transport = match opened {
            Ok(transport) => transport,
            Err(e) => {
                {
                    let mut state = lock(&self.state);
                    if state.phase == ConnectionPhase::Connecting {
                        state.phase = ConnectionPhase::Idle;
                    }
                }
                tracing::warn!(channel = self.channel, error = %e, "WebSocket connection failed");
                if matches!(e, ConnectError::Handshake(_)) {
                    self.observer.on_error();
                }
                return Err(e);
            }
        };

        let generation = {
            let mut state = lock(&self.state);
            if cancel.is_cancelled() {
                if state.phase == ConnectionPhase::Connecting {
                    state.phase = ConnectionPhase::Idle;
                }
                return Err(ConnectError::Cancelled);
            }
            state.generation += 1;
            state.unclosed = Some(state.generation);
            state.phase = ConnectionPhase::Open;
            state.outbound = Some(transport.outbound);
            state.backoff.reset();
            state.generation
        };

        tracing::info!(channel = self.channel, "WebSocket connected");
        self.observer.on_open();

        Ok(Some(Session {
            generation,
            inbound: transport.inbound,
        }))
    }

    /// Drive sessions until cancelled or reconnection stops.
    async fn supervise(self: Arc<Self>, mut session: Session, cancel: CancellationToken) {
        loop {
            let end = self.run_session(session, &cancel).await;
            if matches!(end, SessionEnd::Cancelled) || cancel.is_cancelled() {
                return;
            }

            match self.reconnect(&cancel).await {
                Some(next) => session = next,
                None => return,
            }
        }
    }

    async fn run_session(&self, session: Session, cancel: &CancellationToken) -> SessionEnd {
        let Session {
            generation,
            mut inbound,
        } = session;

        let mut heartbeat = tokio::time::interval_at(
            Instant::now() + self.config.ping_interval,
            self.config.ping_interval,
        );
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut pong_deadline: Option<Instant> = None;

        let end = loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break SessionEnd::Cancelled,

                _ = tokio::time::sleep_until(pong_deadline.unwrap_or_else(Instant::now)),
                    if pong_deadline.is_some() =>
                {
                    tracing::warn!(channel = self.channel, "Heartbeat timeout - no pong received");
                    self.force_close(generation);
                    break SessionEnd::Lost;
                }

                event = inbound.recv() => match event {
                    Some(TransportEvent::Text(text)) => match decode_frame(&text) {
                        Ok(Inbound::Pong) => pong_deadline = None,
                        Ok(Inbound::Message(message)) => self.observer.on_message(message),
                        Err(e) => {
                            tracing::warn!(channel = self.channel, error = %e, "Dropping malformed frame");
                        }
                    },
                    Some(TransportEvent::Closed { code, reason }) => {
                        tracing::info!(channel = self.channel, ?code, %reason, "Server closed connection");
                        break SessionEnd::Lost;
                    }
                    Some(TransportEvent::Error(e)) => {
                        tracing::error!(channel = self.channel, error = %e, "WebSocket error");
                        self.observer.on_error();
                        break SessionEnd::Lost;
                    }
                    None => break SessionEnd::Lost,
                },

                _ = heartbeat.tick() => {
                    let sent = Message::from(Ping {})
                        .encode()
                        .map_err(SendError::from)
                        .and_then(|text| self.send_frame(Frame::Text(text)));
                    match sent {
                        Ok(()) => pong_deadline = Some(Instant::now() + self.config.pong_timeout),
                        Err(e) => {
                            tracing::warn!(channel = self.channel, error = %e, "Failed to send ping");
                            break SessionEnd::Lost;
                        }
                    }
                }
            }
        };

        let report_close = {
            let mut state = lock(&self.state);
            let current = state.generation == generation
                && matches!(
                    state.phase,
                    ConnectionPhase::Open | ConnectionPhase::Closing
                );
            if current {
                state.phase = ConnectionPhase::Idle;
                state.outbound = None;
            }
            // Already reported by `disconnect()` when it is gone.
            let unclosed = state.unclosed == Some(generation);
            if unclosed {
                state.unclosed = None;
            }
            unclosed
        };

        tracing::debug!(channel = self.channel, generation, "Session ended");
        if report_close {
            self.observer.on_close();
        }
        end
    }

    /// Close the transport of `generation` without marking it intentional.
    fn force_close(&self, generation: u64) {
        let outbound = {
            let mut state = lock(&self.state);
            if state.generation != generation || state.phase != ConnectionPhase::Open {
                return;
            }
            state.phase = ConnectionPhase::Closing;
            state.outbound.take()
        };

        if let Some(outbound) = outbound {
            let _ = outbound.send(Frame::Close);
        }
    }

    /// Run the backoff sequence. Returns the restored session, or `None` when
    /// cancelled, superseded by an explicit `connect()`, or given up.
    async fn reconnect(&self, cancel: &CancellationToken) -> Option<Session> {
        loop {
            match self.credentials.resolve() {
                Ok(Some(_)) => {}
                Ok(None) | Err(_) => {
                    tracing::warn!(
                        channel = self.channel,
                        "Credentials unavailable, stopping reconnection"
                    );
                    self.observer.on_gave_up();
                    return None;
                }
            }

            let next = lock(&self.state).backoff.next_delay_and_advance(&self.backoff);
            let Some((attempt, delay)) = next else {
                tracing::error!(
                    channel = self.channel,
                    "Max reconnection attempts reached, giving up"
                );
                self.observer.on_gave_up();
                return None;
            };

            tracing::info!(
                channel = self.channel,
                attempt,
                max = self.backoff.max_attempts(),
                delay_ms = delay.as_millis() as u64,
                "Scheduling reconnection attempt"
            );
            self.observer.on_reconnecting();

            tokio::select! {
                _ = cancel.cancelled() => return None,
                _ = tokio::time::sleep(delay) => {}
            }

            match self.open_session(cancel).await {
                Ok(Some(session)) => return Some(session),
                Ok(None) | Err(ConnectError::Cancelled) => return None,
                Err(e) if e.is_retryable() => {
                    tracing::warn!(channel = self.channel, attempt, error = %e, "Reconnection attempt failed");
                }
                Err(e) => {
                    tracing::warn!(channel = self.channel, error = %e, "Stopping reconnection");
                    self.observer.on_gave_up();
                    return None;
                }
            }
        }
    }
}
