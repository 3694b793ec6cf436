//! Typed channel client.
//!
//! Wraps a [`Connection`] with a per-kind handler registry and lifecycle
//! listener sets. The general and per-game clients are the same type built
//! with a different endpoint and credential policy.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use gamebuilder_shared::{Message, MessageKind, Payload};

use crate::config::ClientConfig;
use crate::error::{ConnectError, SendError};
use crate::infrastructure::credentials::{
    CredentialResolver, CredentialSource, GameCredentials, SessionCredentials,
};
use crate::infrastructure::websocket::connection::{Connection, ConnectionPhase, SessionObserver};
use crate::infrastructure::websocket::core::lock;
use crate::infrastructure::websocket::transport::Connector;
use crate::ports::outbound::GameSelection;

/// Connection lifecycle events listeners can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    Open,
    Close,
    Error,
    /// A lost session is about to be retried after its backoff delay.
    Reconnecting,
    /// Reconnection was abandoned; the channel stays closed until `connect()`.
    GaveUp,
}

/// Handle returned by [`ChannelClient::add_event_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Handler = Arc<dyn Fn(Message) + Send + Sync>;
type Listener = Arc<dyn Fn() + Send + Sync>;

struct Dispatcher {
    channel: &'static str,
    handlers: Mutex<HashMap<MessageKind, Handler>>,
    listeners: Mutex<HashMap<LifecycleEvent, Vec<(ListenerId, Listener)>>>,
    next_listener: AtomicU64,
}

impl Dispatcher {
    fn new(channel: &'static str) -> Self {
        Self {
            channel,
            handlers: Mutex::new(HashMap::new()),
            listeners: Mutex::new(HashMap::new()),
            next_listener: AtomicU64::new(1),
        }
    }

    fn emit(&self, event: LifecycleEvent) {
        // Snapshot so listeners may (un)subscribe while being invoked.
        let listeners: Vec<Listener> = lock(&self.listeners)
            .get(&event)
            .map(|set| set.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default();

        for listener in listeners {
            listener();
        }
    }
}

impl SessionObserver for Dispatcher {
    fn on_open(&self) {
        self.emit(LifecycleEvent::Open);
    }

    fn on_message(&self, message: Message) {
        let kind = message.kind();
        let handler = lock(&self.handlers).get(&kind).cloned();
        match handler {
            Some(handler) => handler(message),
            None => tracing::trace!(channel = self.channel, %kind, "No handler registered"),
        }
    }

    fn on_close(&self) {
        self.emit(LifecycleEvent::Close);
    }

    fn on_error(&self) {
        self.emit(LifecycleEvent::Error);
    }

    fn on_reconnecting(&self) {
        self.emit(LifecycleEvent::Reconnecting);
    }

    fn on_gave_up(&self) {
        self.emit(LifecycleEvent::GaveUp);
    }
}

/// Client for one realtime channel.
#[derive(Clone)]
pub struct ChannelClient {
    connection: Connection,
    dispatcher: Arc<Dispatcher>,
}

impl ChannelClient {
    pub fn new(
        channel: &'static str,
        endpoint: impl Into<String>,
        config: ClientConfig,
        credentials: Arc<dyn CredentialSource>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(channel));
        let connection = Connection::new(
            channel,
            endpoint,
            config,
            credentials,
            connector,
            dispatcher.clone(),
        );
        Self {
            connection,
            dispatcher,
        }
    }

    /// The per-user channel.
    pub fn general(
        config: &ClientConfig,
        resolver: CredentialResolver,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self::new(
            "general",
            config.general_url.clone(),
            config.clone(),
            Arc::new(SessionCredentials::new(resolver)),
            connector,
        )
    }

    /// The channel of the currently selected game.
    pub fn game(
        config: &ClientConfig,
        resolver: CredentialResolver,
        selection: Arc<dyn GameSelection>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self::new(
            "game",
            config.game_url.clone(),
            config.clone(),
            Arc::new(GameCredentials::new(resolver, selection)),
            connector,
        )
    }

    pub fn channel(&self) -> &'static str {
        self.connection.channel()
    }

    pub async fn connect(&self) -> Result<(), ConnectError> {
        self.connection.connect().await
    }

    pub fn disconnect(&self) {
        self.connection.disconnect();
    }

    pub fn state(&self) -> ConnectionPhase {
        self.connection.phase()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_open()
    }

    /// Install the handler for `kind`, replacing any previous one.
    pub fn register_handler<F>(&self, kind: MessageKind, handler: F)
    where
        F: Fn(Message) + Send + Sync + 'static,
    {
        lock(&self.dispatcher.handlers).insert(kind, Arc::new(handler));
    }

    /// Typed form of [`register_handler`](Self::register_handler).
    pub fn on<P, F>(&self, handler: F)
    where
        P: Payload,
        F: Fn(P) + Send + Sync + 'static,
    {
        self.register_handler(P::KIND, move |message| {
            if let Some(payload) = P::from_message(message) {
                handler(payload);
            }
        });
    }

    pub fn unregister_handler(&self, kind: MessageKind) {
        lock(&self.dispatcher.handlers).remove(&kind);
    }

    /// Send a message if the channel is open.
    pub fn send(&self, message: impl Into<Message>) -> Result<(), SendError> {
        let message = message.into();
        let kind = message.kind();
        let result = message
            .encode()
            .map_err(SendError::from)
            .and_then(|text| self.connection.send_text(text));

        if let Err(e) = &result {
            tracing::error!(channel = self.channel(), %kind, "Failed to send message: {}", e);
        }
        result
    }

    pub fn send_payload<P: Payload>(&self, payload: P) -> Result<(), SendError> {
        self.send(payload.into_message())
    }

    /// Subscribe to a lifecycle event. Listeners run in subscription order.
    pub fn add_event_listener<F>(&self, event: LifecycleEvent, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = ListenerId(self.dispatcher.next_listener.fetch_add(1, Ordering::Relaxed));
        lock(&self.dispatcher.listeners)
            .entry(event)
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    /// Returns whether a listener was removed.
    pub fn remove_event_listener(&self, event: LifecycleEvent, id: ListenerId) -> bool {
        let mut listeners = lock(&self.dispatcher.listeners);
        let Some(set) = listeners.get_mut(&event) else {
            return false;
        };
        let before = set.len();
        set.retain(|(existing, _)| *existing != id);
        set.len() != before
    }
}
