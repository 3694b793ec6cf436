//! Composition root for the realtime channels.

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::infrastructure::credentials::CredentialResolver;
use crate::infrastructure::websocket::{ChannelClient, Connector, TungsteniteConnector};
use crate::infrastructure::{FileSessionStore, SharedGameSelection, SystemClock};
use crate::ports::outbound::{Clock, SessionStore};

/// Owns the general and per-game channel clients.
///
/// Both share the session store and clock but nothing else: each has its own
/// connection, handlers and listeners, and they connect independently.
#[derive(Clone)]
pub struct Clients {
    pub general: ChannelClient,
    pub game: ChannelClient,
    pub selection: SharedGameSelection,
    session: Arc<dyn SessionStore>,
}

impl Clients {
    pub fn new(
        config: &ClientConfig,
        session: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        selection: SharedGameSelection,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let resolver = CredentialResolver::new(session.clone(), clock);
        let general = ChannelClient::general(config, resolver.clone(), connector.clone());
        let game = ChannelClient::game(
            config,
            resolver,
            Arc::new(selection.clone()),
            connector,
        );

        Self {
            general,
            game,
            selection,
            session,
        }
    }

    /// Desktop wiring: persisted session file, system clock, tungstenite transport.
    pub fn desktop(config: &ClientConfig) -> Self {
        Self::new(
            config,
            Arc::new(FileSessionStore::new()),
            Arc::new(SystemClock::new()),
            SharedGameSelection::new(),
            Arc::new(TungsteniteConnector::new()),
        )
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    /// Close both channels and forget the stored token.
    pub fn logout(&self) {
        self.disconnect_all();
        self.session.clear();
        self.selection.clear();
    }

    pub fn disconnect_all(&self) {
        self.general.disconnect();
        self.game.disconnect();
    }
}
