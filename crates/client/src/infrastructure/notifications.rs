//! Surfacing channel lifecycle to the user.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::infrastructure::websocket::{ChannelClient, LifecycleEvent, ListenerId};
use crate::ports::outbound::{ConnectionStatus, Notifier};

pub const GAVE_UP_MESSAGE: &str = "Lost connection to server - please reconnect";

/// Notifier that writes to the log instead of a UI.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn connection_status(&self, status: ConnectionStatus) {
        tracing::info!(?status, "Connection status changed");
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

/// Listener ids installed by [`bind_notifier`], for unbinding.
#[derive(Debug, Clone)]
pub struct NotifierBinding {
    ids: Vec<(LifecycleEvent, ListenerId)>,
}

impl NotifierBinding {
    pub fn unbind(self, client: &ChannelClient) {
        for (event, id) in self.ids {
            client.remove_event_listener(event, id);
        }
    }
}

/// Forward a channel's lifecycle events to `notifier`.
///
/// `Disconnected` is only reported once the channel has been connected, so a
/// failed first attempt shows the error message alone. Each scheduled
/// reconnection reports `Connecting`.
pub fn bind_notifier(
    client: &ChannelClient,
    notifier: Arc<dyn Notifier>,
    label: &str,
) -> NotifierBinding {
    let was_connected = Arc::new(AtomicBool::new(false));
    let mut ids = Vec::with_capacity(5);

    {
        let notifier = notifier.clone();
        let was_connected = was_connected.clone();
        let id = client.add_event_listener(LifecycleEvent::Open, move || {
            was_connected.store(true, Ordering::Relaxed);
            notifier.connection_status(ConnectionStatus::Connected);
        });
        ids.push((LifecycleEvent::Open, id));
    }

    {
        let notifier = notifier.clone();
        let id = client.add_event_listener(LifecycleEvent::Close, move || {
            if was_connected.load(Ordering::Relaxed) {
                notifier.connection_status(ConnectionStatus::Disconnected);
            }
        });
        ids.push((LifecycleEvent::Close, id));
    }

    {
        let notifier = notifier.clone();
        let id = client.add_event_listener(LifecycleEvent::Reconnecting, move || {
            notifier.connection_status(ConnectionStatus::Connecting);
        });
        ids.push((LifecycleEvent::Reconnecting, id));
    }

    {
        let notifier = notifier.clone();
        let message = format!("{label} connection failed - check your network connection");
        let id = client.add_event_listener(LifecycleEvent::Error, move || {
            notifier.error(&message);
        });
        ids.push((LifecycleEvent::Error, id));
    }

    let id = client.add_event_listener(LifecycleEvent::GaveUp, move || {
        notifier.error(GAVE_UP_MESSAGE);
    });
    ids.push((LifecycleEvent::GaveUp, id));

    NotifierBinding { ids }
}
