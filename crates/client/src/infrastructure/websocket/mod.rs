//! WebSocket channel clients
//!
//! - `connection`: the resilient connection engine (handshake, heartbeat, reconnection)
//! - `channel`: typed handler registry and lifecycle listeners on top of it
//! - `transport`: the connector seam; `desktop` implements it with tokio-tungstenite

mod channel;
mod connection;
pub(crate) mod core;
mod desktop;
pub mod shared;
mod transport;

pub use channel::{ChannelClient, LifecycleEvent, ListenerId};
pub use connection::{Connection, ConnectionPhase, SessionObserver};
pub use self::core::{Backoff, BackoffState};
pub use desktop::TungsteniteConnector;
pub use transport::{redact, Connector, Frame, Transport, TransportEvent};
