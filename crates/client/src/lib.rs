//! Game Builder realtime client.
//!
//! Two channel clients (the per-user general channel and the per-game channel)
//! built on one connection engine: authenticated connect with timeout,
//! ping/pong liveness and exponential-backoff reconnection, with typed
//! message dispatch on top.

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod ports;

pub use clients::Clients;
pub use config::ClientConfig;
pub use error::{ConnectError, SendError, TransportError};
pub use infrastructure::websocket::{ChannelClient, ConnectionPhase, LifecycleEvent, ListenerId};
