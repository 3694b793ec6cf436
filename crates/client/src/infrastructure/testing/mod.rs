//! Test doubles for the transport and token fixtures.
//!
//! Available to unit tests and, with the `testing` feature, to downstream
//! crates that want to drive a channel client without a network.

pub mod fixtures;
mod mock_transport;

pub use mock_transport::{Handshake, MockConnector, MockServer};
