//! Outbound ports - Interfaces for external collaborators
//!
//! These ports define the contracts that infrastructure adapters must implement,
//! allowing the channel clients to resolve credentials and surface connection
//! status without depending on concrete storage or UI implementations.

pub mod notifier;
pub mod platform;

pub use notifier::{ConnectionStatus, Notifier};
pub use platform::{storage_keys, Clock, GameSelection, SessionStore};

#[cfg(test)]
pub use notifier::MockNotifier;
#[cfg(test)]
pub use platform::{MockGameSelection, MockSessionStore};
