//! Platform abstraction ports
//!
//! These traits abstract client-side persisted state so that:
//! 1. Credential resolution stays independent of where the token lives
//! 2. The per-game channel can ask "which game?" without a global store
//! 3. Code becomes easily testable with mock implementations

use chrono::{DateTime, Utc};

/// Persisted login session (cookie jar / key-value file).
#[cfg_attr(test, mockall::automock)]
pub trait SessionStore: Send + Sync {
    /// The stored access token, if any.
    fn current_token(&self) -> Option<String>;

    /// Replace the stored access token.
    fn set_token(&self, token: &str);

    /// Forget the stored access token (logout).
    fn clear(&self);
}

/// Currently selected game project.
#[cfg_attr(test, mockall::automock)]
pub trait GameSelection: Send + Sync {
    fn active_game_id(&self) -> Option<String>;
}

/// Wall clock, injected so token expiry can be tested.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Storage key constants
///
/// These are kept in the ports layer as they define the contract for
/// what keys are used across the application.
pub mod storage_keys {
    pub const ACCESS_TOKEN: &str = "access_token";
}
