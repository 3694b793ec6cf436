pub mod clock;
pub mod credentials;
pub mod notifications;
pub mod storage;
pub mod websocket;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use clock::SystemClock;
pub use credentials::{
    validate_token, CredentialResolver, CredentialSource, Credentials, GameCredentials,
    SessionCredentials, TokenClaims, TokenError,
};
pub use notifications::{bind_notifier, NotifierBinding, TracingNotifier};
pub use storage::{FileSessionStore, MemorySessionStore, SharedGameSelection};
