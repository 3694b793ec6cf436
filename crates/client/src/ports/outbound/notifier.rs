//! User-facing notification port.

/// Connection status shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
}

/// Sink for user-visible connection notifications (toasts, status bar).
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn connection_status(&self, status: ConnectionStatus);

    fn error(&self, message: &str);
}
