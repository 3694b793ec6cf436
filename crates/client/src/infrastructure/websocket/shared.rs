//! Protocol constants shared by both channel clients.
//!
//! Kept in one place so the general and per-game channels stay in sync;
//! `ClientConfig::default()` is built from these.

pub const DEFAULT_WS_URL: &str = "wss://builder.nethos.xyz/ws";

// Handshake + liveness
pub const CONNECTION_TIMEOUT_MS: u64 = 10_000;
pub const PING_INTERVAL_MS: u64 = 30_000;
pub const PONG_TIMEOUT_MS: u64 = 5_000;

// Reconnection
pub const INITIAL_RETRY_DELAY_MS: u64 = 1_000;
pub const MAX_RETRY_DELAY_MS: u64 = 30_000;
pub const MAX_RETRY_ATTEMPTS: u32 = 5;
