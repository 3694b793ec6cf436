//! Client configuration.
//!
//! Defaults mirror the protocol constants in `infrastructure::websocket::shared`.
//! Every value can be overridden from the environment (the binary loads
//! `.env.local` / `.env` first).

use std::str::FromStr;
use std::time::Duration;

use crate::infrastructure::websocket::shared::{
    CONNECTION_TIMEOUT_MS, DEFAULT_WS_URL, INITIAL_RETRY_DELAY_MS, MAX_RETRY_ATTEMPTS,
    MAX_RETRY_DELAY_MS, PING_INTERVAL_MS, PONG_TIMEOUT_MS,
};

pub const ENV_WS_URL: &str = "GAMEBUILDER_WS_URL";
pub const ENV_GAME_WS_URL: &str = "GAMEBUILDER_GAME_WS_URL";
pub const ENV_CONNECT_TIMEOUT_MS: &str = "GAMEBUILDER_CONNECT_TIMEOUT_MS";
pub const ENV_PING_INTERVAL_MS: &str = "GAMEBUILDER_PING_INTERVAL_MS";
pub const ENV_PONG_TIMEOUT_MS: &str = "GAMEBUILDER_PONG_TIMEOUT_MS";
pub const ENV_MAX_RECONNECT_ATTEMPTS: &str = "GAMEBUILDER_MAX_RECONNECT_ATTEMPTS";

/// Timing and endpoint settings shared by both channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Endpoint of the general (per-user) channel.
    pub general_url: String,
    /// Endpoint of the per-game channel.
    pub game_url: String,
    pub connect_timeout: Duration,
    pub ping_interval: Duration,
    pub pong_timeout: Duration,
    pub max_reconnect_attempts: u32,
    pub reconnect_base_delay: Duration,
    pub reconnect_max_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            general_url: DEFAULT_WS_URL.to_string(),
            game_url: DEFAULT_WS_URL.to_string(),
            connect_timeout: Duration::from_millis(CONNECTION_TIMEOUT_MS),
            ping_interval: Duration::from_millis(PING_INTERVAL_MS),
            pong_timeout: Duration::from_millis(PONG_TIMEOUT_MS),
            max_reconnect_attempts: MAX_RETRY_ATTEMPTS,
            reconnect_base_delay: Duration::from_millis(INITIAL_RETRY_DELAY_MS),
            reconnect_max_delay: Duration::from_millis(MAX_RETRY_DELAY_MS),
        }
    }
}

impl ClientConfig {
    /// Build the config from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (env, test map, ...).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        // The game channel falls back to the general endpoint.
        if let Some(url) = non_empty(lookup(ENV_WS_URL)) {
            config.game_url = url.clone();
            config.general_url = url;
        }
        if let Some(url) = non_empty(lookup(ENV_GAME_WS_URL)) {
            config.game_url = url;
        }
        if let Some(timeout) = parse_duration(&lookup, ENV_CONNECT_TIMEOUT_MS) {
            config.connect_timeout = timeout;
        }
        if let Some(interval) = parse_duration(&lookup, ENV_PING_INTERVAL_MS) {
            config.ping_interval = interval;
        }
        if let Some(timeout) = parse_duration(&lookup, ENV_PONG_TIMEOUT_MS) {
            config.pong_timeout = timeout;
        }
        if let Some(attempts) = parse_var::<u32>(&lookup, ENV_MAX_RECONNECT_ATTEMPTS) {
            config.max_reconnect_attempts = attempts;
        }

        config.sanitized()
    }

    /// Replace timings the engine cannot run with by their defaults.
    ///
    /// Durations must be non-zero, and a pong has to be due before the next
    /// ping goes out or the heartbeat would never expire.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if self.connect_timeout.is_zero() {
            tracing::warn!("Connect timeout must be non-zero, using default");
            self.connect_timeout = defaults.connect_timeout;
        }
        if self.ping_interval.is_zero()
            || self.pong_timeout.is_zero()
            || self.pong_timeout >= self.ping_interval
        {
            tracing::warn!(
                ping_interval_ms = self.ping_interval.as_millis() as u64,
                pong_timeout_ms = self.pong_timeout.as_millis() as u64,
                "Pong timeout must be non-zero and shorter than the ping interval, using default heartbeat"
            );
            self.ping_interval = defaults.ping_interval;
            self.pong_timeout = defaults.pong_timeout;
        }

        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = non_empty(lookup(key))?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparsable config value, using default");
            None
        }
    }
}

fn parse_duration(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    match parse_var::<u64>(lookup, key)? {
        0 => {
            tracing::warn!(key, "Ignoring zero duration, using default");
            None
        }
        ms => Some(Duration::from_millis(ms)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_protocol_constants() {
        let config = ClientConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.ping_interval, Duration::from_secs(30));
        assert_eq!(config.pong_timeout, Duration::from_secs(5));
        assert_eq!(config.max_reconnect_attempts, 5);
        assert_eq!(config.reconnect_base_delay, Duration::from_secs(1));
        assert_eq!(config.reconnect_max_delay, Duration::from_secs(30));
        assert_eq!(config.general_url, config.game_url);
    }

    #[test]
    fn general_url_applies_to_both_channels_unless_overridden() {
        let config = ClientConfig::from_lookup(lookup_from(&[(ENV_WS_URL, "ws://localhost:9000/ws")]));
        assert_eq!(config.general_url, "ws://localhost:9000/ws");
        assert_eq!(config.game_url, "ws://localhost:9000/ws");

        let config = ClientConfig::from_lookup(lookup_from(&[
            (ENV_WS_URL, "ws://localhost:9000/ws"),
            (ENV_GAME_WS_URL, "ws://localhost:9001/game"),
        ]));
        assert_eq!(config.game_url, "ws://localhost:9001/game");
    }

    #[test]
    fn unparsable_values_fall_back_to_defaults() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            (ENV_CONNECT_TIMEOUT_MS, "soon"),
            (ENV_MAX_RECONNECT_ATTEMPTS, "3"),
            (ENV_PONG_TIMEOUT_MS, ""),
        ]));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.max_reconnect_attempts, 3);
        assert_eq!(config.pong_timeout, Duration::from_secs(5));
    }

    #[test]
    fn zero_durations_fall_back_to_defaults() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            (ENV_CONNECT_TIMEOUT_MS, "0"),
            (ENV_PING_INTERVAL_MS, "0"),
            (ENV_PONG_TIMEOUT_MS, "0"),
        ]));
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn pong_timeout_must_be_shorter_than_ping_interval() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            (ENV_PING_INTERVAL_MS, "4000"),
            (ENV_PONG_TIMEOUT_MS, "4000"),
        ]));
        assert_eq!(config.ping_interval, Duration::from_secs(30));
        assert_eq!(config.pong_timeout, Duration::from_secs(5));

        let config = ClientConfig::from_lookup(lookup_from(&[(ENV_PING_INTERVAL_MS, "3000")]));
        assert_eq!(config.ping_interval, Duration::from_secs(30));
        assert_eq!(config.pong_timeout, Duration::from_secs(5));

        let config = ClientConfig::from_lookup(lookup_from(&[
            (ENV_PING_INTERVAL_MS, "10000"),
            (ENV_PONG_TIMEOUT_MS, "2000"),
        ]));
        assert_eq!(config.ping_interval, Duration::from_secs(10));
        assert_eq!(config.pong_timeout, Duration::from_secs(2));
    }

    #[test]
    fn sanitized_repairs_directly_built_configs() {
        let config = ClientConfig {
            connect_timeout: Duration::ZERO,
            ping_interval: Duration::ZERO,
            ..ClientConfig::default()
        }
        .sanitized();
        assert_eq!(config, ClientConfig::default());
    }
}
