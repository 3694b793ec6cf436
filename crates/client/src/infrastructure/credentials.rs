//! Credential resolution for the realtime channels.
//!
//! Credentials are never cached: every connection attempt re-reads the
//! persisted token, validates its structure and expiry, and derives the user
//! id from its claims. A missing or invalid token is a normal "not logged in"
//! outcome and resolves to `None`.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

use crate::error::ConnectError;
use crate::ports::outbound::{Clock, GameSelection, SessionStore};

/// Identity used to open a channel.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user_id: String,
    pub token: String,
    /// Set only for the per-game channel.
    pub game_id: Option<String>,
}

impl Credentials {
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token: token.into(),
            game_id: None,
        }
    }

    pub fn with_game(mut self, game_id: impl Into<String>) -> Self {
        self.game_id = Some(game_id.into());
        self
    }

    /// Build `{endpoint}/{user_id}?token={token}[&game_id={game_id}]`.
    pub fn target_url(&self, endpoint: &str) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(endpoint)?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .push(&self.user_id);

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("token", &self.token);
            if let Some(game_id) = &self.game_id {
                query.append_pair("game_id", game_id);
            }
        }

        Ok(url)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("token", &"<redacted>")
            .field("game_id", &self.game_id)
            .finish()
    }
}

/// Why a stored token was rejected.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token has {0} segments, expected 3")]
    Malformed(usize),

    #[error("claims segment is not base64url: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("claims segment is not a JSON object")]
    Claims,

    #[error("token is missing the `{0}` claim")]
    MissingClaim(&'static str),

    #[error("token expired at {0}")]
    Expired(DateTime<Utc>),
}

/// Claims the client relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

/// Structurally validate a signed token and check its expiry against `now`.
///
/// The signature is not verified; the server does that on handshake.
pub fn validate_token(token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(TokenError::Malformed(segments.len()));
    }

    let claims = decode_claims(segments[1])?;

    let expires_at = claims
        .get("exp")
        .and_then(Value::as_f64)
        .and_then(|exp| DateTime::<Utc>::from_timestamp_millis((exp * 1000.0) as i64))
        .ok_or(TokenError::MissingClaim("exp"))?;
    if now >= expires_at {
        return Err(TokenError::Expired(expires_at));
    }

    let user_id = match claims.get("user_id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => return Err(TokenError::MissingClaim("user_id")),
    };

    let email = claims
        .get("email")
        .and_then(Value::as_str)
        .filter(|email| !email.is_empty())
        .ok_or(TokenError::MissingClaim("email"))?
        .to_string();

    Ok(TokenClaims {
        user_id,
        email,
        expires_at,
    })
}

fn decode_claims(segment: &str) -> Result<Map<String, Value>, TokenError> {
    // Accept both base64url and standard alphabets, padded or not.
    let normalized: String = segment
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();

    let bytes = URL_SAFE_NO_PAD.decode(normalized)?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(TokenError::Claims),
    }
}

/// Reads the persisted token and turns it into [`Credentials`].
#[derive(Clone)]
pub struct CredentialResolver {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
}

impl CredentialResolver {
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Current credentials, or `None` when not authenticated.
    pub fn resolve(&self) -> Option<Credentials> {
        let token = self
            .store
            .current_token()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty() && t != "undefined")?;

        match validate_token(&token, self.clock.now()) {
            Ok(claims) => Some(Credentials::new(claims.user_id, token)),
            Err(e) => {
                tracing::debug!(error = %e, "Stored token rejected");
                None
            }
        }
    }
}

/// Credential policy of a channel.
///
/// `Ok(None)` means "not authenticated"; errors are reserved for
/// misconfiguration such as a per-game channel with no game selected.
pub trait CredentialSource: Send + Sync {
    fn resolve(&self) -> Result<Option<Credentials>, ConnectError>;
}

/// Policy of the general channel: the logged-in user.
#[derive(Clone)]
pub struct SessionCredentials {
    resolver: CredentialResolver,
}

impl SessionCredentials {
    pub fn new(resolver: CredentialResolver) -> Self {
        Self { resolver }
    }
}

impl CredentialSource for SessionCredentials {
    fn resolve(&self) -> Result<Option<Credentials>, ConnectError> {
        Ok(self.resolver.resolve())
    }
}

/// Policy of the per-game channel: the logged-in user plus the active game.
#[derive(Clone)]
pub struct GameCredentials {
    resolver: CredentialResolver,
    selection: Arc<dyn GameSelection>,
}

impl GameCredentials {
    pub fn new(resolver: CredentialResolver, selection: Arc<dyn GameSelection>) -> Self {
        Self {
            resolver,
            selection,
        }
    }
}

impl CredentialSource for GameCredentials {
    fn resolve(&self) -> Result<Option<Credentials>, ConnectError> {
        let game_id = self
            .selection
            .active_game_id()
            .filter(|id| !id.is_empty())
            .ok_or(ConnectError::NoActiveGame)?;

        Ok(self
            .resolver
            .resolve()
            .map(|credentials| credentials.with_game(game_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::testing::fixtures::{mint_token, valid_claims, FIXED_NOW_SECS};
    use crate::ports::outbound::{MockGameSelection, MockSessionStore};
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.timestamp_opt(FIXED_NOW_SECS, 0).single().expect("valid timestamp")
    }

    fn resolver_with(token: Option<String>) -> CredentialResolver {
        let mut store = MockSessionStore::new();
        store.expect_current_token().return_const(token);
        CredentialResolver::new(Arc::new(store), Arc::new(FixedClock(fixed_now())))
    }

    #[test]
    fn valid_token_yields_user_id_from_claims() {
        let token = mint_token(&valid_claims("u1"));
        let claims = validate_token(&token, fixed_now()).expect("token should be valid");
        assert_eq!(claims.user_id, "u1");
        assert_eq!(claims.email, "u1@example.com");

        let credentials = resolver_with(Some(token.clone()))
            .resolve()
            .expect("credentials");
        assert_eq!(credentials, Credentials::new("u1", token));
    }

    #[test]
    fn numeric_user_id_is_accepted() {
        let mut claims = valid_claims("ignored");
        claims["user_id"] = serde_json::json!(42);
        let token = mint_token(&claims);
        assert_eq!(
            validate_token(&token, fixed_now()).expect("valid").user_id,
            "42"
        );
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut claims = valid_claims("u1");
        claims["exp"] = serde_json::json!(FIXED_NOW_SECS);
        let token = mint_token(&claims);

        assert!(matches!(
            validate_token(&token, fixed_now()),
            Err(TokenError::Expired(_))
        ));
        assert!(resolver_with(Some(token)).resolve().is_none());
    }

    #[test]
    fn structural_failures_are_rejected() {
        assert!(matches!(
            validate_token("only.two", fixed_now()),
            Err(TokenError::Malformed(2))
        ));
        assert!(matches!(
            validate_token("a.!!!.c", fixed_now()),
            Err(TokenError::Encoding(_))
        ));

        let not_object = format!("h.{}.s", URL_SAFE_NO_PAD.encode("[1,2,3]"));
        assert!(matches!(
            validate_token(&not_object, fixed_now()),
            Err(TokenError::Claims)
        ));

        let mut claims = valid_claims("u1");
        claims.as_object_mut().expect("object").remove("email");
        assert!(matches!(
            validate_token(&mint_token(&claims), fixed_now()),
            Err(TokenError::MissingClaim("email"))
        ));

        let mut claims = valid_claims("u1");
        claims["user_id"] = serde_json::json!("");
        assert!(matches!(
            validate_token(&mint_token(&claims), fixed_now()),
            Err(TokenError::MissingClaim("user_id"))
        ));
    }

    #[test]
    fn padded_standard_base64_claims_are_accepted() {
        let token = mint_token(&valid_claims("u1"));
        let segments: Vec<&str> = token.split('.').collect();
        let padded = format!("{}.{}==.{}", segments[0], segments[1], segments[2]);
        assert!(validate_token(&padded, fixed_now()).is_ok());
    }

    #[test]
    fn missing_or_placeholder_token_is_absent() {
        assert!(resolver_with(None).resolve().is_none());
        assert!(resolver_with(Some(String::new())).resolve().is_none());
        assert!(resolver_with(Some("undefined".to_string())).resolve().is_none());
    }

    #[test]
    fn game_policy_requires_active_game() {
        let mut selection = MockGameSelection::new();
        selection.expect_active_game_id().return_const(None::<String>);
        let policy = GameCredentials::new(
            resolver_with(Some(mint_token(&valid_claims("u1")))),
            Arc::new(selection),
        );

        assert!(matches!(policy.resolve(), Err(ConnectError::NoActiveGame)));
    }

    #[test]
    fn game_policy_adds_game_id() {
        let mut selection = MockGameSelection::new();
        selection
            .expect_active_game_id()
            .return_const(Some("g7".to_string()));
        let policy = GameCredentials::new(
            resolver_with(Some(mint_token(&valid_claims("u1")))),
            Arc::new(selection),
        );

        let credentials = policy.resolve().expect("ok").expect("some");
        assert_eq!(credentials.game_id.as_deref(), Some("g7"));
    }

    #[test]
    fn game_policy_without_login_is_absent_not_error() {
        let mut selection = MockGameSelection::new();
        selection
            .expect_active_game_id()
            .return_const(Some("g7".to_string()));
        let policy = GameCredentials::new(resolver_with(None), Arc::new(selection));

        assert!(matches!(policy.resolve(), Ok(None)));
    }

    #[test]
    fn target_url_embeds_identity() {
        let url = Credentials::new("user 1", "a.b.c")
            .target_url("wss://builder.nethos.xyz/ws")
            .expect("url");
        assert_eq!(url.as_str(), "wss://builder.nethos.xyz/ws/user%201?token=a.b.c");

        let url = Credentials::new("u1", "a.b.c")
            .with_game("g1")
            .target_url("ws://localhost:9000/ws/")
            .expect("url");
        assert_eq!(url.as_str(), "ws://localhost:9000/ws/u1?token=a.b.c&game_id=g1");
    }

    #[test]
    fn debug_output_redacts_token() {
        let rendered = format!("{:?}", Credentials::new("u1", "secret.token.value"));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("u1"));
    }
}
