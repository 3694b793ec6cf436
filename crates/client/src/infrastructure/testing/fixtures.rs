//! Token fixtures.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{json, Value};

/// Reference "now" used by fixed clocks in tests (2024-06-01T00:00:00Z).
pub const FIXED_NOW_SECS: i64 = 1_717_200_000;

/// Claims valid for one hour after [`FIXED_NOW_SECS`].
pub fn valid_claims(user_id: &str) -> Value {
    json!({
        "user_id": user_id,
        "email": format!("{user_id}@example.com"),
        "exp": FIXED_NOW_SECS + 3600,
    })
}

/// Build an unsigned three-segment token carrying `claims`.
pub fn mint_token(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}
