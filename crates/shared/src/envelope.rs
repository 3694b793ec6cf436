//! Inbound frame decoding.
//!
//! Frames are validated in layers so that a malformed frame can be reported
//! precisely: JSON syntax, object shape, `type` presence, `data` presence,
//! known kind, and finally the payload shape for that kind.

use serde_json::Value;
use thiserror::Error;

use crate::messages::{Message, MessageKind};

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Liveness reply, consumed by the connection heartbeat.
    Pong,
    /// Any other message, destined for a registered handler.
    Message(Message),
}

/// Why an inbound frame was rejected.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("frame is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),

    #[error("frame is not a JSON object")]
    NotAnObject,

    #[error("frame has no string `type` field")]
    MissingType,

    #[error("frame of type `{0}` has no `data` field")]
    MissingData(String),

    #[error("unknown message type `{0}`")]
    UnknownKind(String),

    #[error("invalid `{kind}` payload: {source}")]
    InvalidPayload {
        kind: MessageKind,
        #[source]
        source: serde_json::Error,
    },
}

/// Decode a text frame into an [`Inbound`] value.
///
/// A `pong` is recognised by its `type` alone; every other frame must carry
/// both `type` and `data` and match the payload shape of its kind.
pub fn decode_frame(text: &str) -> Result<Inbound, DecodeError> {
    let value: Value = serde_json::from_str(text).map_err(DecodeError::Json)?;

    let Value::Object(object) = &value else {
        return Err(DecodeError::NotAnObject);
    };

    let Some(wire_type) = object.get("type").and_then(Value::as_str) else {
        return Err(DecodeError::MissingType);
    };

    if wire_type == MessageKind::Pong.as_str() {
        return Ok(Inbound::Pong);
    }

    if !object.contains_key("data") {
        return Err(DecodeError::MissingData(wire_type.to_string()));
    }

    let kind: MessageKind = wire_type
        .parse()
        .map_err(|_| DecodeError::UnknownKind(wire_type.to_string()))?;

    serde_json::from_value(value)
        .map(Inbound::Message)
        .map_err(|source| DecodeError::InvalidPayload { kind, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::ChatResponse;

    #[test]
    fn pong_without_data_is_accepted() {
        assert_eq!(
            decode_frame(r#"{"type":"pong"}"#).expect("pong"),
            Inbound::Pong
        );
        assert_eq!(
            decode_frame(r#"{"type":"pong","data":{}}"#).expect("pong"),
            Inbound::Pong
        );
    }

    #[test]
    fn chat_response_decodes_to_message() {
        let inbound =
            decode_frame(r#"{"type":"chat_response","data":{"message":"ok"}}"#).expect("valid");
        assert_eq!(
            inbound,
            Inbound::Message(Message::ChatResponse(ChatResponse {
                message: "ok".to_string(),
                error: None,
            }))
        );
    }

    #[test]
    fn malformed_frames_are_classified() {
        assert!(matches!(decode_frame("not json"), Err(DecodeError::Json(_))));
        assert!(matches!(decode_frame("[1,2]"), Err(DecodeError::NotAnObject)));
        assert!(matches!(
            decode_frame(r#"{"data":{"message":"ok"}}"#),
            Err(DecodeError::MissingType)
        ));
        assert!(matches!(
            decode_frame(r#"{"type":42,"data":{}}"#),
            Err(DecodeError::MissingType)
        ));
        assert!(matches!(
            decode_frame(r#"{"type":"chat_response"}"#),
            Err(DecodeError::MissingData(kind)) if kind == "chat_response"
        ));
        assert!(matches!(
            decode_frame(r#"{"type":"teleport","data":{}}"#),
            Err(DecodeError::UnknownKind(kind)) if kind == "teleport"
        ));
        assert!(matches!(
            decode_frame(r#"{"type":"chat_response","data":{"message":42}}"#),
            Err(DecodeError::InvalidPayload {
                kind: MessageKind::ChatResponse,
                ..
            })
        ));
    }
}
