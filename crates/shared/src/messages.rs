//! WebSocket message types exchanged on the realtime channels
//!
//! Every frame is an adjacently tagged envelope `{ "type": <kind>, "data": <payload> }`.
//! The set of kinds is closed: each kind has exactly one payload type, and
//! `Message` is the sum of all of them so dispatch can be exhaustive.
//!
//! ## Versioning Policy
//!
//! - New kinds can be added at the end of the catalogue
//! - Wire names (`chat_message`, `pong`, ...) must never change
//! - Payload field names follow the server, including its mixed casing

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{AssetGenerationRequest, AssetType, FileRef, Game, GameFile, GameRef};

/// A wire `type` string that is not part of the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown message type: {0}")]
pub struct UnknownKind(pub String);

/// Binds a payload type to the message kind that carries it.
///
/// Lets channel clients offer typed `send` and handler registration without
/// callers spelling out the kind separately from the data.
pub trait Payload: Sized + Send + 'static {
    const KIND: MessageKind;

    fn into_message(self) -> Message;

    /// Extract the payload if `message` is of this kind.
    fn from_message(message: Message) -> Option<Self>;
}

macro_rules! define_messages {
    ($($variant:ident => $wire:literal),+ $(,)?) => {
        /// Discriminant of every message that can travel on a channel.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum MessageKind {
            $($variant),+
        }

        impl MessageKind {
            /// Every kind, in catalogue order.
            pub const ALL: &'static [MessageKind] = &[$(MessageKind::$variant),+];

            /// The wire name used in the envelope's `type` field.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(MessageKind::$variant => $wire),+
                }
            }
        }

        impl FromStr for MessageKind {
            type Err = UnknownKind;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(MessageKind::$variant),)+
                    other => Err(UnknownKind(other.to_string())),
                }
            }
        }

        /// A typed message envelope.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "type", content = "data")]
        pub enum Message {
            $(
                #[serde(rename = $wire)]
                $variant($variant)
            ),+
        }

        impl Message {
            pub fn kind(&self) -> MessageKind {
                match self {
                    $(Message::$variant(_) => MessageKind::$variant),+
                }
            }
        }

        $(
            impl Payload for $variant {
                const KIND: MessageKind = MessageKind::$variant;

                fn into_message(self) -> Message {
                    Message::$variant(self)
                }

                fn from_message(message: Message) -> Option<Self> {
                    match message {
                        Message::$variant(payload) => Some(payload),
                        _ => None,
                    }
                }
            }

            impl From<$variant> for Message {
                fn from(payload: $variant) -> Self {
                    Message::$variant(payload)
                }
            }
        )+
    };
}

define_messages! {
    ChatMessage => "chat_message",
    ChatResponse => "chat_response",
    GenerateImage => "generate_image",
    ImageGenerated => "image_generated",
    GenerateSound => "generate_sound",
    SoundGenerated => "sound_generated",
    CheckErrors => "check_errors",
    ErrorCheck => "error_check",
    AssetUploaded => "asset_uploaded",
    GameCreated => "game_created",
    GameUpdated => "game_updated",
    GameDeleted => "game_deleted",
    FileCreated => "file_created",
    FileUpdated => "file_updated",
    FileDeleted => "file_deleted",
    EnhancePrompt => "enhance_prompt",
    TaskStarted => "task_started",
    ProgressUpdate => "progress_update",
    Ping => "ping",
    Pong => "pong",
}

impl MessageKind {
    /// Control kinds handled by the connection itself.
    pub fn is_control(self) -> bool {
        matches!(self, MessageKind::Ping | MessageKind::Pong)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Message {
    /// Serialize to the text frame sent on the wire.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// =============================================================================
// Chat
// =============================================================================

/// User prompt sent to the assistant for a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub game: GameRef,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileRef>>,
}

/// Ask the assistant to rewrite a prompt before it is sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancePrompt {
    #[serde(rename = "gameId")]
    pub game_id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspects: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Empty when the server only reports an error.
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// =============================================================================
// Asset generation
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerateImage(pub AssetGenerationRequest);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageGenerated {
    pub url: String,
    pub name: String,
    pub size: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerateSound(pub AssetGenerationRequest);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundGenerated {
    pub url: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetUploaded {
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub filename: String,
}

// =============================================================================
// Error checking
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckErrors {
    pub game: GameRef,
    pub files: Vec<FileRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorCheck {
    pub errors: Vec<String>,
}

// =============================================================================
// Task progress
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStarted {
    pub task_id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub game_id: String,
    pub status: String,
    pub progress: f64,
    pub message: String,
}

// =============================================================================
// Game and file change notifications
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameCreated(pub Game);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameUpdated(pub Game);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameDeleted {
    #[serde(rename = "gameId")]
    pub game_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileCreated(pub GameFile);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileUpdated(pub GameFile);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDeleted {
    #[serde(rename = "filePath")]
    pub file_path: String,
}

// =============================================================================
// Liveness
// =============================================================================

/// Client liveness probe. Always carries an empty object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ping {}

/// Server liveness reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pong {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip_through_from_str() {
        for kind in MessageKind::ALL {
            assert_eq!(kind.as_str().parse::<MessageKind>(), Ok(*kind));
        }
        assert_eq!(MessageKind::ALL.len(), 20);
    }

    #[test]
    fn unknown_wire_name_is_rejected() {
        assert_eq!(
            "teleport".parse::<MessageKind>(),
            Err(UnknownKind("teleport".to_string()))
        );
    }

    #[test]
    fn ping_encodes_with_empty_data_object() {
        let text = Message::Ping(Ping {}).encode().expect("ping should encode");
        assert_eq!(text, r#"{"type":"ping","data":{}}"#);
    }

    #[test]
    fn chat_message_encodes_envelope() {
        let message = Message::from(ChatMessage {
            game: GameRef::new("g1"),
            content: "make the ball faster".to_string(),
            files: None,
        });

        let value: serde_json::Value =
            serde_json::from_str(&message.encode().expect("should encode")).expect("json");
        assert_eq!(
            value,
            serde_json::json!({
                "type": "chat_message",
                "data": { "game": { "id": "g1" }, "content": "make the ball faster" }
            })
        );
    }

    #[test]
    fn transparent_payloads_carry_inner_object() {
        let json = r#"{"type":"game_deleted","data":{"gameId":"g9"}}"#;
        let message: Message = serde_json::from_str(json).expect("should parse");
        assert_eq!(message.kind(), MessageKind::GameDeleted);

        let json = r#"{"type":"generate_sound","data":{"prompt":"laser","type":"single"}}"#;
        let message: Message = serde_json::from_str(json).expect("should parse");
        let GenerateSound(request) =
            GenerateSound::from_message(message).expect("should be generate_sound");
        assert_eq!(request.prompt, "laser");
    }

    #[test]
    fn from_message_rejects_other_kinds() {
        let message = Message::Pong(Pong {});
        assert!(ChatResponse::from_message(message.clone()).is_none());
        assert_eq!(Pong::from_message(message), Some(Pong {}));
        assert_eq!(<ChatResponse as Payload>::KIND, MessageKind::ChatResponse);
    }

    #[test]
    fn error_only_chat_response_decodes() {
        let message: Message =
            serde_json::from_str(r#"{"type":"chat_response","data":{"error":"model overloaded"}}"#)
                .expect("decode");
        assert_eq!(
            message,
            Message::ChatResponse(ChatResponse {
                message: String::new(),
                error: Some("model overloaded".into()),
            })
        );
    }
}
