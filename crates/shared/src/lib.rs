//! Game Builder Protocol - Shared types for the realtime WebSocket channels
//!
//! This crate contains the wire-level contract spoken by both the general and
//! the per-game channel:
//! - The closed catalogue of message kinds (`MessageKind`)
//! - The `{ "type": ..., "data": ... }` envelope (`Message`)
//! - Payload types for every message kind
//! - Frame decoding with a malformed-frame taxonomy
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json, and thiserror
//! 2. **No business logic** - Pure data types and serialization
//! 3. **No transport** - Framing over WebSocket lives in the client crate

pub mod envelope;
pub mod messages;
pub mod types;

pub use envelope::{decode_frame, DecodeError, Inbound};
pub use messages::{
    AssetUploaded, ChatMessage, ChatResponse, CheckErrors, EnhancePrompt, ErrorCheck,
    FileCreated, FileDeleted, FileUpdated, GameCreated, GameDeleted, GameUpdated, GenerateImage,
    GenerateSound, ImageGenerated, Message, MessageKind, Payload, Ping, Pong, ProgressUpdate,
    SoundGenerated, TaskStarted, UnknownKind,
};
pub use types::{
    AssetGenerationRequest, AssetScope, AssetType, FileKind, FileRef, Game, GameFile, GameRef,
    ImageSize,
};
