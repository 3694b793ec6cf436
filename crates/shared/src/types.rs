//! Value types shared by several message payloads.

use serde::{Deserialize, Serialize};

/// A generated game project as broadcast by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub name: String,
    pub user_id: String,
    pub folder_path: String,
    #[serde(rename = "lastModified")]
    pub last_modified: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,
}

/// Whether a project entry is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Directory,
}

/// A file inside a game project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameFile {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(
        rename = "lastModified",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_modified: Option<String>,
}

/// Reference to a game by id (`{ "id": ... }` on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRef {
    pub id: String,
}

impl GameRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Reference to a project file attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Whether an asset is generated standalone or for a whole game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetScope {
    Single,
    Game,
}

/// Image sizes accepted by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSize {
    #[serde(rename = "256x256")]
    Small,
    #[serde(rename = "512x512")]
    Medium,
    #[serde(rename = "1024x1024")]
    Large,
}

/// Request body shared by image and sound generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetGenerationRequest {
    pub prompt: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<AssetScope>,
    #[serde(rename = "gameType", default, skip_serializing_if = "Option::is_none")]
    pub game_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<ImageSize>,
}

impl AssetGenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            scope: None,
            game_type: None,
            size: None,
        }
    }
}

/// Kind of uploaded asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Image,
    Sound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_uses_camel_case_last_modified() {
        let json = r#"{
            "id": "g1",
            "name": "Pong",
            "user_id": "u1",
            "folder_path": "/games/g1",
            "lastModified": "2024-05-01T10:00:00Z"
        }"#;

        let game: Game = serde_json::from_str(json).expect("game should parse");
        assert_eq!(game.last_modified, "2024-05-01T10:00:00Z");
        assert_eq!(game.preview_url, None);

        let value = serde_json::to_value(&game).expect("game should serialize");
        assert!(value.get("lastModified").is_some());
        assert!(value.get("preview_url").is_none());
    }

    #[test]
    fn asset_request_omits_unset_fields() {
        let mut request = AssetGenerationRequest::new("a red spaceship");
        request.size = Some(ImageSize::Medium);

        let value = serde_json::to_value(&request).expect("request should serialize");
        assert_eq!(
            value,
            serde_json::json!({ "prompt": "a red spaceship", "size": "512x512" })
        );
    }

    #[test]
    fn game_file_kind_is_lowercase() {
        let file: GameFile =
            serde_json::from_str(r#"{"name":"main.js","path":"src/main.js","type":"file"}"#)
                .expect("file should parse");
        assert_eq!(file.kind, FileKind::File);
        assert_eq!(file.size, None);
    }
}
