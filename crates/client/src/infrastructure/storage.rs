//! Session and game-selection adapters.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use directories::ProjectDirs;

use crate::ports::outbound::{storage_keys, GameSelection, SessionStore};

/// Session store kept in memory only.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    token: Arc<RwLock<Option<String>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set_token(&token.into());
        store
    }
}

impl SessionStore for MemorySessionStore {
    fn current_token(&self) -> Option<String> {
        self.token.read().ok().and_then(|token| token.clone())
    }

    fn set_token(&self, token: &str) {
        if let Ok(mut guard) = self.token.write() {
            *guard = Some(token.to_string());
        }
    }

    fn clear(&self) {
        if let Ok(mut guard) = self.token.write() {
            *guard = None;
        }
    }
}

/// Session store with file-based persistence
///
/// Stores key-value pairs in a JSON file at:
/// - Linux: ~/.config/gamebuilder/client/session.json
/// - macOS: ~/Library/Application Support/xyz.nethos.gamebuilder/session.json
/// - Windows: C:\Users\<User>\AppData\Roaming\nethos\gamebuilder\session.json
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
    cache: Arc<RwLock<HashMap<String, String>>>,
}

impl Default for FileSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSessionStore {
    /// Open the store at the platform config directory.
    pub fn new() -> Self {
        let path = match ProjectDirs::from("xyz", "nethos", "gamebuilder") {
            Some(dirs) => dirs.config_dir().join("session.json"),
            None => PathBuf::from("gamebuilder_session.json"),
        };
        Self::at(path)
    }

    /// Open the store at an explicit path, loading existing data if present.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = load(&path);
        tracing::debug!("Session store initialized at: {:?}", path);

        Self {
            path,
            cache: Arc::new(RwLock::new(cache)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::error!("Failed to create session directory: {}", e);
                return;
            }
        }

        let data = match self.cache.read() {
            Ok(cache) => serde_json::to_string_pretty(&*cache),
            Err(e) => {
                tracing::error!("Failed to acquire read lock for session store: {}", e);
                return;
            }
        };

        match data {
            Ok(data) => {
                if let Err(e) = fs::write(&self.path, data) {
                    tracing::error!("Failed to write session file: {}", e);
                }
            }
            Err(e) => tracing::error!("Failed to serialize session: {}", e),
        }
    }
}

fn load(path: &Path) -> HashMap<String, String> {
    if !path.exists() {
        return HashMap::new();
    }

    match fs::read_to_string(path) {
        Ok(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse session file: {}", e);
            HashMap::new()
        }),
        Err(e) => {
            tracing::warn!("Failed to read session file: {}", e);
            HashMap::new()
        }
    }
}

impl SessionStore for FileSessionStore {
    fn current_token(&self) -> Option<String> {
        self.cache
            .read()
            .ok()
            .and_then(|cache| cache.get(storage_keys::ACCESS_TOKEN).cloned())
    }

    fn set_token(&self, token: &str) {
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(storage_keys::ACCESS_TOKEN.to_string(), token.to_string());
        }
        self.persist();
    }

    fn clear(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.remove(storage_keys::ACCESS_TOKEN);
        }
        self.persist();
    }
}

/// Active game shared between the UI and the game channel.
#[derive(Debug, Clone, Default)]
pub struct SharedGameSelection {
    active: Arc<RwLock<Option<String>>>,
}

impl SharedGameSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&self, game_id: impl Into<String>) {
        if let Ok(mut active) = self.active.write() {
            *active = Some(game_id.into());
        }
    }

    pub fn clear(&self) {
        if let Ok(mut active) = self.active.write() {
            *active = None;
        }
    }

    /// Clear the selection if it points at `game_id` (the game was deleted).
    pub fn forget(&self, game_id: &str) {
        if let Ok(mut active) = self.active.write() {
            if active.as_deref() == Some(game_id) {
                *active = None;
            }
        }
    }
}

impl GameSelection for SharedGameSelection {
    fn active_game_id(&self) -> Option<String> {
        self.active.read().ok().and_then(|active| active.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_persists_token_across_instances() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("session.json");

        let store = FileSessionStore::at(&path);
        assert_eq!(store.current_token(), None);
        store.set_token("a.b.c");

        let reopened = FileSessionStore::at(&path);
        assert_eq!(reopened.current_token().as_deref(), Some("a.b.c"));

        let raw = fs::read_to_string(&path).expect("file written");
        let map: HashMap<String, String> = serde_json::from_str(&raw).expect("json map");
        assert_eq!(map.get("access_token").map(String::as_str), Some("a.b.c"));

        reopened.clear();
        assert_eq!(FileSessionStore::at(&path).current_token(), None);
    }

    #[test]
    fn corrupt_session_file_starts_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").expect("write");

        assert_eq!(FileSessionStore::at(&path).current_token(), None);
    }

    #[test]
    fn memory_store_set_and_clear() {
        let store = MemorySessionStore::with_token("t");
        assert_eq!(store.current_token().as_deref(), Some("t"));
        store.clear();
        assert_eq!(store.current_token(), None);
    }

    #[test]
    fn forget_only_clears_matching_game() {
        let selection = SharedGameSelection::new();
        selection.select("g1");

        selection.forget("g2");
        assert_eq!(selection.active_game_id().as_deref(), Some("g1"));

        selection.forget("g1");
        assert_eq!(selection.active_game_id(), None);
    }
}
