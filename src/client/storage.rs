//! Token persistence for the client
//!
//! The file store keeps a small JSON object on disk with the token under the
//! `"token"` key. Other keys in the object are left alone.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Well-known key the token is stored under
pub const TOKEN_KEY: &str = "token";

/// Where the client keeps its session token
pub trait TokenStorage: Send + Sync {
    /// Read the persisted token, if any
    fn load(&self) -> Result<Option<String>>;

    /// Persist a token, replacing any previous one
    fn save(&self, token: &str) -> Result<()>;

    /// Forget the persisted token
    fn clear(&self) -> Result<()>;
}

/// Token storage backed by a JSON file
#[derive(Debug, Clone)]
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_object(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?
        {
            Value::Object(map) => Ok(map),
            _ => anyhow::bail!("{} does not contain a JSON object", self.path.display()),
        }
    }

    fn write_object(&self, map: Map<String, Value>) -> Result<()> {
        if map.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path)
                    .with_context(|| format!("Failed to remove {}", self.path.display()))?;
            }
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let content = serde_json::to_string_pretty(&Value::Object(map))?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

impl TokenStorage for FileTokenStorage {
    fn load(&self) -> Result<Option<String>> {
        let map = self.read_object()?;
        Ok(map
            .get(TOKEN_KEY)
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(String::from))
    }

    fn save(&self, token: &str) -> Result<()> {
        // A corrupt file is replaced rather than blocking login
        let mut map = self.read_object().unwrap_or_default();
        map.insert(TOKEN_KEY.to_string(), Value::String(token.to_string()));
        self.write_object(map)
    }

    fn clear(&self) -> Result<()> {
        let mut map = self.read_object().unwrap_or_default();
        map.remove(TOKEN_KEY);
        self.write_object(map)
    }
}

/// In-process token storage
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    fn slot(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>> {
        self.token
            .lock()
            .map_err(|_| anyhow::anyhow!("Token storage lock poisoned"))
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.slot()?.clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        *self.slot()? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot()? = None;
        Ok(())
    }
}
