use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::base::{TokenStore, TOKEN_KEY};
use crate::models::StoredToken;

#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct FileStoreConfig {
    #[serde(default = "default_path")]
    pub path: PathBuf,
}

fn default_path() -> PathBuf {
    PathBuf::from(".leaguedesk/session.json")
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

/// Keeps the token in a small JSON document: `{ "accessToken": { ... } }`.
///
/// Other keys in the document are preserved so the file can be shared with
/// other client state.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(config: &FileStoreConfig) -> Self {
        Self {
            path: config.path.clone(),
        }
    }

    async fn read_document(&self) -> Result<HashMap<String, serde_json::Value>, String> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(HashMap::new()),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| format!("Corrupt token file {}: {}", self.path.display(), e)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(format!("Error reading {}: {}", self.path.display(), e)),
        }
    }

    async fn write_document(&self, doc: &HashMap<String, serde_json::Value>) -> Result<(), String> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("Error creating {}: {}", parent.display(), e))?;
        }
        let body = serde_json::to_vec_pretty(doc).map_err(|e| e.to_string())?;
        tokio::fs::write(&self.path, body)
            .await
            .map_err(|e| format!("Error writing {}: {}", self.path.display(), e))
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<StoredToken>, String> {
        let mut doc = self.read_document().await?;
        let Some(raw) = doc.remove(TOKEN_KEY) else {
            debug!("No persisted token in {}", self.path.display());
            return Ok(None);
        };
        match serde_json::from_value::<StoredToken>(raw) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                // An unreadable entry is as good as no token
                warn!("Ignoring unreadable persisted token: {}", e);
                Ok(None)
            }
        }
    }

    async fn save(&self, token: &StoredToken) -> Result<(), String> {
        let mut doc = self.read_document().await.unwrap_or_default();
        let value = serde_json::to_value(token).map_err(|e| e.to_string())?;
        doc.insert(TOKEN_KEY.to_string(), value);
        self.write_document(&doc).await
    }

    async fn clear(&self) -> Result<(), String> {
        let mut doc = self.read_document().await.unwrap_or_default();
        if doc.remove(TOKEN_KEY).is_none() {
            return Ok(());
        }
        self.write_document(&doc).await
    }
}
