use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{file_store::FileTokenStore, memory_store::MemoryTokenStore};
use crate::config::{StoreBackend, StoreConfig};
use crate::models::StoredToken;

/// Fixed name the token is stored under.
pub const TOKEN_KEY: &str = "accessToken";

/// The TokenStore trait abstracts durable token persistence (load, save, clear).
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> Result<Option<StoredToken>, String>;
    async fn save(&self, token: &StoredToken) -> Result<(), String>;
    async fn clear(&self) -> Result<(), String>;
    fn is_durable(&self) -> bool {
        // Real stores survive a restart; the in-memory store overrides this
        true
    }
}

/// Creates a concrete store implementation based on the StoreConfig.
/// If `store.enabled = false`, the token only lives as long as the process.
pub fn create_store(config: &StoreConfig) -> Arc<dyn TokenStore> {
    if !config.enabled {
        info!("Token persistence is disabled. Using an in-memory store.");
        return Arc::new(MemoryTokenStore::new());
    }

    match config.backend.clone().unwrap_or_default() {
        StoreBackend::File(file_config) => {
            info!(path = %file_config.path.display(), "Persisting tokens to file.");
            Arc::new(FileTokenStore::new(&file_config))
        }
    }
}
