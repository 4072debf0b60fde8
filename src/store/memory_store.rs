use std::sync::Mutex;

use async_trait::async_trait;

use super::TokenStore;
use crate::models::StoredToken;

/// Keeps the token for the lifetime of the process only.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<StoredToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: StoredToken) -> Self {
        Self {
            token: Mutex::new(Some(token)),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<StoredToken>, String> {
        let guard = self.token.lock().map_err(|e| e.to_string())?;
        Ok(guard.clone())
    }

    async fn save(&self, token: &StoredToken) -> Result<(), String> {
        let mut guard = self.token.lock().map_err(|e| e.to_string())?;
        *guard = Some(token.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), String> {
        let mut guard = self.token.lock().map_err(|e| e.to_string())?;
        *guard = None;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn round_trips_in_memory() {
        let store = MemoryTokenStore::new();
        assert!(!store.is_durable());
        assert_eq!(store.load().await.unwrap(), None);

        let token = StoredToken::new("abc", Duration::days(7), Utc::now());
        store.save(&token).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(token));

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }
}
