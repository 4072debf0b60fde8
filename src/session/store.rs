use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use super::state::{Session, SessionEffect, SessionEvent, SessionState, TransitionError};
use crate::store::TokenStore;

/// Single owner of the session.
///
/// All changes go through [`SessionStore::dispatch`], which applies one
/// transition and runs its storage effects before returning. Dispatches are
/// serialized, so storage always ends up matching the last applied transition.
/// Observers get read-only snapshots through [`SessionStore::subscribe`].
pub struct SessionStore {
    tx: watch::Sender<Session>,
    tokens: Arc<dyn TokenStore>,
    dispatching: Mutex<()>,
}

impl SessionStore {
    pub fn new(tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            tx: watch::Sender::new(Session::default()),
            tokens,
            dispatching: Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> Session {
        self.tx.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.tx.borrow().state
    }

    /// The epoch of the token currently held.
    pub fn epoch(&self) -> u64 {
        self.tx.borrow().epoch
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Applies `event` and returns the new state.
    ///
    /// Rejected events leave the session untouched and notify nobody.
    pub async fn dispatch(&self, event: SessionEvent) -> Result<SessionState, TransitionError> {
        let name = event.name();
        // held until the effects are written so a later transition cannot be overtaken in storage
        let _dispatching = self.dispatching.lock().await;
        let mut outcome = None;
        self.tx.send_if_modified(|session| match session.transition(event) {
            Ok((next, effects)) => {
                debug!(
                    event = name,
                    from = ?session.state,
                    to = ?next.state,
                    epoch = next.epoch,
                    "session transition"
                );
                *session = next;
                outcome = Some(Ok((session.state, effects)));
                true
            }
            Err(e) => {
                outcome = Some(Err(e));
                false
            }
        });

        let (state, effects) = match outcome {
            Some(Ok(applied)) => applied,
            Some(Err(e)) => {
                debug!(event = name, error = %e, "session event ignored");
                return Err(e);
            }
            None => unreachable!("send_if_modified always runs its closure"),
        };

        for effect in effects {
            self.run_effect(effect).await;
        }
        if state == SessionState::Unauthenticated {
            info!(event = name, "session signed out");
        }
        Ok(state)
    }

    async fn run_effect(&self, effect: SessionEffect) {
        let result = match &effect {
            SessionEffect::PersistToken(token) => self.tokens.save(token).await,
            SessionEffect::ClearToken => self.tokens.clear().await,
        };
        if let Err(e) = result {
            // The in-memory session stays authoritative; the next login rewrites storage
            warn!(
                effect = ?effect,
                durable = self.tokens.is_durable(),
                "token storage failed: {}",
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::token::fixtures::jwt_expiring_at;
    use crate::models::user::fixtures::profile;
    use crate::models::StoredToken;
    use crate::store::MemoryTokenStore;
    use chrono::{Duration, Utc};

    fn token() -> StoredToken {
        let now = Utc::now();
        StoredToken::new(
            jwt_expiring_at((now + Duration::hours(1)).timestamp()),
            Duration::days(7),
            now,
        )
    }

    #[tokio::test]
    async fn login_persists_before_returning() {
        let tokens = Arc::new(MemoryTokenStore::new());
        let store = SessionStore::new(tokens.clone());
        let t = token();

        let state = store
            .dispatch(SessionEvent::LoginSucceeded(t.clone()))
            .await
            .unwrap();
        assert_eq!(state, SessionState::Authenticating);
        assert_eq!(tokens.load().await.unwrap(), Some(t));

        store.dispatch(SessionEvent::LoggedOut).await.unwrap();
        assert_eq!(tokens.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn subscribers_see_each_applied_transition() {
        let store = SessionStore::new(Arc::new(MemoryTokenStore::new()));
        let mut rx = store.subscribe();
        assert_eq!(rx.borrow_and_update().state, SessionState::Unknown);

        store
            .dispatch(SessionEvent::TokenRestored(token()))
            .await
            .unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().state, SessionState::Authenticating);

        // rejected events do not wake observers
        assert!(store.dispatch(SessionEvent::Retry).await.is_err());
        assert!(!rx.has_changed().unwrap());

        store
            .dispatch(SessionEvent::ProfileLoaded {
                epoch: 1,
                profile: profile(1, 1),
            })
            .await
            .unwrap();
        assert_eq!(
            rx.borrow_and_update().state,
            SessionState::AuthenticatedComplete
        );
    }

    /// Memory store whose saves take a while, like a slow disk.
    struct SlowSaves(MemoryTokenStore);

    #[async_trait::async_trait]
    impl TokenStore for SlowSaves {
        async fn load(&self) -> Result<Option<StoredToken>, String> {
            self.0.load().await
        }

        async fn save(&self, token: &StoredToken) -> Result<(), String> {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            self.0.save(token).await
        }

        async fn clear(&self) -> Result<(), String> {
            self.0.clear().await
        }
    }

    #[tokio::test]
    async fn logout_during_a_slow_save_leaves_storage_empty() {
        let tokens = Arc::new(SlowSaves(MemoryTokenStore::new()));
        let store = Arc::new(SessionStore::new(tokens.clone()));

        let login = tokio::spawn({
            let store = store.clone();
            async move { store.dispatch(SessionEvent::LoginSucceeded(token())).await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        store.dispatch(SessionEvent::LoggedOut).await.unwrap();
        login.await.unwrap().unwrap();

        assert_eq!(store.state(), SessionState::Unauthenticated);
        assert_eq!(tokens.load().await.unwrap(), None);
    }
}
