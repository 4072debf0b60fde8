use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::cache::{QueryCache, QueryGroup, QueryKey};
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::gateway::ApiClient;
use crate::inflight::{Action, SubmitLock};
use crate::models::{LoginRequest, Profile, RiotAccountRequest, StoredToken};
use crate::session::{SessionEvent, SessionState, SessionStore, TransitionError};

/// Drives the session through login, profile loading, game-account linking and logout.
pub struct Auth {
    session: Arc<SessionStore>,
    client: Arc<ApiClient>,
    cache: Arc<QueryCache>,
    config: SessionConfig,
    submits: SubmitLock,
}

impl Auth {
    pub fn new(
        session: Arc<SessionStore>,
        client: Arc<ApiClient>,
        cache: Arc<QueryCache>,
        config: SessionConfig,
    ) -> Self {
        Self {
            session,
            client,
            cache,
            config,
            submits: SubmitLock::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// The signed-in user's profile, if one has been loaded.
    pub fn profile(&self) -> Option<Profile> {
        self.session.snapshot().user
    }

    /// Startup check: picks up a persisted token if there is a usable one.
    ///
    /// Does nothing once the session has left `Unknown`.
    pub async fn restore(&self) -> Result<SessionState> {
        if self.session.state() != SessionState::Unknown {
            return Ok(self.session.state());
        }

        let persisted = match self.session.tokens().load().await {
            Ok(token) => token,
            Err(e) => {
                warn!("Could not read persisted token: {}", e);
                None
            }
        };

        match persisted {
            Some(token) if token.is_valid() => {
                info!("Restoring persisted session");
                self.session
                    .dispatch(SessionEvent::TokenRestored(token))
                    .await?;
                self.fetch_profile().await
            }
            Some(_) => {
                info!("Persisted token has expired");
                Ok(self.session.dispatch(SessionEvent::NoPersistedToken).await?)
            }
            None => {
                debug!("No persisted token");
                Ok(self.session.dispatch(SessionEvent::NoPersistedToken).await?)
            }
        }
    }

    /// Exchanges school credentials for a token, then loads the profile with that token.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<SessionState> {
        let state = self.session.state();
        if !matches!(
            state,
            SessionState::Unknown | SessionState::Unauthenticated | SessionState::Unreachable
        ) {
            return Err(Error::Session(TransitionError::InvalidTransition {
                state,
                event: "login_succeeded",
            }));
        }
        let _permit = self.submits.begin(Action::Login)?;

        let response = self.client.login(credentials).await?;
        let token = StoredToken::new(response.token, self.config.token_lifetime(), Utc::now());
        if !token.is_valid() {
            return Err(Error::Decode(
                "login returned a token that is already expired or unreadable".to_string(),
            ));
        }

        self.session
            .dispatch(SessionEvent::LoginSucceeded(token))
            .await?;
        self.cache.clear();
        info!(account_id = %credentials.account_id, "Login accepted");

        // The dispatch above has persisted and adopted the new token, so this fetch carries it.
        self.fetch_profile().await
    }

    /// Fetches the profile for a session that is still authenticating.
    ///
    /// The outcome only applies to the token held when the fetch started.
    async fn fetch_profile(&self) -> Result<SessionState> {
        let epoch = self.session.epoch();
        match self.client.me().await {
            Ok(profile) => {
                let state = self
                    .session
                    .dispatch(SessionEvent::ProfileLoaded {
                        epoch,
                        profile: profile.clone(),
                    })
                    .await?;
                self.cache.put(QueryKey::Me, &profile);
                Ok(state)
            }
            Err(Error::Connectivity(message)) => {
                warn!("Profile fetch could not reach the server: {}", message);
                self.session
                    .dispatch(SessionEvent::ProfileUnreachable { epoch })
                    .await?;
                Err(Error::Connectivity(message))
            }
            // the gateway has already signed the session out
            Err(e @ Error::Unauthorized(_)) => Err(e),
            Err(e) => {
                warn!("Profile fetch failed, signing out: {}", e);
                self.session
                    .dispatch(SessionEvent::ProfileRejected { epoch })
                    .await?;
                Err(e)
            }
        }
    }

    /// Re-reads the profile of an already authenticated session.
    ///
    /// Failures other than authorization leave the session as it was.
    pub async fn refresh_profile(&self) -> Result<Profile> {
        if self.session.state() == SessionState::Authenticating {
            self.fetch_profile().await?;
            return self.profile().ok_or_else(|| {
                Error::Unauthorized("profile is not available".to_string())
            });
        }

        let epoch = self.session.epoch();
        let profile = self.client.me().await?;
        self.session
            .dispatch(SessionEvent::ProfileLoaded {
                epoch,
                profile: profile.clone(),
            })
            .await?;
        self.cache.put(QueryKey::Me, &profile);
        Ok(profile)
    }

    /// Leaves the unreachable state and tries the profile fetch again.
    pub async fn retry(&self) -> Result<SessionState> {
        self.session.dispatch(SessionEvent::Retry).await?;
        self.fetch_profile().await
    }

    pub async fn link_game_account(&self, account: &RiotAccountRequest) -> Result<SessionState> {
        if !self.session.state().is_authenticated() {
            return Err(Error::Unauthorized(
                "log in before linking a game account".to_string(),
            ));
        }
        let _permit = self.submits.begin(Action::LinkGameAccount)?;
        let epoch = self.session.epoch();

        let profile = self.client.register_riot(account).await?;
        self.cache.invalidate(&[QueryGroup::Me]);
        let state = self
            .session
            .dispatch(SessionEvent::GameAccountLinked { epoch, profile })
            .await?;
        if state == SessionState::AuthenticatedIncomplete {
            warn!("Game account linked but the profile still has no tier");
        }
        Ok(state)
    }

    pub async fn logout(&self) -> Result<SessionState> {
        let state = self.session.dispatch(SessionEvent::LoggedOut).await?;
        self.cache.clear();
        info!("Logged out");
        Ok(state)
    }

    /// Signs the session out if its token lapsed since it was adopted.
    pub async fn expire_if_stale(&self) -> Result<bool> {
        let snapshot = self.session.snapshot();
        if !snapshot.state.holds_token() || snapshot.is_authenticated() {
            return Ok(false);
        }
        self.session
            .dispatch(SessionEvent::TokenExpired {
                epoch: snapshot.epoch,
            })
            .await?;
        self.cache.clear();
        Ok(true)
    }
}
