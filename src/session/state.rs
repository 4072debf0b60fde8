//! The session state machine.
//!
//! [`Session::transition`] is the only way a session changes. It is pure: it
//! returns the next session plus the storage effects the caller must run.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Profile, StoredToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Nothing checked yet.
    Unknown,
    Unauthenticated,
    /// A token is held and the profile fetch is in flight.
    Authenticating,
    /// The profile fetch could not reach the server. The token is kept.
    Unreachable,
    /// Logged in, but no game account is linked yet.
    AuthenticatedIncomplete,
    AuthenticatedComplete,
}

impl SessionState {
    /// States the guard shows a loading indicator for.
    pub fn is_transitional(self) -> bool {
        matches!(self, SessionState::Unknown | SessionState::Authenticating)
    }

    pub fn is_authenticated(self) -> bool {
        matches!(
            self,
            SessionState::AuthenticatedIncomplete | SessionState::AuthenticatedComplete
        )
    }

    /// States that hold a token.
    pub fn holds_token(self) -> bool {
        matches!(
            self,
            SessionState::Authenticating
                | SessionState::Unreachable
                | SessionState::AuthenticatedIncomplete
                | SessionState::AuthenticatedComplete
        )
    }
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Startup found no usable persisted token.
    NoPersistedToken,
    /// Startup found a usable persisted token.
    TokenRestored(StoredToken),
    LoginSucceeded(StoredToken),
    /// The profile fetch started under `epoch` returned a profile.
    ProfileLoaded { epoch: u64, profile: Profile },
    /// The server answered the profile fetch with something other than a profile.
    ProfileRejected { epoch: u64 },
    /// The profile fetch got no response at all.
    ProfileUnreachable { epoch: u64 },
    Retry,
    GameAccountLinked { epoch: u64, profile: Profile },
    LoggedOut,
    /// The server refused a token handed out in `epoch`.
    CredentialsRejected { epoch: u64 },
    /// The token from `epoch` ran past one of its expiries.
    TokenExpired { epoch: u64 },
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::NoPersistedToken => "no_persisted_token",
            SessionEvent::TokenRestored(_) => "token_restored",
            SessionEvent::LoginSucceeded(_) => "login_succeeded",
            SessionEvent::ProfileLoaded { .. } => "profile_loaded",
            SessionEvent::ProfileRejected { .. } => "profile_rejected",
            SessionEvent::ProfileUnreachable { .. } => "profile_unreachable",
            SessionEvent::Retry => "retry",
            SessionEvent::GameAccountLinked { .. } => "game_account_linked",
            SessionEvent::LoggedOut => "logged_out",
            SessionEvent::CredentialsRejected { .. } => "credentials_rejected",
            SessionEvent::TokenExpired { .. } => "token_expired",
        }
    }

    /// The token epoch a response-driven event was produced under.
    pub fn epoch(&self) -> Option<u64> {
        match self {
            SessionEvent::ProfileLoaded { epoch, .. }
            | SessionEvent::ProfileRejected { epoch }
            | SessionEvent::ProfileUnreachable { epoch }
            | SessionEvent::GameAccountLinked { epoch, .. }
            | SessionEvent::CredentialsRejected { epoch }
            | SessionEvent::TokenExpired { epoch } => Some(*epoch),
            _ => None,
        }
    }
}

/// Side effects a transition asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    PersistToken(StoredToken),
    ClearToken,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("event '{event}' is not valid in state {state:?}")]
    InvalidTransition {
        state: SessionState,
        event: &'static str,
    },
    /// The event refers to a token that is no longer the current one.
    #[error("event '{event}' refers to epoch {got}, current epoch is {current}")]
    StaleEpoch {
        event: &'static str,
        got: u64,
        current: u64,
    },
}

/// Snapshot of the client's authentication state.
#[derive(Debug, Clone)]
pub struct Session {
    pub state: SessionState,
    pub token: Option<StoredToken>,
    pub user: Option<Profile>,
    /// Bumped every time a new token is adopted.
    pub epoch: u64,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            state: SessionState::Unknown,
            token: None,
            user: None,
            epoch: 0,
        }
    }
}

fn profile_state(profile: &Profile) -> SessionState {
    if profile.needs_game_account_link() {
        SessionState::AuthenticatedIncomplete
    } else {
        SessionState::AuthenticatedComplete
    }
}

impl Session {
    /// True iff a token is held and neither of its expiries has passed at `now`.
    pub fn is_authenticated_at(&self, now: DateTime<Utc>) -> bool {
        self.token.as_ref().is_some_and(|t| t.is_valid_at(now))
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(Utc::now())
    }

    pub fn needs_game_account_link(&self) -> bool {
        self.user
            .as_ref()
            .map_or(true, Profile::needs_game_account_link)
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_transitional()
    }

    fn signed_out(&self) -> Session {
        Session {
            state: SessionState::Unauthenticated,
            token: None,
            user: None,
            epoch: self.epoch,
        }
    }

    fn adopt(&self, token: StoredToken) -> Session {
        Session {
            state: SessionState::Authenticating,
            token: Some(token),
            user: None,
            epoch: self.epoch + 1,
        }
    }

    fn with_profile(&self, profile: Profile) -> Session {
        Session {
            state: profile_state(&profile),
            token: self.token.clone(),
            user: Some(profile),
            epoch: self.epoch,
        }
    }

    fn persist_current(&self) -> Vec<SessionEffect> {
        self.token
            .iter()
            .cloned()
            .map(SessionEffect::PersistToken)
            .collect()
    }

    /// Applies `event`, returning the next session and the effects to run.
    pub fn transition(
        &self,
        event: SessionEvent,
    ) -> Result<(Session, Vec<SessionEffect>), TransitionError> {
        use SessionState::*;

        let name = event.name();
        let invalid = || TransitionError::InvalidTransition {
            state: self.state,
            event: name,
        };

        // a response to an earlier token never touches the current one
        if let Some(epoch) = event.epoch() {
            if self.state.holds_token() && epoch != self.epoch {
                return Err(TransitionError::StaleEpoch {
                    event: name,
                    got: epoch,
                    current: self.epoch,
                });
            }
        }

        match (self.state, event) {
            (_, SessionEvent::LoggedOut) => Ok((self.signed_out(), vec![SessionEffect::ClearToken])),

            (
                _,
                SessionEvent::CredentialsRejected { .. } | SessionEvent::TokenExpired { .. },
            ) => {
                if !self.state.holds_token() {
                    return Err(invalid());
                }
                Ok((self.signed_out(), vec![SessionEffect::ClearToken]))
            }

            (Unknown, SessionEvent::NoPersistedToken) => {
                Ok((self.signed_out(), vec![SessionEffect::ClearToken]))
            }
            (Unknown, SessionEvent::TokenRestored(token)) => Ok((self.adopt(token), vec![])),

            (Unknown | Unauthenticated | Unreachable, SessionEvent::LoginSucceeded(token)) => {
                let effects = vec![SessionEffect::PersistToken(token.clone())];
                Ok((self.adopt(token), effects))
            }

            (
                Authenticating | AuthenticatedIncomplete | AuthenticatedComplete,
                SessionEvent::ProfileLoaded { profile, .. },
            ) => {
                let next = self.with_profile(profile);
                let effects = next.persist_current();
                Ok((next, effects))
            }
            (Authenticating, SessionEvent::ProfileRejected { .. }) => {
                Ok((self.signed_out(), vec![SessionEffect::ClearToken]))
            }
            (Authenticating, SessionEvent::ProfileUnreachable { .. }) => Ok((
                Session {
                    state: Unreachable,
                    ..self.clone()
                },
                vec![],
            )),

            (Unreachable, SessionEvent::Retry) => Ok((
                Session {
                    state: Authenticating,
                    ..self.clone()
                },
                vec![],
            )),

            (
                AuthenticatedIncomplete | AuthenticatedComplete,
                SessionEvent::GameAccountLinked { profile, .. },
            ) => {
                let next = self.with_profile(profile);
                let effects = next.persist_current();
                Ok((next, effects))
            }

            _ => Err(invalid()),
        }
    }
}
