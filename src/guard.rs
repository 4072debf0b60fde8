//! Route protection.
//!
//! [`decide`] maps a session snapshot and a route to what should be shown.
//! [`AuthGuard`] applies those decisions as the session changes and is the
//! only place that navigates on the session's behalf.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::session::{Session, SessionState};
use crate::views::ViewHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    LinkGameAccount,
    Home,
    Teams,
    CreateTeam,
    Profile,
}

impl Route {
    pub const ALL: [Route; 6] = [
        Route::Login,
        Route::LinkGameAccount,
        Route::Home,
        Route::Teams,
        Route::CreateTeam,
        Route::Profile,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::LinkGameAccount => "/riot-register",
            Route::Home => "/",
            Route::Teams => "/teams",
            Route::CreateTeam => "/create-team",
            Route::Profile => "/profile",
        }
    }

    pub fn from_path(path: &str) -> Option<Route> {
        let path = match path.trim_end_matches('/') {
            "" => "/",
            p => p,
        };
        Route::ALL.into_iter().find(|r| r.path() == path)
    }

    /// Everything but the login page needs a session.
    pub fn is_protected(self) -> bool {
        self != Route::Login
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Loading,
    /// The server could not be reached; offer a retry.
    ConnectionError,
    Redirect(Route),
    Render,
}

/// The guard's decision table. First matching rule wins.
pub fn decide(
    session: &Session,
    route: Route,
    now: DateTime<Utc>,
    loading_expired: bool,
) -> GuardDecision {
    if !route.is_protected() {
        return GuardDecision::Render;
    }

    match session.state {
        SessionState::Unknown | SessionState::Authenticating => {
            return if loading_expired {
                GuardDecision::ConnectionError
            } else {
                GuardDecision::Loading
            };
        }
        SessionState::Unreachable => return GuardDecision::ConnectionError,
        _ => {}
    }

    if session.state == SessionState::Unauthenticated || !session.is_authenticated_at(now) {
        return GuardDecision::Redirect(Route::Login);
    }

    match (session.state, route) {
        (SessionState::AuthenticatedIncomplete, r) if r != Route::LinkGameAccount => {
            GuardDecision::Redirect(Route::LinkGameAccount)
        }
        (SessionState::AuthenticatedComplete, Route::LinkGameAccount) => {
            GuardDecision::Redirect(Route::Home)
        }
        _ => GuardDecision::Render,
    }
}

/// Performs history-replacing navigation.
pub trait Navigator: Send + Sync {
    fn replace(&self, route: Route);
}

/// The session change, or navigation, a redirect was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IssuedRedirect {
    state: SessionState,
    epoch: u64,
    target: Route,
}

pub struct AuthGuard {
    session: watch::Receiver<Session>,
    navigator: Arc<dyn Navigator>,
    loading_timeout: Duration,
    loading_since: Option<Instant>,
    route: Route,
    last_redirect: Option<IssuedRedirect>,
    view: Option<ViewHandle>,
}

impl AuthGuard {
    pub fn new(
        session: watch::Receiver<Session>,
        navigator: Arc<dyn Navigator>,
        loading_timeout: Duration,
        route: Route,
    ) -> Self {
        Self {
            session,
            navigator,
            loading_timeout,
            loading_since: None,
            route,
            last_redirect: None,
            view: None,
        }
    }

    /// Hands over the view shown for the current route. It is unmounted when
    /// the guard redirects away from that route.
    pub fn attach(&mut self, view: ViewHandle) {
        self.view = Some(view);
    }

    /// The route currently shown, after any redirect.
    pub fn route(&self) -> Route {
        self.route
    }

    /// User-initiated navigation.
    ///
    /// Counts as a change of its own: a redirect already issued for the
    /// current session is issued again if the new route calls for it.
    pub fn navigate(&mut self, route: Route) -> GuardDecision {
        debug!(%route, "navigating");
        self.route = route;
        self.last_redirect = None;
        self.evaluate()
    }

    /// Decides for the current snapshot and carries out a redirect if one is due.
    pub fn evaluate(&mut self) -> GuardDecision {
        let session = self.session.borrow_and_update().clone();

        if session.state.is_transitional() {
            self.loading_since.get_or_insert_with(Instant::now);
        } else {
            self.loading_since = None;
        }
        let loading_expired = self
            .loading_since
            .is_some_and(|since| since.elapsed() >= self.loading_timeout);

        let decision = decide(&session, self.route, Utc::now(), loading_expired);
        match decision {
            GuardDecision::Redirect(target) => {
                let issued = IssuedRedirect {
                    state: session.state,
                    epoch: session.epoch,
                    target,
                };
                if self.last_redirect != Some(issued) {
                    info!(from = %self.route, to = %target, state = ?session.state, "redirecting");
                    self.navigator.replace(target);
                    self.last_redirect = Some(issued);
                }
                if let Some(view) = self.view.take() {
                    view.unmount();
                }
                self.route = target;
            }
            GuardDecision::ConnectionError if loading_expired => {
                warn!(
                    timeout_ms = self.loading_timeout.as_millis() as u64,
                    "session is still loading; giving up"
                );
            }
            _ => {}
        }
        decision
    }

    /// Waits for the next session change, or for the loading bound to run out.
    ///
    /// Returns `false` once the session store is gone.
    pub async fn changed(&mut self) -> bool {
        let remaining = self
            .loading_since
            .map(|since| self.loading_timeout.saturating_sub(since.elapsed()));
        match remaining {
            Some(remaining) => {
                match tokio::time::timeout(remaining, self.session.changed()).await {
                    Ok(result) => result.is_ok(),
                    // the loading bound elapsed; the next evaluation reports it
                    Err(_) => true,
                }
            }
            None => self.session.changed().await.is_ok(),
        }
    }

    /// Evaluates until the session settles into something other than `Loading`.
    pub async fn settle(&mut self) -> GuardDecision {
        loop {
            let decision = self.evaluate();
            if decision != GuardDecision::Loading || !self.changed().await {
                return decision;
            }
        }
    }

    /// Re-evaluates on every session change until the session store is dropped.
    pub async fn run(mut self) {
        loop {
            self.evaluate();
            if !self.changed().await {
                debug!("session store closed; guard stopping");
                return;
            }
        }
    }
}
