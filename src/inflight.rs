//! Guards against submitting the same mutation twice.
//!
//! The backend does not de-duplicate mutations, so a second "accept" while the
//! first is still in flight would be a second request. A [`SubmitPermit`] is
//! held for the whole request and released when dropped.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    CreateTeam,
    LeaveTeam,
    Kick(i64),
    SendRecruit(i64),
    RespondRecruit(i64),
    LinkGameAccount,
    Login,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::CreateTeam => write!(f, "create team"),
            Action::LeaveTeam => write!(f, "leave team"),
            Action::Kick(id) => write!(f, "kick user {}", id),
            Action::SendRecruit(id) => write!(f, "recruit user {}", id),
            Action::RespondRecruit(id) => write!(f, "respond to request {}", id),
            Action::LinkGameAccount => write!(f, "link game account"),
            Action::Login => write!(f, "login"),
        }
    }
}

#[derive(Default, Clone)]
pub struct SubmitLock {
    pending: Arc<Mutex<HashSet<Action>>>,
}

pub struct SubmitPermit {
    action: Action,
    pending: Arc<Mutex<HashSet<Action>>>,
}

impl SubmitLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `action`, failing if the same action is still awaiting its response.
    pub fn begin(&self, action: Action) -> Result<SubmitPermit> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| Error::InFlight(action.to_string()))?;
        if !pending.insert(action.clone()) {
            return Err(Error::InFlight(action.to_string()));
        }
        Ok(SubmitPermit {
            action,
            pending: self.pending.clone(),
        })
    }

    pub fn is_pending(&self, action: &Action) -> bool {
        self.pending
            .lock()
            .map(|p| p.contains(action))
            .unwrap_or(false)
    }
}

impl Drop for SubmitPermit {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(&self.action);
        }
    }
}
