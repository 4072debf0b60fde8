//! Shared application state.
//!
//! Wires the token store, session, gateway, query cache and services together
//! once per process.

use std::sync::Arc;

use crate::auth::Auth;
use crate::cache::QueryCache;
use crate::config::ConfigV1;
use crate::error::Result;
use crate::gateway::ApiClient;
use crate::league::League;
use crate::rules::TeamLimits;
use crate::session::SessionStore;
use crate::store::{create_store, TokenStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConfigV1>,
    pub session: Arc<SessionStore>,
    pub client: Arc<ApiClient>,
    pub cache: Arc<QueryCache>,
    pub auth: Arc<Auth>,
    pub league: Arc<League>,
}

impl AppState {
    pub fn new(config: Arc<ConfigV1>) -> Result<Self> {
        let tokens = create_store(&config.store);
        Self::with_token_store(config, tokens)
    }

    /// Builds the state around an existing token store.
    pub fn with_token_store(config: Arc<ConfigV1>, tokens: Arc<dyn TokenStore>) -> Result<Self> {
        let session = Arc::new(SessionStore::new(tokens));
        let client = Arc::new(ApiClient::new(&config.api, session.clone())?);
        let cache = Arc::new(QueryCache::new(&config.cache));
        let auth = Arc::new(Auth::new(
            session.clone(),
            client.clone(),
            cache.clone(),
            config.session.clone(),
        ));
        let league = Arc::new(League::new(
            client.clone(),
            cache.clone(),
            auth.clone(),
            TeamLimits::from(&config.rules),
        ));

        Ok(Self {
            config,
            session,
            client,
            cache,
            auth,
            league,
        })
    }
}
