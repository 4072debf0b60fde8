//! Query cache for server reads.
//!
//! Entries expire after the configured stale time and are dropped explicitly
//! when a mutation touches the data they mirror. The cache never outlives a
//! session: login and logout clear it.

use std::collections::HashSet;
use std::sync::Mutex;

use cached::{Cached, TimedCache};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::models::UserQuery;

/// Identifies one cached read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Me,
    Users(UserQuery),
    AvailableUsers(UserQuery),
    Teams,
    MyTeam,
    Team(i64),
    RecruitsPending,
    RecruitsTeam,
}

/// Families of keys a mutation invalidates together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryGroup {
    Me,
    Users,
    AvailableUsers,
    Teams,
    MyTeam,
    Team(i64),
    Recruits,
}

impl QueryGroup {
    fn matches(self, key: &QueryKey) -> bool {
        match (self, key) {
            (QueryGroup::Me, QueryKey::Me) => true,
            (QueryGroup::Users, QueryKey::Users(_)) => true,
            (QueryGroup::AvailableUsers, QueryKey::AvailableUsers(_)) => true,
            (QueryGroup::Teams, QueryKey::Teams) => true,
            (QueryGroup::MyTeam, QueryKey::MyTeam) => true,
            (QueryGroup::Team(id), QueryKey::Team(key_id)) => id == *key_id,
            (QueryGroup::Recruits, QueryKey::RecruitsPending | QueryKey::RecruitsTeam) => true,
            _ => false,
        }
    }
}

struct Entries {
    values: TimedCache<QueryKey, Value>,
    // TimedCache cannot enumerate its keys; group invalidation needs them
    keys: HashSet<QueryKey>,
}

pub struct QueryCache {
    inner: Mutex<Entries>,
}

impl QueryCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            inner: Mutex::new(Entries {
                values: TimedCache::with_lifespan(config.stale_time_secs),
                keys: HashSet::new(),
            }),
        }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let mut entries = self.inner.lock().ok()?;
        let Some(value) = entries.values.cache_get(key).cloned() else {
            entries.keys.remove(key);
            return None;
        };
        match serde_json::from_value(value) {
            Ok(v) => {
                debug!(?key, "query cache hit");
                Some(v)
            }
            Err(e) => {
                warn!(?key, "dropping unreadable cache entry: {}", e);
                entries.values.cache_remove(key);
                entries.keys.remove(key);
                None
            }
        }
    }

    pub fn put<T: Serialize>(&self, key: QueryKey, value: &T) {
        let Ok(json) = serde_json::to_value(value) else {
            return;
        };
        if let Ok(mut entries) = self.inner.lock() {
            let Entries { values, keys } = &mut *entries;
            // forget keys whose entries expired without being read again
            keys.retain(|k| values.cache_get(k).is_some());
            keys.insert(key.clone());
            values.cache_set(key, json);
        }
    }

    pub fn invalidate(&self, groups: &[QueryGroup]) {
        let Ok(mut entries) = self.inner.lock() else {
            return;
        };
        let doomed: Vec<QueryKey> = entries
            .keys
            .iter()
            .filter(|key| groups.iter().any(|g| g.matches(key)))
            .cloned()
            .collect();
        for key in &doomed {
            entries.values.cache_remove(key);
            entries.keys.remove(key);
        }
        debug!(?groups, removed = doomed.len(), "query cache invalidated");
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.inner.lock() {
            entries.values.cache_clear();
            entries.keys.clear();
        }
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.get::<Value>(key).is_some()
    }

    /// Number of keys tracked for group invalidation.
    pub fn tracked(&self) -> usize {
        self.inner.lock().map(|e| e.keys.len()).unwrap_or(0)
    }
}
