//! # Cache
//!
//! In-process key/value cache with a time-to-live per entry. Values are kept
//! as JSON so any serializable type can be cached under a string key.
//! Invalidation is explicit: observers forget keys after model writes.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Key naming convention shared by services and observers
pub mod keys {
    pub fn user_categories(user_id: &str) -> String {
        format!("user_{}_categories", user_id)
    }

    pub fn user_budgets(user_id: &str) -> String {
        format!("user_{}_budgets", user_id)
    }

    pub fn user_dashboard(user_id: &str) -> String {
        format!("user_{}_dashboard", user_id)
    }

    pub fn budget_progress(budget_id: &str) -> String {
        format!("budget_{}_progress", budget_id)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map_or(false, |at| at <= now)
    }
}

#[derive(Clone)]
pub struct CacheStore {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    default_ttl: Option<Duration>,
}

impl CacheStore {
    /// A cache whose entries expire after `default_ttl`; zero means never
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            default_ttl: (!default_ttl.is_zero()).then_some(default_ttl),
        }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            let entry = entries.get(key)?;
            if entry.is_expired(Instant::now()) {
                None
            } else {
                Some(entry.value.clone())
            }
        };

        match value {
            Some(value) => match serde_json::from_value(value) {
                Ok(typed) => Some(typed),
                Err(e) => {
                    warn!(target: "app", key, error = %e, "Dropping unreadable cache entry");
                    self.forget(key);
                    None
                }
            },
            None => {
                self.forget(key);
                None
            }
        }
    }

    pub fn put<T: Serialize>(&self, key: &str, value: &T) {
        self.put_with_ttl(key, value, self.default_ttl);
    }

    pub fn put_with_ttl<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                warn!(target: "app", key, error = %e, "Value not cacheable");
                return;
            }
        };

        let entry = CacheEntry {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), entry);
    }

    pub fn has(&self, key: &str) -> bool {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .map_or(false, |entry| !entry.is_expired(Instant::now()))
    }

    /// Returns true if the key was present
    pub fn forget(&self, key: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }

    pub fn forget_many<I, K>(&self, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        for key in keys {
            if entries.remove(key.as_ref()).is_some() {
                debug!(target: "app", key = key.as_ref(), "Cache key forgotten");
            }
        }
    }

    pub fn flush(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Return the cached value, or compute, store and return it.
    /// Errors from `compute` are passed through and nothing is cached.
    pub async fn remember<T, E, F, Fut>(&self, key: &str, compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get::<T>(key) {
            return Ok(cached);
        }

        let value = compute().await?;
        self.put(key, &value);
        Ok(value)
    }
}
