//! In-process key/value cache with per-entry TTL.
//!
//! One cache instance is shared by every invocation in the process; clones
//! are cheap handles onto the same store. Expired entries are dropped
//! lazily on read and can also be swept explicitly or on a timer. The
//! cache guarantees atomicity at single-key granularity only; callers own
//! any cross-key consistency.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::debug;

use crate::keys::{safe_key, UnsafeKey};

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Shared in-memory TTL cache.
#[derive(Debug, Clone, Default)]
pub struct Cache {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a value, dropping it first if its TTL has elapsed.
    pub fn get_item(&self, key: &str) -> Result<Option<Value>, UnsafeKey> {
        let key = safe_key(key)?;
        let mut entries = self.entries.lock().expect("cache lock");
        let now = Instant::now();

        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    /// Store a value, optionally bounded by a time-to-live.
    pub fn set_item(
        &self,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> Result<(), UnsafeKey> {
        let key = safe_key(key)?;
        let entry = Entry {
            value,
            expires_at: ttl.map(|d| Instant::now() + d),
        };
        self.entries
            .lock()
            .expect("cache lock")
            .insert(key.to_string(), entry);
        Ok(())
    }

    /// Remove a value, returning it if it was present and live.
    pub fn remove_item(&self, key: &str) -> Result<Option<Value>, UnsafeKey> {
        let key = safe_key(key)?;
        let now = Instant::now();
        Ok(self
            .entries
            .lock()
            .expect("cache lock")
            .remove(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value))
    }

    /// Sweep every expired entry, returning how many were dropped.
    pub fn prune(&self) -> usize {
        let mut entries = self.entries.lock().expect("cache lock");
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Run [`Cache::prune`] on a timer until the task is dropped.
    pub fn spawn_pruner(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let dropped = cache.prune();
                if dropped > 0 {
                    debug!(dropped, "cache pruner swept expired entries");
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
