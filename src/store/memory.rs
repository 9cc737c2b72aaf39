//! In-memory store for tests and local development

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use redis::{RedisError, RedisResult};

use super::KeyValueStore;

#[derive(Debug, Clone)]
struct StoredEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl StoredEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map_or(false, |at| at <= now)
    }
}

/// Store backed by a `HashMap`, with lazy expiration
///
/// Clones share the same map, so a clone handed to the client can be inspected
/// from the test afterwards.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, StoredEntry>>>,
    /// Simulate a refused connection on every command if true
    simulate_unreachable: Arc<Mutex<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable refused-connection simulation for testing
    pub fn set_unreachable(&self, enabled: bool) {
        *self.simulate_unreachable.lock() = enabled;
    }

    /// Store a raw string without going through the JSON codec
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries.lock().insert(
            key.to_string(),
            StoredEntry {
                value: value.to_string(),
                expires_at: None,
            },
        );
    }

    /// Read the raw string at `key`, ignoring expiration
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).map(|e| e.value.clone())
    }

    /// Number of live (non-expired) keys
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_reachable(&self) -> RedisResult<()> {
        if *self.simulate_unreachable.lock() {
            return Err(RedisError::from(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Simulated connection refused",
            )));
        }
        Ok(())
    }

    /// Drops `key` if it has expired and returns the live entry otherwise
    fn live_entry(
        entries: &mut HashMap<String, StoredEntry>,
        key: &str,
    ) -> Option<StoredEntry> {
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.clone()),
            None => None,
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> RedisResult<Option<String>> {
        self.check_reachable()?;
        let mut entries = self.entries.lock();
        Ok(Self::live_entry(&mut entries, key).map(|e| e.value))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> RedisResult<()> {
        self.check_reachable()?;
        if ttl_seconds == 0 {
            return Err(RedisError::from((
                redis::ErrorKind::InvalidClientConfig,
                "invalid expire time in 'set' command",
            )));
        }

        self.entries.lock().insert(
            key.to_string(),
            StoredEntry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + Duration::from_secs(ttl_seconds)),
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> RedisResult<usize> {
        self.check_reachable()?;
        let mut entries = self.entries.lock();
        let existed = Self::live_entry(&mut entries, key).is_some();
        entries.remove(key);
        Ok(usize::from(existed))
    }

    async fn ttl(&self, key: &str) -> RedisResult<i64> {
        self.check_reachable()?;
        let mut entries = self.entries.lock();
        let ttl = match Self::live_entry(&mut entries, key) {
            None => -2,
            Some(StoredEntry {
                expires_at: None, ..
            }) => -1,
            Some(StoredEntry {
                expires_at: Some(at),
                ..
            }) => {
                // Redis rounds the remaining time to the nearest second
                let remaining = at.saturating_duration_since(Instant::now());
                (remaining.as_millis() as i64 + 500) / 1000
            }
        };
        Ok(ttl)
    }
}
