//! User-facing client
//!
//! [`AsyncRedisClient`] wraps a connected store and exposes the verbs:
//! save, load, delete, update, append, extend, extract and health_check.
//! Writes without an explicit TTL use the default passed at construction.

use redis::aio::ConnectionManager;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::RedisSettings;
use crate::constants::{DEFAULT_STORE_TTL_SECS, HEALTH_CHECK_KEY, HEALTH_CHECK_TTL_SECS};
use crate::error::ClientResult;
use crate::operator::{self, Operation};
use crate::store::KeyValueStore;
use crate::value::{self, StoredValue};

/// Async JSON client over a key-value store
#[derive(Debug, Clone)]
pub struct AsyncRedisClient<S = ConnectionManager> {
    store: S,
    default_ttl_seconds: u64,
}

impl AsyncRedisClient<ConnectionManager> {
    /// Connects using `settings` and wraps the resulting pool
    pub async fn connect(settings: &RedisSettings) -> ClientResult<Self> {
        settings.validate()?;
        let pool = settings.make_pool(None).await?;
        Ok(Self::with_default_ttl(pool, settings.default_ttl_seconds))
    }
}

impl<S: KeyValueStore> AsyncRedisClient<S> {
    /// Wraps `store` with the crate's default TTL
    pub fn new(store: S) -> Self {
        Self::with_default_ttl(store, DEFAULT_STORE_TTL_SECS)
    }

    pub fn with_default_ttl(store: S, default_ttl_seconds: u64) -> Self {
        Self {
            store,
            default_ttl_seconds,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn default_ttl_seconds(&self) -> u64 {
        self.default_ttl_seconds
    }

    /// Saves `value` under `key` with the default TTL, overwriting
    pub async fn save(&self, key: &str, value: StoredValue) -> ClientResult<StoredValue> {
        self.save_with_ttl(key, value, self.default_ttl_seconds).await
    }

    pub async fn save_with_ttl(
        &self,
        key: &str,
        value: StoredValue,
        ttl_seconds: u64,
    ) -> ClientResult<StoredValue> {
        tracing::debug!(key = %key, ttl_seconds, size = payload_len(&value), "Saving data");
        Operation::Save {
            key,
            value,
            ttl_seconds,
        }
        .run(&self.store)
        .await
    }

    /// Serializes any `Serialize` value and saves it with the default TTL
    pub async fn save_as<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> ClientResult<StoredValue> {
        let value = serde_json::to_value(value)?;
        self.save(key, value).await
    }

    /// Loads the value under `key`, or an empty sequence if there is none
    pub async fn load(&self, key: &str) -> ClientResult<StoredValue> {
        self.load_or(key, value::empty_sequence()).await
    }

    /// Loads the value under `key`, returning `default` if there is none
    pub async fn load_or(&self, key: &str, default: StoredValue) -> ClientResult<StoredValue> {
        let data = Operation::Load { key, default }.run(&self.store).await?;
        tracing::debug!(key = %key, size = payload_len(&data), "Loaded data");
        Ok(data)
    }

    /// Loads and deserializes the value under `key`
    ///
    /// `None` only when the key is absent (or holds an empty string). A stored
    /// JSON `null` is handed to `T`'s deserializer like any other value, so
    /// `load_as::<Option<T>>` yields `Some(None)` for it.
    pub async fn load_as<T: DeserializeOwned>(&self, key: &str) -> ClientResult<Option<T>> {
        operator::instrumented("load", key, read_as(&self.store, key)).await
    }

    /// Removes `key`; absent keys are not an error
    pub async fn delete(&self, key: &str) -> ClientResult<()> {
        Operation::Delete { key }.run(&self.store).await?;
        tracing::debug!(key = %key, "Deleted");
        Ok(())
    }

    /// Shallow-merges `value` into the mapping under `key` and returns the result
    pub async fn update(&self, key: &str, value: StoredValue) -> ClientResult<StoredValue> {
        self.update_with_ttl(key, value, self.default_ttl_seconds)
            .await
    }

    pub async fn update_with_ttl(
        &self,
        key: &str,
        value: StoredValue,
        ttl_seconds: u64,
    ) -> ClientResult<StoredValue> {
        tracing::debug!(key = %key, ttl_seconds, size = payload_len(&value), "Data will be updated");
        Operation::Update {
            key,
            value,
            ttl_seconds,
        }
        .run(&self.store)
        .await
    }

    /// Appends one element to the sequence under `key` and returns the result
    pub async fn append(&self, key: &str, value: StoredValue) -> ClientResult<StoredValue> {
        self.append_with_ttl(key, value, self.default_ttl_seconds)
            .await
    }

    pub async fn append_with_ttl(
        &self,
        key: &str,
        value: StoredValue,
        ttl_seconds: u64,
    ) -> ClientResult<StoredValue> {
        let appended = Operation::Append {
            key,
            value,
            ttl_seconds,
        }
        .run(&self.store)
        .await?;
        tracing::debug!(key = %key, ttl_seconds, len = payload_len(&appended), "Data appended");
        Ok(appended)
    }

    /// Concatenates a sequence onto the sequence under `key` and returns the result
    pub async fn extend(&self, key: &str, value: StoredValue) -> ClientResult<StoredValue> {
        self.extend_with_ttl(key, value, self.default_ttl_seconds)
            .await
    }

    pub async fn extend_with_ttl(
        &self,
        key: &str,
        value: StoredValue,
        ttl_seconds: u64,
    ) -> ClientResult<StoredValue> {
        let extended = Operation::Extend {
            key,
            value,
            ttl_seconds,
        }
        .run(&self.store)
        .await?;
        tracing::debug!(key = %key, ttl_seconds, len = payload_len(&extended), "Data extended");
        Ok(extended)
    }

    /// Loads the value under `key`, then deletes the key
    ///
    /// Two separate commands: a write landing in between is lost.
    pub async fn extract(&self, key: &str) -> ClientResult<StoredValue> {
        let data = self.load(key).await?;
        self.delete(key).await?;
        Ok(data)
    }

    /// Round-trips a sentinel mapping through the store
    ///
    /// Saves `{"test": "test"}` under a well-known key, reads it back, deletes
    /// it, and returns what was read.
    pub async fn health_check(&self) -> ClientResult<StoredValue> {
        tracing::info!("Redis checking...");
        self.save_with_ttl(HEALTH_CHECK_KEY, json!({"test": "test"}), HEALTH_CHECK_TTL_SECS)
            .await?;
        let results = self.load(HEALTH_CHECK_KEY).await?;
        tracing::info!("Redis checking: OK");
        self.delete(HEALTH_CHECK_KEY).await?;

        Ok(results)
    }
}

/// Connects with `settings` and runs a health check
pub async fn check_redis_connection(settings: &RedisSettings) -> ClientResult<StoredValue> {
    AsyncRedisClient::connect(settings)
        .await?
        .health_check()
        .await
}

async fn read_as<S, T>(store: &S, key: &str) -> ClientResult<Option<T>>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    match operator::read(store, key).await? {
        None => Ok(None),
        Some(data) => Ok(Some(serde_json::from_value(data)?)),
    }
}

/// Element count for collections, byte length for strings, 1 otherwise
fn payload_len(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        Value::String(text) => text.len(),
        Value::Null => 0,
        _ => 1,
    }
}
