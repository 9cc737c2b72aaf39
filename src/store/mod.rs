//! Store abstraction
//!
//! The client never talks to Redis directly. It issues `GET`, `SET .. EX`, `DEL`
//! and `TTL` through [`KeyValueStore`], which is implemented for the redis
//! `ConnectionManager` and for an in-memory backend used in tests.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisResult};

pub mod memory;
pub use memory::MemoryStore;

/// Connected session capable of string get/set/delete with expiration
///
/// Errors are reported as `RedisError` so every backend goes through the same
/// translation into `ClientError`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the string stored at `key`, `None` if absent
    async fn get(&self, key: &str) -> RedisResult<Option<String>>;

    /// Store `value` at `key`, overwriting, expiring after `ttl_seconds`
    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> RedisResult<()>;

    /// Remove `key`, returning the number of keys removed (0 or 1)
    async fn del(&self, key: &str) -> RedisResult<usize>;

    /// Remaining time to live: -2 if absent, -1 if no expiry
    async fn ttl(&self, key: &str) -> RedisResult<i64>;
}

// ConnectionManager is a cheap clone over a multiplexed connection; each call
// clones it so the trait can take `&self`. The redis commands are called through
// `AsyncCommands::` explicitly since the method names match this trait's.
#[async_trait]
impl KeyValueStore for ConnectionManager {
    async fn get(&self, key: &str) -> RedisResult<Option<String>> {
        let mut conn = self.clone();
        AsyncCommands::get(&mut conn, key).await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> RedisResult<()> {
        let mut conn = self.clone();
        AsyncCommands::set_ex(&mut conn, key, value, ttl_seconds).await
    }

    async fn del(&self, key: &str) -> RedisResult<usize> {
        let mut conn = self.clone();
        AsyncCommands::del(&mut conn, key).await
    }

    async fn ttl(&self, key: &str) -> RedisResult<i64> {
        let mut conn = self.clone();
        AsyncCommands::ttl(&mut conn, key).await
    }
}
