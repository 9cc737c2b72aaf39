// Redis Async Client Library
//
// JSON convenience verbs over a Redis string store.

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod operator;
pub mod store;
pub mod value;

pub use client::{check_redis_connection, AsyncRedisClient};
pub use config::RedisSettings;
pub use error::{ClientError, ClientResult, ErrorKind};
pub use store::{KeyValueStore, MemoryStore};
pub use value::StoredValue;
