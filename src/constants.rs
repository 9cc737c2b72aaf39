// Constants module - centralized default values for configuration
//
// Defaults shared by the settings loader, the facade and the health check.

// =============================================================================
// Connection defaults
// =============================================================================

/// Default Redis host
pub const DEFAULT_REDIS_HOST: &str = "127.0.0.1";

/// Default Redis port
pub const DEFAULT_REDIS_PORT: u16 = 6379;

/// Default Redis database index
pub const DEFAULT_REDIS_DB: u32 = 0;

/// URL scheme used when building connection URLs
pub const REDIS_URL_SCHEME: &str = "redis";

/// Default connection timeout in milliseconds (5 seconds)
pub const DEFAULT_CONNECTION_TIMEOUT_MS: u64 = 5000;

/// Default response timeout in milliseconds (2 seconds)
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 2000;

// =============================================================================
// Storage defaults
// =============================================================================

/// Default expiration applied to every write (1 day)
pub const DEFAULT_STORE_TTL_SECS: u64 = 24 * 60 * 60;

// =============================================================================
// Health check
// =============================================================================

/// Well-known key used by the round-trip self test
pub const HEALTH_CHECK_KEY: &str = "redis_auto_test";

/// Expiration of the health check key, in case the delete never lands
pub const HEALTH_CHECK_TTL_SECS: u64 = 60;
