// Configuration module

use std::path::Path;
use std::time::Duration;

use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::Client;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CONNECTION_TIMEOUT_MS, DEFAULT_REDIS_DB, DEFAULT_REDIS_HOST, DEFAULT_REDIS_PORT,
    DEFAULT_RESPONSE_TIMEOUT_MS, DEFAULT_STORE_TTL_SECS, REDIS_URL_SCHEME,
};
use crate::error::{ClientError, ClientResult};

/// Redis connection settings
///
/// Holds the address of the store and the defaults threaded into the client.
/// Every field has a default, so an empty YAML document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisSettings {
    /// Redis host (default: 127.0.0.1)
    #[serde(default = "default_redis_host")]
    pub host: String,

    /// Redis port (default: 6379)
    #[serde(default = "default_redis_port")]
    pub port: u16,

    /// Redis database index (default: 0)
    #[serde(default = "default_redis_db")]
    pub db: u32,

    /// Optional password for Redis authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Expiration applied by writes that don't pass one explicitly (default: 1 day)
    #[serde(default = "default_ttl_seconds")]
    pub default_ttl_seconds: u64,

    /// Connection timeout in milliseconds (default: 5000)
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// Response timeout in milliseconds (default: 2000)
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            host: default_redis_host(),
            port: default_redis_port(),
            db: default_redis_db(),
            password: None,
            default_ttl_seconds: default_ttl_seconds(),
            connection_timeout_ms: default_connection_timeout_ms(),
            response_timeout_ms: default_response_timeout_ms(),
        }
    }
}

fn default_redis_host() -> String {
    DEFAULT_REDIS_HOST.to_string()
}

fn default_redis_port() -> u16 {
    DEFAULT_REDIS_PORT
}

fn default_redis_db() -> u32 {
    DEFAULT_REDIS_DB
}

fn default_ttl_seconds() -> u64 {
    DEFAULT_STORE_TTL_SECS
}

fn default_connection_timeout_ms() -> u64 {
    DEFAULT_CONNECTION_TIMEOUT_MS
}

fn default_response_timeout_ms() -> u64 {
    DEFAULT_RESPONSE_TIMEOUT_MS
}

impl RedisSettings {
    /// Parses settings from YAML, replacing `${VAR_NAME}` with environment values
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error if a referenced variable is unset, the
    /// YAML is malformed, or the resulting settings fail validation.
    pub fn from_yaml_with_env(yaml: &str) -> ClientResult<Self> {
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| ClientError::configuration(e.to_string()))?;

        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                ClientError::configuration(format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                ))
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        let settings: RedisSettings = serde_yaml::from_str(&substituted)
            .map_err(|e| ClientError::configuration(format!("Invalid settings: {}", e)))?;
        settings.validate()?;

        Ok(settings)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> ClientResult<Self> {
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            ClientError::configuration(format!("Failed to read config file: {}", e))
        })?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.host.is_empty() {
            return Err(ClientError::configuration("host cannot be empty"));
        }
        if self.port == 0 {
            return Err(ClientError::configuration("port cannot be 0"));
        }
        if self.default_ttl_seconds == 0 {
            return Err(ClientError::configuration(
                "default_ttl_seconds must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Full connection URL: `redis://[:password@]host:port/db`
    pub fn url(&self) -> String {
        match &self.password {
            Some(password) => format!(
                "{}://:{}@{}:{}/{}",
                REDIS_URL_SCHEME, password, self.host, self.port, self.db
            ),
            None => format!(
                "{}://{}:{}/{}",
                REDIS_URL_SCHEME, self.host, self.port, self.db
            ),
        }
    }

    /// Builds a multiplexed, auto-reconnecting connection handle
    ///
    /// Uses `url` when given and non-empty, otherwise [`RedisSettings::url`].
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error if the URL is invalid, or a
    /// `Connectivity` error if the server cannot be reached.
    pub async fn make_pool(&self, url: Option<&str>) -> ClientResult<ConnectionManager> {
        let url = match url {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => self.url(),
        };

        let client = Client::open(url.as_str())
            .map_err(|e| ClientError::configuration(format!("Invalid Redis URL: {}", e)))?;

        let config = ConnectionManagerConfig::new()
            .set_connection_timeout(Some(Duration::from_millis(self.connection_timeout_ms)))
            .set_response_timeout(Some(Duration::from_millis(self.response_timeout_ms)));

        let connection = ConnectionManager::new_with_config(client, config).await?;
        tracing::debug!(host = %self.host, port = self.port, db = self.db, "Redis pool created");

        Ok(connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_can_create_settings_from_yaml() {
        let yaml = r#"
host: "redis.internal"
port: 6380
db: 2
password: "secret"
default_ttl_seconds: 120
connection_timeout_ms: 3000
response_timeout_ms: 1000
"#;

        let settings = RedisSettings::from_yaml_with_env(yaml).unwrap();
        assert_eq!(settings.host, "redis.internal");
        assert_eq!(settings.port, 6380);
        assert_eq!(settings.db, 2);
        assert_eq!(settings.password, Some("secret".to_string()));
        assert_eq!(settings.default_ttl_seconds, 120);
        assert_eq!(settings.connection_timeout_ms, 3000);
        assert_eq!(settings.response_timeout_ms, 1000);
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let settings = RedisSettings::from_yaml_with_env("{}").unwrap();
        assert_eq!(settings, RedisSettings::default());
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.port, 6379);
        assert_eq!(settings.db, 0);
        assert_eq!(settings.default_ttl_seconds, DEFAULT_STORE_TTL_SECS);
    }

    #[test]
    fn test_url_has_scheme_host_port_db() {
        let settings = RedisSettings::default();
        assert_eq!(settings.url(), "redis://127.0.0.1:6379/0");

        let settings = RedisSettings {
            host: "cache".to_string(),
            port: 7000,
            db: 3,
            ..Default::default()
        };
        assert_eq!(settings.url(), "redis://cache:7000/3");
    }

    #[test]
    fn test_url_includes_password_when_set() {
        let settings = RedisSettings {
            password: Some("hunter2".to_string()),
            ..Default::default()
        };
        assert_eq!(settings.url(), "redis://:hunter2@127.0.0.1:6379/0");
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("REDIS_ASYNC_CLIENT_TEST_HOST", "from-env");
        let yaml = r#"host: "${REDIS_ASYNC_CLIENT_TEST_HOST}""#;

        let settings = RedisSettings::from_yaml_with_env(yaml).unwrap();
        assert_eq!(settings.host, "from-env");
    }

    #[test]
    fn test_missing_env_var_is_rejected() {
        let yaml = r#"host: "${REDIS_ASYNC_CLIENT_NONEXISTENT_VAR}""#;

        let err = RedisSettings::from_yaml_with_env(yaml).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err
            .message()
            .contains("Environment variable 'REDIS_ASYNC_CLIENT_NONEXISTENT_VAR'"));
    }

    #[test]
    fn test_zero_ttl_fails_validation() {
        let err = RedisSettings::from_yaml_with_env("default_ttl_seconds: 0").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_empty_host_fails_validation() {
        let settings = RedisSettings {
            host: String::new(),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_from_file_reports_missing_file() {
        let err = RedisSettings::from_file("/nonexistent/redis.yaml").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.message().contains("Failed to read config file"));
    }

    #[test]
    fn test_from_file_reads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("redis.yaml");
        std::fs::write(&path, "port: 6390\ndb: 1\n").unwrap();

        let settings = RedisSettings::from_file(&path).unwrap();
        assert_eq!(settings.port, 6390);
        assert_eq!(settings.db, 1);
    }

    #[tokio::test]
    async fn test_make_pool_rejects_invalid_url() {
        let settings = RedisSettings::default();
        let err = settings.make_pool(Some("not-a-url")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
