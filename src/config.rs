//! Configuration Management
//!
//! Client configuration is fixed at construction time. It can be read from
//! `<config dir>/hci/config.json`, then overridden by environment variables
//! and finally by explicit values from the caller.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default pause between two task polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default bound on task poll iterations
pub const DEFAULT_MAX_ATTEMPTS: u32 = 120;

/// Default timeout for a single HTTP request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Environment variable overrides
pub const ENV_API_URL: &str = "HCI_API_URL";
pub const ENV_API_KEY: &str = "HCI_API_KEY";
pub const ENV_POLL_INTERVAL_MS: &str = "HCI_POLL_INTERVAL_MS";
pub const ENV_MAX_ATTEMPTS: &str = "HCI_MAX_ATTEMPTS";

/// Immutable client configuration
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the API, e.g. `https://api.example.com/v1`
    #[serde(default)]
    pub base_endpoint: String,
    /// Static credential sent with every request
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_poll_interval", with = "duration_ms")]
    pub poll_interval: Duration,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_request_timeout", with = "duration_secs")]
    pub request_timeout: Duration,
}

fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_endpoint: String::new(),
            api_key: String::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

// Security: never print the API key
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_endpoint", &self.base_endpoint)
            .field("api_key", &"<redacted>")
            .field("poll_interval", &self.poll_interval)
            .field("max_attempts", &self.max_attempts)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(base_endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_endpoint: base_endpoint.into(),
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("hci").join("config.json"))
    }

    /// Load configuration from disk, then apply environment overrides
    pub fn load() -> Result<Self> {
        let from_file = match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        from_file.apply_env(|key| std::env::var(key).ok())
    }

    /// Load configuration from a specific JSON file
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))
    }

    /// Apply overrides from a variable lookup (the process environment in practice)
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.base_endpoint = url;
        }
        if let Some(key) = lookup(ENV_API_KEY) {
            self.api_key = key;
        }
        if let Some(ms) = lookup(ENV_POLL_INTERVAL_MS) {
            let ms: u64 = ms
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("{} must be an integer", ENV_POLL_INTERVAL_MS)))?;
            self.poll_interval = Duration::from_millis(ms);
        }
        if let Some(attempts) = lookup(ENV_MAX_ATTEMPTS) {
            self.max_attempts = attempts
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("{} must be an integer", ENV_MAX_ATTEMPTS)))?;
        }
        Ok(self)
    }

    /// Check the configuration can drive a client
    pub fn validate(&self) -> Result<()> {
        self.validate_transport()?;
        if self.max_attempts == 0 {
            return Err(Error::Config("max attempts must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Check only the settings the HTTP client needs (endpoint and key)
    pub fn validate_transport(&self) -> Result<()> {
        if self.base_endpoint.trim().is_empty() {
            return Err(Error::Config("base endpoint is not set".to_string()));
        }
        url::Url::parse(&self.base_endpoint)?;
        if self.api_key.is_empty() {
            return Err(Error::Config("API key is not set".to_string()));
        }
        Ok(())
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("cannot create {}: {}", parent.display(), e)))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)
            .map_err(|e| Error::Config(format!("cannot write {}: {}", path.display(), e)))?;

        Ok(())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_applied_to_partial_file() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_endpoint":"https://api.test","api_key":"k"}"#).unwrap();
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(config.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn test_poll_interval_read_as_millis() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"poll_interval":250,"max_attempts":3}"#).unwrap();
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.max_attempts, 3);
    }

    #[test]
    fn test_env_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            (ENV_API_URL, "https://override.test"),
            (ENV_API_KEY, "env-key"),
            (ENV_POLL_INTERVAL_MS, "10"),
            (ENV_MAX_ATTEMPTS, "7"),
        ]
        .into_iter()
        .collect();

        let config = ClientConfig::new("https://file.test", "file-key")
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.base_endpoint, "https://override.test");
        assert_eq!(config.api_key, "env-key");
        assert_eq!(config.poll_interval, Duration::from_millis(10));
        assert_eq!(config.max_attempts, 7);
    }

    #[test]
    fn test_env_rejects_non_numeric_attempts() {
        let result = ClientConfig::default().apply_env(|k| {
            (k == ENV_MAX_ATTEMPTS).then(|| "many".to_string())
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate() {
        assert!(ClientConfig::new("https://api.test", "key").validate().is_ok());
        assert!(ClientConfig::new("", "key").validate().is_err());
        assert!(ClientConfig::new("not a url", "key").validate().is_err());
        assert!(ClientConfig::new("https://api.test", "").validate().is_err());
        assert!(ClientConfig::new("https://api.test", "key")
            .with_max_attempts(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_transport_checks_ignore_poll_budget() {
        let config = ClientConfig::new("https://api.test", "key").with_max_attempts(0);
        assert!(config.validate_transport().is_ok());
        assert!(ClientConfig::new("", "key").validate_transport().is_err());
        assert!(ClientConfig::new("https://api.test", "").validate_transport().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("hci-config-{}.json", std::process::id()));
        let config = ClientConfig::new("https://api.test", "key").with_max_attempts(9);
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = ClientConfig::load_from(&path);
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.unwrap(), config);
        assert!(matches!(
            ClientConfig::load_from(std::path::Path::new("/nonexistent/hci.json")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ClientConfig::new("https://api.test", "super-secret");
        assert!(!format!("{:?}", config).contains("super-secret"));
    }
}
