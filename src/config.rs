//! Process-wide configuration
//!
//! String/bool/int keyed settings read from the environment: `listen`,
//! `port`, `log`, `cache_ttl` (hours), `cache_size`, `salt` (hex bytes) and
//! `auth_delegate_url` (opaque to the core). The struct travels by reference
//! into the components that need it; there are no globals.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::{CacheConfig, DEFAULT_CACHE_SIZE, DEFAULT_CACHE_TTL};

/// Default listen address.
pub const DEFAULT_LISTEN: &str = "127.0.0.1";
/// Default LDAP listen port.
pub const DEFAULT_PORT: u16 = 3890;

// process-wide default salt, overridable through `salt`
const DEFAULT_SALT_HEX: &str = "2432622431322467316a566377314a35386e5336472e5a507270514a2e";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for '{key}'")]
    InvalidValue { key: &'static str, value: String },
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen: String,
    pub port: u16,
    pub log: String,
    pub cache_ttl: Duration,
    pub cache_size: usize,
    pub salt: Vec<u8>,
    pub auth_delegate_url: Option<String>,
    pub cache_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen: DEFAULT_LISTEN.to_string(),
            port: DEFAULT_PORT,
            log: "info".to_string(),
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_size: DEFAULT_CACHE_SIZE,
            salt: from_hex(DEFAULT_SALT_HEX).unwrap_or_default(),
            auth_delegate_url: None,
            cache_path: None,
        }
    }
}

impl Config {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Config, ConfigError> {
        let mut config = Config::default();
        if let Ok(listen) = env::var("listen") {
            config.listen = listen;
        }
        if let Ok(port) = env::var("port") {
            config.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "port",
                value: port.clone(),
            })?;
        }
        if let Ok(log) = env::var("log") {
            config.log = log;
        }
        if let Ok(hours) = env::var("cache_ttl") {
            let hours: u64 = hours.parse().map_err(|_| ConfigError::InvalidValue {
                key: "cache_ttl",
                value: hours.clone(),
            })?;
            config.cache_ttl = Duration::from_secs(hours * 60 * 60);
        }
        if let Ok(size) = env::var("cache_size") {
            config.cache_size = size.parse().map_err(|_| ConfigError::InvalidValue {
                key: "cache_size",
                value: size.clone(),
            })?;
        }
        if let Ok(salt) = env::var("salt") {
            config.salt = from_hex(&salt).ok_or(ConfigError::InvalidValue {
                key: "salt",
                value: salt.clone(),
            })?;
        }
        if let Ok(url) = env::var("auth_delegate_url") {
            config.auth_delegate_url = Some(url);
        }
        if let Ok(path) = env::var("cache_path") {
            config.cache_path = Some(PathBuf::from(path));
        }
        Ok(config)
    }

    /// The credential cache parameters derived from this configuration.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            ttl: self.cache_ttl,
            capacity: self.cache_size,
            salt: self.salt.clone(),
            path: self.cache_path.clone(),
        }
    }
}

fn from_hex(input: &str) -> Option<Vec<u8>> {
    if input.len() % 2 != 0 {
        return None;
    }
    (0..input.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(input.get(i..i + 2)?, 16).ok())
        .collect()
}
