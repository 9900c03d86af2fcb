//! Configuration management for the server.

use delta_engine::Limits;
use std::env;
use std::str::FromStr;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Id of the account this server hosts
    pub account_id: String,
    /// Request limits handed to the engine
    pub limits: Limits,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let account_id = lookup("ACCOUNT_ID").unwrap_or_else(|| "default".to_string());
        if account_id.is_empty() {
            return Err(ConfigError::EmptyAccountId);
        }

        let defaults = Limits::default();
        let limits = Limits {
            max_objects_in_get: limit(&lookup, "MAX_OBJECTS_IN_GET", defaults.max_objects_in_get)?,
            max_objects_in_set: limit(&lookup, "MAX_OBJECTS_IN_SET", defaults.max_objects_in_set)?,
            max_changes: limit(&lookup, "MAX_CHANGES", defaults.max_changes)?,
        };

        Ok(Self {
            host,
            port,
            account_id,
            limits,
        })
    }
}

fn limit(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: usize,
) -> Result<usize, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match usize::from_str(raw.trim()) {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ConfigError::InvalidLimit(key)),
        },
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid PORT value")]
    InvalidPort,

    #[error("ACCOUNT_ID must not be empty")]
    EmptyAccountId,

    #[error("Invalid {0} value, expected a positive integer")]
    InvalidLimit(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.account_id, "default");
        assert_eq!(config.limits, Limits::default());
    }

    #[test]
    fn overrides() {
        let config = load(&[
            ("PORT", "8080"),
            ("ACCOUNT_ID", "acc-1"),
            ("MAX_OBJECTS_IN_GET", "10"),
            ("MAX_CHANGES", "64"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.account_id, "acc-1");
        assert_eq!(config.limits.max_objects_in_get, 10);
        assert_eq!(config.limits.max_objects_in_set, 500);
        assert_eq!(config.limits.max_changes, 64);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(load(&[("PORT", "x")]), Err(ConfigError::InvalidPort)));
        assert!(matches!(
            load(&[("MAX_CHANGES", "0")]),
            Err(ConfigError::InvalidLimit("MAX_CHANGES"))
        ));
        assert!(matches!(
            load(&[("MAX_OBJECTS_IN_SET", "-3")]),
            Err(ConfigError::InvalidLimit("MAX_OBJECTS_IN_SET"))
        ));
        assert!(matches!(load(&[("ACCOUNT_ID", "")]), Err(ConfigError::EmptyAccountId)));
    }
}
