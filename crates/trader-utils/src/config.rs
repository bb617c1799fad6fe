//! Environment-backed configuration helpers
//!
//! Configuration is read once at process start. `Environment` snapshots the
//! process environment (after loading an optional `.env` file) so the rest of
//! the program never touches `std::env` directly.

use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while reading configuration values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    /// A key is set but cannot be parsed
    #[error("invalid value for {key}: {detail}")]
    Invalid { key: String, detail: String },
}

/// Snapshot of configuration key/value pairs
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Load `.env` (if present) and snapshot the process environment
    pub fn load() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("Loaded environment file {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
        }
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build from explicit pairs (tests, embedding)
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Get a non-empty value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// First non-empty value among several aliases
    pub fn get_any(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.get(k))
    }

    /// Boolean flag: `1`, `true`, `yes`, `on` (case-insensitive) are true
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| {
            matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
        })
    }

    /// Parse an optional value with `FromStr`
    pub fn parse<T>(&self, key: &str) -> Result<Option<T>, EnvError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|raw| {
                raw.parse::<T>().map_err(|e| EnvError::Invalid {
                    key: key.to_string(),
                    detail: e.to_string(),
                })
            })
            .transpose()
    }
}
