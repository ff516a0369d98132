//! Launcher configuration read from the environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8003;

/// The server always listens on every interface.
pub const BIND_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub port: u16,
    pub api_key: Option<String>,
    /// SQLite file for persistent storage; in-memory storage when unset.
    pub db_path: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            api_key: None,
            db_path: None,
        }
    }
}

impl ApiConfig {
    /// Read `PORT`, `MEMORY_API_KEY` and `MEMORY_DB_PATH`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|source| ConfigError::InvalidPort { value: raw, source })?,
            None => DEFAULT_PORT,
        };
        let api_key = lookup("MEMORY_API_KEY").filter(|k| !k.trim().is_empty());
        let db_path = lookup("MEMORY_DB_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        Ok(Self {
            port,
            api_key,
            db_path,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(BIND_HOST, self.port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PORT must be an integer in 0..=65535, got {value:?}")]
    InvalidPort {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn port_defaults_to_8003() {
        let cfg = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.port, 8003);
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8003".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg, ApiConfig::default());
    }

    #[test]
    fn port_from_env() {
        let cfg = ApiConfig::from_lookup(lookup(&[("PORT", "9999")])).unwrap();
        assert_eq!(cfg.port, 9999);
        assert_eq!(cfg.bind_addr().to_string(), "0.0.0.0:9999");
    }

    #[test]
    fn bad_port_is_an_error() {
        for raw in ["abc", "", "70000", "-1"] {
            let err = ApiConfig::from_lookup(lookup(&[("PORT", raw)])).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidPort { ref value, .. } if value == raw));
        }
    }

    #[test]
    fn blank_key_and_db_path_are_ignored() {
        let cfg = ApiConfig::from_lookup(lookup(&[
            ("MEMORY_API_KEY", "  "),
            ("MEMORY_DB_PATH", ""),
        ]))
        .unwrap();
        assert_eq!(cfg.api_key, None);
        assert_eq!(cfg.db_path, None);

        let cfg = ApiConfig::from_lookup(lookup(&[
            ("MEMORY_API_KEY", "secret"),
            ("MEMORY_DB_PATH", "/tmp/memories.db"),
        ]))
        .unwrap();
        assert_eq!(cfg.api_key.as_deref(), Some("secret"));
        assert_eq!(cfg.db_path, Some(PathBuf::from("/tmp/memories.db")));
    }
}
