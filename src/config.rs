use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// JSON array of natural keys seeding the in-memory store's mappings.
    pub mappings_file: Option<PathBuf>,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = match lookup("COMMISSION_STORE").as_deref() {
            None | Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "COMMISSION_STORE",
                    value: other.to_string(),
                })
            }
        };

        let database_url = lookup("DATABASE_URL");
        if store == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        Ok(Self {
            store,
            database_url,
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            mappings_file: lookup("COMMISSION_MAPPINGS").map(PathBuf::from),
            jwt_secret,
            host: parse_or(&lookup, "HOST", DEFAULT_HOST)?,
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_for_postgres() {
        let config = config(&[("DATABASE_URL", "postgres://localhost/c"), ("JWT_SECRET", "s")]).unwrap();
        assert_eq!(config.store, StoreBackend::Postgres);
        assert_eq!(config.host.to_string(), "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_connections, 5);
    }

    #[test]
    fn postgres_requires_database_url() {
        assert!(matches!(
            config(&[("JWT_SECRET", "s")]),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));
    }

    #[test]
    fn memory_store_needs_no_database() {
        let config = config(&[
            ("COMMISSION_STORE", "memory"),
            ("JWT_SECRET", "s"),
            ("COMMISSION_MAPPINGS", "mappings.json"),
        ])
        .unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.mappings_file, Some(PathBuf::from("mappings.json")));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config(&[("COMMISSION_STORE", "memory"), ("JWT_SECRET", "s"), ("PORT", "http")]),
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));
        assert!(matches!(
            config(&[("COMMISSION_STORE", "mysql"), ("JWT_SECRET", "s")]),
            Err(ConfigError::Invalid { name: "COMMISSION_STORE", .. })
        ));
        assert!(matches!(
            config(&[("COMMISSION_STORE", "memory")]),
            Err(ConfigError::Missing("JWT_SECRET"))
        ));
    }
}
