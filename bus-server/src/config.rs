//! Server configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default bind address.
const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 3000);

/// Default static assets directory.
const DEFAULT_STATIC_DIR: &str = "static";

/// Default station cache TTL in seconds.
const DEFAULT_STATION_CACHE_TTL_SECS: u64 = 60;

/// Errors in the environment configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable has a value that cannot be parsed
    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// One of a pair of variables that must be set together is missing
    #[error("{present} is set but {missing} is not")]
    Incomplete {
        present: &'static str,
        missing: &'static str,
    },
}

/// Where timetable data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// Hosted database over its REST API.
    Rest { url: String, api_key: String },
    /// In-process store, optionally seeded from a JSON file.
    Memory { seed_file: Option<PathBuf> },
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub static_dir: PathBuf,
    pub store: StoreConfig,
    pub enforce_direction: bool,
    pub station_cache_ttl: Duration,
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, treating blank values as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bind_addr = match get("BIND_ADDR") {
            Some(value) => value.trim().parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::Invalid {
                    name: "BIND_ADDR",
                    value,
                    reason: e.to_string(),
                }
            })?,
            None => SocketAddr::from(DEFAULT_BIND_ADDR),
        };

        let static_dir = get("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));

        let store = match (get("DATABASE_REST_URL"), get("DATABASE_API_KEY")) {
            (Some(url), Some(api_key)) => StoreConfig::Rest { url, api_key },
            (Some(_), None) => {
                return Err(ConfigError::Incomplete {
                    present: "DATABASE_REST_URL",
                    missing: "DATABASE_API_KEY",
                });
            }
            (None, Some(_)) => {
                return Err(ConfigError::Incomplete {
                    present: "DATABASE_API_KEY",
                    missing: "DATABASE_REST_URL",
                });
            }
            (None, None) => StoreConfig::Memory {
                seed_file: get("SEED_FILE").map(PathBuf::from),
            },
        };

        let enforce_direction = match get("SEARCH_ENFORCE_DIRECTION") {
            Some(value) => parse_bool("SEARCH_ENFORCE_DIRECTION", value)?,
            None => false,
        };

        let ttl_secs = match get("STATION_CACHE_TTL_SECS") {
            Some(value) => value.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                name: "STATION_CACHE_TTL_SECS",
                value,
                reason: e.to_string(),
            })?,
            None => DEFAULT_STATION_CACHE_TTL_SECS,
        };

        Ok(Self {
            bind_addr,
            static_dir,
            store,
            enforce_direction,
            station_cache_ttl: Duration::from_secs(ttl_secs),
        })
    }
}

fn parse_bool(name: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value,
            reason: "expected true or false".to_string(),
        }),
    }
}
