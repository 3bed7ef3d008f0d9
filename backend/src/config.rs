//! Server configuration from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `ALCHEMIST_HOST` | `0.0.0.0` |
//! | `ALCHEMIST_PORT` | `3000` |
//! | `ALCHEMIST_MAX_UPLOAD_BYTES` | 50 MiB |

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.clone(),
            message: e.to_string(),
        }),
    }
}

impl ServerConfig {
    /// Read the process environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            host: parse_var(&lookup, "ALCHEMIST_HOST", defaults.host)?,
            port: parse_var(&lookup, "ALCHEMIST_PORT", defaults.port)?,
            max_upload_bytes: parse_var(&lookup, "ALCHEMIST_MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
        };

        if config.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ALCHEMIST_MAX_UPLOAD_BYTES".to_string(),
                value: "0".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(config)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
