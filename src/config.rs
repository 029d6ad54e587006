//! Process configuration, read from the environment.

use std::env;

use thiserror::Error;

use crate::handler::ItemSchema;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";
pub const DEFAULT_POOL_SIZE: usize = 16;

/// Name of the collection the service serves.
pub const ITEMS_COLLECTION: &str = "items";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Store connection string. Required.
    pub store_url: String,
    pub bind_host: String,
    pub port: u16,
    /// Maximum concurrent store calls.
    pub pool_size: usize,
    pub schema: ItemSchema,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("ITEMS_STORE_URL (or DATABASE_URL) must be set")]
    MissingStoreUrl,
    #[error("invalid PORT: {0}")]
    InvalidPort(String),
    #[error("invalid ITEMS_POOL_SIZE: {0}")]
    InvalidPoolSize(String),
    #[error("invalid ITEMS_REQUIRED_FIELDS: {0}")]
    InvalidRequiredFields(String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let store_url = var("ITEMS_STORE_URL")
            .or_else(|| var("DATABASE_URL"))
            .ok_or(ConfigError::MissingStoreUrl)?;
        let bind_host = var("ITEMS_BIND_HOST").unwrap_or_else(|| DEFAULT_BIND_HOST.to_string());
        let port = match var("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|error| ConfigError::InvalidPort(format!("{raw}: {error}")))?,
            None => DEFAULT_PORT,
        };
        let pool_size = match var("ITEMS_POOL_SIZE") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(0) => return Err(ConfigError::InvalidPoolSize("must be at least 1".into())),
                Ok(size) => size,
                Err(error) => return Err(ConfigError::InvalidPoolSize(format!("{raw}: {error}"))),
            },
            None => DEFAULT_POOL_SIZE,
        };
        let schema = match var("ITEMS_REQUIRED_FIELDS") {
            Some(raw) => ItemSchema::parse(&raw).map_err(ConfigError::InvalidRequiredFields)?,
            None => ItemSchema::default(),
        };

        Ok(Self {
            store_url,
            bind_host,
            port,
            pool_size,
            schema,
        })
    }

    /// `host:port` to bind the listener to.
    pub fn bind_addr(&self) -> String {
        if self.bind_host.contains(':') && !self.bind_host.starts_with('[') {
            format!("[{}]:{}", self.bind_host, self.port)
        } else {
            format!("{}:{}", self.bind_host, self.port)
        }
    }
}
