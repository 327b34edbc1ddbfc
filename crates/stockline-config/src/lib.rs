// crates/stockline-config/src/lib.rs
// ============================================================================
// Module: Stockline Configuration
// Description: Configuration model, TOML loading, and fail-closed validation.
// Purpose: Keep deployment settings explicit and credentials out of source.
// Dependencies: serde, thiserror, toml, url
// ============================================================================

//! ## Overview
//! Stockline configuration is a TOML document validated before use. Shard
//! connection descriptors are resolved from environment variables at load
//! time (`{PREFIX}_{index}_URL`) so credentials never live in source or in
//! checked-in config files; an inline `connections` list is accepted for
//! development and validated as parseable Postgres URLs. Validation fails
//! closed with descriptive messages.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default environment variable prefix for shard connection descriptors.
const DEFAULT_CONNECTION_ENV_PREFIX: &str = "STOCKLINE_SHARD";
/// Default server bind address.
fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}
/// Default environment prefix wrapper for serde.
fn default_connection_env_prefix() -> String {
    DEFAULT_CONNECTION_ENV_PREFIX.to_string()
}
/// Default maximum pool size per shard.
const fn default_max_connections() -> u32 {
    16
}
/// Default minimum idle connections per shard.
const fn default_min_idle() -> u32 {
    0
}
/// Default checkout timeout in milliseconds.
const fn default_checkout_timeout_ms() -> u64 {
    5_000
}
/// Default connect timeout in milliseconds.
const fn default_connect_timeout_ms() -> u64 {
    5_000
}
/// Default statement timeout in milliseconds.
const fn default_statement_timeout_ms() -> u64 {
    30_000
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("config io error: {0}")]
    Io(String),
    /// Configuration file could not be parsed.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Configuration failed validation.
    #[error("invalid config: {0}")]
    Invalid(String),
    /// Required environment variable is absent.
    #[error("missing environment variable: {0}")]
    MissingEnv(String),
}

// ============================================================================
// SECTION: Model
// ============================================================================

/// Server settings.
///
/// # Invariants
/// - `bind` must parse as a socket address.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP listener.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Per-shard connection pool settings.
///
/// # Invariants
/// - All timeouts are interpreted as milliseconds and must be greater than
///   zero.
/// - `min_idle` never exceeds `max_connections`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PoolConfig {
    /// Maximum pool size per shard.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum idle connections per shard; zero defers connecting until the
    /// first checkout.
    #[serde(default = "default_min_idle")]
    pub min_idle: u32,
    /// Bounded wait for a connection checkout in milliseconds.
    #[serde(default = "default_checkout_timeout_ms")]
    pub checkout_timeout_ms: u64,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Statement timeout in milliseconds.
    #[serde(default = "default_statement_timeout_ms")]
    pub statement_timeout_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            min_idle: default_min_idle(),
            checkout_timeout_ms: default_checkout_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            statement_timeout_ms: default_statement_timeout_ms(),
        }
    }
}

/// Shard storage settings.
///
/// # Invariants
/// - `shard_count` is fixed for the lifetime of a deployment; changing it
///   invalidates the tenant-to-shard mapping.
/// - `connections`, when non-empty, has exactly `shard_count` entries.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Number of storage shards.
    pub shard_count: usize,
    /// Environment variable prefix for shard descriptors
    /// (`{PREFIX}_{index}_URL`).
    #[serde(default = "default_connection_env_prefix")]
    pub connection_env_prefix: String,
    /// Inline connection descriptors for development; resolved from the
    /// environment when empty.
    #[serde(default)]
    pub connections: Vec<String>,
    /// Pool settings applied to every shard.
    #[serde(default)]
    pub pool: PoolConfig,
}

/// Top-level Stockline configuration.
///
/// # Invariants
/// - `validate` must pass before the configuration is used.
#[derive(Debug, Clone, Deserialize)]
pub struct StocklineConfig {
    /// Server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Shard storage settings.
    pub storage: StorageConfig,
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl StocklineConfig {
    /// Loads configuration from a TOML file without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
        Self::from_toml(&raw)
    }

    /// Parses configuration from a TOML string without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the document cannot be parsed.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Validates the configuration, failing closed on the first defect.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] with a descriptive message.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "server bind must be a socket address: {}",
                self.server.bind
            )));
        }
        self.storage.validate()
    }
}

impl StorageConfig {
    /// Validates the storage settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] with a descriptive message.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shard_count == 0 {
            return Err(ConfigError::Invalid("shard count must be at least 1".to_string()));
        }
        if self.connection_env_prefix.is_empty() {
            return Err(ConfigError::Invalid(
                "connection env prefix must not be empty".to_string(),
            ));
        }
        if !self.connections.is_empty() {
            if self.connections.len() != self.shard_count {
                return Err(ConfigError::Invalid(format!(
                    "connection list length must equal shard count: {} != {}",
                    self.connections.len(),
                    self.shard_count
                )));
            }
            for (index, descriptor) in self.connections.iter().enumerate() {
                validate_descriptor(index, descriptor)?;
            }
        }
        self.pool.validate()
    }

    /// Resolves one connection descriptor per shard.
    ///
    /// Inline descriptors take precedence; otherwise each shard reads
    /// `{prefix}_{index}_URL` from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnv`] when a shard's variable is absent
    /// and [`ConfigError::Invalid`] when a resolved descriptor is malformed.
    pub fn resolve_connections(&self) -> Result<Vec<String>, ConfigError> {
        if !self.connections.is_empty() {
            return Ok(self.connections.clone());
        }
        let mut resolved = Vec::with_capacity(self.shard_count);
        for index in 0..self.shard_count {
            let name = format!("{}_{}_URL", self.connection_env_prefix, index);
            let descriptor =
                env::var(&name).map_err(|_| ConfigError::MissingEnv(name.clone()))?;
            validate_descriptor(index, &descriptor)?;
            resolved.push(descriptor);
        }
        Ok(resolved)
    }
}

impl PoolConfig {
    /// Validates the pool settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] with a descriptive message.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "pool max_connections must be at least 1".to_string(),
            ));
        }
        if self.min_idle > self.max_connections {
            return Err(ConfigError::Invalid(format!(
                "pool min_idle must not exceed max_connections: {} > {}",
                self.min_idle, self.max_connections
            )));
        }
        if self.checkout_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "pool checkout_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "pool connect_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.statement_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "pool statement_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Validates a single shard connection descriptor.
fn validate_descriptor(index: usize, descriptor: &str) -> Result<(), ConfigError> {
    let parsed = Url::parse(descriptor).map_err(|err| {
        ConfigError::Invalid(format!("shard {index} descriptor is not a valid url: {err}"))
    })?;
    if parsed.scheme() != "postgres" && parsed.scheme() != "postgresql" {
        return Err(ConfigError::Invalid(format!(
            "shard {index} descriptor must use a postgres scheme, got {}",
            parsed.scheme()
        )));
    }
    Ok(())
}
