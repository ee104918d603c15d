//! Configuration management
//!
//! Configuration is read from the process environment after loading an
//! optional `.env` file. Every setting has a default; values that are present
//! but unparseable abort startup instead of silently falling back.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::profile::{ExpansionDepth, MAX_EXPANSION_DEPTH};

// ============================================================================
// Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default database URL. `mode=rwc` creates the file on first start.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://asnmap.db?mode=rwc";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default attempts for a write that hits a busy or locked database.
pub const DEFAULT_WRITE_RETRIES: u32 = 5;

/// Default base directory for ingestion paths.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Default cap on detailed record issues kept per ingestion report.
pub const DEFAULT_MAX_REPORTED_ERRORS: usize = 100;

/// Default number of finished ingestion jobs kept for polling.
pub const DEFAULT_MAX_RETAINED_JOBS: usize = 100;

/// Default CORS allowed origin for local development.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub ingest: IngestConfig,
    pub profile: ProfileConfig,
    pub cors: CorsConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Which record store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => Err(anyhow::anyhow!("Invalid store backend: {other} (expected sqlite or memory)")),
        }
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Sqlite => f.write_str("sqlite"),
            StoreBackend::Memory => f.write_str("memory"),
        }
    }
}

/// Record store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
    pub write_retries: u32,
}

/// Ingestion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Paths submitted over HTTP must resolve inside this directory
    pub data_dir: PathBuf,
    pub max_reported_errors: usize,
    /// Finished jobs beyond this count are dropped, oldest first
    pub max_retained_jobs: usize,
}

/// Default expansion bounds for profile lookups
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub sibling_depth: u8,
    pub customer_depth: u8,
    pub provider_depth: u8,
}

impl ProfileConfig {
    pub fn expansion_depth(&self) -> ExpansionDepth {
        ExpansionDepth {
            siblings: self.sibling_depth,
            customers: self.customer_depth,
            providers: self.provider_depth,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

impl Config {
    /// Load configuration from `.env` and the process environment
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let profile_defaults = defaults.profile.expansion_depth();

        let config = Config {
            server: ServerConfig {
                host: lookup("ASNMAP_HOST").unwrap_or(defaults.server.host),
                port: parse_var(&lookup, "ASNMAP_PORT", DEFAULT_SERVER_PORT)?,
                shutdown_timeout_secs: parse_var(
                    &lookup,
                    "ASNMAP_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                )?,
            },
            store: StoreConfig {
                backend: parse_var(&lookup, "ASNMAP_STORE", StoreBackend::Sqlite)?,
                url: lookup("DATABASE_URL").unwrap_or(defaults.store.url),
                max_connections: parse_var(
                    &lookup,
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                )?,
                connect_timeout_secs: parse_var(
                    &lookup,
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                )?,
                write_retries: parse_var(&lookup, "ASNMAP_WRITE_RETRIES", DEFAULT_WRITE_RETRIES)?,
            },
            ingest: IngestConfig {
                data_dir: lookup("ASNMAP_DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.ingest.data_dir),
                max_reported_errors: parse_var(
                    &lookup,
                    "ASNMAP_MAX_REPORTED_ERRORS",
                    DEFAULT_MAX_REPORTED_ERRORS,
                )?,
                max_retained_jobs: parse_var(
                    &lookup,
                    "ASNMAP_MAX_RETAINED_JOBS",
                    DEFAULT_MAX_RETAINED_JOBS,
                )?,
            },
            profile: ProfileConfig {
                sibling_depth: parse_var(&lookup, "ASNMAP_SIBLING_DEPTH", profile_defaults.siblings)?,
                customer_depth: parse_var(
                    &lookup,
                    "ASNMAP_CUSTOMER_DEPTH",
                    profile_defaults.customers,
                )?,
                provider_depth: parse_var(
                    &lookup,
                    "ASNMAP_PROVIDER_DEPTH",
                    profile_defaults.providers,
                )?,
            },
            cors: CorsConfig {
                allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|| DEFAULT_CORS_ALLOWED_ORIGIN.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                allow_credentials: parse_var(&lookup, "CORS_ALLOW_CREDENTIALS", true)?,
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.store.backend == StoreBackend::Sqlite && self.store.url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL cannot be empty when ASNMAP_STORE=sqlite");
        }

        if self.store.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.store.write_retries == 0 {
            anyhow::bail!("ASNMAP_WRITE_RETRIES must be at least 1");
        }

        for (name, depth) in [
            ("ASNMAP_SIBLING_DEPTH", self.profile.sibling_depth),
            ("ASNMAP_CUSTOMER_DEPTH", self.profile.customer_depth),
            ("ASNMAP_PROVIDER_DEPTH", self.profile.provider_depth),
        ] {
            if depth > MAX_EXPANSION_DEPTH {
                anyhow::bail!("{name} ({depth}) cannot exceed {MAX_EXPANSION_DEPTH}");
            }
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        let depth = ExpansionDepth::default();
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            store: StoreConfig {
                backend: StoreBackend::Sqlite,
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                write_retries: DEFAULT_WRITE_RETRIES,
            },
            ingest: IngestConfig {
                data_dir: PathBuf::from(DEFAULT_DATA_DIR),
                max_reported_errors: DEFAULT_MAX_REPORTED_ERRORS,
                max_retained_jobs: DEFAULT_MAX_RETAINED_JOBS,
            },
            profile: ProfileConfig {
                sibling_depth: depth.siblings,
                customer_depth: depth.customers,
                provider_depth: depth.providers,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: true,
            },
        }
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Invalid value for {name}: {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_when_environment_empty() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.server.port, DEFAULT_SERVER_PORT);
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.store.url, DEFAULT_DATABASE_URL);
        assert_eq!(config.ingest.max_reported_errors, 100);
        assert_eq!(config.ingest.max_retained_jobs, DEFAULT_MAX_RETAINED_JOBS);
        assert_eq!(config.profile.expansion_depth(), ExpansionDepth::default());
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = from_pairs(&[
            ("ASNMAP_PORT", "9001"),
            ("ASNMAP_STORE", "memory"),
            ("ASNMAP_DATA_DIR", "/srv/asnmap"),
            ("ASNMAP_PROVIDER_DEPTH", "3"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example"),
        ])
        .unwrap();

        assert_eq!(config.server.port, 9001);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.ingest.data_dir, PathBuf::from("/srv/asnmap"));
        assert_eq!(config.profile.provider_depth, 3);
        assert_eq!(config.cors.allowed_origins.len(), 2);
    }

    #[test]
    fn test_unparseable_value_is_an_error() {
        let err = from_pairs(&[("ASNMAP_PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("ASNMAP_PORT"));
    }

    #[test]
    fn test_depth_above_bound_rejected() {
        assert!(from_pairs(&[("ASNMAP_SIBLING_DEPTH", "9")]).is_err());
    }

    #[test]
    fn test_zero_retries_rejected() {
        assert!(from_pairs(&[("ASNMAP_WRITE_RETRIES", "0")]).is_err());
    }
}
