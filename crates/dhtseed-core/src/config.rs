//! Configuration system for dhtseed.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $DHTSEED_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/dhtseed/config.toml
//!   3. ~/.config/dhtseed/config.toml

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Most peers ever handed out in one bootstrap sample.
pub const MAX_SAMPLE_SIZE: usize = 50;

/// Default number of peers handed out per bootstrap sample.
pub const DEFAULT_SAMPLE_SIZE: usize = MAX_SAMPLE_SIZE;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DhtSeedConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP endpoint binds to.
    pub listen_addr: IpAddr,
    /// TCP port for the HTTP endpoint.
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local; records are lost on restart.
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Database file for the sqlite backend.
    pub sqlite_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Max peers per bootstrap sample.
    pub sample_size: usize,
    /// User-agent strings rejected in addition to the built-in list.
    pub denied_user_agents: Vec<String>,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: IpAddr::from([0, 0, 0, 0]),
            port: 8080,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            sqlite_path: data_dir().join("peers.db"),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            denied_user_agents: Vec::new(),
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("dhtseed")
}

fn data_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".local").join("share"))
        .join("dhtseed")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },
    #[error("{key} must be between 1 and {max}, got {value}")]
    OutOfRange {
        key: &'static str,
        value: usize,
        max: usize,
    },
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl DhtSeedConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            Self::from_toml(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            DhtSeedConfig::default()
        };
        config.apply_env_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("DHTSEED_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&DhtSeedConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply DHTSEED_* overrides. `lookup` is `std::env::var` outside tests.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DHTSEED_SERVER__LISTEN_ADDR") {
            self.server.listen_addr = parse_env("DHTSEED_SERVER__LISTEN_ADDR", v)?;
        }
        if let Some(v) = lookup("DHTSEED_SERVER__PORT") {
            self.server.port = parse_env("DHTSEED_SERVER__PORT", v)?;
        }
        if let Some(v) = lookup("DHTSEED_STORE__BACKEND") {
            self.store.backend = match v.as_str() {
                "memory" => StoreBackend::Memory,
                "sqlite" => StoreBackend::Sqlite,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        var: "DHTSEED_STORE__BACKEND",
                        value: v,
                    })
                }
            };
        }
        if let Some(v) = lookup("DHTSEED_STORE__SQLITE_PATH") {
            self.store.sqlite_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("DHTSEED_REGISTRY__SAMPLE_SIZE") {
            let size: usize = parse_env("DHTSEED_REGISTRY__SAMPLE_SIZE", v.clone())?;
            if !(1..=MAX_SAMPLE_SIZE).contains(&size) {
                return Err(ConfigError::InvalidEnv {
                    var: "DHTSEED_REGISTRY__SAMPLE_SIZE",
                    value: v,
                });
            }
            self.registry.sample_size = size;
        }
        Ok(())
    }

    /// Reject values the registry cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let size = self.registry.sample_size;
        if !(1..=MAX_SAMPLE_SIZE).contains(&size) {
            return Err(ConfigError::OutOfRange {
                key: "registry.sample_size",
                value: size,
                max: MAX_SAMPLE_SIZE,
            });
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { var, value })
}
