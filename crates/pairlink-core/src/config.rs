//! Configuration system for pairlink.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $PAIRLINK_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/pairlink/config.toml
//!   3. ~/.config/pairlink/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub network: NetworkConfig,
    pub routing: RoutingConfig,
    pub pairing: PairingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address the signaling endpoint binds to.
    pub bind_addr: String,
    /// Signaling port. `PORT` in the environment wins over the file.
    pub port: u16,
    /// Admin API port, always bound to loopback.
    pub api_port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub strategy: RoutingStrategy,
    pub on_reregister: ReregisterPolicy,
    /// Frames buffered per connection before new frames are dropped.
    pub outbound_queue: usize,
}

/// How a signal's destination is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingStrategy {
    /// An explicit `to` field wins; otherwise the pairing table decides.
    #[default]
    Addressed,
    /// Only the pairing table decides; `to` is ignored.
    Paired,
}

/// What happens to a connection whose identity is claimed by a newer one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReregisterPolicy {
    /// Overwrite the registry entry, leave the old connection open.
    #[default]
    Keep,
    /// Overwrite the registry entry and close the old connection.
    Close,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
    pub pairs: Vec<PairEntry>,
}

/// One device/console pair. The relation is symmetric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairEntry {
    pub device: String,
    pub console: String,
}

impl PairEntry {
    pub fn new(device: impl Into<String>, console: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            console: console.into(),
        }
    }
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 3000,
            api_port: 3001,
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            strategy: RoutingStrategy::default(),
            on_reregister: ReregisterPolicy::default(),
            outbound_queue: 64,
        }
    }
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            pairs: vec![
                PairEntry::new("poopush", "poopush_controller"),
                PairEntry::new("poopelle", "poopelle_controller"),
            ],
        }
    }
}

impl RoutingStrategy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "addressed" => Some(Self::Addressed),
            "paired" => Some(Self::Paired),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Addressed => "addressed",
            Self::Paired => "paired",
        }
    }
}

impl ReregisterPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "keep" => Some(Self::Keep),
            "close" => Some(Self::Close),
            _ => None,
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
        .join("pairlink")
}

fn home_dir() -> PathBuf {
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
    #[error("invalid pairing table: {0}")]
    Pairing(String),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl RelayConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            Self::from_toml(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            RelayConfig::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("PAIRLINK_CONFIG")
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
            let text = toml::to_string_pretty(&RelayConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply `PORT` and `PAIRLINK_*` overrides. `lookup` is the environment.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(p) = lookup("PAIRLINK_NETWORK__PORT").and_then(|v| v.parse().ok()) {
            self.network.port = p;
        }
        if let Some(p) = lookup("PORT").and_then(|v| v.parse().ok()) {
            self.network.port = p;
        }
        if let Some(v) = lookup("PAIRLINK_NETWORK__BIND_ADDR") {
            self.network.bind_addr = v;
        }
        if let Some(p) = lookup("PAIRLINK_NETWORK__API_PORT").and_then(|v| v.parse().ok()) {
            self.network.api_port = p;
        }
        if let Some(s) = lookup("PAIRLINK_ROUTING__STRATEGY").and_then(|v| RoutingStrategy::parse(&v)) {
            self.routing.strategy = s;
        }
        if let Some(p) =
            lookup("PAIRLINK_ROUTING__ON_REREGISTER").and_then(|v| ReregisterPolicy::parse(&v))
        {
            self.routing.on_reregister = p;
        }
    }
}
