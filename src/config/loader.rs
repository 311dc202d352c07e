// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::config::consts::{
    DEFAULT_BIND, DEFAULT_COMPLETED_TTL_SECONDS, DEFAULT_LOG_FILTER, DEFAULT_MAX_PROCESSES,
    DEFAULT_MAX_SOURCE_BYTES, DEFAULT_QUEUE_CAPACITY, DEFAULT_SWEEP_INTERVAL_SECONDS,
};
use crate::config::validation::validate_config;
use crate::errors::ConfigError;

/// Main configuration structure for the process supervisor.
///
/// Every section is optional; missing values fall back to the defaults in
/// `config::consts`. Loaded from YAML or TOML depending on the file
/// extension.
///
/// # Example
/// ```yaml
/// server:
///   bind: 0.0.0.0:5151
/// registry:
///   max_processes: 5000
///   retention:
///     completed_ttl_seconds: 600
///     sweep_interval_seconds: 60
/// broker:
///   queue_capacity: 32
/// wait:
///   timeout_ms: 30000
/// modules:
///   max_source_bytes: 65536
/// logging:
///   filter: apeiro=debug,info
/// ```
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub wait: WaitConfig,
    #[serde(default)]
    pub modules: ModulesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<SocketAddr>,
}

impl ServerConfig {
    pub fn get_bind(&self) -> SocketAddr {
        self.bind
            .or_else(|| DEFAULT_BIND.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 5151)))
    }
}

/// Process record limits and retention.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct RegistryConfig {
    pub max_processes: Option<usize>,
    #[serde(default)]
    pub retention: RetentionConfig,
}

impl RegistryConfig {
    pub fn get_max_processes(&self) -> usize {
        self.max_processes.unwrap_or(DEFAULT_MAX_PROCESSES)
    }
}

/// Time-based eviction of finished processes.
///
/// # Fields
/// * `completed_ttl_seconds` - age after which a finished record is evicted;
///   `disabled: true` turns eviction off entirely
/// * `sweep_interval_seconds` - how often the reaper runs
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct RetentionConfig {
    pub completed_ttl_seconds: Option<u64>,
    pub sweep_interval_seconds: Option<u64>,
    #[serde(default)]
    pub disabled: bool,
}

impl RetentionConfig {
    /// `None` when retention is disabled.
    pub fn get_completed_ttl(&self) -> Option<Duration> {
        if self.disabled {
            return None;
        }
        Some(Duration::from_secs(
            self.completed_ttl_seconds
                .unwrap_or(DEFAULT_COMPLETED_TTL_SECONDS),
        ))
    }

    pub fn get_sweep_interval(&self) -> Duration {
        Duration::from_secs(
            self.sweep_interval_seconds
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECONDS),
        )
    }
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct BrokerConfig {
    pub queue_capacity: Option<usize>,
}

impl BrokerConfig {
    pub fn get_queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(DEFAULT_QUEUE_CAPACITY)
    }
}

/// Synchronous spawn settings. Without `timeout_ms` a wait never gives up.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct WaitConfig {
    pub timeout_ms: Option<u64>,
}

impl WaitConfig {
    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct ModulesConfig {
    pub max_source_bytes: Option<usize>,
}

impl ModulesConfig {
    pub fn get_max_source_bytes(&self) -> usize {
        self.max_source_bytes.unwrap_or(DEFAULT_MAX_SOURCE_BYTES)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    pub filter: Option<String>,
}

impl LoggingConfig {
    pub fn get_filter(&self) -> &str {
        self.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}

/// Load a config from a YAML (`.yaml`, `.yml`) or TOML (`.toml`) file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match extension.as_str() {
        "yaml" | "yml" => Ok(serde_yaml::from_str(&content)?),
        "toml" => Ok(toml::from_str(&content)?),
        _ => Err(ConfigError::UnsupportedFormat { extension }),
    }
}

/// Load a config and reject values the supervisor cannot run with
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let cfg = load_config(path)?;
    validate_config(&cfg)?;
    Ok(cfg)
}
