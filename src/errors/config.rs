// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("failed to read config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML config did not parse
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML config did not parse
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// The file extension names no supported format
    #[error("unsupported config format '{extension}' (expected yaml, yml or toml)")]
    UnsupportedFormat { extension: String },

    /// A value parsed but is out of range
    #[error("invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}
