// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::Config;
use crate::errors::ConfigError;

/// Reject settings that would leave the supervisor unable to run.
///
/// Reports the first offending field.
pub fn validate_config(cfg: &Config) -> Result<(), ConfigError> {
    require_positive(
        "registry.max_processes",
        cfg.registry.get_max_processes() as u64,
    )?;
    require_positive(
        "broker.queue_capacity",
        cfg.broker.get_queue_capacity() as u64,
    )?;
    require_positive(
        "modules.max_source_bytes",
        cfg.modules.get_max_source_bytes() as u64,
    )?;
    require_positive(
        "registry.retention.sweep_interval_seconds",
        cfg.registry.retention.get_sweep_interval().as_secs(),
    )?;
    if let Some(timeout_ms) = cfg.wait.timeout_ms {
        require_positive("wait.timeout_ms", timeout_ms)?;
    }
    Ok(())
}

fn require_positive(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            field,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}
