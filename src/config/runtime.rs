// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::backends::script::{ScriptExecutor, ScriptModuleStore};
use crate::config::Config;
use crate::engine::{Supervisor, SupervisorOptions};
use crate::traits::{ModuleStore, ProcessExecutor};

/// Supervisor builder - wires the registry, broker and collaborators from
/// configuration.
///
/// # Examples
///
/// ```
/// use apeiro::config::{Config, RuntimeBuilder};
///
/// let config = Config::default();
/// let supervisor = RuntimeBuilder::with_script_backend(&config);
///
/// assert_eq!(supervisor.executor_name(), "script");
/// assert_eq!(supervisor.options().max_processes, config.registry.get_max_processes());
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Map configuration onto supervisor options.
    pub fn options(cfg: &Config) -> SupervisorOptions {
        SupervisorOptions {
            max_processes: cfg.registry.get_max_processes(),
            queue_capacity: cfg.broker.get_queue_capacity(),
            wait_timeout: cfg.wait.get_timeout(),
            retention_ttl: cfg.registry.retention.get_completed_ttl(),
            sweep_interval: cfg.registry.retention.get_sweep_interval(),
        }
    }

    /// Build a supervisor around the given collaborators.
    pub fn from_config(
        cfg: &Config,
        modules: Arc<dyn ModuleStore>,
        executor: Arc<dyn ProcessExecutor>,
    ) -> Supervisor {
        Supervisor::new(modules, executor, Self::options(cfg))
    }

    /// Build a supervisor with the built-in script store and executor.
    pub fn with_script_backend(cfg: &Config) -> Supervisor {
        let modules = Arc::new(ScriptModuleStore::new(cfg.modules.get_max_source_bytes()));
        Self::from_config(cfg, modules, Arc::new(ScriptExecutor::new()))
    }
}
