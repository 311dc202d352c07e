// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Process supervision.
//!
//! The `Supervisor` is the explicitly constructed core: it owns the process
//! registry, the notification broker, the module store and the executor, and
//! exposes the operations the HTTP layer is built on:
//!
//! * `spawn` - create a process record and release it to the executor
//! * `spawn_and_await` / `spawn_and_await_terminal` - spawn, then block the
//!   calling task until progress (or the terminal state) is reported
//! * `open_stream` - a finite stream of snapshots for one process
//! * `send` - hand a message to a suspended process, resuming it
//! * `sweep` / `start_reaper` - time-based retention of finished records
//!
//! Cloning a `Supervisor` is cheap; every clone shares the same state.

mod retention;
mod spawn;
mod stream;
mod wait;

pub use stream::SnapshotStream;
pub use wait::WaitFor;

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::broker::{NotificationBroker, Subscription};
use crate::config::consts::{
    DEFAULT_COMPLETED_TTL_SECONDS, DEFAULT_MAX_PROCESSES, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_SWEEP_INTERVAL_SECONDS,
};
use crate::errors::{CoreError, ModuleError};
use crate::observability::messages::engine::SupervisorShutdown;
use crate::observability::messages::StructuredLog;
use crate::registry::{Pid, ProcessRegistry, Snapshot};
use crate::traits::{ModuleId, ModuleStore, ProcessExecutor};

/// Tunables of a supervisor, normally derived from `Config`.
#[derive(Debug, Clone, PartialEq)]
pub struct SupervisorOptions {
    pub max_processes: usize,
    pub queue_capacity: usize,
    /// Upper bound on synchronous waits; `None` waits indefinitely.
    pub wait_timeout: Option<Duration>,
    /// Age after which terminal records are evicted; `None` keeps them until
    /// deleted explicitly.
    pub retention_ttl: Option<Duration>,
    pub sweep_interval: Duration,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            max_processes: DEFAULT_MAX_PROCESSES,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            wait_timeout: None,
            retention_ttl: Some(Duration::from_secs(DEFAULT_COMPLETED_TTL_SECONDS)),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECONDS),
        }
    }
}

#[derive(Clone)]
pub struct Supervisor {
    registry: Arc<ProcessRegistry>,
    modules: Arc<dyn ModuleStore>,
    executor: Arc<dyn ProcessExecutor>,
    options: SupervisorOptions,
    shutdown: CancellationToken,
}

impl Supervisor {
    pub fn new(
        modules: Arc<dyn ModuleStore>,
        executor: Arc<dyn ProcessExecutor>,
        options: SupervisorOptions,
    ) -> Self {
        let broker = Arc::new(NotificationBroker::new(options.queue_capacity));
        let registry = Arc::new(ProcessRegistry::new(
            Arc::clone(&modules),
            broker,
            options.max_processes,
        ));

        Self {
            registry,
            modules,
            executor,
            options,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn registry(&self) -> &Arc<ProcessRegistry> {
        &self.registry
    }

    pub fn broker(&self) -> &Arc<NotificationBroker> {
        self.registry.broker()
    }

    pub fn modules(&self) -> &Arc<dyn ModuleStore> {
        &self.modules
    }

    pub fn executor_name(&self) -> &'static str {
        self.executor.name()
    }

    pub fn options(&self) -> &SupervisorOptions {
        &self.options
    }

    pub fn mount(&self, source: &[u8]) -> Result<ModuleId, ModuleError> {
        self.modules.mount(source)
    }

    pub fn get(&self, pid: Pid) -> Result<Snapshot, CoreError> {
        self.registry.get(pid)
    }

    pub fn list(&self) -> Vec<Snapshot> {
        self.registry.list()
    }

    pub fn remove(&self, pid: Pid) -> Result<Snapshot, CoreError> {
        self.registry.remove(pid)
    }

    /// Deliver `message` to a suspended process. The process resumes with the
    /// message as its value; its executor reads it from its inbox.
    pub fn send(&self, pid: Pid, message: Value) -> Result<Snapshot, CoreError> {
        self.registry.send(pid, message)
    }

    pub fn subscribe(&self, pid: Pid) -> Result<Subscription, CoreError> {
        self.registry.subscribe(pid)
    }

    /// Token cancelled by `shutdown`. Executors see it through their
    /// `ProcessHandle`.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Ask running executors and the reaper to stop. Idempotent.
    pub fn shutdown(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        let live_processes = self
            .registry
            .list()
            .iter()
            .filter(|snapshot| !snapshot.is_terminal())
            .count();
        SupervisorShutdown { live_processes }.log();
        self.shutdown.cancel();
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("registry", &self.registry)
            .field("executor", &self.executor.name())
            .field("options", &self.options)
            .finish()
    }
}
