// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::errors::{CoreError, ExecutionError};
use crate::registry::{Pid, ProcessRegistry, ProcessState, Snapshot};
use crate::traits::Module;

/// Execution engine collaborator.
///
/// The supervisor calls `execute` once per spawned process, on its own task,
/// after the process record exists and any synchronous watcher is already
/// subscribed. The executor reports progress through the `ProcessHandle`.
///
/// Returning `Err` (or panicking) while the process is still live makes the
/// supervisor mark it `Failed`. Returning `Ok(())` leaves the process as the
/// executor left it.
#[async_trait]
pub trait ProcessExecutor: Send + Sync {
    async fn execute(&self, module: Arc<Module>, process: ProcessHandle) -> Result<(), ExecutionError>;

    fn name(&self) -> &'static str;
}

/// An executor's view of the one process it is driving.
///
/// Clones share the process inbox; dropping the last one closes it, after
/// which sends to the process are refused.
#[derive(Clone)]
pub struct ProcessHandle {
    pid: Pid,
    registry: Arc<ProcessRegistry>,
    inbox: Arc<Mutex<Option<mpsc::UnboundedReceiver<Value>>>>,
    shutdown: CancellationToken,
}

impl ProcessHandle {
    pub(crate) fn new(pid: Pid, registry: Arc<ProcessRegistry>, shutdown: CancellationToken) -> Self {
        let inbox = registry.take_inbox(pid);
        Self {
            pid,
            registry,
            inbox: Arc::new(Mutex::new(inbox)),
            shutdown,
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn snapshot(&self) -> Result<Snapshot, CoreError> {
        self.registry.get(self.pid)
    }

    /// Report a new value; the state is unchanged.
    pub fn update(&self, value: Value) -> Result<Snapshot, CoreError> {
        self.registry.update_value(self.pid, value)
    }

    pub fn suspend(&self, value: Option<Value>) -> Result<Snapshot, CoreError> {
        self.registry.set_state(self.pid, ProcessState::Suspended, value)
    }

    /// Wait for the next message sent to this process. By the time it
    /// arrives the process has already been resumed with the message as its
    /// value. `None` if the inbox belongs to another handle.
    pub async fn recv_message(&self) -> Option<Value> {
        let mut inbox = self.inbox.lock().await;
        inbox.as_mut()?.recv().await
    }

    pub fn complete(&self, value: Value) -> Result<Snapshot, CoreError> {
        self.registry
            .mark_terminal(self.pid, ProcessState::Completed, value)
    }

    /// Fail the process; the value becomes `{"error": message}`.
    pub fn fail(&self, message: impl Into<String>) -> Result<Snapshot, CoreError> {
        self.registry.mark_terminal(
            self.pid,
            ProcessState::Failed,
            json!({ "error": message.into() }),
        )
    }

    /// Resolves once the supervisor starts shutting down.
    pub async fn shutdown_requested(&self) {
        self.shutdown.cancelled().await
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}
