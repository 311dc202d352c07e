// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::engine::Supervisor;
use crate::errors::CoreError;
use crate::observability::messages::engine::{
    ExecutionFailed, LateExecutionError, ProcessReleased,
};
use crate::observability::messages::StructuredLog;
use crate::registry::{Pid, ProcessRegistry, ProcessState};
use crate::traits::{Module, ModuleId, ProcessHandle};

impl Supervisor {
    /// Create a process for `mid` and hand it to the executor.
    ///
    /// Returns as soon as the record exists; the process is visible to `get`
    /// and `subscribe` from that point on. Unknown modules and a full
    /// registry are rejected here, before anything runs.
    pub fn spawn(&self, mid: &ModuleId, name: Option<String>) -> Result<Pid, CoreError> {
        let (pid, module) = self.prepare(mid, name)?;
        self.release(pid, module);
        Ok(pid)
    }

    pub(crate) fn prepare(
        &self,
        mid: &ModuleId,
        name: Option<String>,
    ) -> Result<(Pid, Arc<Module>), CoreError> {
        let module = self
            .modules
            .get(mid)
            .ok_or_else(|| CoreError::ModuleNotFound(mid.clone()))?;
        let pid = self.registry.create(mid, name)?;
        Ok((pid, module))
    }

    /// Run the executor for `pid` on its own task.
    ///
    /// The executor runs inside a nested task so a panic is caught as a
    /// `JoinError`. An error or panic while the process is still live marks
    /// it `Failed` with `{"error": message}`.
    pub(crate) fn release(&self, pid: Pid, module: Arc<Module>) -> JoinHandle<()> {
        let executor = Arc::clone(&self.executor);
        let executor_name = executor.name();
        let registry = Arc::clone(&self.registry);
        let handle = ProcessHandle::new(pid, Arc::clone(&registry), self.shutdown.clone());

        let released = ProcessReleased {
            pid,
            executor: executor_name,
        };
        released.log();
        let span = released.span("execute");

        tokio::spawn(async move {
            let task = tokio::spawn(
                async move { executor.execute(module, handle).await }.instrument(span),
            );

            let failure = match task.await {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(join_error) if join_error.is_panic() => {
                    Some(panic_message(join_error.into_panic()))
                }
                Err(join_error) => Some(join_error.to_string()),
            };

            if let Some(error) = failure {
                fail_if_live(&registry, pid, executor_name, &error);
            }
        })
    }
}

fn fail_if_live(registry: &ProcessRegistry, pid: Pid, executor: &str, error: &str) {
    match registry.mark_terminal(pid, ProcessState::Failed, json!({ "error": error })) {
        Ok(_) => ExecutionFailed {
            pid,
            executor,
            error,
        }
        .log(),
        Err(CoreError::InvalidTransition { .. }) => LateExecutionError { pid, error }.log(),
        // Removed while the executor was still running.
        Err(_) => {}
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("executor panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("executor panicked: {}", message)
    } else {
        "executor panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_from_str_and_string() {
        assert_eq!(
            panic_message(Box::new("boom")),
            "executor panicked: boom"
        );
        assert_eq!(
            panic_message(Box::new(String::from("bang"))),
            "executor panicked: bang"
        );
        assert_eq!(panic_message(Box::new(7u32)), "executor panicked");
    }
}
