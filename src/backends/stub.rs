// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::errors::ExecutionError;
use crate::traits::{Module, ProcessExecutor, ProcessHandle};

/// Completes with a fixed value as soon as it runs
pub struct InstantExecutor {
    pub value: Value,
}

impl InstantExecutor {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

#[async_trait]
impl ProcessExecutor for InstantExecutor {
    async fn execute(&self, _module: Arc<Module>, process: ProcessHandle) -> Result<(), ExecutionError> {
        process.complete(self.value.clone())?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "instant"
    }
}

/// Reports `updates` progress values `{"step": n}`, pausing `pause` between
/// them, then completes with `{"step": updates}`
pub struct ProgressExecutor {
    pub updates: u64,
    pub pause: Duration,
}

impl ProgressExecutor {
    pub fn new(updates: u64, pause: Duration) -> Self {
        Self { updates, pause }
    }
}

#[async_trait]
impl ProcessExecutor for ProgressExecutor {
    async fn execute(&self, _module: Arc<Module>, process: ProcessHandle) -> Result<(), ExecutionError> {
        for step in 1..=self.updates {
            process.update(json!({ "step": step }))?;
            tokio::time::sleep(self.pause).await;
        }
        process.complete(json!({ "step": self.updates }))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "progress"
    }
}

/// Hands every released process to the test through a channel and leaves
/// the driving to it
pub struct ManualExecutor {
    released: mpsc::UnboundedSender<ProcessHandle>,
}

impl ManualExecutor {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProcessHandle>) {
        let (released, receiver) = mpsc::unbounded_channel();
        (Self { released }, receiver)
    }
}

#[async_trait]
impl ProcessExecutor for ManualExecutor {
    async fn execute(&self, _module: Arc<Module>, process: ProcessHandle) -> Result<(), ExecutionError> {
        // The test may have dropped its receiver; the process then just stays live.
        let _ = self.released.send(process);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "manual"
    }
}

/// Always returns an execution error without reporting anything
pub struct FailingExecutor;

#[async_trait]
impl ProcessExecutor for FailingExecutor {
    async fn execute(&self, _module: Arc<Module>, _process: ProcessHandle) -> Result<(), ExecutionError> {
        Err(ExecutionError::Step {
            index: 0,
            reason: "simulated executor failure".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Panics mid-execution
pub struct PanickingExecutor;

#[async_trait]
impl ProcessExecutor for PanickingExecutor {
    async fn execute(&self, _module: Arc<Module>, process: ProcessHandle) -> Result<(), ExecutionError> {
        process.update(json!("about to panic"))?;
        panic!("simulated executor panic");
    }

    fn name(&self) -> &'static str {
        "panicking"
    }
}
