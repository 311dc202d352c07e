// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::backends::script::{Program, Step};
use crate::errors::{CoreError, ExecutionError};
use crate::observability::messages::engine::StepStarted;
use crate::observability::messages::StructuredLog;
use crate::traits::{Module, ProcessExecutor, ProcessHandle};

/// Runs script modules step by step.
///
/// A script that runs out of steps without a `complete` or `fail` completes
/// with the last value it reported. Shutdown interrupts sleeps and suspensions
/// and stops the script before its next step.
#[derive(Debug, Default)]
pub struct ScriptExecutor;

impl ScriptExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessExecutor for ScriptExecutor {
    async fn execute(&self, module: Arc<Module>, process: ProcessHandle) -> Result<(), ExecutionError> {
        let program = module
            .definition::<Program>()
            .ok_or_else(|| ExecutionError::UnsupportedModule {
                mid: module.id.clone(),
                executor: self.name(),
            })?;
        let mut last = Value::Null;

        for (index, step) in program.steps.iter().enumerate() {
            if process.is_shutting_down() {
                return Err(ExecutionError::Shutdown);
            }

            StepStarted {
                pid: process.pid(),
                index,
                step,
            }
            .log();

            let report = |e: CoreError| ExecutionError::Step {
                index,
                reason: e.to_string(),
            };

            match step {
                Step::Emit { value } => {
                    process.update(value.clone()).map_err(report)?;
                    last = value.clone();
                }
                Step::Sleep { ms } => {
                    tokio::select! {
                        _ = tokio::time::sleep(Duration::from_millis(*ms)) => {}
                        _ = process.shutdown_requested() => return Err(ExecutionError::Shutdown),
                    }
                }
                Step::Suspend { value } => {
                    process.suspend(value.clone()).map_err(report)?;
                    tokio::select! {
                        message = process.recv_message() => match message {
                            Some(message) => last = message,
                            None => {
                                return Err(ExecutionError::Step {
                                    index,
                                    reason: "process inbox unavailable".to_string(),
                                })
                            }
                        },
                        _ = process.shutdown_requested() => return Err(ExecutionError::Shutdown),
                    }
                }
                Step::Complete { value } => {
                    process.complete(value.clone()).map_err(report)?;
                    return Ok(());
                }
                Step::Fail { message } => {
                    process.fail(message.clone()).map_err(report)?;
                    return Ok(());
                }
            }
        }

        process.complete(last)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "script"
    }
}
