// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::errors::CoreError;
use crate::traits::ModuleId;

/// Errors an executor reports back to the supervisor.
///
/// Any of these ending an execution while the process is still live turns the
/// process into `Failed` with the error message as its value.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// A program step could not be carried out.
    #[error("step {index} failed: {reason}")]
    Step { index: usize, reason: String },

    /// The module was mounted by a store this executor cannot run.
    #[error("executor '{executor}' cannot run module {mid}")]
    UnsupportedModule { mid: ModuleId, executor: &'static str },

    /// The registry rejected a progress report.
    #[error("registry rejected update: {0}")]
    Registry(#[from] CoreError),

    /// The supervisor is shutting down.
    #[error("supervisor shutting down")]
    Shutdown,
}
