// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors returned by the registry, broker and supervisor.
//!
//! These are typed errors handed back to callers; nothing in the core aborts
//! the process on a failed operation. The HTTP layer maps each variant to a
//! status code (see `api::error`).

use std::time::Duration;
use thiserror::Error;

use crate::errors::ModuleError;
use crate::registry::{Pid, ProcessState};
use crate::traits::ModuleId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// The module store has no module with this id.
    #[error("module not found: {0}")]
    ModuleNotFound(ModuleId),

    /// The pid was never issued, or its record has been evicted.
    #[error("process not found: {0}")]
    ProcessNotFound(Pid),

    /// The requested change is not allowed from the process's current state.
    #[error("invalid transition for process {pid}: {from:?} -> {to:?}")]
    InvalidTransition {
        pid: Pid,
        from: ProcessState,
        to: ProcessState,
    },

    /// The process is suspended but its executor no longer reads messages.
    #[error("process {0} is not accepting messages")]
    InboxClosed(Pid),

    /// The registry already holds its configured maximum of process records.
    #[error("process registry is at capacity ({limit} processes)")]
    ResourceExhausted { limit: usize },

    /// A synchronous wait gave up before the expected event arrived.
    #[error("timed out after {after:?} waiting on process {pid}")]
    WaitTimedOut { pid: Pid, after: Duration },

    /// Mounting a module failed.
    #[error(transparent)]
    Module(#[from] ModuleError),
}

impl CoreError {
    /// True for errors caused by the caller's input rather than server state.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CoreError::ModuleNotFound(_)
                | CoreError::ProcessNotFound(_)
                | CoreError::InvalidTransition { .. }
                | CoreError::InboxClosed(_)
                | CoreError::Module(ModuleError::InvalidSource(_))
                | CoreError::Module(ModuleError::EmptyProgram)
                | CoreError::Module(ModuleError::UnreachableSteps { .. })
        )
    }
}
