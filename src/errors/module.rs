// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised while mounting module source.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModuleError {
    /// Source could not be parsed as a module definition.
    #[error("invalid module source: {0}")]
    InvalidSource(String),

    /// Source parsed but declares no steps.
    #[error("module declares no steps")]
    EmptyProgram,

    /// A terminating step is followed by steps that can never run.
    #[error("step {index} ends the process but {remaining} step(s) follow it")]
    UnreachableSteps { index: usize, remaining: usize },

    /// Source exceeds the configured size limit.
    #[error("module source too large: {size} bytes (max: {limit} bytes)")]
    TooLarge { size: usize, limit: usize },
}
