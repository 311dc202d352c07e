// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for module mounting.

use std::fmt::{Display, Formatter};

use crate::errors::ModuleError;
use crate::observability::messages::StructuredLog;
use crate::traits::ModuleId;

/// Module source was accepted.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use apeiro::observability::messages::module::ModuleMounted;
/// use apeiro::traits::ModuleId;
///
/// let mid = ModuleId::from("AbCdEfGhIjK");
/// let msg = ModuleMounted {
///     mid: &mid,
///     name: Some("counter"),
///     steps: 3,
/// };
///
/// assert_eq!(msg.to_string(), "Mounted module AbCdEfGhIjK 'counter' with 3 steps");
/// ```
pub struct ModuleMounted<'a> {
    pub mid: &'a ModuleId,
    pub name: Option<&'a str>,
    pub steps: usize,
}

impl Display for ModuleMounted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.name {
            Some(name) => write!(
                f,
                "Mounted module {} '{}' with {} steps",
                self.mid, name, self.steps
            ),
            None => write!(f, "Mounted module {} with {} steps", self.mid, self.steps),
        }
    }
}

impl StructuredLog for ModuleMounted<'_> {
    fn log(&self) {
        tracing::info!(
            mid = %self.mid,
            name = self.name,
            steps = self.steps,
            "{}", self
        );
    }
}

/// Module source was refused.
///
/// # Log Level
/// `warn!` - Client supplied bad input
pub struct ModuleRejected<'a> {
    pub error: &'a ModuleError,
}

impl Display for ModuleRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Rejected module source: {}", self.error)
    }
}

impl StructuredLog for ModuleRejected<'_> {
    fn log(&self) {
        tracing::warn!(error = %self.error, "{}", self);
    }
}
