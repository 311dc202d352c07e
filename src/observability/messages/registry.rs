// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for process record lifecycle events.

use std::fmt::{Display, Formatter};

use crate::observability::messages::StructuredLog;
use crate::registry::{Pid, ProcessState};
use crate::traits::ModuleId;

/// A process record was inserted.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ProcessCreated<'a> {
    pub pid: Pid,
    pub mid: &'a ModuleId,
}

impl Display for ProcessCreated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Process {} created from module {}", self.pid, self.mid)
    }
}

impl StructuredLog for ProcessCreated<'_> {
    fn log(&self) {
        tracing::info!(pid = %self.pid, mid = %self.mid, "{}", self);
    }
}

/// A live process reported a new value or state.
///
/// # Log Level
/// `debug!` - High-frequency progress event
pub struct ProcessUpdated {
    pub pid: Pid,
    pub state: ProcessState,
    pub revision: u64,
}

impl Display for ProcessUpdated {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Process {} updated: state={:?}, revision={}",
            self.pid, self.state, self.revision
        )
    }
}

impl StructuredLog for ProcessUpdated {
    fn log(&self) {
        tracing::debug!(
            pid = %self.pid,
            state = ?self.state,
            revision = self.revision,
            "{}", self
        );
    }
}

/// A process reached its terminal state.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use apeiro::observability::messages::registry::ProcessTerminated;
/// use apeiro::registry::{Pid, ProcessState};
///
/// let msg = ProcessTerminated {
///     pid: Pid::from_raw(1),
///     state: ProcessState::Completed,
///     revision: 4,
///     subscribers: 2,
/// };
///
/// assert_eq!(
///     msg.to_string(),
///     "Process 0000000000000001 finished as Completed at revision 4 (2 subscribers notified)"
/// );
/// ```
pub struct ProcessTerminated {
    pub pid: Pid,
    pub state: ProcessState,
    pub revision: u64,
    pub subscribers: usize,
}

impl Display for ProcessTerminated {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Process {} finished as {:?} at revision {} ({} subscribers notified)",
            self.pid, self.state, self.revision, self.subscribers
        )
    }
}

impl StructuredLog for ProcessTerminated {
    fn log(&self) {
        tracing::info!(
            pid = %self.pid,
            state = ?self.state,
            revision = self.revision,
            subscribers = self.subscribers,
            "{}", self
        );
    }
}

/// A suspended process was handed a message and resumed.
///
/// # Log Level
/// `info!` - Important operational event
pub struct MessageDelivered {
    pub pid: Pid,
    pub revision: u64,
}

impl Display for MessageDelivered {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Message delivered to process {}, resumed at revision {}",
            self.pid, self.revision
        )
    }
}

impl StructuredLog for MessageDelivered {
    fn log(&self) {
        tracing::info!(pid = %self.pid, revision = self.revision, "{}", self);
    }
}

/// A terminal record left the registry.
pub struct ProcessRemoved {
    pub pid: Pid,
    pub reason: &'static str,
}

impl Display for ProcessRemoved {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Process {} removed ({})", self.pid, self.reason)
    }
}

impl StructuredLog for ProcessRemoved {
    fn log(&self) {
        tracing::info!(pid = %self.pid, reason = self.reason, "{}", self);
    }
}

/// A create was refused because the registry is full.
///
/// # Log Level
/// `warn!` - Degraded operation
pub struct CapacityExceeded {
    pub limit: usize,
}

impl Display for CapacityExceeded {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Process registry full: limit={}", self.limit)
    }
}

impl StructuredLog for CapacityExceeded {
    fn log(&self) {
        tracing::warn!(limit = self.limit, "{}", self);
    }
}
