// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for process supervision events.
//!
//! This module contains message types for logging events related to:
//! * Releasing a process to its executor
//! * Executor failures and panics
//! * Synchronous waits
//! * Retention sweeps and supervisor shutdown

use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

use crate::backends::script::Step;
use crate::observability::messages::StructuredLog;
use crate::registry::Pid;

/// A process was handed to its executor.
///
/// # Log Level
/// `debug!` - One per spawn
///
/// # Example
/// ```
/// use apeiro::observability::messages::engine::ProcessReleased;
/// use apeiro::registry::Pid;
///
/// let msg = ProcessReleased {
///     pid: Pid::from_raw(10),
///     executor: "script",
/// };
///
/// assert_eq!(msg.to_string(), "Released process 000000000000000a to script executor");
/// ```
pub struct ProcessReleased<'a> {
    pub pid: Pid,
    pub executor: &'a str,
}

impl Display for ProcessReleased<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Released process {} to {} executor",
            self.pid, self.executor
        )
    }
}

impl StructuredLog for ProcessReleased<'_> {
    fn log(&self) {
        tracing::debug!(pid = %self.pid, executor = self.executor, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "process",
            span_name = name,
            pid = %self.pid,
            executor = self.executor,
        )
    }
}

/// The executor returned an error or panicked while the process was live.
///
/// # Log Level
/// `error!` - The process is marked `Failed` on the executor's behalf
pub struct ExecutionFailed<'a> {
    pub pid: Pid,
    pub executor: &'a str,
    pub error: &'a str,
}

impl Display for ExecutionFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Executor {} failed process {}: {}",
            self.executor, self.pid, self.error
        )
    }
}

impl StructuredLog for ExecutionFailed<'_> {
    fn log(&self) {
        tracing::error!(
            pid = %self.pid,
            executor = self.executor,
            error = self.error,
            "{}", self
        );
    }
}

/// The executor returned an error after the process had already finished.
///
/// # Log Level
/// `warn!` - Nothing to mark; the terminal state stands
pub struct LateExecutionError<'a> {
    pub pid: Pid,
    pub error: &'a str,
}

impl Display for LateExecutionError<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Ignoring executor error for already finished process {}: {}",
            self.pid, self.error
        )
    }
}

impl StructuredLog for LateExecutionError<'_> {
    fn log(&self) {
        tracing::warn!(pid = %self.pid, error = self.error, "{}", self);
    }
}

/// Script step about to run.
///
/// # Log Level
/// `trace!` - Per-step detail
pub struct StepStarted<'a> {
    pub pid: Pid,
    pub index: usize,
    pub step: &'a Step,
}

impl Display for StepStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Process {} running step {}: {:?}",
            self.pid, self.index, self.step
        )
    }
}

impl StructuredLog for StepStarted<'_> {
    fn log(&self) {
        tracing::trace!(pid = %self.pid, index = self.index, "{}", self);
    }
}

pub struct WaitTimedOut {
    pub pid: Pid,
    pub after: Duration,
}

impl Display for WaitTimedOut {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Gave up waiting on process {} after {:?}; it keeps running",
            self.pid, self.after
        )
    }
}

impl StructuredLog for WaitTimedOut {
    fn log(&self) {
        tracing::warn!(
            pid = %self.pid,
            after_ms = self.after.as_millis() as u64,
            "{}", self
        );
    }
}

/// Retention sweep evicted expired terminal records.
///
/// # Log Level
/// `info!` when anything was evicted, otherwise `debug!`
pub struct RetentionSweep {
    pub evicted: usize,
    pub remaining: usize,
}

impl Display for RetentionSweep {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Retention sweep evicted {} process(es), {} remaining",
            self.evicted, self.remaining
        )
    }
}

impl StructuredLog for RetentionSweep {
    fn log(&self) {
        if self.evicted > 0 {
            tracing::info!(evicted = self.evicted, remaining = self.remaining, "{}", self);
        } else {
            tracing::debug!(evicted = self.evicted, remaining = self.remaining, "{}", self);
        }
    }
}

pub struct ReaperStarted {
    pub ttl: Duration,
    pub interval: Duration,
}

impl Display for ReaperStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Retention reaper started: ttl={:?}, interval={:?}",
            self.ttl, self.interval
        )
    }
}

impl StructuredLog for ReaperStarted {
    fn log(&self) {
        tracing::info!(
            ttl_secs = self.ttl.as_secs(),
            interval_secs = self.interval.as_secs(),
            "{}", self
        );
    }
}

/// Shutdown was requested; running executors are being told to stop.
///
/// # Log Level
/// `info!` - Important operational event
pub struct SupervisorShutdown {
    pub live_processes: usize,
}

impl Display for SupervisorShutdown {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Supervisor shutting down with {} live process(es)",
            self.live_processes
        )
    }
}

impl StructuredLog for SupervisorShutdown {
    fn log(&self) {
        tracing::info!(live_processes = self.live_processes, "{}", self);
    }
}
