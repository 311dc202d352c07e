// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the HTTP surface.

use std::fmt::{Display, Formatter};
use std::net::SocketAddr;

use crate::observability::messages::StructuredLog;
use crate::registry::Pid;

pub struct ServerListening {
    pub addr: SocketAddr,
}

impl Display for ServerListening {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Listening on http://{}", self.addr)
    }
}

impl StructuredLog for ServerListening {
    fn log(&self) {
        tracing::info!(addr = %self.addr, "{}", self);
    }
}

/// A request was answered with an error status.
///
/// # Log Level
/// `warn!` for server errors, `debug!` for client errors
///
/// # Example
/// ```
/// use apeiro::observability::messages::api::RequestFailed;
///
/// let msg = RequestFailed {
///     status: 404,
///     error: "process 0000000000000007 not found",
/// };
///
/// assert_eq!(msg.to_string(), "Request failed with 404: process 0000000000000007 not found");
/// ```
pub struct RequestFailed<'a> {
    pub status: u16,
    pub error: &'a str,
}

impl Display for RequestFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Request failed with {}: {}", self.status, self.error)
    }
}

impl StructuredLog for RequestFailed<'_> {
    fn log(&self) {
        if self.status >= 500 {
            tracing::warn!(status = self.status, error = self.error, "{}", self);
        } else {
            tracing::debug!(status = self.status, error = self.error, "{}", self);
        }
    }
}

pub struct StreamOpened {
    pub pid: Pid,
}

impl Display for StreamOpened {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Opened event stream on process {}", self.pid)
    }
}

impl StructuredLog for StreamOpened {
    fn log(&self) {
        tracing::debug!(pid = %self.pid, "{}", self);
    }
}

/// An event could not be encoded; the stream is ended after an `error` event.
pub struct StreamEncodeFailed<'a> {
    pub pid: Pid,
    pub error: &'a str,
}

impl Display for StreamEncodeFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to encode event for process {}: {}",
            self.pid, self.error
        )
    }
}

impl StructuredLog for StreamEncodeFailed<'_> {
    fn log(&self) {
        tracing::error!(pid = %self.pid, error = self.error, "{}", self);
    }
}
