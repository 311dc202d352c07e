// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! `StructuredLog` to emit the same event with its fields attached, so log
//! wording lives in one place instead of being scattered across call sites.
//!
//! # Organization
//!
//! * `registry` - process record lifecycle (create, update, terminal, removal)
//! * `broker` - subscriber attach/detach, coalescing, topic teardown
//! * `module` - module mount outcomes
//! * `engine` - process release, executor supervision, waits, retention
//! * `api` - HTTP server and streaming events
//!
//! # Usage Pattern
//!
//! ```rust
//! use apeiro::observability::messages::registry::CapacityExceeded;
//! use apeiro::observability::messages::StructuredLog;
//!
//! let msg = CapacityExceeded { limit: 10_000 };
//! msg.log();
//! assert_eq!(msg.to_string(), "Process registry full: limit=10000");
//! ```

pub mod api;
pub mod broker;
pub mod engine;
pub mod module;
pub mod registry;

use tracing::Span;

/// A log message that knows its level and its structured fields.
pub trait StructuredLog: std::fmt::Display {
    /// Emit the event at the message's level with its fields attached.
    fn log(&self);

    /// Build a span carrying the message's fields. Messages that never open a
    /// span keep the disabled default.
    fn span(&self, _name: &str) -> Span {
        Span::none()
    }
}
