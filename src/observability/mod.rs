// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Message types live in `messages`, organized by subsystem, and follow a
//! struct-based pattern: `Display` for the human-readable line and
//! `StructuredLog` to emit it with its fields attached.
//!
//! `init_tracing` installs the process-wide `tracing-subscriber` formatter.
//! The filter comes from `RUST_LOG` when set, otherwise from configuration.
//!
//! # Usage
//!
//! ```rust
//! use apeiro::observability::messages::engine::WaitTimedOut;
//! use apeiro::observability::messages::StructuredLog;
//! use apeiro::registry::Pid;
//! use std::time::Duration;
//!
//! let msg = WaitTimedOut {
//!     pid: Pid::from_raw(3),
//!     after: Duration::from_secs(30),
//! };
//! msg.log();
//! ```

pub mod messages;

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `default_filter` applies when `RUST_LOG` is
/// unset or unparsable. Calling it twice is a no-op.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
