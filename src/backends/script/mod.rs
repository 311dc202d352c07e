// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in module format and executor.
//!
//! A script module is a YAML (or JSON) document listing steps that report
//! progress into the registry:
//!
//! ```yaml
//! name: counter
//! steps:
//!   - op: emit
//!     value: {count: 1}
//!   - op: sleep
//!     ms: 10
//!   - op: complete
//!     value: 42
//! ```
//!
//! `ScriptModuleStore` validates and mounts scripts; `ScriptExecutor` runs
//! them on behalf of the supervisor.

mod executor;
mod program;
mod store;

pub use executor::ScriptExecutor;
pub use program::{parse_program, Program, Step};
pub use store::ScriptModuleStore;
