// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Module store and executor implementations.
//!
//! # Available Backends
//!
//! ## Script Backend
//! Declarative step scripts mounted from YAML or JSON:
//! - **ScriptModuleStore**: validates source and derives content-addressed module ids
//! - **ScriptExecutor**: reports each step's progress into the registry
//! - **Use Case**: the default collaborators of the `apeiro` server, demos, tests
//!
//! ## Stub Backend (Test-Only)
//! Executors for exercising the supervisor without scripts:
//! - **InstantExecutor**: completes the moment it is released
//! - **ProgressExecutor**: reports a fixed number of updates, then completes
//! - **ManualExecutor**: hands each process handle to the test to drive by hand
//! - **FailingExecutor** / **PanickingExecutor**: exercise failure supervision
//! - **Note**: NOT available in production builds
//!
//! # Example
//! ```rust
//! use apeiro::backends::script::ScriptModuleStore;
//! use apeiro::traits::ModuleStore;
//!
//! let store = ScriptModuleStore::new(64 * 1024);
//! let mid = store.mount(b"steps:\n  - op: complete\n    value: 42\n")?;
//! assert!(store.contains(&mid));
//! # Ok::<(), apeiro::errors::ModuleError>(())
//! ```

pub mod script;
#[cfg(test)]
pub mod stub;
