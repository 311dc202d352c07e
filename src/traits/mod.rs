// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod executor;
pub mod module_store;

pub use executor::{ProcessExecutor, ProcessHandle};
pub use module_store::{Module, ModuleId, ModuleStore};
