// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod core_error;
mod execution;
mod module;

pub use core_error::CoreError;
pub use config::ConfigError;
pub use execution::ExecutionError;
pub use module::ModuleError;
