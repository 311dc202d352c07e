// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod api;            // HTTP surface
pub mod backends;       // module stores + executors
pub mod broker;         // per-process snapshot fan-out
pub mod config;         // config loading + supervisor wiring
pub mod engine;         // supervisor: spawn, wait, stream, retention
pub mod errors;         // error handling
pub mod observability;
pub mod registry;       // process records
pub mod traits;         // collaborator abstractions
