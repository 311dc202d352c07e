// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Default listen address of the HTTP server
pub const DEFAULT_BIND: &str = "127.0.0.1:5151";
/// Default upper bound on process records held at once
pub const DEFAULT_MAX_PROCESSES: usize = 10_000;
/// Default per-subscriber queue depth before snapshots are coalesced
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;
/// Default age at which finished process records are evicted (5 minutes)
pub const DEFAULT_COMPLETED_TTL_SECONDS: u64 = 300;
/// Default period of the retention sweep
pub const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 30;
/// Default maximum size of mounted module source (1 MiB)
pub const DEFAULT_MAX_SOURCE_BYTES: usize = 1024 * 1024;
/// Default tracing filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";
/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "APEIRO_CONFIG";
