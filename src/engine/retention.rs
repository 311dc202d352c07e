// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::engine::Supervisor;
use crate::observability::messages::engine::{ReaperStarted, RetentionSweep};
use crate::observability::messages::StructuredLog;
use crate::registry::Pid;

impl Supervisor {
    /// Evict terminal records older than the retention TTL. Does nothing
    /// when retention is disabled.
    pub fn sweep(&self) -> Vec<Pid> {
        let Some(ttl) = self.options.retention_ttl else {
            return Vec::new();
        };

        let evicted = self.registry.evict_expired(ttl);
        RetentionSweep {
            evicted: evicted.len(),
            remaining: self.registry.len(),
        }
        .log();
        evicted
    }

    /// Run `sweep` every sweep interval until shutdown. `None` when
    /// retention is disabled.
    pub fn start_reaper(&self) -> Option<JoinHandle<()>> {
        let ttl = self.options.retention_ttl?;
        let period = self.options.sweep_interval.max(Duration::from_millis(1));
        let supervisor = self.clone();
        let shutdown = self.shutdown.clone();

        ReaperStarted {
            ttl,
            interval: period,
        }
        .log();

        Some(tokio::spawn(async move {
            let mut ticks = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticks.tick() => {
                        supervisor.sweep();
                    }
                }
            }
        }))
    }
}
