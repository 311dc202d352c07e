// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::broker::Subscription;
use crate::engine::Supervisor;
use crate::errors::CoreError;
use crate::observability::messages::engine::WaitTimedOut;
use crate::observability::messages::StructuredLog;
use crate::registry::{Pid, Snapshot};
use crate::traits::ModuleId;

/// What a synchronous spawn waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitFor {
    /// The first event carrying progress (revision 1 or later), terminal or
    /// not.
    FirstProgress,
    /// The terminal snapshot.
    Terminal,
}

impl WaitFor {
    fn is_satisfied_by(self, snapshot: &Snapshot) -> bool {
        match self {
            WaitFor::FirstProgress => snapshot.revision >= 1,
            WaitFor::Terminal => snapshot.is_terminal(),
        }
    }
}

impl Supervisor {
    /// Spawn and suspend the calling task until the process reports
    /// progress, then return the registry's current snapshot.
    ///
    /// The subscription is registered before the executor is released, so
    /// even a process that finishes instantly is observed. The returned
    /// snapshot may well be non-terminal.
    pub async fn spawn_and_await(
        &self,
        mid: &ModuleId,
        name: Option<String>,
    ) -> Result<(Pid, Snapshot), CoreError> {
        self.spawn_and_wait_for(mid, name, WaitFor::FirstProgress)
            .await
    }

    /// Like `spawn_and_await`, but only returns once the process finished.
    pub async fn spawn_and_await_terminal(
        &self,
        mid: &ModuleId,
        name: Option<String>,
    ) -> Result<(Pid, Snapshot), CoreError> {
        self.spawn_and_wait_for(mid, name, WaitFor::Terminal).await
    }

    pub async fn spawn_and_wait_for(
        &self,
        mid: &ModuleId,
        name: Option<String>,
        until: WaitFor,
    ) -> Result<(Pid, Snapshot), CoreError> {
        let (pid, module) = self.prepare(mid, name)?;
        let mut subscription = self.registry.subscribe(pid)?;
        self.release(pid, module);

        let observed = match self.options.wait_timeout {
            Some(after) => {
                let waited =
                    tokio::time::timeout(after, next_matching(&mut subscription, until)).await;
                match waited {
                    Ok(observed) => observed,
                    Err(_) => {
                        subscription.cancel();
                        WaitTimedOut { pid, after }.log();
                        return Err(CoreError::WaitTimedOut { pid, after });
                    }
                }
            }
            None => next_matching(&mut subscription, until).await,
        };
        subscription.cancel();

        // Prefer the registry's view; fall back to the observed event if the
        // record was already evicted.
        let snapshot = match (self.registry.get(pid), observed) {
            (Ok(current), _) => current,
            (Err(_), Some(event)) => event,
            (Err(e), None) => return Err(e),
        };
        Ok((pid, snapshot))
    }
}

async fn next_matching(subscription: &mut Subscription, until: WaitFor) -> Option<Snapshot> {
    while let Some(snapshot) = subscription.next().await {
        if until.is_satisfied_by(&snapshot) {
            return Some(snapshot);
        }
    }
    None
}
