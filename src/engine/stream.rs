// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use futures::stream::{self, BoxStream, Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::broker::Subscription;
use crate::engine::Supervisor;
use crate::errors::CoreError;
use crate::registry::{Pid, Snapshot};

/// Push stream of one process's snapshots.
///
/// Starts with the snapshot current at open time and ends after the terminal
/// snapshot. Not restartable: open a new one to watch again. Dropping it
/// unsubscribes.
pub struct SnapshotStream {
    pid: Pid,
    inner: BoxStream<'static, Snapshot>,
}

impl SnapshotStream {
    pub fn new(subscription: Subscription) -> Self {
        let pid = subscription.pid();
        let inner = stream::unfold(subscription, |mut subscription| async move {
            let snapshot = subscription.next().await?;
            Some((snapshot, subscription))
        })
        .boxed();
        Self { pid, inner }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }
}

impl Stream for SnapshotStream {
    type Item = Snapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Snapshot>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl std::fmt::Debug for SnapshotStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStream").field("pid", &self.pid).finish()
    }
}

impl Supervisor {
    /// Open a snapshot stream on `pid`. Fails only if the pid is unknown.
    pub fn open_stream(&self, pid: Pid) -> Result<SnapshotStream, CoreError> {
        self.registry.subscribe(pid).map(SnapshotStream::new)
    }
}
