// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::sync::{Arc, Weak};

use crate::broker::queue::{DeliveryQueue, TryRecv};
use crate::broker::NotificationBroker;
use crate::registry::{Pid, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Detached reference to a subscription, usable to cancel it from elsewhere
/// via `NotificationBroker::unsubscribe`.
#[derive(Debug, Clone)]
pub struct SubscriptionHandle {
    pub(crate) pid: Pid,
    pub(crate) id: SubscriptionId,
    pub(crate) queue: Weak<DeliveryQueue>,
}

impl SubscriptionHandle {
    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

/// A watcher's live registration on one process.
///
/// Yields the snapshot current at subscription time first, then every
/// published snapshot in order, ending after the terminal one. Each
/// subscription has its own queue, so cancelling or dropping one never
/// affects another watcher of the same process. Dropping unsubscribes.
pub struct Subscription {
    handle: SubscriptionHandle,
    queue: Arc<DeliveryQueue>,
    broker: Option<Arc<NotificationBroker>>,
}

impl Subscription {
    pub(crate) fn attached(
        handle: SubscriptionHandle,
        queue: Arc<DeliveryQueue>,
        broker: Arc<NotificationBroker>,
    ) -> Self {
        Self {
            handle,
            queue,
            broker: Some(broker),
        }
    }

    /// Subscription to an already terminal process: one snapshot, then done.
    pub(crate) fn finished(id: SubscriptionId, snapshot: Snapshot) -> Self {
        let queue = Arc::new(DeliveryQueue::finished_with(snapshot.clone()));
        Self {
            handle: SubscriptionHandle {
                pid: snapshot.pid,
                id,
                queue: Arc::downgrade(&queue),
            },
            queue,
            broker: None,
        }
    }

    pub fn pid(&self) -> Pid {
        self.handle.pid
    }

    pub fn id(&self) -> SubscriptionId {
        self.handle.id
    }

    pub fn handle(&self) -> SubscriptionHandle {
        self.handle.clone()
    }

    /// Next snapshot, or `None` once the subscription has ended.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.queue.recv().await
    }

    /// Next snapshot if one is already queued.
    pub fn try_next(&mut self) -> TryRecv {
        self.queue.try_recv()
    }

    /// Stop receiving events. Safe to call repeatedly, and safe to race a
    /// terminal publication.
    pub fn cancel(&mut self) {
        match self.broker.take() {
            Some(broker) => broker.unsubscribe(&self.handle),
            None => self.queue.cancel(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.queue.is_cancelled()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("pid", &self.handle.pid)
            .field("id", &self.handle.id)
            .field("queued", &self.queue.len())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
