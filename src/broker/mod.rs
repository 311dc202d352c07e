// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-process publish/subscribe fan-out of snapshot events.
//!
//! The broker keeps, for every live process that has watchers, the set of
//! subscriber queues. It never reads process state itself: the registry hands
//! it the snapshot to deliver, and calls `attach`, `publish` and `close` while
//! holding that process's entry lock. That is what makes "read current
//! snapshot, then register" atomic with respect to publications, and what
//! makes delivery order equal revision order.
//!
//! Lock order is always registry entry -> topic shard -> delivery queue.
//! Nothing here blocks on a consumer: a full queue coalesces instead.

mod queue;
mod subscription;

pub use queue::{DeliveryQueue, PushOutcome, TryRecv};
pub use subscription::{Subscription, SubscriptionHandle, SubscriptionId};

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::observability::messages::broker::{
    EventsCoalesced, SubscriberAttached, SubscriberDetached, TopicClosed,
};
use crate::observability::messages::StructuredLog;
use crate::registry::{Pid, Snapshot};

type Topic = HashMap<SubscriptionId, Arc<DeliveryQueue>>;

pub struct NotificationBroker {
    topics: DashMap<Pid, Topic>,
    next_subscription: AtomicU64,
    queue_capacity: usize,
}

impl NotificationBroker {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            topics: DashMap::new(),
            next_subscription: AtomicU64::new(1),
            queue_capacity: queue_capacity.max(1),
        }
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed))
    }

    /// Register a new subscriber on a live process, seeded with `current` as
    /// its synthetic first event.
    ///
    /// Must be called with the process's registry entry locked.
    pub(crate) fn attach(self: &Arc<Self>, current: &Snapshot) -> Subscription {
        let id = self.next_id();
        let queue = Arc::new(DeliveryQueue::new(self.queue_capacity));
        queue.push(current.clone());

        let subscriber_count = {
            let mut topic = self.topics.entry(current.pid).or_default();
            topic.insert(id, Arc::clone(&queue));
            topic.len()
        };

        SubscriberAttached {
            pid: current.pid,
            subscription: id,
            subscriber_count,
        }
        .log();

        let handle = SubscriptionHandle {
            pid: current.pid,
            id,
            queue: Arc::downgrade(&queue),
        };
        Subscription::attached(handle, queue, Arc::clone(self))
    }

    /// Subscription for a process that already reached its terminal state.
    pub(crate) fn attach_finished(&self, terminal: Snapshot) -> Subscription {
        Subscription::finished(self.next_id(), terminal)
    }

    /// Deliver a non-terminal snapshot to every subscriber of its process.
    ///
    /// Must be called with the process's registry entry locked.
    pub(crate) fn publish(&self, snapshot: &Snapshot) {
        let Some(topic) = self.topics.get(&snapshot.pid) else {
            return;
        };

        let mut coalesced = 0usize;
        for queue in topic.values() {
            if queue.push(snapshot.clone()) == PushOutcome::Coalesced {
                coalesced += 1;
            }
        }
        drop(topic);

        if coalesced > 0 {
            EventsCoalesced {
                pid: snapshot.pid,
                revision: snapshot.revision,
                subscriber_count: coalesced,
            }
            .log();
        }
    }

    /// Deliver the terminal snapshot to every subscriber, then tear down the
    /// subscriber set. Returns how many subscribers received it.
    ///
    /// Must be called with the process's registry entry locked.
    pub(crate) fn close(&self, terminal: &Snapshot) -> usize {
        let Some((_, topic)) = self.topics.remove(&terminal.pid) else {
            return 0;
        };

        let delivered = topic
            .values()
            .filter(|queue| queue.push(terminal.clone()) != PushOutcome::Rejected)
            .count();

        TopicClosed {
            pid: terminal.pid,
            state: terminal.state,
            delivered,
        }
        .log();
        delivered
    }

    /// Cancel a subscription. Idempotent, and safe after the subscription has
    /// already been closed by a terminal event.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) {
        let removed = self
            .topics
            .get_mut(&handle.pid)
            .and_then(|mut topic| topic.remove(&handle.id))
            .is_some();

        // Drop the topic entry once its last subscriber leaves.
        self.topics
            .remove_if(&handle.pid, |_, topic| topic.is_empty());

        if let Some(queue) = handle.queue.upgrade() {
            queue.cancel();
        }

        if removed {
            SubscriberDetached {
                pid: handle.pid,
                subscription: handle.id,
            }
            .log();
        }
    }

    /// Drop any subscriber set left for a process that is being removed.
    pub(crate) fn forget(&self, pid: Pid) {
        if let Some((_, topic)) = self.topics.remove(&pid) {
            for queue in topic.values() {
                queue.cancel();
            }
        }
    }

    pub fn subscriber_count(&self, pid: Pid) -> usize {
        self.topics.get(&pid).map(|topic| topic.len()).unwrap_or(0)
    }

    /// Number of processes that currently have at least one subscriber.
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }
}

impl std::fmt::Debug for NotificationBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBroker")
            .field("topics", &self.topics.len())
            .field("queue_capacity", &self.queue_capacity)
            .finish()
    }
}
