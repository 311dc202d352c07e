// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for notification broker events.

use std::fmt::{Display, Formatter};

use crate::broker::SubscriptionId;
use crate::observability::messages::StructuredLog;
use crate::registry::{Pid, ProcessState};

pub struct SubscriberAttached {
    pub pid: Pid,
    pub subscription: SubscriptionId,
    pub subscriber_count: usize,
}

impl Display for SubscriberAttached {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Subscriber {} attached to process {} ({} total)",
            self.subscription, self.pid, self.subscriber_count
        )
    }
}

impl StructuredLog for SubscriberAttached {
    fn log(&self) {
        tracing::debug!(
            pid = %self.pid,
            subscription = %self.subscription,
            subscriber_count = self.subscriber_count,
            "{}", self
        );
    }
}

pub struct SubscriberDetached {
    pub pid: Pid,
    pub subscription: SubscriptionId,
}

impl Display for SubscriberDetached {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Subscriber {} detached from process {}",
            self.subscription, self.pid
        )
    }
}

impl StructuredLog for SubscriberDetached {
    fn log(&self) {
        tracing::debug!(pid = %self.pid, subscription = %self.subscription, "{}", self);
    }
}

/// Slow subscribers had an older snapshot dropped to make room.
///
/// # Log Level
/// `debug!` - Expected under load; snapshots supersede each other
pub struct EventsCoalesced {
    pub pid: Pid,
    pub revision: u64,
    pub subscriber_count: usize,
}

impl Display for EventsCoalesced {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Coalesced queued snapshots for {} slow subscriber(s) of process {} at revision {}",
            self.subscriber_count, self.pid, self.revision
        )
    }
}

impl StructuredLog for EventsCoalesced {
    fn log(&self) {
        tracing::debug!(
            pid = %self.pid,
            revision = self.revision,
            subscriber_count = self.subscriber_count,
            "{}", self
        );
    }
}

pub struct TopicClosed {
    pub pid: Pid,
    pub state: ProcessState,
    pub delivered: usize,
}

impl Display for TopicClosed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Closed subscriptions on process {}: {:?} delivered to {} subscriber(s)",
            self.pid, self.state, self.delivered
        )
    }
}

impl StructuredLog for TopicClosed {
    fn log(&self) {
        tracing::debug!(
            pid = %self.pid,
            state = ?self.state,
            delivered = self.delivered,
            "{}", self
        );
    }
}
