// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bounded per-subscriber delivery queue.
//!
//! Events are whole snapshots, so when a slow consumer lets the queue fill up
//! the oldest queued snapshot is discarded and the newest kept. A terminal
//! snapshot is always accepted: it is the last thing ever pushed, so the
//! queue can only hold non-terminal snapshots at that point and one of them
//! makes room.

use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::Notify;

use crate::registry::Snapshot;

/// Result of offering a snapshot to a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Appended without displacing anything
    Delivered,
    /// Appended after dropping the oldest queued snapshot
    Coalesced,
    /// The queue is cancelled or already holds its terminal snapshot
    Rejected,
}

/// Result of a non-blocking receive
#[derive(Debug, Clone, PartialEq)]
pub enum TryRecv {
    Ready(Snapshot),
    /// Nothing queued yet; more may arrive
    Empty,
    /// Terminal snapshot already taken, or the queue was cancelled
    Ended,
}

#[derive(Debug, Default)]
struct QueueState {
    events: VecDeque<Snapshot>,
    /// A terminal snapshot has been queued; nothing else may follow it.
    finished: bool,
    /// The consumer went away; drop everything.
    cancelled: bool,
}

/// Single-consumer queue shared between the broker (producer side) and one
/// `Subscription` (consumer side).
#[derive(Debug)]
pub struct DeliveryQueue {
    state: Mutex<QueueState>,
    ready: Notify,
    capacity: usize,
}

impl DeliveryQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            ready: Notify::new(),
            capacity: capacity.max(1),
        }
    }

    /// A queue that yields `snapshot` once and then ends.
    pub fn finished_with(snapshot: Snapshot) -> Self {
        let queue = Self::new(1);
        {
            let mut state = queue.state.lock();
            state.events.push_back(snapshot);
            state.finished = true;
        }
        queue
    }

    pub fn push(&self, snapshot: Snapshot) -> PushOutcome {
        let outcome = {
            let mut state = self.state.lock();
            if state.cancelled || state.finished {
                return PushOutcome::Rejected;
            }

            let mut outcome = PushOutcome::Delivered;
            if state.events.len() >= self.capacity {
                state.events.pop_front();
                outcome = PushOutcome::Coalesced;
            }
            if snapshot.is_terminal() {
                state.finished = true;
            }
            state.events.push_back(snapshot);
            outcome
        };
        self.ready.notify_one();
        outcome
    }

    /// Drop queued snapshots and refuse new ones. Idempotent.
    pub fn cancel(&self) {
        {
            let mut state = self.state.lock();
            state.cancelled = true;
            state.events.clear();
        }
        self.ready.notify_one();
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.lock().cancelled
    }

    pub fn try_recv(&self) -> TryRecv {
        let mut state = self.state.lock();
        if state.cancelled {
            return TryRecv::Ended;
        }
        match state.events.pop_front() {
            Some(snapshot) => TryRecv::Ready(snapshot),
            None if state.finished => TryRecv::Ended,
            None => TryRecv::Empty,
        }
    }

    /// Wait for the next snapshot. `None` once the terminal snapshot has been
    /// taken or the queue was cancelled.
    pub async fn recv(&self) -> Option<Snapshot> {
        loop {
            match self.try_recv() {
                TryRecv::Ready(snapshot) => return Some(snapshot),
                TryRecv::Ended => return None,
                // One consumer per queue, so a stored `notify_one` permit can
                // never be taken by anyone else.
                TryRecv::Empty => self.ready.notified().await,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Pid, ProcessState};
    use crate::traits::ModuleId;
    use serde_json::json;

    fn snapshot(revision: u64, state: ProcessState) -> Snapshot {
        Snapshot {
            pid: Pid::from_raw(1),
            mid: ModuleId::from("m1"),
            name: None,
            state,
            value: Some(json!(revision)),
            revision,
            created_at_ms: 0,
        }
    }

    #[tokio::test]
    async fn test_delivers_in_push_order() {
        let queue = DeliveryQueue::new(8);
        for revision in 1..=3 {
            assert_eq!(queue.push(snapshot(revision, ProcessState::Running)), PushOutcome::Delivered);
        }

        for revision in 1..=3 {
            assert_eq!(queue.recv().await.unwrap().revision, revision);
        }
        assert_eq!(queue.try_recv(), TryRecv::Empty);
    }

    #[tokio::test]
    async fn test_overflow_keeps_newest() {
        let queue = DeliveryQueue::new(2);
        queue.push(snapshot(1, ProcessState::Running));
        queue.push(snapshot(2, ProcessState::Running));
        assert_eq!(queue.push(snapshot(3, ProcessState::Running)), PushOutcome::Coalesced);

        assert_eq!(queue.recv().await.unwrap().revision, 2);
        assert_eq!(queue.recv().await.unwrap().revision, 3);
    }

    #[tokio::test]
    async fn test_terminal_displaces_and_ends_queue() {
        let queue = DeliveryQueue::new(1);
        queue.push(snapshot(1, ProcessState::Running));
        assert_eq!(queue.push(snapshot(2, ProcessState::Completed)), PushOutcome::Coalesced);
        assert_eq!(queue.push(snapshot(3, ProcessState::Running)), PushOutcome::Rejected);

        let last = queue.recv().await.unwrap();
        assert_eq!(last.revision, 2);
        assert_eq!(last.state, ProcessState::Completed);
        assert!(queue.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_cancel_drops_pending_and_rejects_pushes() {
        let queue = DeliveryQueue::new(4);
        queue.push(snapshot(1, ProcessState::Running));
        queue.cancel();
        queue.cancel();

        assert!(queue.is_cancelled());
        assert_eq!(queue.push(snapshot(2, ProcessState::Completed)), PushOutcome::Rejected);
        assert!(queue.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_recv_wakes_on_push_from_another_task() {
        let queue = std::sync::Arc::new(DeliveryQueue::new(4));
        let producer = std::sync::Arc::clone(&queue);

        let waiter = tokio::spawn(async move { queue.recv().await });
        tokio::task::yield_now().await;
        producer.push(snapshot(5, ProcessState::Running));

        let received = waiter.await.unwrap().unwrap();
        assert_eq!(received.revision, 5);
    }

    #[tokio::test]
    async fn test_finished_with_yields_once() {
        let queue = DeliveryQueue::finished_with(snapshot(9, ProcessState::Failed));
        assert_eq!(queue.recv().await.unwrap().revision, 9);
        assert!(queue.recv().await.is_none());
    }
}
