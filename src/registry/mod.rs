// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Authoritative store of process records.
//!
//! Records live in a sharded map from pid to an `Arc`'d entry; each entry has
//! its own mutex, so writers to one process are serialized without touching
//! any other process. Every state or value change bumps the revision and is
//! published to the broker before the entry lock is released.
//!
//! Each record also owns an inbox. `send` hands a message to a suspended
//! process and resumes it in the same critical section; the executor drains
//! the inbox through `take_inbox`.

mod process;

pub use process::{ParsePidError, Pid, ProcessState, Snapshot};

use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;

use crate::broker::{NotificationBroker, Subscription};
use crate::errors::CoreError;
use crate::observability::messages::registry::{
    CapacityExceeded, MessageDelivered, ProcessCreated, ProcessRemoved, ProcessTerminated,
    ProcessUpdated,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{ModuleId, ModuleStore};

/// Mutable part of a process record, guarded by the entry mutex.
#[derive(Debug)]
struct ProcessRecord {
    state: ProcessState,
    value: Option<Value>,
    revision: u64,
    finished_at: Option<Instant>,
}

#[derive(Debug)]
struct ProcessEntry {
    pid: Pid,
    mid: ModuleId,
    name: Option<String>,
    created_at_ms: u64,
    record: Mutex<ProcessRecord>,
    inbox: mpsc::UnboundedSender<Value>,
    /// Receiving end of `inbox` until an executor takes it.
    mailbox: Mutex<Option<mpsc::UnboundedReceiver<Value>>>,
}

impl ProcessEntry {
    fn snapshot(&self, record: &ProcessRecord) -> Snapshot {
        Snapshot {
            pid: self.pid,
            mid: self.mid.clone(),
            name: self.name.clone(),
            state: record.state,
            value: record.value.clone(),
            revision: record.revision,
            created_at_ms: self.created_at_ms,
        }
    }
}

pub struct ProcessRegistry {
    processes: DashMap<Pid, Arc<ProcessEntry>>,
    modules: Arc<dyn ModuleStore>,
    broker: Arc<NotificationBroker>,
    next_pid: AtomicU64,
    /// Records currently held, counted separately from the map so capacity
    /// can be reserved before insertion.
    held: AtomicUsize,
    max_processes: usize,
}

impl ProcessRegistry {
    pub fn new(
        modules: Arc<dyn ModuleStore>,
        broker: Arc<NotificationBroker>,
        max_processes: usize,
    ) -> Self {
        Self {
            processes: DashMap::new(),
            modules,
            broker,
            next_pid: AtomicU64::new(1),
            held: AtomicUsize::new(0),
            max_processes,
        }
    }

    pub fn broker(&self) -> &Arc<NotificationBroker> {
        &self.broker
    }

    pub fn max_processes(&self) -> usize {
        self.max_processes
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    fn entry(&self, pid: Pid) -> Result<Arc<ProcessEntry>, CoreError> {
        self.processes
            .get(&pid)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(CoreError::ProcessNotFound(pid))
    }

    fn reserve_slot(&self) -> Result<(), CoreError> {
        let reserved = self
            .held
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |held| {
                (held < self.max_processes).then_some(held + 1)
            });
        reserved.map(|_| ()).map_err(|_| {
            CapacityExceeded {
                limit: self.max_processes,
            }
            .log();
            CoreError::ResourceExhausted {
                limit: self.max_processes,
            }
        })
    }

    /// Allocate a fresh pid and insert a `Running` record at revision 0.
    ///
    /// The record is visible to `get` and `subscribe` as soon as this returns.
    pub fn create(&self, mid: &ModuleId, name: Option<String>) -> Result<Pid, CoreError> {
        if !self.modules.contains(mid) {
            return Err(CoreError::ModuleNotFound(mid.clone()));
        }
        self.reserve_slot()?;

        let pid = Pid::from_raw(self.next_pid.fetch_add(1, Ordering::Relaxed));
        let (inbox, mailbox) = mpsc::unbounded_channel();
        let entry = Arc::new(ProcessEntry {
            pid,
            mid: mid.clone(),
            name,
            created_at_ms: now_ms(),
            record: Mutex::new(ProcessRecord {
                state: ProcessState::Running,
                value: None,
                revision: 0,
                finished_at: None,
            }),
            inbox,
            mailbox: Mutex::new(Some(mailbox)),
        });
        self.processes.insert(pid, entry);

        ProcessCreated { pid, mid }.log();
        Ok(pid)
    }

    /// Latest committed snapshot.
    pub fn get(&self, pid: Pid) -> Result<Snapshot, CoreError> {
        let entry = self.entry(pid)?;
        let record = entry.record.lock();
        Ok(entry.snapshot(&record))
    }

    /// Replace the value of a live process, keeping its state.
    pub fn update_value(&self, pid: Pid, value: Value) -> Result<Snapshot, CoreError> {
        let entry = self.entry(pid)?;
        let mut record = entry.record.lock();
        if record.state.is_terminal() {
            return Err(CoreError::InvalidTransition {
                pid,
                from: record.state,
                to: record.state,
            });
        }

        record.value = Some(value);
        record.revision += 1;
        let snapshot = entry.snapshot(&record);
        self.broker.publish(&snapshot);

        ProcessUpdated {
            pid,
            state: snapshot.state,
            revision: snapshot.revision,
        }
        .log();
        Ok(snapshot)
    }

    /// Move a live process between `Running` and `Suspended`, optionally
    /// replacing its value. Terminal states go through `mark_terminal`.
    pub fn set_state(
        &self,
        pid: Pid,
        state: ProcessState,
        value: Option<Value>,
    ) -> Result<Snapshot, CoreError> {
        let entry = self.entry(pid)?;
        let mut record = entry.record.lock();
        if record.state.is_terminal() || state.is_terminal() || record.state == state {
            return Err(CoreError::InvalidTransition {
                pid,
                from: record.state,
                to: state,
            });
        }

        record.state = state;
        if value.is_some() {
            record.value = value;
        }
        record.revision += 1;
        let snapshot = entry.snapshot(&record);
        self.broker.publish(&snapshot);

        ProcessUpdated {
            pid,
            state: snapshot.state,
            revision: snapshot.revision,
        }
        .log();
        Ok(snapshot)
    }

    /// Freeze a process in `final_state` with `value`, publish the terminal
    /// snapshot and close every subscription on it. Allowed once per process.
    pub fn mark_terminal(
        &self,
        pid: Pid,
        final_state: ProcessState,
        value: Value,
    ) -> Result<Snapshot, CoreError> {
        let entry = self.entry(pid)?;
        let mut record = entry.record.lock();
        if record.state.is_terminal() || !final_state.is_terminal() {
            return Err(CoreError::InvalidTransition {
                pid,
                from: record.state,
                to: final_state,
            });
        }

        record.state = final_state;
        record.value = Some(value);
        record.revision += 1;
        record.finished_at = Some(Instant::now());
        let snapshot = entry.snapshot(&record);
        let delivered = self.broker.close(&snapshot);

        ProcessTerminated {
            pid,
            state: final_state,
            revision: snapshot.revision,
            subscribers: delivered,
        }
        .log();
        Ok(snapshot)
    }

    /// Deliver `message` to a suspended process and resume it.
    ///
    /// The process moves to `Running` with the message as its value, and the
    /// message is queued on its inbox, under one entry lock. Anything but a
    /// `Suspended` process is an invalid transition; a process whose executor
    /// no longer reads its inbox answers `InboxClosed` and stays suspended.
    pub fn send(&self, pid: Pid, message: Value) -> Result<Snapshot, CoreError> {
        let entry = self.entry(pid)?;
        let mut record = entry.record.lock();
        if record.state != ProcessState::Suspended {
            return Err(CoreError::InvalidTransition {
                pid,
                from: record.state,
                to: ProcessState::Running,
            });
        }
        if entry.inbox.send(message.clone()).is_err() {
            return Err(CoreError::InboxClosed(pid));
        }

        record.state = ProcessState::Running;
        record.value = Some(message);
        record.revision += 1;
        let snapshot = entry.snapshot(&record);
        self.broker.publish(&snapshot);

        MessageDelivered {
            pid,
            revision: snapshot.revision,
        }
        .log();
        Ok(snapshot)
    }

    /// Hand the receiving end of a process's inbox to its executor. Only the
    /// first call gets it.
    pub(crate) fn take_inbox(&self, pid: Pid) -> Option<mpsc::UnboundedReceiver<Value>> {
        let entry = self.entry(pid).ok()?;
        let inbox = entry.mailbox.lock().take();
        inbox
    }

    /// Subscribe to a process.
    ///
    /// The current snapshot is read and the subscriber registered under the
    /// same entry lock that every publication takes, so no event can slip in
    /// between. A terminal process yields its final snapshot once and ends.
    pub fn subscribe(&self, pid: Pid) -> Result<Subscription, CoreError> {
        let entry = self.entry(pid)?;
        let record = entry.record.lock();
        let current = entry.snapshot(&record);
        if current.is_terminal() {
            return Ok(self.broker.attach_finished(current));
        }
        Ok(self.broker.attach(&current))
    }

    /// Snapshots of every held process, ordered by pid.
    pub fn list(&self) -> Vec<Snapshot> {
        let entries: Vec<Arc<ProcessEntry>> = self
            .processes
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut snapshots: Vec<Snapshot> = entries
            .iter()
            .map(|entry| entry.snapshot(&entry.record.lock()))
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.pid);
        snapshots
    }

    /// Delete a terminal process record.
    pub fn remove(&self, pid: Pid) -> Result<Snapshot, CoreError> {
        let entry = self.entry(pid)?;
        let snapshot = {
            let record = entry.record.lock();
            if !record.state.is_terminal() {
                return Err(CoreError::InvalidTransition {
                    pid,
                    from: record.state,
                    to: record.state,
                });
            }
            entry.snapshot(&record)
        };

        if self.processes.remove(&pid).is_some() {
            self.release_slot(pid, "deleted");
        }
        Ok(snapshot)
    }

    /// Remove terminal records whose terminal transition happened at least
    /// `ttl` ago. Returns the evicted pids.
    pub fn evict_expired(&self, ttl: Duration) -> Vec<Pid> {
        let expired: Vec<Pid> = self
            .processes
            .iter()
            .filter(|entry| {
                entry
                    .record
                    .lock()
                    .finished_at
                    .is_some_and(|finished| finished.elapsed() >= ttl)
            })
            .map(|entry| *entry.key())
            .collect();

        let mut evicted = Vec::with_capacity(expired.len());
        for pid in expired {
            if self.processes.remove(&pid).is_some() {
                self.release_slot(pid, "expired");
                evicted.push(pid);
            }
        }
        evicted
    }

    fn release_slot(&self, pid: Pid, reason: &'static str) {
        self.held.fetch_sub(1, Ordering::AcqRel);
        self.broker.forget(pid);
        ProcessRemoved { pid, reason }.log();
    }
}

impl std::fmt::Debug for ProcessRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessRegistry")
            .field("processes", &self.processes.len())
            .field("max_processes", &self.max_processes)
            .finish()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
