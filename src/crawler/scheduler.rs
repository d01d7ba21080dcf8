//! Scheduler for queued transfers
//!
//! This module handles:
//! - The FIFO of transfers waiting for a slot
//! - The concurrency cap, enforced with a semaphore whose permits travel
//!   with the spawned transfer and free the slot when it ends

use crate::link::Link;
use crate::state::TransferState;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A transfer waiting for a concurrency slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedTransfer {
    /// Identifier unique within one orchestrator
    pub id: u64,

    /// Index of the session the transfer belongs to
    pub session: usize,

    pub link: Link,

    /// Depth recorded for the link when it was scheduled
    pub depth: i32,

    pub state: TransferState,
}

/// A transfer allowed to start, with the permit holding its slot
#[derive(Debug)]
pub struct ScheduledTransfer {
    pub transfer: QueuedTransfer,
    pub permit: OwnedSemaphorePermit,
}

/// Pending queue and concurrency cap shared by every session of a task
pub struct Scheduler {
    semaphore: Arc<Semaphore>,
    pending: VecDeque<QueuedTransfer>,
    capacity: usize,
}

impl Scheduler {
    /// Creates a scheduler allowing `capacity` transfers in flight
    ///
    /// The capacity is clamped to `1..=Semaphore::MAX_PERMITS`.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            pending: VecDeque::new(),
            capacity,
        }
    }

    pub fn enqueue(&mut self, transfer: QueuedTransfer) {
        self.pending.push_back(transfer);
    }

    /// Pops the oldest queued transfer if a slot is free
    ///
    /// Never waits: with no free slot or an empty queue it returns `None`.
    pub fn try_next(&mut self) -> Option<ScheduledTransfer> {
        if self.pending.is_empty() {
            return None;
        }

        let permit = Arc::clone(&self.semaphore).try_acquire_owned().ok()?;
        let transfer = self.pending.pop_front()?;

        Some(ScheduledTransfer { transfer, permit })
    }

    /// Removes every queued transfer, oldest first
    pub fn drain_pending(&mut self) -> Vec<QueuedTransfer> {
        self.pending.drain(..).collect()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Slots not held by a running transfer
    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
