//! Priority-ordered work queue handle

use super::channel::Channel;
use super::registry::{QueueRegistry, Registration};
use crate::core::{Priority, Result, WorkqError, MAX_PAYLOAD};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A unit of work: a bounded payload tagged with a priority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedWorkItem")]
pub struct WorkItem {
    priority: Priority,
    payload: Vec<u8>,
}

/// Wire form of a [`WorkItem`] before the payload limit is checked
#[derive(Deserialize)]
struct UncheckedWorkItem {
    priority: Priority,
    payload: Vec<u8>,
}

impl TryFrom<UncheckedWorkItem> for WorkItem {
    type Error = WorkqError;

    fn try_from(item: UncheckedWorkItem) -> Result<Self> {
        if item.payload.len() > MAX_PAYLOAD {
            return Err(WorkqError::payload_too_large(item.payload.len(), MAX_PAYLOAD));
        }
        Ok(Self::new(item.priority, item.payload))
    }
}

impl WorkItem {
    pub(crate) fn new(priority: Priority, payload: Vec<u8>) -> Self {
        Self { priority, payload }
    }

    /// Priority the item was enqueued with
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Payload bytes
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload size in bytes
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Check if the payload is empty
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Take ownership of the payload
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

/// A handle to a priority channel.
///
/// Items are delivered most urgent first ([`Priority::HIGHEST`] = 1) and in
/// submission order within a level. Receivers block while the channel is
/// empty instead of polling.
///
/// Several handles may share one channel through a [`QueueRegistry`]. Sends
/// are serialized per handle, as are receives, so a multi-level scan is never
/// interleaved with another scan through the same handle.
///
/// # Example
///
/// ```rust
/// use rust_workq::prelude::*;
///
/// # fn main() -> Result<()> {
/// let queue = PriorityQueue::init(None, 0)?;
/// queue.add(b"later", 8)?;
/// queue.add(b"now", 2)?;
///
/// assert_eq!(queue.get()?.payload(), b"now");
/// assert_eq!(queue.get()?.payload(), b"later");
/// queue.destroy()?;
/// # Ok(())
/// # }
/// ```
pub struct PriorityQueue {
    channel: Arc<Channel>,
    registration: Option<Registration>,
    alive: AtomicBool,
    send_lock: Mutex<()>,
    recv_lock: Mutex<()>,
}

impl std::fmt::Debug for PriorityQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriorityQueue")
            .field("channel", &self.channel)
            .field("alive", &self.alive.load(Ordering::Relaxed))
            .finish()
    }
}

impl PriorityQueue {
    /// Create or attach to a queue through the process-wide registry.
    ///
    /// See [`QueueRegistry::init`].
    pub fn init(key: Option<&str>, subsystem_id: i32) -> Result<Self> {
        QueueRegistry::global().init(key, subsystem_id)
    }

    pub(crate) fn attach(channel: Arc<Channel>, registration: Option<Registration>) -> Self {
        Self {
            channel,
            registration,
            alive: AtomicBool::new(true),
            send_lock: Mutex::new(()),
            recv_lock: Mutex::new(()),
        }
    }

    /// Identifier of the underlying channel
    pub fn channel_id(&self) -> Uuid {
        self.channel.id()
    }

    /// Check if this handle and its channel are still usable
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire) && !self.channel.is_removed()
    }

    fn check_alive(&self) -> Result<()> {
        if self.is_alive() {
            Ok(())
        } else {
            Err(WorkqError::invalid_handle("queue"))
        }
    }

    /// Enqueue a copy of `payload` at `priority`.
    ///
    /// # Errors
    ///
    /// - `WorkqError::InvalidHandle` - the queue has been destroyed
    /// - `WorkqError::PayloadTooLarge` - `payload` exceeds [`MAX_PAYLOAD`]; nothing is enqueued
    /// - `WorkqError::InvalidPriority` - `priority` is outside `1..=PRIORITY_LEVELS`
    pub fn add(&self, payload: &[u8], priority: u32) -> Result<()> {
        self.check_alive()?;
        if payload.len() > MAX_PAYLOAD {
            return Err(WorkqError::payload_too_large(payload.len(), MAX_PAYLOAD));
        }
        let priority = Priority::new(priority)?;

        let _send = self.send_lock.lock();
        self.channel
            .send(WorkItem::new(priority, payload.to_vec()))?;

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_enqueue(priority.value(), self.channel.len());
        Ok(())
    }

    /// Take the most urgent pending item, blocking while the queue is empty.
    ///
    /// Levels are probed from most to least urgent without blocking; only when
    /// every level is empty does the call wait for the next item of any
    /// priority.
    ///
    /// # Errors
    ///
    /// - `WorkqError::InvalidHandle` - the queue was destroyed before or while waiting
    pub fn get(&self) -> Result<WorkItem> {
        self.receive(None)?
            .ok_or_else(|| WorkqError::other("blocking receive returned without an item"))
    }

    /// Take the most urgent pending item without blocking
    pub fn try_get(&self) -> Result<Option<WorkItem>> {
        self.check_alive()?;
        let _recv = self.recv_lock.lock();
        self.probe()
    }

    /// Take the most urgent pending item, waiting at most `timeout`
    pub fn get_timeout(&self, timeout: Duration) -> Result<Option<WorkItem>> {
        self.receive(Some(Instant::now() + timeout))
    }

    fn receive(&self, deadline: Option<Instant>) -> Result<Option<WorkItem>> {
        self.check_alive()?;
        let _recv = self.recv_lock.lock();

        if let Some(item) = self.probe()? {
            return Ok(Some(item));
        }
        self.channel.recv_any(deadline)
    }

    fn probe(&self) -> Result<Option<WorkItem>> {
        for priority in Priority::all() {
            if let Some(item) = self.channel.try_recv_at(priority)? {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }

    /// Number of pending items
    pub fn len(&self) -> usize {
        self.channel.len()
    }

    /// Check if no items are pending
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove the underlying channel, discarding pending items, and drop its
    /// registry address.
    ///
    /// Blocked receivers wake with `InvalidHandle`, and every other handle
    /// attached to the same channel becomes invalid too.
    ///
    /// # Errors
    ///
    /// - `WorkqError::InvalidHandle` - the queue was already destroyed
    pub fn destroy(&self) -> Result<()> {
        if !self.alive.swap(false, Ordering::AcqRel) {
            return Err(WorkqError::invalid_handle("queue"));
        }
        let removed = self.channel.remove();
        if let Some(registration) = &self.registration {
            registration.release(&self.channel);
        }
        if removed {
            Ok(())
        } else {
            Err(WorkqError::invalid_handle("queue"))
        }
    }
}
