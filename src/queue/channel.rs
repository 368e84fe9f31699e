//! In-process priority channel.
//!
//! One FIFO bucket per priority level plus a condition variable signalled on
//! every send. Each method is a single atomic step under the channel mutex;
//! multi-step protocols (the probe-then-wait receive) live in
//! [`PriorityQueue`](super::PriorityQueue).

use super::WorkItem;
use crate::core::{Priority, Result, WorkqError, PRIORITY_LEVELS};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

struct ChannelInner {
    buckets: Vec<VecDeque<WorkItem>>,
    len: usize,
    removed: bool,
}

impl ChannelInner {
    fn pop_highest(&mut self) -> Option<WorkItem> {
        let item = self.buckets.iter_mut().find_map(VecDeque::pop_front)?;
        self.len -= 1;
        Some(item)
    }
}

/// A priority-ordered delivery channel shared by every handle attached to it
pub(crate) struct Channel {
    id: Uuid,
    inner: Mutex<ChannelInner>,
    available: Condvar,
    /// Live channel counter of the owning registry
    slots: Arc<AtomicUsize>,
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("len", &inner.len)
            .field("removed", &inner.removed)
            .finish()
    }
}

impl Channel {
    /// Create a channel occupying one already-reserved registry slot
    pub(crate) fn new(slots: Arc<AtomicUsize>) -> Self {
        Self {
            id: Uuid::new_v4(),
            inner: Mutex::new(ChannelInner {
                buckets: (0..PRIORITY_LEVELS).map(|_| VecDeque::new()).collect(),
                len: 0,
                removed: false,
            }),
            available: Condvar::new(),
            slots,
        }
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    /// Enqueue one item and wake a waiting receiver
    pub(crate) fn send(&self, item: WorkItem) -> Result<()> {
        {
            let mut inner = self.inner.lock();
            if inner.removed {
                return Err(WorkqError::invalid_handle("queue"));
            }
            inner.buckets[item.priority().index()].push_back(item);
            inner.len += 1;
        }
        self.available.notify_one();
        Ok(())
    }

    /// Non-blocking receive of the oldest item at exactly `priority`
    pub(crate) fn try_recv_at(&self, priority: Priority) -> Result<Option<WorkItem>> {
        let mut inner = self.inner.lock();
        if inner.removed {
            return Err(WorkqError::invalid_handle("queue"));
        }
        let item = inner.buckets[priority.index()].pop_front();
        if item.is_some() {
            inner.len -= 1;
        }
        Ok(item)
    }

    /// Block until an item of any priority is available, then return the most
    /// urgent one. Returns `Ok(None)` only when `deadline` passes first.
    pub(crate) fn recv_any(&self, deadline: Option<Instant>) -> Result<Option<WorkItem>> {
        let mut inner = self.inner.lock();
        loop {
            if inner.removed {
                return Err(WorkqError::invalid_handle("queue"));
            }
            if let Some(item) = inner.pop_highest() {
                return Ok(Some(item));
            }
            match deadline {
                Some(deadline) => {
                    if self.available.wait_until(&mut inner, deadline).timed_out() {
                        if inner.removed {
                            return Err(WorkqError::invalid_handle("queue"));
                        }
                        return Ok(inner.pop_highest());
                    }
                }
                None => self.available.wait(&mut inner),
            }
        }
    }

    /// Remove the channel, discarding pending items and waking all receivers.
    ///
    /// Returns `false` if the channel was already removed.
    pub(crate) fn remove(&self) -> bool {
        let discarded = {
            let mut inner = self.inner.lock();
            if inner.removed {
                return false;
            }
            inner.removed = true;
            inner.buckets.iter_mut().for_each(VecDeque::clear);
            std::mem::take(&mut inner.len)
        };
        self.slots.fetch_sub(1, Ordering::AcqRel);
        self.available.notify_all();
        log::debug!("channel {}: removed, {} items discarded", self.id, discarded);
        true
    }

    pub(crate) fn is_removed(&self) -> bool {
        self.inner.lock().removed
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().len
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        // A private channel dropped without destroy still gives its slot back
        if !self.inner.get_mut().removed {
            self.slots.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    fn item(payload: &str, level: u32) -> WorkItem {
        WorkItem::new(Priority::new(level).unwrap(), payload.as_bytes().to_vec())
    }

    fn channel() -> (Channel, Arc<AtomicUsize>) {
        let slots = Arc::new(AtomicUsize::new(1));
        (Channel::new(Arc::clone(&slots)), slots)
    }

    #[test]
    fn test_try_recv_at_exact_level() {
        let (channel, _) = channel();
        channel.send(item("low", 9)).unwrap();

        assert!(channel.try_recv_at(Priority::HIGHEST).unwrap().is_none());
        let got = channel.try_recv_at(Priority::new(9).unwrap()).unwrap();
        assert_eq!(got.unwrap().payload(), b"low");
        assert_eq!(channel.len(), 0);
    }

    #[test]
    fn test_recv_any_returns_most_urgent() {
        let (channel, _) = channel();
        channel.send(item("b", 7)).unwrap();
        channel.send(item("a", 2)).unwrap();

        let got = channel.recv_any(None).unwrap().unwrap();
        assert_eq!(got.payload(), b"a");
    }

    #[test]
    fn test_recv_any_deadline() {
        let (channel, _) = channel();
        let deadline = Instant::now() + Duration::from_millis(20);
        assert!(channel.recv_any(Some(deadline)).unwrap().is_none());
        assert!(Instant::now() >= deadline);
    }

    #[test]
    fn test_remove_wakes_receiver() {
        let (channel, slots) = channel();
        let channel = Arc::new(channel);
        let receiver = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.recv_any(None))
        };

        thread::sleep(Duration::from_millis(20));
        assert!(channel.remove());
        assert!(!channel.remove());

        let result = receiver.join().unwrap();
        assert!(matches!(result, Err(WorkqError::InvalidHandle { .. })));
        assert_eq!(slots.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_drop_releases_slot_once() {
        let (channel, slots) = channel();
        drop(channel);
        assert_eq!(slots.load(Ordering::SeqCst), 0);

        let (channel, slots) = self::channel();
        channel.remove();
        drop(channel);
        assert_eq!(slots.load(Ordering::SeqCst), 0);
    }
}
