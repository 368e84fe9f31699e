//! Resolution of `(key, subsystem_id)` addresses to shared channels

use super::channel::Channel;
use super::PriorityQueue;
use crate::core::{Result, WorkqError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, Weak};

/// Limits applied by a [`QueueRegistry`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of live channels, private ones included
    pub max_queues: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { max_queues: 32_000 }
    }
}

impl QueueConfig {
    /// Set the maximum number of live channels
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_queues(mut self, max_queues: usize) -> Self {
        self.max_queues = max_queues;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ChannelKey {
    key: String,
    subsystem_id: i32,
}

type ChannelMap = DashMap<ChannelKey, Arc<Channel>>;

/// Back-reference from a keyed queue handle to the registry entry it was
/// resolved from
#[derive(Debug)]
pub(crate) struct Registration {
    channels: Weak<ChannelMap>,
    address: ChannelKey,
}

impl Registration {
    /// Drop the registry entry if it still points at `channel`.
    ///
    /// An address that was already recreated keeps its new channel.
    pub(crate) fn release(&self, channel: &Arc<Channel>) {
        let Some(channels) = self.channels.upgrade() else {
            return;
        };
        if channels
            .remove_if(&self.address, |_, registered| Arc::ptr_eq(registered, channel))
            .is_some()
        {
            log::debug!(
                "channel {}: unregistered '{}' ({})",
                channel.id(),
                self.address.key,
                self.address.subsystem_id
            );
        }
    }
}

/// Maps queue addresses to channels.
///
/// Keyed channels outlive their handles: they stay registered until some
/// handle destroys them, and a later `init` with the same address attaches to
/// the same pending items. Destroying a keyed channel unregisters its
/// address. Private channels (no key) are never shared and go
/// away with their last handle.
///
/// Most callers use the process-wide [`QueueRegistry::global`]; a dedicated
/// registry scopes addresses and limits to its own lifetime.
#[derive(Debug)]
pub struct QueueRegistry {
    config: QueueConfig,
    channels: Arc<ChannelMap>,
    live: Arc<AtomicUsize>,
}

impl Default for QueueRegistry {
    fn default() -> Self {
        Self::new(QueueConfig::default())
    }
}

impl QueueRegistry {
    /// Create a registry with the given limits
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            channels: Arc::new(DashMap::new()),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The process-wide registry
    pub fn global() -> &'static QueueRegistry {
        static GLOBAL: OnceLock<QueueRegistry> = OnceLock::new();
        GLOBAL.get_or_init(QueueRegistry::default)
    }

    /// Number of live channels
    pub fn live_queues(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Number of addresses currently registered
    pub fn registered_queues(&self) -> usize {
        self.channels.len()
    }

    /// Create a queue handle, attaching to an existing channel when `key`
    /// names one that is still live.
    ///
    /// `key = None` always creates a new private channel.
    ///
    /// # Errors
    ///
    /// - `WorkqError::QueueCreation` - empty key, or the channel limit is reached
    pub fn init(&self, key: Option<&str>, subsystem_id: i32) -> Result<PriorityQueue> {
        let Some(name) = key else {
            let channel = self.create_channel(key, subsystem_id)?;
            log::debug!("channel {}: created private queue", channel.id());
            return Ok(PriorityQueue::attach(channel, None));
        };

        if name.is_empty() {
            return Err(WorkqError::queue_creation(
                key,
                subsystem_id,
                "key must not be empty",
            ));
        }

        let address = ChannelKey {
            key: name.to_owned(),
            subsystem_id,
        };

        let registration = Registration {
            channels: Arc::downgrade(&self.channels),
            address: address.clone(),
        };

        // The shard lock makes attach-or-create atomic per address
        let channel = match self.channels.entry(address) {
            Entry::Occupied(entry) if !entry.get().is_removed() => {
                let channel = Arc::clone(entry.get());
                log::debug!(
                    "channel {}: attached to '{}' ({})",
                    channel.id(),
                    name,
                    subsystem_id
                );
                channel
            }
            Entry::Occupied(mut entry) => {
                let channel = self.create_channel(key, subsystem_id)?;
                entry.insert(Arc::clone(&channel));
                log::debug!(
                    "channel {}: recreated '{}' ({})",
                    channel.id(),
                    name,
                    subsystem_id
                );
                channel
            }
            Entry::Vacant(entry) => {
                let channel = self.create_channel(key, subsystem_id)?;
                entry.insert(Arc::clone(&channel));
                log::debug!(
                    "channel {}: created '{}' ({})",
                    channel.id(),
                    name,
                    subsystem_id
                );
                channel
            }
        };

        Ok(PriorityQueue::attach(channel, Some(registration)))
    }

    fn create_channel(&self, key: Option<&str>, subsystem_id: i32) -> Result<Arc<Channel>> {
        let max = self.config.max_queues;
        self.live
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
                (live < max).then_some(live + 1)
            })
            .map_err(|live| {
                WorkqError::queue_creation(
                    key,
                    subsystem_id,
                    format!("queue limit reached ({}/{})", live, max),
                )
            })?;

        Ok(Arc::new(Channel::new(Arc::clone(&self.live))))
    }
}
