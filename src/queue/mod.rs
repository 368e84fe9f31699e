//! Priority-ordered work queue.
//!
//! A [`PriorityQueue`] is a handle to an in-process channel holding
//! [`WorkItem`]s in one FIFO bucket per priority level. Handles are obtained
//! from a [`QueueRegistry`], which resolves a `(key, subsystem_id)` address to
//! a shared channel, or creates a private one when no key is given.
//!
//! ```rust
//! use rust_workq::queue::QueueRegistry;
//!
//! # fn main() -> rust_workq::Result<()> {
//! let registry = QueueRegistry::default();
//! let producer = registry.init(Some("jobs"), 1)?;
//! let consumer = registry.init(Some("jobs"), 1)?;
//!
//! producer.add(b"payload", 4)?;
//! assert_eq!(consumer.get()?.payload(), b"payload");
//! # Ok(())
//! # }
//! ```

mod channel;
mod priority_queue;
mod registry;

pub use priority_queue::{PriorityQueue, WorkItem};
pub use registry::{QueueConfig, QueueRegistry};
