//! # Rust WorkQ
//!
//! A resizable worker thread pool and a priority-ordered blocking work queue.
//!
//! ## Features
//!
//! - **Worker Pool**: N live workers repeatedly invoking an interchangeable run function
//! - **Live Resizing**: Grow immediately, shrink cooperatively after in-flight work
//! - **Function Hot-Swap**: Replace the run function and argument without a restart
//! - **Priority Queue**: Most urgent items first, FIFO within a level, blocking receive
//! - **Shared Queues**: Attach several handles to one channel by `(key, subsystem_id)`
//!
//! The pool and the queue are independent. They usually meet through a run
//! function that takes an item off a queue and processes it.
//!
//! ## Quick Start
//!
//! ```rust
//! use rust_workq::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<()> {
//! let queue = Arc::new(PriorityQueue::init(None, 0)?);
//! for i in 0..10u32 {
//!     queue.add(format!("item {}", i).as_bytes(), i % 10 + 1)?;
//! }
//!
//! let pool = WorkerPool::create(
//!     2,
//!     run_function(|queue: &Arc<PriorityQueue>| {
//!         if let Some(item) = queue.try_get()? {
//!             println!("got {:?}", String::from_utf8_lossy(item.payload()));
//!         }
//!         std::thread::yield_now();
//!         Ok(())
//!     }),
//!     Arc::clone(&queue),
//! )?;
//!
//! pool.add(2, None)?;
//! pool.trim(3);
//! pool.delete()?;
//! queue.destroy()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Resizing
//!
//! ```rust
//! use rust_workq::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let pool = WorkerPool::create(2, run_function(|_: &()| {
//!     std::thread::sleep(std::time::Duration::from_millis(1));
//!     Ok(())
//! }), ())?;
//!
//! pool.add(3, None)?;
//! assert_eq!(pool.get_size(), 5);
//!
//! // Surplus workers leave after finishing their current invocation
//! pool.trim(4);
//! assert_eq!(pool.desired_size(), 1);
//! # pool.delete()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod pool;
pub mod prelude;
pub mod queue;
#[cfg(feature = "tracing")]
pub mod tracing;

pub use crate::core::{Priority, Result, RunFunction, WorkqError, MAX_PAYLOAD, PRIORITY_LEVELS};
pub use crate::pool::{PoolStats, WorkerPool, WorkerPoolConfig, WorkerStats};
pub use crate::queue::{PriorityQueue, QueueRegistry, WorkItem};
