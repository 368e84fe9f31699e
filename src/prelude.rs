//! Convenient re-exports for common types and traits

pub use crate::core::{
    run_function, Priority, Result, RunFunction, RunOutcome, WorkqError, MAX_PAYLOAD,
    PRIORITY_LEVELS,
};
pub use crate::pool::{PoolStats, WorkerPool, WorkerPoolBuilder, WorkerPoolConfig};
pub use crate::queue::{PriorityQueue, QueueConfig, QueueRegistry, WorkItem};
