//! Core types shared by the pool and the queue

pub mod error;
pub mod priority;
pub mod run;

pub use error::{Result, WorkqError};
pub use priority::{Priority, MAX_PAYLOAD, PRIORITY_LEVELS};
pub use run::{run_function, RunFunction, RunOutcome};
