//! Tracing integration for observability.
//!
//! Compiled with the `tracing` feature. Workers run inside a `worker` span and
//! pool/queue activity is emitted as trace events that metrics layers can
//! consume.
//!
//! # Example
//!
//! ```rust,ignore
//! use rust_workq::prelude::*;
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env()
//!         .add_directive("rust_workq=debug".parse().unwrap()))
//!     .init();
//!
//! let work = rust_workq::tracing::traced(run_function(|_: &()| Ok(())));
//! let pool = WorkerPool::create(4, work, ())?;
//! ```

use crate::core::{RunFunction, RunOutcome};
use std::sync::Arc;

/// Wrap a run function so every invocation runs inside the span that was
/// current when `traced` was called.
///
/// Worker threads do not inherit the caller's span; this carries it across.
pub fn traced<A>(function: RunFunction<A>) -> RunFunction<A>
where
    A: Send + Sync + 'static,
{
    traced_with_span(function, tracing::Span::current())
}

/// Wrap a run function so every invocation runs inside `span`
pub fn traced_with_span<A>(function: RunFunction<A>, span: tracing::Span) -> RunFunction<A>
where
    A: Send + Sync + 'static,
{
    Arc::new(move |arg: &A| -> RunOutcome {
        let _guard = span.enter();
        function(arg)
    })
}

/// Metrics recording functions for observability.
///
/// These functions emit tracing events that can be consumed by
/// metrics collection systems like Prometheus via tracing-opentelemetry.
pub mod metrics {
    use std::time::Duration;

    /// Records the end of one run function invocation.
    #[inline]
    pub fn record_invocation(duration: Duration, success: bool) {
        let duration_ms = duration.as_millis() as u64;
        if success {
            tracing::trace!(
                counter.invocations_completed = 1,
                histogram.invocation_duration_ms = duration_ms,
                "invocation completed"
            );
        } else {
            tracing::trace!(
                counter.invocations_failed = 1,
                histogram.invocation_duration_ms = duration_ms,
                "invocation failed"
            );
        }
    }

    /// Records a panicking invocation.
    #[inline]
    pub fn record_panic(duration: Duration) {
        tracing::trace!(
            counter.invocations_panicked = 1,
            histogram.invocation_duration_ms = duration.as_millis() as u64,
            "invocation panicked"
        );
    }

    /// Records a worker leaving a shrinking pool.
    #[inline]
    pub fn record_worker_exit(worker_id: usize, running: usize, desired: usize) {
        tracing::debug!(
            worker_id = worker_id,
            gauge.workers_running = running as i64,
            gauge.workers_desired = desired as i64,
            "worker exited"
        );
    }

    /// Records a change of pool size or target.
    #[inline]
    pub fn record_pool_resize(desired: usize, running: usize) {
        tracing::info!(
            gauge.workers_desired = desired as i64,
            gauge.workers_running = running as i64,
            "worker pool resized"
        );
    }

    /// Records pool teardown.
    #[inline]
    pub fn record_pool_shutdown(invocations_completed: u64, invocations_failed: u64) {
        tracing::info!(
            invocations_completed = invocations_completed,
            invocations_failed = invocations_failed,
            "worker pool deleted"
        );
    }

    /// Records an enqueued work item.
    #[inline]
    pub fn record_enqueue(priority: u32, queue_depth: usize) {
        tracing::trace!(
            counter.items_enqueued = 1,
            priority = priority,
            gauge.queue_depth = queue_depth as i64,
            "work item enqueued"
        );
    }
}
