//! Worker thread implementation

use crate::core::run::Runner;
use crate::core::{Result, WorkqError};
use crate::pool::worker_pool::PoolShared;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

#[cfg(feature = "tracing")]
use tracing::{debug, span, Level};

/// Invocation statistics shared by all workers of a pool
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Total number of run function invocations that returned `Ok`
    pub invocations_completed: AtomicU64,
    /// Total number of invocations that returned an error
    pub invocations_failed: AtomicU64,
    /// Total number of invocations that panicked
    pub invocations_panicked: AtomicU64,
    /// Total number of workers that could not be spawned
    pub spawn_failures: AtomicU64,
    /// Total time spent inside the run function (microseconds)
    pub total_run_time_us: AtomicU64,
}

impl WorkerStats {
    /// Create new worker statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment completed invocations counter
    pub fn increment_completed(&self) {
        self.invocations_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment failed invocations counter
    pub fn increment_failed(&self) {
        self.invocations_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment panicked invocations counter
    pub fn increment_panicked(&self) {
        self.invocations_panicked.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment spawn failures counter
    pub fn increment_spawn_failures(&self) {
        self.spawn_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Add time spent in the run function
    pub fn add_run_time(&self, microseconds: u64) {
        self.total_run_time_us
            .fetch_add(microseconds, Ordering::Relaxed);
    }

    /// Get total completed invocations
    pub fn get_invocations_completed(&self) -> u64 {
        self.invocations_completed.load(Ordering::Relaxed)
    }

    /// Get total failed invocations
    pub fn get_invocations_failed(&self) -> u64 {
        self.invocations_failed.load(Ordering::Relaxed)
    }

    /// Get total panicked invocations
    pub fn get_invocations_panicked(&self) -> u64 {
        self.invocations_panicked.load(Ordering::Relaxed)
    }

    /// Get total spawn failures
    pub fn get_spawn_failures(&self) -> u64 {
        self.spawn_failures.load(Ordering::Relaxed)
    }

    /// Get average run time per invocation in microseconds
    pub fn get_average_run_time_us(&self) -> f64 {
        let total = self.total_run_time_us.load(Ordering::Relaxed);
        let count = self.get_invocations_completed()
            + self.get_invocations_failed()
            + self.get_invocations_panicked();
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }
}

/// A live worker thread owned by a pool's handle table
#[derive(Debug)]
pub(crate) struct Worker {
    id: usize,
    thread: thread::JoinHandle<()>,
}

impl Worker {
    /// Spawn a worker that loops over the pool's current run function.
    ///
    /// The caller holds the pool lock; the new thread blocks on it until the
    /// caller's critical section ends.
    pub(crate) fn spawn<A>(id: usize, shared: &Arc<PoolShared<A>>) -> Result<Self>
    where
        A: Send + Sync + 'static,
    {
        let mut builder =
            thread::Builder::new().name(format!("{}-{}", shared.config.thread_name_prefix, id));
        if let Some(stack_size) = shared.config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let pool = Arc::clone(shared);
        let thread = builder
            .spawn(move || Self::run(id, pool))
            .map_err(|e| WorkqError::spawn_with_source(id, "Cannot create worker thread", e))?;

        Ok(Self { id, thread })
    }

    /// Get worker ID
    pub(crate) fn id(&self) -> usize {
        self.id
    }

    /// Whether this worker runs on the calling thread
    pub(crate) fn is_current(&self) -> bool {
        self.thread.thread().id() == thread::current().id()
    }

    /// Join the worker thread
    pub(crate) fn join(self) -> Result<()> {
        self.thread
            .join()
            .map_err(|_| WorkqError::join(self.id, "Worker panicked"))
    }

    /// Main worker loop.
    ///
    /// Reads the run function under the pool lock, invokes it unlocked, then
    /// re-checks the pool under the lock: a dead pool or a surplus of running
    /// workers ends the loop.
    fn run<A>(id: usize, pool: Arc<PoolShared<A>>)
    where
        A: Send + Sync + 'static,
    {
        #[cfg(feature = "tracing")]
        let worker_span = span!(Level::DEBUG, "worker", id = id, pool = %pool.id);
        #[cfg(feature = "tracing")]
        let _guard = worker_span.enter();

        #[cfg(feature = "tracing")]
        debug!("worker started");

        loop {
            let runner = {
                let state = pool.state.lock();
                match state.runner.as_ref() {
                    Some(runner) if state.alive => runner.clone(),
                    _ => return,
                }
            };

            Self::invoke(id, &runner, &pool.stats);
            drop(runner);

            let mut state = pool.state.lock();
            if !state.alive {
                return;
            }
            if state.running > state.desired {
                state.running -= 1;
                // Detaches our own handle; a concurrent delete may already hold it.
                state.workers.remove(&id);
                log::debug!(
                    "pool {}: worker {} exiting, {} running / {} desired",
                    pool.id,
                    id,
                    state.running,
                    state.desired
                );
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_worker_exit(id, state.running, state.desired);
                return;
            }
        }
    }

    /// Invoke the run function once with panic protection
    fn invoke<A>(id: usize, runner: &Runner<A>, stats: &WorkerStats) {
        let start = Instant::now();

        let panic_result = catch_unwind(AssertUnwindSafe(|| runner.invoke()));

        let elapsed = start.elapsed();
        // Recorded before the outcome counters so the average never undercounts
        stats.add_run_time(elapsed.as_micros() as u64);

        match panic_result {
            Ok(Ok(())) => {
                stats.increment_completed();
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_invocation(elapsed, true);
            }
            Ok(Err(e)) => {
                log::warn!("Worker {}: run function failed: {}", id, e);
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_invocation(elapsed, false);
                stats.increment_failed();
            }
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                log::error!("Worker {}: run function panicked: {}", id, panic_msg);
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_panic(elapsed);
                stats.increment_panicked();
            }
        }
    }
}
