//! Resizable worker pool implementation

use crate::core::run::Runner;
use crate::core::{Result, RunFunction, WorkqError};
use crate::pool::worker::{Worker, WorkerStats};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Configuration for a worker pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerPoolConfig {
    /// Number of workers spawned by `build()` (0 is allowed)
    pub num_workers: usize,
    /// Thread name prefix; workers are named `{prefix}-{id}`
    pub thread_name_prefix: String,
    /// Stack size for worker threads (None = platform default)
    pub stack_size: Option<usize>,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            num_workers: num_cpus::get(),
            thread_name_prefix: "workq-worker".to_string(),
            stack_size: None,
        }
    }
}

impl WorkerPoolConfig {
    /// Create a new configuration with the specified number of workers
    #[must_use]
    pub fn new(num_workers: usize) -> Self {
        Self {
            num_workers,
            ..Default::default()
        }
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set worker stack size in bytes
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.thread_name_prefix.is_empty() {
            return Err(WorkqError::configuration(
                "thread_name_prefix",
                "Thread name prefix must not be empty",
            ));
        }
        if self.stack_size == Some(0) {
            return Err(WorkqError::configuration(
                "stack_size",
                "Stack size must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Point-in-time statistics of a pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Pool identifier
    pub pool_id: Uuid,
    /// Target number of workers
    pub desired_workers: usize,
    /// Live worker count
    pub running_workers: usize,
    /// Invocations that returned `Ok`
    pub invocations_completed: u64,
    /// Invocations that returned an error
    pub invocations_failed: u64,
    /// Invocations that panicked
    pub invocations_panicked: u64,
    /// Workers that could not be spawned
    pub spawn_failures: u64,
    /// Mean duration of one invocation in microseconds
    pub average_run_time_us: f64,
}

/// Pool bookkeeping guarded by the pool lock
pub(crate) struct PoolState<A> {
    pub(crate) alive: bool,
    pub(crate) desired: usize,
    pub(crate) running: usize,
    pub(crate) runner: Option<Runner<A>>,
    pub(crate) workers: HashMap<usize, Worker>,
    next_worker_id: usize,
}

/// State shared between the pool handle and its workers
pub(crate) struct PoolShared<A> {
    pub(crate) id: Uuid,
    pub(crate) config: WorkerPoolConfig,
    pub(crate) state: Mutex<PoolState<A>>,
    pub(crate) stats: WorkerStats,
}

impl<A> PoolShared<A>
where
    A: Send + Sync + 'static,
{
    /// Spawn workers until `running` reaches `desired`.
    ///
    /// Must be called with the pool lock held. Workers that fail to spawn are
    /// logged and counted; `desired` is lowered to the number that actually
    /// started so the handle table only ever holds live workers.
    fn spawn_workers_locked(self: &Arc<Self>, state: &mut PoolState<A>) {
        let requested = state.desired.saturating_sub(state.running);
        let mut failed = 0usize;

        for _ in 0..requested {
            let worker_id = state.next_worker_id;
            state.next_worker_id += 1;

            match Worker::spawn(worker_id, self) {
                Ok(worker) => {
                    state.workers.insert(worker_id, worker);
                    state.running += 1;
                }
                Err(e) => {
                    log::warn!("pool {}: {}", self.id, e);
                    self.stats.increment_spawn_failures();
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            state.desired -= failed;
            log::warn!(
                "pool {}: {} of {} workers failed to spawn, continuing with {}",
                self.id,
                failed,
                requested,
                state.running
            );
        }

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_resize(state.desired, state.running);
    }
}

/// Builder for [`WorkerPool`]
pub struct WorkerPoolBuilder<A> {
    config: WorkerPoolConfig,
    run_function: Option<RunFunction<A>>,
    arg: Arc<A>,
}

impl<A> WorkerPoolBuilder<A>
where
    A: Send + Sync + 'static,
{
    /// Start a builder with the shared argument handed to the run function
    pub fn new(arg: A) -> Self {
        Self {
            config: WorkerPoolConfig::default(),
            run_function: None,
            arg: Arc::new(arg),
        }
    }

    /// Set the number of workers to spawn
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn workers(mut self, num_workers: usize) -> Self {
        self.config.num_workers = num_workers;
        self
    }

    /// Set the run function
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn run_function(mut self, function: RunFunction<A>) -> Self {
        self.run_function = Some(function);
        self
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    /// Replace the whole configuration
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn config(mut self, config: WorkerPoolConfig) -> Self {
        self.config = config;
        self
    }

    /// Create the pool and synchronously spawn its workers.
    ///
    /// # Errors
    ///
    /// - `WorkqError::Configuration` - no run function was set, or the config is invalid
    /// - `WorkqError::Allocation` - the worker handle table could not be allocated
    ///
    /// Individual spawn failures do not fail the build; check
    /// [`WorkerPool::get_size`] when an exact count matters.
    pub fn build(self) -> Result<WorkerPool<A>> {
        let function = self.run_function.ok_or_else(|| {
            WorkqError::configuration("run_function", "No run function was supplied")
        })?;
        self.config.validate()?;

        let mut workers = HashMap::new();
        workers
            .try_reserve(self.config.num_workers)
            .map_err(|e| WorkqError::allocation(format!("worker table: {}", e)))?;

        let desired = self.config.num_workers;
        let shared = Arc::new(PoolShared {
            id: Uuid::new_v4(),
            config: self.config,
            state: Mutex::new(PoolState {
                alive: true,
                desired,
                running: 0,
                runner: Some(Runner {
                    function,
                    arg: self.arg,
                }),
                workers,
                next_worker_id: 0,
            }),
            stats: WorkerStats::new(),
        });

        // Hold the lock across spawning so new workers start only after the table is complete.
        let running = {
            let mut state = shared.state.lock();
            shared.spawn_workers_locked(&mut state);
            state.running
        };

        log::debug!(
            "pool {}: created with {} of {} workers",
            shared.id,
            running,
            desired
        );

        Ok(WorkerPool { shared })
    }
}

/// A pool of worker threads that repeatedly invoke a shared run function.
///
/// # Resizing
///
/// [`add`](Self::add) spawns workers before returning. [`trim`](Self::trim)
/// only lowers the target: each surplus worker exits after its current
/// invocation, so [`get_size`](Self::get_size) converges lazily.
///
/// # Teardown
///
/// [`delete`](Self::delete) waits for every live worker to finish its current
/// invocation. There is no preemption: a run function that never returns
/// blocks `delete` forever.
pub struct WorkerPool<A>
where
    A: Send + Sync + 'static,
{
    shared: Arc<PoolShared<A>>,
}

impl<A> std::fmt::Debug for WorkerPool<A>
where
    A: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("WorkerPool")
            .field("id", &self.shared.id)
            .field("config", &self.shared.config)
            .field("alive", &state.alive)
            .field("desired", &state.desired)
            .field("running", &state.running)
            .finish()
    }
}

impl<A> WorkerPool<A>
where
    A: Send + Sync + 'static,
{
    /// Create a pool of `num_workers` workers running `function` with `arg`
    pub fn create(num_workers: usize, function: RunFunction<A>, arg: A) -> Result<Self> {
        WorkerPoolBuilder::new(arg)
            .workers(num_workers)
            .run_function(function)
            .build()
    }

    /// Start building a pool around the shared argument `arg`
    pub fn builder(arg: A) -> WorkerPoolBuilder<A> {
        WorkerPoolBuilder::new(arg)
    }

    /// Pool identifier
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    /// Replace the run function and argument.
    ///
    /// Workers pick up the new pair at their next loop iteration; an
    /// invocation already in flight finishes with the old one.
    ///
    /// # Errors
    ///
    /// - `WorkqError::InvalidHandle` - the pool has been deleted
    pub fn set_function(&self, function: RunFunction<A>, arg: A) -> Result<()> {
        let mut state = self.shared.state.lock();
        if !state.alive {
            return Err(WorkqError::invalid_handle("worker pool"));
        }

        state.runner = Some(Runner {
            function,
            arg: Arc::new(arg),
        });
        log::debug!("pool {}: updated run function", self.shared.id);
        Ok(())
    }

    /// Grow the pool by `num_to_add` workers, spawning them before returning.
    ///
    /// The new target is the current live count plus `num_to_add`, so a
    /// pending trim that has not drained yet is discarded.
    ///
    /// If `arg` is `Some` it replaces the shared argument for all workers.
    ///
    /// # Errors
    ///
    /// - `WorkqError::InvalidHandle` - the pool has been deleted
    /// - `WorkqError::Allocation` - the worker handle table could not grow
    pub fn add(&self, num_to_add: usize, arg: Option<A>) -> Result<()> {
        let mut state = self.shared.state.lock();
        if !state.alive {
            return Err(WorkqError::invalid_handle("worker pool"));
        }

        state
            .workers
            .try_reserve(num_to_add)
            .map_err(|e| WorkqError::allocation(format!("worker table: {}", e)))?;

        if let Some(arg) = arg {
            if let Some(runner) = state.runner.as_mut() {
                runner.arg = Arc::new(arg);
            }
        }

        // Sized from the live count so a shrink still draining does not
        // swallow part of the growth
        state.desired = state.running + num_to_add;
        self.shared.spawn_workers_locked(&mut state);

        log::debug!(
            "pool {}: added {} workers, {} running / {} desired",
            self.shared.id,
            num_to_add,
            state.running,
            state.desired
        );
        Ok(())
    }

    /// Request the pool to shrink by `num_to_cut` workers (floored at zero).
    ///
    /// Surplus workers exit after finishing their current invocation. No-op on
    /// a deleted pool.
    pub fn trim(&self, num_to_cut: usize) {
        let mut state = self.shared.state.lock();
        if !state.alive {
            return;
        }

        state.desired = state.desired.saturating_sub(num_to_cut);
        log::debug!(
            "pool {}: trimmed to {} desired ({} running)",
            self.shared.id,
            state.desired,
            state.running
        );
        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_resize(state.desired, state.running);
    }

    /// Current live worker count, or 0 if the pool has been deleted.
    ///
    /// Exceeds [`desired_size`](Self::desired_size) while a trim is draining.
    pub fn get_size(&self) -> usize {
        let state = self.shared.state.lock();
        if state.alive {
            state.running
        } else {
            0
        }
    }

    /// Target worker count, or 0 if the pool has been deleted
    pub fn desired_size(&self) -> usize {
        let state = self.shared.state.lock();
        if state.alive {
            state.desired
        } else {
            0
        }
    }

    /// Check if the pool has not been deleted
    pub fn is_alive(&self) -> bool {
        self.shared.state.lock().alive
    }

    /// Get pool statistics
    pub fn stats(&self) -> PoolStats {
        let (desired, running) = {
            let state = self.shared.state.lock();
            (state.desired, state.running)
        };
        let stats = &self.shared.stats;

        PoolStats {
            pool_id: self.shared.id,
            desired_workers: desired,
            running_workers: running,
            invocations_completed: stats.get_invocations_completed(),
            invocations_failed: stats.get_invocations_failed(),
            invocations_panicked: stats.get_invocations_panicked(),
            spawn_failures: stats.get_spawn_failures(),
            average_run_time_us: stats.get_average_run_time_us(),
        }
    }

    /// Tear the pool down, blocking until every live worker has exited.
    ///
    /// Sets the target to zero, snapshots the live workers and joins each of
    /// them once. Only then is the pool marked dead and its run function and
    /// argument released. Deleting a dead pool is a no-op.
    ///
    /// When called from one of the pool's own workers, that worker is not
    /// joined; it exits at its next loop boundary.
    ///
    /// # Errors
    ///
    /// - `WorkqError::JoinError` - a worker thread terminated abnormally; the
    ///   pool is still fully torn down
    pub fn delete(&self) -> Result<()> {
        let snapshot = {
            let mut state = self.shared.state.lock();
            if !state.alive {
                return Ok(());
            }
            state.desired = 0;
            std::mem::take(&mut state.workers)
        };

        log::debug!(
            "pool {}: deleting, waiting on {} workers",
            self.shared.id,
            snapshot.len()
        );

        let mut first_error = None;
        for (_, worker) in snapshot {
            if worker.is_current() {
                continue;
            }
            let worker_id = worker.id();
            if let Err(e) = worker.join() {
                log::error!("pool {}: worker {} join failed: {}", self.shared.id, worker_id, e);
                first_error.get_or_insert(e);
            }
        }

        {
            let mut state = self.shared.state.lock();
            state.alive = false;
            state.running = 0;
            state.runner = None;
            state.workers = HashMap::new();
        }

        log::debug!("pool {}: deleted", self.shared.id);
        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_shutdown(
            self.shared.stats.get_invocations_completed(),
            self.shared.stats.get_invocations_failed(),
        );

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<A> Drop for WorkerPool<A>
where
    A: Send + Sync + 'static,
{
    fn drop(&mut self) {
        if let Err(e) = self.delete() {
            log::error!(
                "[WORKER POOL ERROR] Failed to delete pool '{}' during drop: {}",
                self.shared.id,
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::run_function;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::{Duration, Instant};

    fn idle() -> RunFunction<()> {
        run_function(|_: &()| {
            thread::sleep(Duration::from_millis(2));
            Ok(())
        })
    }

    fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        condition()
    }

    #[test]
    fn test_config_validation() {
        assert!(WorkerPoolConfig::new(2).validate().is_ok());
        assert!(WorkerPoolConfig::new(0).validate().is_ok());

        let config = WorkerPoolConfig::new(2).with_thread_name_prefix("");
        assert!(matches!(
            config.validate(),
            Err(WorkqError::Configuration { .. })
        ));

        let config = WorkerPoolConfig::new(2).with_stack_size(0);
        assert!(matches!(
            config.validate(),
            Err(WorkqError::Configuration { .. })
        ));
    }

    #[test]
    fn test_config_default_uses_cpu_count() {
        let config = WorkerPoolConfig::default();
        assert_eq!(config.num_workers, num_cpus::get());
        assert_eq!(config.thread_name_prefix, "workq-worker");
        assert_eq!(config.stack_size, None);
    }

    #[test]
    fn test_build_without_run_function() {
        let result = WorkerPool::<()>::builder(()).workers(2).build();
        assert!(matches!(
            result,
            Err(WorkqError::Configuration { ref parameter, .. }) if parameter == "run_function"
        ));
    }

    #[test]
    fn test_create_spawns_synchronously() {
        let pool = WorkerPool::create(3, idle(), ()).expect("Failed to create pool");
        assert_eq!(pool.get_size(), 3);
        assert_eq!(pool.desired_size(), 3);
        assert!(pool.is_alive());
        pool.delete().expect("Failed to delete pool");
    }

    #[test]
    fn test_create_zero_then_delete() {
        let pool = WorkerPool::create(0, idle(), ()).expect("Failed to create pool");
        assert_eq!(pool.get_size(), 0);
        pool.delete().expect("Failed to delete pool");
        assert!(!pool.is_alive());
    }

    #[test]
    fn test_add_grows_immediately() {
        let pool = WorkerPool::create(1, idle(), ()).expect("Failed to create pool");
        pool.add(5, None).expect("Failed to add workers");
        assert_eq!(pool.get_size(), 6);
        assert_eq!(pool.desired_size(), 6);
        pool.delete().expect("Failed to delete pool");
    }

    #[test]
    fn test_add_replaces_arg() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = Arc::clone(&seen);
        let pool = WorkerPool::create(
            1,
            run_function(move |value: &usize| {
                seen_clone.store(*value, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(1));
                Ok(())
            }),
            1usize,
        )
        .expect("Failed to create pool");

        assert!(wait_until(|| seen.load(Ordering::SeqCst) == 1));
        pool.add(1, Some(7)).expect("Failed to add workers");
        assert!(wait_until(|| seen.load(Ordering::SeqCst) == 7));

        pool.delete().expect("Failed to delete pool");
    }

    #[test]
    fn test_trim_converges_lazily() {
        let pool = WorkerPool::create(4, idle(), ()).expect("Failed to create pool");
        pool.trim(3);
        assert_eq!(pool.desired_size(), 1);
        assert!(wait_until(|| pool.get_size() == 1));
        pool.delete().expect("Failed to delete pool");
    }

    #[test]
    fn test_trim_floors_at_zero() {
        let pool = WorkerPool::create(2, idle(), ()).expect("Failed to create pool");
        pool.trim(10);
        assert_eq!(pool.desired_size(), 0);
        assert!(wait_until(|| pool.get_size() == 0));
        pool.delete().expect("Failed to delete pool");
    }

    #[test]
    fn test_add_during_pending_trim_spawns_full_count() {
        let gate = Arc::new(parking_lot::Mutex::new(()));
        let held = gate.lock();
        let pool = WorkerPool::create(
            2,
            run_function(|gate: &Arc<parking_lot::Mutex<()>>| {
                drop(gate.lock());
                thread::sleep(Duration::from_millis(1));
                Ok(())
            }),
            Arc::clone(&gate),
        )
        .expect("Failed to create pool");

        // Both workers are parked on the gate, so the trim cannot drain yet
        pool.trim(2);
        assert_eq!(pool.desired_size(), 0);
        assert_eq!(pool.get_size(), 2);

        pool.add(5, None).expect("Failed to add workers");
        assert_eq!(pool.get_size(), 7);
        assert_eq!(pool.desired_size(), 7);
        assert_eq!(pool.stats().spawn_failures, 0);
        drop(held);

        // The pending shrink was replaced by the new target
        thread::sleep(Duration::from_millis(20));
        assert_eq!(pool.get_size(), 7);
        pool.delete().expect("Failed to delete pool");
    }

    #[test]
    fn test_set_function_switches_at_loop_boundary() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let pool = WorkerPool::create(
            2,
            run_function(|counter: &Arc<AtomicUsize>| {
                counter.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(1));
                Ok(())
            }),
            Arc::clone(&first),
        )
        .expect("Failed to create pool");

        assert!(wait_until(|| first.load(Ordering::SeqCst) > 0));

        pool.set_function(
            run_function(|counter: &Arc<AtomicUsize>| {
                counter.fetch_add(10, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(1));
                Ok(())
            }),
            Arc::clone(&second),
        )
        .expect("Failed to set function");

        assert!(wait_until(|| second.load(Ordering::SeqCst) >= 20));
        // At most one in-flight call per worker lands on the old counter
        let frozen = first.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        assert!(first.load(Ordering::SeqCst) <= frozen + 2);
        assert_eq!(second.load(Ordering::SeqCst) % 10, 0);

        pool.delete().expect("Failed to delete pool");
    }

    #[test]
    fn test_operations_after_delete() {
        let pool = WorkerPool::create(2, idle(), ()).expect("Failed to create pool");
        pool.delete().expect("Failed to delete pool");

        assert!(matches!(
            pool.add(1, None),
            Err(WorkqError::InvalidHandle { .. })
        ));
        assert!(matches!(
            pool.set_function(idle(), ()),
            Err(WorkqError::InvalidHandle { .. })
        ));
        pool.trim(1);
        assert_eq!(pool.get_size(), 0);
        assert_eq!(pool.desired_size(), 0);

        // Redundant delete is a no-op
        assert!(pool.delete().is_ok());
    }

    #[test]
    fn test_delete_waits_for_in_flight_invocation() {
        let finished = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::create(
            2,
            run_function(|finished: &Arc<AtomicUsize>| {
                thread::sleep(Duration::from_millis(30));
                finished.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
            Arc::clone(&finished),
        )
        .expect("Failed to create pool");

        thread::sleep(Duration::from_millis(5));
        pool.delete().expect("Failed to delete pool");

        // Both workers completed their first invocation before delete returned
        assert!(finished.load(Ordering::SeqCst) >= 2);
        let after = finished.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(finished.load(Ordering::SeqCst), after);
    }

    #[test]
    fn test_delete_from_own_worker() {
        let slot: Arc<parking_lot::Mutex<Option<Arc<WorkerPool<AtomicUsize>>>>> =
            Arc::new(parking_lot::Mutex::new(None));
        let slot_clone = Arc::clone(&slot);

        let pool = Arc::new(
            WorkerPool::create(
                1,
                run_function(move |calls: &AtomicUsize| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    if let Some(pool) = slot_clone.lock().take() {
                        pool.delete()?;
                    }
                    thread::sleep(Duration::from_millis(1));
                    Ok(())
                }),
                AtomicUsize::new(0),
            )
            .expect("Failed to create pool"),
        );

        *slot.lock() = Some(Arc::clone(&pool));
        assert!(wait_until(|| !pool.is_alive()));
        assert_eq!(pool.get_size(), 0);
    }

    #[test]
    fn test_stats_snapshot_serializes() {
        let pool = WorkerPool::create(1, idle(), ()).expect("Failed to create pool");
        assert!(wait_until(|| pool.stats().invocations_completed > 0));

        let stats = pool.stats();
        assert_eq!(stats.pool_id, pool.id());
        assert_eq!(stats.running_workers, 1);

        let json = serde_json::to_string(&stats).expect("Failed to serialize stats");
        let back: PoolStats = serde_json::from_str(&json).expect("Failed to deserialize stats");
        assert_eq!(back.pool_id, stats.pool_id);

        pool.delete().expect("Failed to delete pool");
    }

    #[test]
    fn test_stats_report_average_run_time() {
        let pool = WorkerPool::create(1, idle(), ()).expect("Failed to create pool");
        assert_eq!(pool.stats().average_run_time_us, 0.0);
        assert!(wait_until(|| pool.stats().invocations_completed >= 3));

        // Each invocation sleeps for 2ms
        assert!(pool.stats().average_run_time_us >= 2_000.0);
        pool.delete().expect("Failed to delete pool");
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_spawn_failure_is_absorbed() {
        // A stack larger than the address space cannot be mapped
        let config = WorkerPoolConfig::new(3).with_stack_size(1 << 50);
        let pool = WorkerPool::builder(())
            .config(config)
            .run_function(idle())
            .build()
            .expect("Spawn failures must not fail create");

        let stats = pool.stats();
        assert_eq!(pool.get_size() as u64 + stats.spawn_failures, 3);
        assert_eq!(pool.desired_size(), pool.get_size());

        pool.delete().expect("Failed to delete pool");
    }

    #[test]
    fn test_drop_deletes_pool() {
        let calls = Arc::new(AtomicUsize::new(0));
        {
            let _pool = WorkerPool::create(
                2,
                run_function(|calls: &Arc<AtomicUsize>| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(1));
                    Ok(())
                }),
                Arc::clone(&calls),
            )
            .expect("Failed to create pool");
            thread::sleep(Duration::from_millis(10));
        }

        let after = calls.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(calls.load(Ordering::SeqCst), after);
    }
}
