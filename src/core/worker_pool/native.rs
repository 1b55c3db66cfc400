//! Native implementation of `InteractionPool` using dedicated OS threads.
//!
//! # Design Principles
//!
//! - **No polling**: workers block on the job channel, the submitter blocks
//!   on the result channel, `terminate` blocks on an exit channel
//! - **Failure isolation**: every job runs under `catch_unwind`; errors and
//!   panics become `JobOutcome::Failure` values and the worker keeps going
//! - **Guaranteed teardown**: `PoolScope` and `Drop` both terminate the roster

use std::any::Any;
use std::collections::HashSet;
use std::iter::FusedIterator;
use std::ops::Deref;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Instant;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::WorkerPoolConfig;
use crate::core::error::InteractionError;
use crate::core::executor::{JobContext, JobExecutor};

use super::{Completion, ErrorMarker, JobId, JobOutcome, PoolCounters, PoolError, PoolStats, QueuedJob};

/// Where a pool is in its single-use lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    /// Channels exist, no workers yet.
    Created,
    /// Workers are running.
    Running,
    /// Workers have been told to stop; the pool cannot be restarted.
    Terminated,
}

/// A spawned worker.
struct WorkerHandle {
    worker_id: usize,
    handle: JoinHandle<()>,
}

/// Sends the worker id on the exit channel when a worker leaves its loop,
/// including while unwinding.
struct ExitNotice {
    worker_id: usize,
    exit_tx: Sender<usize>,
}

impl Drop for ExitNotice {
    fn drop(&mut self) {
        let _ = self.exit_tx.send(self.worker_id);
    }
}

/// Pool supervisor owning a fixed roster of worker threads and the channel
/// pair they share.
///
/// The pool is single use: `new` → `start` (or `enter`/`scoped`) →
/// submit/receive → `terminate`. Dropping the pool terminates it.
///
/// The executor `E` is cloned into every worker and carries whatever fixed
/// arguments the jobs need.
pub struct InteractionPool<J, R, E>
where
    J: Send + 'static,
    R: Send + 'static,
    E: JobExecutor<J, R>,
{
    /// Pool configuration.
    config: WorkerPoolConfig,

    /// Computation bound to this pool.
    executor: E,

    /// Job sender. Taken on terminate so idle workers wake and exit.
    job_tx: Mutex<Option<Sender<QueuedJob<J>>>>,

    /// Job receiver, cloned into each worker and drained on terminate.
    job_rx: Receiver<QueuedJob<J>>,

    /// Result sender, handed to the workers on start.
    result_tx: Mutex<Option<Sender<Completion<R>>>>,

    /// Result receiver read by `receive_one`/`receive_all`.
    result_rx: Receiver<Completion<R>>,

    /// Exit notifications from workers.
    exit_tx: Sender<usize>,
    exit_rx: Receiver<usize>,

    /// Shutdown flag shared with workers and job contexts.
    shutdown: Arc<AtomicBool>,

    /// Submit/receive counters.
    counters: PoolCounters,

    /// Next job id.
    next_job_id: AtomicU64,

    /// Lifecycle state.
    state: Mutex<Lifecycle>,

    /// Worker roster.
    workers: Mutex<Vec<WorkerHandle>>,
}

impl<J, R, E> InteractionPool<J, R, E>
where
    J: Send + 'static,
    R: Send + 'static,
    E: JobExecutor<J, R>,
{
    /// Create a pool with the given configuration and executor.
    ///
    /// Creates both channels and zeroes the counters. No worker is started
    /// until [`start`](Self::start) or [`enter`](Self::enter).
    ///
    /// # Errors
    ///
    /// Returns `PoolError::InvalidConfig` if the configuration is invalid.
    pub fn new(config: WorkerPoolConfig, executor: E) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;

        let (job_tx, job_rx) = unbounded();
        let (result_tx, result_rx) = unbounded();
        let (exit_tx, exit_rx) = unbounded();

        debug!(worker_count = config.worker_count, "InteractionPool created");

        Ok(Self {
            config,
            executor,
            job_tx: Mutex::new(Some(job_tx)),
            job_rx,
            result_tx: Mutex::new(Some(result_tx)),
            result_rx,
            exit_tx,
            exit_rx,
            shutdown: Arc::new(AtomicBool::new(false)),
            counters: PoolCounters::default(),
            next_job_id: AtomicU64::new(0),
            state: Mutex::new(Lifecycle::Created),
            workers: Mutex::new(Vec::new()),
        })
    }

    /// Number of workers this pool runs.
    #[must_use]
    pub const fn worker_count(&self) -> usize {
        self.config.worker_count
    }

    /// Pool configuration.
    #[must_use]
    pub const fn config(&self) -> &WorkerPoolConfig {
        &self.config
    }

    /// The executor every worker runs.
    #[must_use]
    pub const fn executor(&self) -> &E {
        &self.executor
    }

    /// Start every worker thread.
    ///
    /// # Errors
    ///
    /// - `PoolError::AlreadyStarted` if the pool is running
    /// - `PoolError::PoolShutdown` if the pool has been terminated
    /// - `PoolError::Spawn` if the OS refused a thread; workers spawned so far
    ///   are terminated before returning
    pub fn start(&self) -> Result<(), PoolError> {
        let mut state = self.state.lock();
        match *state {
            Lifecycle::Running => return Err(PoolError::AlreadyStarted),
            Lifecycle::Terminated => return Err(PoolError::PoolShutdown),
            Lifecycle::Created => {}
        }

        let Some(result_tx) = self.result_tx.lock().take() else {
            return Err(PoolError::PoolShutdown);
        };
        *state = Lifecycle::Running;
        drop(state);

        let mut spawn_error = None;
        {
            let mut workers = self.workers.lock();
            workers.reserve(self.config.worker_count);

            for worker_id in 0..self.config.worker_count {
                match spawn_worker(
                    worker_id,
                    &self.config,
                    self.job_rx.clone(),
                    result_tx.clone(),
                    self.exit_tx.clone(),
                    Arc::clone(&self.shutdown),
                    self.executor.clone(),
                ) {
                    Ok(handle) => workers.push(WorkerHandle { worker_id, handle }),
                    Err(e) => {
                        spawn_error = Some(PoolError::Spawn(e.to_string()));
                        break;
                    }
                }
            }
        }
        // Workers hold the only result senders now, so a receive on a pool
        // whose workers are all gone fails instead of hanging.
        drop(result_tx);

        if let Some(err) = spawn_error {
            warn!(error = %err, "Failed to start worker pool");
            let _ = self.terminate();
            return Err(err);
        }

        info!(
            worker_count = self.config.worker_count,
            "InteractionPool started with dedicated worker threads"
        );
        Ok(())
    }

    /// Start the pool and return a guard that terminates it when dropped.
    ///
    /// # Errors
    ///
    /// Same as [`start`](Self::start).
    pub fn enter(&self) -> Result<PoolScope<'_, J, R, E>, PoolError> {
        self.start()?;
        Ok(PoolScope { pool: self })
    }

    /// Run `f` with the pool started, terminating it afterwards on every exit
    /// path. Teardown failures are swallowed so an error from `f` reaches the
    /// caller unmasked.
    ///
    /// # Errors
    ///
    /// Returns the start failure, or whatever `f` returns.
    pub fn scoped<T, Er, F>(&self, f: F) -> Result<T, Er>
    where
        F: FnOnce(&Self) -> Result<T, Er>,
        Er: From<PoolError>,
    {
        let scope = self.enter()?;
        f(scope.pool())
    }

    /// Enqueue a job. Never blocks; the job waits in the channel until a
    /// worker is free. Jobs may be submitted before `start`.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::PoolShutdown` if the pool has been terminated.
    pub fn submit(&self, job: J) -> Result<JobId, PoolError> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(PoolError::PoolShutdown);
        }

        let job_tx = self.job_tx.lock();
        let Some(job_tx) = job_tx.as_ref() else {
            return Err(PoolError::PoolShutdown);
        };

        let id = self.next_job_id.fetch_add(1, Ordering::Relaxed);
        job_tx
            .send(QueuedJob { id, job })
            .map_err(|_| PoolError::PoolShutdown)?;
        self.counters.submitted.fetch_add(1, Ordering::AcqRel);

        debug!(job_id = id, "Job submitted to interaction pool");
        Ok(id)
    }

    /// Block until one result is available and return it.
    ///
    /// Several threads may receive at once: each call first claims one
    /// outstanding result, so no caller waits for a result another caller
    /// will take.
    ///
    /// # Errors
    ///
    /// - the original error, if the job failed inside its worker
    /// - `PoolError::NothingOutstanding` if every submitted job was received
    ///   or claimed
    /// - `PoolError::NotStarted` / `PoolError::PoolShutdown` outside the
    ///   running state
    pub fn receive_one(&self) -> Result<R, InteractionError> {
        self.receive_next()
    }

    /// Lazily receive every job outstanding at call time, in completion
    /// order.
    ///
    /// The iterator yields exactly `submitted - completed` entries. The first
    /// error ends it: results still outstanding are left for teardown to
    /// discard.
    pub fn receive_all(&self) -> ReceiveAll<'_, J, R, E> {
        ReceiveAll {
            pool: self,
            remaining: self.counters.outstanding(),
            fused: false,
        }
    }

    /// Stop every worker.
    ///
    /// Queued jobs that have not started are discarded. Running jobs see
    /// [`JobContext::is_cancelled`] turn true. Workers are waited on up to
    /// the configured shutdown timeout; stragglers are detached. Calling this
    /// again is a no-op.
    ///
    /// # Errors
    ///
    /// - `PoolError::WorkersDetached` if some workers outlived the timeout
    /// - `PoolError::WorkerPanicked` if some workers died outside a job
    pub fn terminate(&self) -> Result<(), PoolError> {
        {
            let mut state = self.state.lock();
            if *state == Lifecycle::Terminated {
                return Ok(());
            }
            *state = Lifecycle::Terminated;
        }

        self.shutdown.store(true, Ordering::Release);
        self.job_tx.lock().take();
        self.result_tx.lock().take();
        let discarded = self.job_rx.try_iter().count();

        // Wait without holding the roster lock.
        let workers = std::mem::take(&mut *self.workers.lock());
        let worker_count = workers.len();
        info!(
            worker_count = worker_count,
            discarded_jobs = discarded,
            "Terminating interaction pool"
        );

        let deadline = Instant::now() + self.config.shutdown_timeout();
        let mut exited = HashSet::with_capacity(worker_count);
        while exited.len() < worker_count {
            match self.exit_rx.recv_deadline(deadline) {
                Ok(worker_id) => {
                    exited.insert(worker_id);
                }
                Err(_) => break,
            }
        }

        let mut detached = 0;
        let mut panicked = 0;
        for worker in workers {
            if exited.contains(&worker.worker_id) || worker.handle.is_finished() {
                if worker.handle.join().is_ok() {
                    debug!(worker_id = worker.worker_id, "Worker joined");
                } else {
                    warn!(worker_id = worker.worker_id, "Worker panicked");
                    panicked += 1;
                }
            } else {
                warn!(
                    worker_id = worker.worker_id,
                    "Worker did not exit within timeout - detaching"
                );
                detached += 1;
            }
        }

        info!(worker_count = worker_count, "Interaction pool terminated");

        if detached > 0 {
            Err(PoolError::WorkersDetached { count: detached })
        } else if panicked > 0 {
            Err(PoolError::WorkerPanicked { count: panicked })
        } else {
            Ok(())
        }
    }

    /// Thread ids of the workers still running, for diagnostics.
    #[must_use]
    pub fn worker_ids(&self) -> Vec<ThreadId> {
        self.workers
            .lock()
            .iter()
            .filter(|w| !w.handle.is_finished())
            .map(|w| w.handle.thread().id())
            .collect()
    }

    /// True between a successful `start` and `terminate`.
    #[must_use]
    pub fn is_running(&self) -> bool {
        *self.state.lock() == Lifecycle::Running
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(self.config.worker_count)
    }

    fn receive_next(&self) -> Result<R, InteractionError> {
        match *self.state.lock() {
            Lifecycle::Created => return Err(PoolError::NotStarted.into()),
            Lifecycle::Terminated => return Err(PoolError::PoolShutdown.into()),
            Lifecycle::Running => {}
        }

        if !self.counters.claim() {
            return Err(PoolError::NothingOutstanding.into());
        }
        let Ok(completion) = self.result_rx.recv() else {
            self.counters.release();
            return Err(PoolError::PoolShutdown.into());
        };

        let Completion {
            job_id,
            worker_id,
            outcome,
        } = completion;
        if outcome.is_failure() {
            self.counters.failed.fetch_add(1, Ordering::Relaxed);
            debug!(job_id = job_id, worker_id = worker_id, "Received failed job");
        } else {
            debug!(job_id = job_id, worker_id = worker_id, "Received job result");
        }
        outcome.into_result()
    }
}

impl<J, R, E> Drop for InteractionPool<J, R, E>
where
    J: Send + 'static,
    R: Send + 'static,
    E: JobExecutor<J, R>,
{
    fn drop(&mut self) {
        if let Err(err) = self.terminate() {
            warn!(error = %err, "Interaction pool teardown on drop was incomplete");
        }
    }
}

/// A started pool that terminates itself when dropped.
///
/// Derefs to the pool. Teardown failures on drop are logged and swallowed.
pub struct PoolScope<'a, J, R, E>
where
    J: Send + 'static,
    R: Send + 'static,
    E: JobExecutor<J, R>,
{
    pool: &'a InteractionPool<J, R, E>,
}

impl<'a, J, R, E> PoolScope<'a, J, R, E>
where
    J: Send + 'static,
    R: Send + 'static,
    E: JobExecutor<J, R>,
{
    /// The pool this scope keeps running.
    #[must_use]
    pub const fn pool(&self) -> &'a InteractionPool<J, R, E> {
        self.pool
    }
}

impl<J, R, E> Deref for PoolScope<'_, J, R, E>
where
    J: Send + 'static,
    R: Send + 'static,
    E: JobExecutor<J, R>,
{
    type Target = InteractionPool<J, R, E>;

    fn deref(&self) -> &Self::Target {
        self.pool
    }
}

impl<J, R, E> Drop for PoolScope<'_, J, R, E>
where
    J: Send + 'static,
    R: Send + 'static,
    E: JobExecutor<J, R>,
{
    fn drop(&mut self) {
        if let Err(err) = self.pool.terminate() {
            debug!(error = %err, "Ignoring teardown failure on scope exit");
        }
    }
}

/// Iterator returned by [`InteractionPool::receive_all`].
pub struct ReceiveAll<'a, J, R, E>
where
    J: Send + 'static,
    R: Send + 'static,
    E: JobExecutor<J, R>,
{
    pool: &'a InteractionPool<J, R, E>,
    remaining: u64,
    fused: bool,
}

impl<J, R, E> Iterator for ReceiveAll<'_, J, R, E>
where
    J: Send + 'static,
    R: Send + 'static,
    E: JobExecutor<J, R>,
{
    type Item = Result<R, InteractionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused || self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let result = self.pool.receive_next();
        match result {
            // Another receiver took what was left.
            Err(InteractionError::Pool(PoolError::NothingOutstanding)) => {
                self.fused = true;
                None
            }
            Err(_) => {
                self.fused = true;
                Some(result)
            }
            Ok(_) => Some(result),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.fused {
            return (0, Some(0));
        }
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (0, Some(remaining))
    }
}

impl<J, R, E> FusedIterator for ReceiveAll<'_, J, R, E>
where
    J: Send + 'static,
    R: Send + 'static,
    E: JobExecutor<J, R>,
{
}

/// Render a panic payload as text.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

/// Spawn a worker thread.
fn spawn_worker<J, R, E>(
    worker_id: usize,
    config: &WorkerPoolConfig,
    job_rx: Receiver<QueuedJob<J>>,
    result_tx: Sender<Completion<R>>,
    exit_tx: Sender<usize>,
    shutdown: Arc<AtomicBool>,
    executor: E,
) -> std::io::Result<JoinHandle<()>>
where
    J: Send + 'static,
    R: Send + 'static,
    E: JobExecutor<J, R>,
{
    thread::Builder::new()
        .name(format!("{}-{worker_id}", config.thread_name_prefix))
        .stack_size(config.thread_stack_size)
        .spawn(move || {
            let _exit = ExitNotice { worker_id, exit_tx };
            debug!(worker_id = worker_id, "Worker thread started");

            // recv() returns Err once terminate drops the job sender
            for QueuedJob { id: job_id, job } in job_rx.iter() {
                if shutdown.load(Ordering::Acquire) {
                    debug!(worker_id = worker_id, "Worker saw shutdown, exiting");
                    break;
                }

                debug!(worker_id = worker_id, job_id = job_id, "Worker executing job");
                let ctx = JobContext::new(worker_id, job_id, Arc::clone(&shutdown));

                let outcome =
                    match panic::catch_unwind(AssertUnwindSafe(|| executor.execute(job, &ctx))) {
                        Ok(Ok(value)) => JobOutcome::Success(value),
                        Ok(Err(error)) => {
                            debug!(
                                worker_id = worker_id,
                                job_id = job_id,
                                error = %error,
                                "Job failed"
                            );
                            JobOutcome::Failure(ErrorMarker::new(worker_id, job_id, error))
                        }
                        Err(payload) => {
                            let message = panic_message(payload.as_ref());
                            warn!(
                                worker_id = worker_id,
                                job_id = job_id,
                                panic = %message,
                                "Job panicked"
                            );
                            let error = InteractionError::WorkerPanic {
                                worker: worker_id,
                                message,
                            };
                            JobOutcome::Failure(ErrorMarker::new(worker_id, job_id, error))
                        }
                    };

                let completion = Completion {
                    job_id,
                    worker_id,
                    outcome,
                };
                if result_tx.send(completion).is_err() {
                    debug!(worker_id = worker_id, "Result channel closed, exiting");
                    break;
                }
            }

            debug!(worker_id = worker_id, "Worker thread exiting");
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn config(workers: usize) -> WorkerPoolConfig {
        WorkerPoolConfig::new()
            .with_worker_count(workers)
            .with_shutdown_timeout(Duration::from_secs(5))
    }

    #[derive(Clone)]
    struct CountingExecutor {
        executed: Arc<AtomicUsize>,
    }

    impl JobExecutor<u32, String> for CountingExecutor {
        fn execute(&self, job: u32, _ctx: &JobContext) -> Result<String, InteractionError> {
            self.executed.fetch_add(1, Ordering::Relaxed);
            thread::sleep(Duration::from_millis(5));
            Ok(format!("Result: {job}"))
        }
    }

    fn counting() -> CountingExecutor {
        CountingExecutor {
            executed: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[test]
    fn test_pool_basic() {
        let executor = counting();
        let pool = InteractionPool::new(config(2), executor.clone()).unwrap();
        pool.start().unwrap();

        pool.submit(1).unwrap();
        assert_eq!(pool.receive_one().unwrap(), "Result: 1");
        assert_eq!(executor.executed.load(Ordering::Relaxed), 1);

        let stats = pool.stats();
        assert_eq!(stats.submitted, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.outstanding, 0);

        pool.terminate().unwrap();
    }

    #[test]
    fn new_rejects_zero_workers() {
        let result = InteractionPool::new(config(0), counting());
        assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
    }

    #[test]
    fn start_is_single_use() {
        let pool = InteractionPool::new(config(1), counting()).unwrap();
        pool.start().unwrap();
        assert_eq!(pool.start(), Err(PoolError::AlreadyStarted));
        pool.terminate().unwrap();
        assert_eq!(pool.start(), Err(PoolError::PoolShutdown));
    }

    #[test]
    fn receive_before_start_is_an_error() {
        let pool = InteractionPool::new(config(1), counting()).unwrap();
        pool.submit(3).unwrap();
        assert_eq!(
            pool.receive_one(),
            Err(InteractionError::Pool(PoolError::NotStarted))
        );
    }

    #[test]
    fn receive_one_without_outstanding_jobs_does_not_block() {
        let pool = InteractionPool::new(config(1), counting()).unwrap();
        let _scope = pool.enter().unwrap();
        assert_eq!(
            pool.receive_one(),
            Err(InteractionError::Pool(PoolError::NothingOutstanding))
        );
    }

    #[test]
    fn jobs_submitted_before_start_run_after_start() {
        let pool = InteractionPool::new(config(2), counting()).unwrap();
        for job in 0..4 {
            pool.submit(job).unwrap();
        }
        let scope = pool.enter().unwrap();
        let results: Result<Vec<_>, _> = scope.receive_all().collect();
        assert_eq!(results.unwrap().len(), 4);
    }

    #[test]
    fn terminate_is_idempotent_and_stops_workers() {
        let pool = InteractionPool::new(config(3), counting()).unwrap();
        pool.start().unwrap();
        assert_eq!(pool.worker_ids().len(), 3);
        assert!(pool.is_running());

        pool.terminate().unwrap();
        pool.terminate().unwrap();
        assert!(pool.worker_ids().is_empty());
        assert!(!pool.is_running());
        assert_eq!(pool.submit(1), Err(PoolError::PoolShutdown));
    }

    #[test]
    fn panic_message_handles_both_payload_kinds() {
        let boxed: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(panic_message(boxed.as_ref()), "static str");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(17_u8);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }
}
