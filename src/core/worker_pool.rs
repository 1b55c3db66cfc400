//! Fixed-size worker pool with a job channel and a result channel.
//!
//! An [`InteractionPool`] owns a roster of dedicated OS threads. Jobs go out
//! on one unbounded channel, completions come back on another, in completion
//! order. A job that fails inside a worker does not take the worker down: the
//! failure is captured as an [`ErrorMarker`] value, sent back like any other
//! result, and re-raised as the original [`InteractionError`] when the caller
//! drains it.
//!
//! # Example
//!
//! ```rust
//! use mminte::config::WorkerPoolConfig;
//! use mminte::core::{InteractionError, InteractionPool, JobContext};
//!
//! let square = |n: u64, _ctx: &JobContext| Ok::<_, InteractionError>(n * n);
//! let pool = InteractionPool::new(WorkerPoolConfig::new().with_worker_count(2), square)?;
//!
//! let mut total = pool.scoped(|pool| -> Result<Vec<u64>, InteractionError> {
//!     for n in 1..=4 {
//!         pool.submit(n)?;
//!     }
//!     pool.receive_all().collect::<Result<Vec<_>, _>>()
//! })?;
//! total.sort_unstable();
//! assert_eq!(total, vec![1, 4, 9, 16]);
//! # Ok::<(), InteractionError>(())
//! ```

mod native;

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::error::InteractionError;

pub use native::{InteractionPool, PoolScope, ReceiveAll};

/// Identifier assigned to each submitted job, unique within one pool.
pub type JobId = u64;

/// Errors from pool lifecycle and the submit/receive protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolError {
    /// `start` was called on a pool that is already running.
    #[error("pool has already been started")]
    AlreadyStarted,

    /// Results were requested before the workers were started.
    #[error("pool has not been started")]
    NotStarted,

    /// The pool has been terminated.
    #[error("pool has been shut down")]
    PoolShutdown,

    /// `receive_one` was called with no job outstanding.
    #[error("no submitted job is waiting to be received")]
    NothingOutstanding,

    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A worker thread could not be spawned.
    #[error("failed to spawn worker: {0}")]
    Spawn(String),

    /// Workers did not exit within the shutdown timeout and were detached.
    #[error("{count} worker(s) did not exit within the shutdown timeout")]
    WorkersDetached {
        /// Number of detached workers.
        count: usize,
    },

    /// Workers panicked outside of job execution.
    #[error("{count} worker(s) panicked")]
    WorkerPanicked {
        /// Number of panicked workers.
        count: usize,
    },
}

/// A failure captured inside a worker, carried back as a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMarker {
    /// Worker that ran the job.
    pub worker_id: usize,
    /// Job that failed.
    pub job_id: JobId,
    /// The error the job produced.
    pub error: InteractionError,
}

impl ErrorMarker {
    /// Capture `error` raised by `job_id` on `worker_id`.
    #[must_use]
    pub const fn new(worker_id: usize, job_id: JobId, error: InteractionError) -> Self {
        Self {
            worker_id,
            job_id,
            error,
        }
    }

    /// The captured error, ready to be re-raised.
    #[must_use]
    pub fn into_error(self) -> InteractionError {
        self.error
    }
}

/// What a worker sends back for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome<R> {
    /// The job produced a value.
    Success(R),
    /// The job failed; the marker holds the original error.
    Failure(ErrorMarker),
}

impl<R> JobOutcome<R> {
    /// Turn the outcome back into the result the job returned.
    ///
    /// # Errors
    ///
    /// Returns the captured error for a `Failure`.
    pub fn into_result(self) -> Result<R, InteractionError> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(marker) => Err(marker.into_error()),
        }
    }

    /// True for `Failure`.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}

/// Statistics about pool progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of worker threads.
    pub worker_count: usize,

    /// Total jobs submitted.
    pub submitted: u64,

    /// Total results received, successful or not. A receiver blocked on a
    /// result it has claimed already counts.
    pub completed: u64,

    /// Received results that were error markers.
    pub failed: u64,

    /// Jobs submitted but not yet received.
    pub outstanding: u64,
}

/// Submit/receive counters.
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub submitted: AtomicU64,
    pub completed: AtomicU64,
    pub failed: AtomicU64,
}

impl PoolCounters {
    /// Jobs submitted but not yet received.
    pub fn outstanding(&self) -> u64 {
        let completed = self.completed.load(Ordering::Acquire);
        self.submitted
            .load(Ordering::Acquire)
            .saturating_sub(completed)
    }

    /// Reserve one outstanding result for the calling receiver. Counts it
    /// as completed; false when nothing is left to claim.
    pub fn claim(&self) -> bool {
        let submitted = self.submitted.load(Ordering::Acquire);
        self.completed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |completed| {
                (completed < submitted).then_some(completed + 1)
            })
            .is_ok()
    }

    /// Undo a claim whose result never arrived.
    pub fn release(&self) {
        self.completed.fetch_sub(1, Ordering::AcqRel);
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, worker_count: usize) -> PoolStats {
        PoolStats {
            worker_count,
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            outstanding: self.outstanding(),
        }
    }
}

/// A job on its way to a worker.
#[derive(Debug)]
pub(crate) struct QueuedJob<J> {
    pub id: JobId,
    pub job: J,
}

/// A worker's answer for one job.
#[derive(Debug)]
pub(crate) struct Completion<R> {
    pub job_id: JobId,
    pub worker_id: usize,
    pub outcome: JobOutcome<R>,
}
