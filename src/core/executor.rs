//! The per-job computation contract workers run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::error::InteractionError;
use super::worker_pool::JobId;

/// What a worker knows about the job it is running.
#[derive(Debug, Clone)]
pub struct JobContext {
    worker_id: usize,
    job_id: JobId,
    shutdown: Arc<AtomicBool>,
}

impl JobContext {
    pub(crate) const fn new(worker_id: usize, job_id: JobId, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            worker_id,
            job_id,
            shutdown,
        }
    }

    /// A context that is never cancelled, for running an executor inline.
    #[must_use]
    pub fn detached() -> Self {
        Self::new(0, 0, Arc::new(AtomicBool::new(false)))
    }

    /// Index of the worker running the job.
    #[must_use]
    pub const fn worker_id(&self) -> usize {
        self.worker_id
    }

    /// Identifier assigned to the job at submit time.
    #[must_use]
    pub const fn job_id(&self) -> JobId {
        self.job_id
    }

    /// True once the owning pool has started terminating.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once the owning pool has started terminating.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::Cancelled`] after termination began.
    pub fn check_cancelled(&self) -> Result<(), InteractionError> {
        if self.is_cancelled() {
            Err(InteractionError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Executes one job descriptor and produces its result.
///
/// Implementations carry the fixed extra arguments of a pool (an output
/// directory, a medium file) as fields. Each worker thread owns its own clone.
/// Long computations should poll [`JobContext::is_cancelled`] so pool
/// termination does not have to wait for them.
///
/// # Example
///
/// ```rust
/// use mminte::core::{InteractionError, JobContext, JobExecutor};
///
/// #[derive(Clone)]
/// struct Doubler;
///
/// impl JobExecutor<u64, u64> for Doubler {
///     fn execute(&self, job: u64, _ctx: &JobContext) -> Result<u64, InteractionError> {
///         Ok(job * 2)
///     }
/// }
///
/// assert_eq!(Doubler.execute(21, &JobContext::detached()), Ok(42));
/// ```
pub trait JobExecutor<J, R>: Send + Sync + Clone + 'static
where
    J: Send + 'static,
    R: Send + 'static,
{
    /// Run `job` to completion.
    ///
    /// # Errors
    ///
    /// Any failure is captured by the worker and re-raised to whoever drains
    /// the job's result.
    fn execute(&self, job: J, ctx: &JobContext) -> Result<R, InteractionError>;
}

impl<J, R, F> JobExecutor<J, R> for F
where
    J: Send + 'static,
    R: Send + 'static,
    F: Fn(J, &JobContext) -> Result<R, InteractionError> + Send + Sync + Clone + 'static,
{
    fn execute(&self, job: J, ctx: &JobContext) -> Result<R, InteractionError> {
        self(job, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_executors() {
        let add_one = |job: u32, _ctx: &JobContext| Ok::<_, InteractionError>(job + 1);
        assert_eq!(add_one.execute(1, &JobContext::detached()), Ok(2));
    }

    #[test]
    fn context_reports_cancellation() {
        let flag = Arc::new(AtomicBool::new(false));
        let ctx = JobContext::new(2, 9, Arc::clone(&flag));
        assert_eq!(ctx.worker_id(), 2);
        assert_eq!(ctx.job_id(), 9);
        assert!(ctx.check_cancelled().is_ok());

        flag.store(true, Ordering::Release);
        assert!(ctx.is_cancelled());
        assert_eq!(ctx.check_cancelled(), Err(InteractionError::Cancelled));
    }
}
