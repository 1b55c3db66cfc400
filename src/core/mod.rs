//! Worker pool core: the pool supervisor, the job contract and errors.

pub mod error;
pub mod executor;
pub mod worker_pool;

pub use error::{AppResult, InteractionError, IoCategory};
pub use executor::{JobContext, JobExecutor};
pub use worker_pool::{
    ErrorMarker, InteractionPool, JobId, JobOutcome, PoolError, PoolScope, PoolStats, ReceiveAll,
};
