//! Configuration models for worker pools.

pub mod pool;

pub use pool::{default_worker_count, WorkerPoolConfig, MAX_DEFAULT_WORKERS};
