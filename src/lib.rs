//! # MMinte
//!
//! Pairwise microbial community analysis on a fixed pool of worker threads.
//!
//! Building a two-species community model and computing its growth rates are
//! independent, long-running jobs. This crate fans them out across a bounded
//! roster of dedicated workers and collects the results, or the first
//! failure, back on the calling thread.
//!
//! ## Core Problem Solved
//!
//! - **Bounded parallelism**: a fixed number of workers, default
//!   `min(host parallelism, 4)`, shared by every job of a batch
//! - **Failure isolation**: a job that fails or panics is reported back as an
//!   error value; the worker keeps serving the rest of the batch
//! - **Errors as data**: the caller sees the same [`InteractionError`] the job
//!   raised, not a generic "worker crashed"
//! - **Guaranteed teardown**: pools terminate their workers on every exit
//!   path, including early returns and panics
//!
//! ## InteractionPool - the worker pool
//!
//! ```rust,ignore
//! use mminte::config::WorkerPoolConfig;
//! use mminte::core::InteractionPool;
//!
//! let pool = InteractionPool::new(WorkerPoolConfig::new().with_worker_count(4), executor)?;
//! let results = pool.scoped(|pool| {
//!     for job in jobs {
//!         pool.submit(job)?;
//!     }
//!     pool.receive_all().collect::<Result<Vec<_>, _>>()
//! })?;
//! ```
//!
//! ## Interaction analysis
//!
//! ```rust,ignore
//! use mminte::analysis::{calculate_growth_rates, create_interaction_models};
//!
//! let pair_models = create_interaction_models(&["BT.json", "FP.json"], "out", None)?;
//! let growth = calculate_growth_rates(&pair_models, "western.json", None)?;
//! growth.write_csv(std::io::stdout())?;
//! ```
//!
//! [`InteractionError`]: crate::core::InteractionError

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Worker pool core: supervisor, job contract and errors.
pub mod core;
/// Configuration models for worker pools.
pub mod config;
/// Builders to construct the specialized pools.
pub mod builders;
/// Community models and growth-rate computation.
pub mod community;
/// Interaction analysis entry points and pool specializations.
pub mod analysis;
/// Shared utilities.
pub mod util;

pub use analysis::{calculate_growth_rates, create_interaction_models};
pub use crate::core::{InteractionError, InteractionPool};
