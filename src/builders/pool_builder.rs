//! Builders that bind an executor and its fixed arguments to a pool.

use std::path::PathBuf;

use tracing::debug;

use crate::analysis::{CreateModelPool, GrowthRateCalculator, GrowthRatePool, PairModelBuilder};
use crate::config::WorkerPoolConfig;
use crate::core::PoolError;

/// Build a pool that writes pair community models into `output_folder`.
///
/// # Errors
///
/// Returns `PoolError::InvalidConfig` if the configuration is invalid.
pub fn create_model_pool(
    output_folder: impl Into<PathBuf>,
    config: &WorkerPoolConfig,
) -> Result<CreateModelPool, PoolError> {
    let builder = PairModelBuilder::new(output_folder);
    debug!(
        output = %builder.output_folder().display(),
        worker_count = config.worker_count,
        "Building create-model pool"
    );
    CreateModelPool::new(config.clone(), builder)
}

/// Build a pool that evaluates community models in the medium at
/// `media_filename`.
///
/// The medium is read by each job, so a missing file fails jobs rather
/// than pool construction.
///
/// # Errors
///
/// Returns `PoolError::InvalidConfig` if the configuration is invalid.
pub fn growth_rate_pool(
    media_filename: impl Into<PathBuf>,
    config: &WorkerPoolConfig,
) -> Result<GrowthRatePool, PoolError> {
    let calculator = GrowthRateCalculator::new(media_filename);
    debug!(
        medium = %calculator.medium_file().display(),
        worker_count = config.worker_count,
        "Building growth-rate pool"
    );
    GrowthRatePool::new(config.clone(), calculator)
}
