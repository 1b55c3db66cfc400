//! Entry points: build all pair models, then compute their growth rates.

use std::path::{Path, PathBuf};

use tracing::info;

use super::jobs::SourcePair;
use crate::builders::{create_model_pool, growth_rate_pool};
use crate::community::GrowthRateTable;
use crate::config::WorkerPoolConfig;
use crate::core::InteractionError;

/// Create a two-species community model for every unordered pair of
/// `source_models` and return the produced file names, in completion order.
///
/// `n_processes` overrides the worker count; `None` uses the default width.
///
/// # Errors
///
/// - `InteractionError::InsufficientSources` for fewer than two sources
/// - the first error any pair job raised, unchanged
pub fn create_interaction_models<P: AsRef<Path>>(
    source_models: &[P],
    output_folder: impl AsRef<Path>,
    n_processes: Option<usize>,
) -> Result<Vec<PathBuf>, InteractionError> {
    let config = WorkerPoolConfig::new().with_optional_worker_count(n_processes);
    create_interaction_models_with_config(source_models, output_folder, &config)
}

/// [`create_interaction_models`] with a full pool configuration.
///
/// # Errors
///
/// Same as [`create_interaction_models`], plus `Pool(InvalidConfig)` for an
/// invalid configuration.
pub fn create_interaction_models_with_config<P: AsRef<Path>>(
    source_models: &[P],
    output_folder: impl AsRef<Path>,
    config: &WorkerPoolConfig,
) -> Result<Vec<PathBuf>, InteractionError> {
    if source_models.len() < 2 {
        return Err(InteractionError::InsufficientSources {
            found: source_models.len(),
        });
    }

    let pairs = SourcePair::all_pairs(source_models);
    info!(
        sources = source_models.len(),
        pairs = pairs.len(),
        output = %output_folder.as_ref().display(),
        "Creating pair community models"
    );

    let pool = create_model_pool(output_folder.as_ref(), config)?;
    pool.scoped(|pool| {
        for pair in pairs {
            pool.submit(pair)?;
        }
        pool.receive_all().collect()
    })
}

/// Compute growth rates of every community model in `pair_model_filenames`
/// in the medium stored at `media_filename`. Rows follow completion order.
///
/// `n_processes` overrides the worker count; `None` uses the default width.
///
/// # Errors
///
/// The first error any growth job raised, unchanged. A missing or invalid
/// medium fails the first job that reads it.
pub fn calculate_growth_rates<P: AsRef<Path>>(
    pair_model_filenames: &[P],
    media_filename: impl AsRef<Path>,
    n_processes: Option<usize>,
) -> Result<GrowthRateTable, InteractionError> {
    let config = WorkerPoolConfig::new().with_optional_worker_count(n_processes);
    calculate_growth_rates_with_config(pair_model_filenames, media_filename, &config)
}

/// [`calculate_growth_rates`] with a full pool configuration.
///
/// # Errors
///
/// Same as [`calculate_growth_rates`], plus `Pool(InvalidConfig)` for an
/// invalid configuration.
pub fn calculate_growth_rates_with_config<P: AsRef<Path>>(
    pair_model_filenames: &[P],
    media_filename: impl AsRef<Path>,
    config: &WorkerPoolConfig,
) -> Result<GrowthRateTable, InteractionError> {
    info!(
        models = pair_model_filenames.len(),
        medium = %media_filename.as_ref().display(),
        "Calculating growth rates"
    );

    let pool = growth_rate_pool(media_filename.as_ref(), config)?;
    pool.scoped(|pool| {
        for model in pair_model_filenames {
            pool.submit(model.as_ref().to_path_buf())?;
        }
        pool.receive_all().collect()
    })
}
