//! Pairwise interaction analysis on specialized worker pools.

pub mod api;
pub mod jobs;

use std::path::PathBuf;

use crate::community::GrowthRateRecord;
use crate::core::InteractionPool;

pub use api::{
    calculate_growth_rates, calculate_growth_rates_with_config, create_interaction_models,
    create_interaction_models_with_config,
};
pub use jobs::{GrowthRateCalculator, PairModelBuilder, SourcePair};

/// Pool that turns source model pairs into community model files.
pub type CreateModelPool = InteractionPool<SourcePair, PathBuf, PairModelBuilder>;

/// Pool that computes growth rates of community model files in one medium.
pub type GrowthRatePool = InteractionPool<PathBuf, GrowthRateRecord, GrowthRateCalculator>;
