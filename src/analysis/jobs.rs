//! Job descriptors and the executors bound to the two specialized pools.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::community::{CommunityModel, GrowthRateRecord, Medium, SpeciesModel};
use crate::core::{InteractionError, JobContext, JobExecutor};

/// Two source model files to combine into a community.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourcePair {
    /// Member A's model file.
    pub first: PathBuf,
    /// Member B's model file.
    pub second: PathBuf,
}

impl SourcePair {
    /// Pair two model files, `first` becoming member A.
    pub fn new(first: impl Into<PathBuf>, second: impl Into<PathBuf>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    /// Every unordered pair of `sources`, in combination order: `(0, 1)`,
    /// `(0, 2)`, ..., `(1, 2)`, ...
    #[must_use]
    pub fn all_pairs<P: AsRef<Path>>(sources: &[P]) -> Vec<Self> {
        let mut pairs = Vec::with_capacity(sources.len() * sources.len().saturating_sub(1) / 2);
        for (i, first) in sources.iter().enumerate() {
            for second in &sources[i + 1..] {
                pairs.push(Self::new(first.as_ref(), second.as_ref()));
            }
        }
        pairs
    }
}

/// Builds a two-species community model file from a [`SourcePair`].
#[derive(Debug, Clone)]
pub struct PairModelBuilder {
    output_folder: PathBuf,
}

impl PairModelBuilder {
    /// Write community models into `output_folder`.
    pub fn new(output_folder: impl Into<PathBuf>) -> Self {
        Self {
            output_folder: output_folder.into(),
        }
    }

    /// Folder community models are written to.
    #[must_use]
    pub fn output_folder(&self) -> &Path {
        &self.output_folder
    }
}

impl JobExecutor<SourcePair, PathBuf> for PairModelBuilder {
    fn execute(&self, pair: SourcePair, ctx: &JobContext) -> Result<PathBuf, InteractionError> {
        // Both sources are loaded before anything is written.
        let a = SpeciesModel::load(&pair.first)?;
        let b = SpeciesModel::load(&pair.second)?;
        ctx.check_cancelled()?;

        let community = CommunityModel::pair(a, b);
        let path = community.save(&self.output_folder)?;
        debug!(
            worker_id = ctx.worker_id(),
            job_id = ctx.job_id(),
            community = %community.id,
            "Built pair model"
        );
        Ok(path)
    }
}

/// Computes growth rates of a community model file in a fixed medium.
#[derive(Debug, Clone)]
pub struct GrowthRateCalculator {
    medium_file: PathBuf,
}

impl GrowthRateCalculator {
    /// Evaluate communities in the medium stored at `medium_file`.
    pub fn new(medium_file: impl Into<PathBuf>) -> Self {
        Self {
            medium_file: medium_file.into(),
        }
    }

    /// Medium file every job reads.
    #[must_use]
    pub fn medium_file(&self) -> &Path {
        &self.medium_file
    }
}

impl JobExecutor<PathBuf, GrowthRateRecord> for GrowthRateCalculator {
    fn execute(&self, model_file: PathBuf, ctx: &JobContext) -> Result<GrowthRateRecord, InteractionError> {
        let medium = Medium::load(&self.medium_file)?;
        let community = CommunityModel::load(&model_file)?;
        let record = GrowthRateRecord::compute(&community, &medium, ctx)?;
        debug!(
            worker_id = ctx.worker_id(),
            job_id = ctx.job_id(),
            community = %community.id,
            interaction = %record.interaction,
            "Computed growth rates"
        );
        Ok(record)
    }
}
