//! Species, community and medium models and their JSON file format.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::core::InteractionError;

/// File extension of every model and medium file.
pub const MODEL_EXTENSION: &str = "json";

/// Uptake capability of a species for one metabolite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Uptake {
    /// Largest flux the species can take up.
    pub max_uptake: f64,
    /// Growth produced per unit of uptake flux.
    pub biomass_yield: f64,
}

/// A single-species model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesModel {
    /// Short identifier, used in community ids and result rows.
    pub id: String,
    /// Optional descriptive name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Metabolites the species can take up.
    #[serde(default)]
    pub uptake: BTreeMap<String, Uptake>,
    /// Metabolites the species secretes, as flux per unit of growth.
    #[serde(default)]
    pub secretion: BTreeMap<String, f64>,
}

impl SpeciesModel {
    /// Read and validate a species model file.
    ///
    /// # Errors
    ///
    /// - `Io` (`UnsupportedFormat`) for an unrecognized extension
    /// - `Io` (`NotFound`, ...) if the file cannot be read
    /// - `InvalidModel` if the content does not parse or validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InteractionError> {
        let path = path.as_ref();
        let model: Self = read_json(path)?;
        model.validate(path)?;
        debug!(path = %path.display(), id = %model.id, "Loaded species model");
        Ok(model)
    }

    /// Uptake capability for `metabolite`, if the species has one.
    #[must_use]
    pub fn uptake_of(&self, metabolite: &str) -> Option<&Uptake> {
        self.uptake.get(metabolite)
    }

    /// Secretion flux per unit growth, zero when the species does not secrete
    /// `metabolite`.
    #[must_use]
    pub fn secretion_of(&self, metabolite: &str) -> f64 {
        self.secretion.get(metabolite).copied().unwrap_or(0.0)
    }

    fn validate(&self, path: &Path) -> Result<(), InteractionError> {
        if self.id.trim().is_empty() {
            return Err(InteractionError::invalid_model(path, "model id must not be empty"));
        }
        // The id becomes part of community file names.
        if self.id.contains(['/', '\\']) || self.id.contains("..") {
            return Err(InteractionError::invalid_model(
                path,
                format!("model id `{}` must not contain path separators or `..`", self.id),
            ));
        }
        for (metabolite, uptake) in &self.uptake {
            check_amount(path, &format!("uptake.{metabolite}.max_uptake"), uptake.max_uptake)?;
            check_amount(
                path,
                &format!("uptake.{metabolite}.biomass_yield"),
                uptake.biomass_yield,
            )?;
        }
        for (metabolite, rate) in &self.secretion {
            check_amount(path, &format!("secretion.{metabolite}"), *rate)?;
        }
        Ok(())
    }
}

/// A two-member community built from a pair of species models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityModel {
    /// `<A_ID>x<B_ID>`.
    pub id: String,
    /// The two members, A first.
    pub members: [SpeciesModel; 2],
}

impl CommunityModel {
    /// Combine two species into a community.
    #[must_use]
    pub fn pair(a: SpeciesModel, b: SpeciesModel) -> Self {
        Self {
            id: format!("{}x{}", a.id, b.id),
            members: [a, b],
        }
    }

    /// File name the community is saved under.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.{MODEL_EXTENSION}", self.id)
    }

    /// Member A.
    #[must_use]
    pub const fn a(&self) -> &SpeciesModel {
        &self.members[0]
    }

    /// Member B.
    #[must_use]
    pub const fn b(&self) -> &SpeciesModel {
        &self.members[1]
    }

    /// Read and validate a community model file.
    ///
    /// # Errors
    ///
    /// Same as [`SpeciesModel::load`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InteractionError> {
        let path = path.as_ref();
        let model: Self = read_json(path)?;
        if model.id.trim().is_empty() {
            return Err(InteractionError::invalid_model(path, "community id must not be empty"));
        }
        for member in &model.members {
            member.validate(path)?;
        }
        debug!(path = %path.display(), id = %model.id, "Loaded community model");
        Ok(model)
    }

    /// Write the community into `folder` and return the file path.
    ///
    /// The folder is created if needed. The file is written under a
    /// temporary name and renamed into place, so a failed write never
    /// leaves a partial model behind. An existing file of the same name is
    /// replaced.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the folder or file cannot be written.
    pub fn save(&self, folder: impl AsRef<Path>) -> Result<PathBuf, InteractionError> {
        let folder = folder.as_ref();
        fs::create_dir_all(folder).map_err(|e| InteractionError::io(folder, &e))?;

        let target = folder.join(self.file_name());
        let staging = folder.join(format!(".{}.{}.tmp", self.id, Uuid::new_v4()));

        let body = serde_json::to_vec_pretty(self)
            .map_err(|e| InteractionError::invalid_model(&target, e.to_string()))?;
        if let Err(e) = fs::write(&staging, body) {
            let _ = fs::remove_file(&staging);
            return Err(InteractionError::io(&staging, &e));
        }
        if let Err(e) = fs::rename(&staging, &target) {
            let _ = fs::remove_file(&staging);
            return Err(InteractionError::io(&target, &e));
        }

        debug!(path = %target.display(), "Saved community model");
        Ok(target)
    }
}

/// Growth medium: the flux available for each metabolite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Medium {
    /// Available flux per metabolite. Missing metabolites are unavailable.
    pub bounds: BTreeMap<String, f64>,
}

impl Medium {
    /// Read and validate a medium file.
    ///
    /// # Errors
    ///
    /// Same as [`SpeciesModel::load`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InteractionError> {
        let path = path.as_ref();
        let medium: Self = read_json(path)?;
        for (metabolite, bound) in &medium.bounds {
            check_amount(path, &format!("bounds.{metabolite}"), *bound)?;
        }
        Ok(medium)
    }

    /// Flux available for `metabolite`.
    #[must_use]
    pub fn available(&self, metabolite: &str) -> f64 {
        self.bounds.get(metabolite).copied().unwrap_or(0.0)
    }
}

/// Reject paths whose extension is not [`MODEL_EXTENSION`].
///
/// # Errors
///
/// Returns `Io` with category `UnsupportedFormat`.
pub fn check_extension(path: &Path) -> Result<(), InteractionError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case(MODEL_EXTENSION) => Ok(()),
        _ => Err(InteractionError::unsupported_format(path)),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, InteractionError> {
    check_extension(path)?;
    let text = fs::read_to_string(path).map_err(|e| InteractionError::io(path, &e))?;
    serde_json::from_str(&text).map_err(|e| InteractionError::invalid_model(path, e.to_string()))
}

fn check_amount(path: &Path, field: &str, value: f64) -> Result<(), InteractionError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(InteractionError::invalid_model(
            path,
            format!("{field} must be a finite non-negative number, got {value}"),
        ))
    }
}
