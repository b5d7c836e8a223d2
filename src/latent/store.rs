use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{LatentModel, LatentParams};
use crate::catalog::Catalog;
use crate::error::{MatchError, Result};

/// Version of the persisted model layout.
pub const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct PersistedRef<'a> {
    format_version: u32,
    model: &'a LatentModel,
}

#[derive(Deserialize)]
struct Persisted {
    format_version: u32,
    model: LatentModel,
}

impl LatentModel {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&PersistedRef {
            format_version: MODEL_FORMAT_VERSION,
            model: self,
        })?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let persisted: Persisted = serde_json::from_str(json)?;
        if persisted.format_version != MODEL_FORMAT_VERSION {
            return Err(MatchError::config(format!(
                "unsupported model format version {} (expected {})",
                persisted.format_version, MODEL_FORMAT_VERSION
            )));
        }
        persisted.model.validate()?;
        Ok(persisted.model)
    }

    /// Writes the model, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| MatchError::io(parent, e))?;
        }
        fs::write(path, self.to_json()?).map_err(|e| MatchError::io(path, e))?;

        info!(
            "Saved latent model to {:?} ({} courses, k={})",
            path,
            self.course_codes.len(),
            self.n_components
        );
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| MatchError::io(path, e))?;
        let model = Self::from_json(&json)?;

        info!(
            "Loaded latent model from {:?} ({} courses, {} skills, k={})",
            path,
            model.course_codes.len(),
            model.vocabulary.len(),
            model.n_components
        );
        Ok(model)
    }

    /// True when the model was trained on exactly this catalog's courses and
    /// skills.
    pub fn is_aligned_with(&self, catalog: &Catalog) -> bool {
        self.course_codes == catalog.course_codes() && &self.vocabulary == catalog.vocabulary()
    }
}

/// Model file location with train-on-missing semantics.
#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Loads the stored model, or trains and saves a fresh one when none
    /// exists, it cannot be read, or it no longer matches `catalog`.
    pub fn load_or_train(&self, catalog: &Catalog, params: LatentParams) -> Result<LatentModel> {
        if self.exists() {
            match LatentModel::load(&self.path) {
                Ok(model) if model.is_aligned_with(catalog) => return Ok(model),
                Ok(_) => warn!("Stored model at {:?} is stale for the current catalog, retraining", self.path),
                Err(e) => warn!("Failed to load model from {:?}: {}, retraining", self.path, e),
            }
        } else {
            info!("No model at {:?}, training a new one", self.path);
        }

        let model = LatentModel::train(catalog, params)?;
        model.save(&self.path)?;
        Ok(model)
    }
}
