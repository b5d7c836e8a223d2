use config::builder::{ConfigBuilder, DefaultState};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use crate::error::Result;
use crate::latent::LatentParams;
use crate::matching::{HybridWeights, StrategyKind};
use crate::similarity::{Calibration, DirectScorer};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub matching: MatchingConfig,
    pub latent: LatentParams,
    #[serde(default)]
    pub calibration: Calibration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    pub catalog_path: PathBuf,
    pub model_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingConfig {
    pub default_top_n: usize,
    pub strategy: StrategyKind,
    pub latent_weight: f64,
    pub direct_weight: f64,
    pub missing_threshold: f64,
    pub infer_skills: bool,
}

impl Config {
    /// Defaults, then an optional `skill-match.{toml,yaml,json}` file, then
    /// `SKILL_MATCH__SECTION__KEY` environment variables.
    pub fn load() -> std::result::Result<Self, config::ConfigError> {
        // Load .env file
        let _ = dotenvy::dotenv();

        let config = Self::defaults()?
            .add_source(config::File::with_name("skill-match").required(false))
            // Load from environment
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .prefix("SKILL_MATCH")
                    .prefix_separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }

    fn defaults() -> std::result::Result<ConfigBuilder<DefaultState>, config::ConfigError> {
        let defaults = LatentParams::default();
        config::Config::builder()
            .set_default("data.catalog_path", "data/course_skills.json")?
            .set_default("data.model_path", "models/latent_model.json")?
            .set_default("matching.default_top_n", 10)?
            .set_default("matching.strategy", "hybrid")?
            .set_default("matching.latent_weight", 0.7)?
            .set_default("matching.direct_weight", 0.3)?
            .set_default("matching.missing_threshold", 0.5)?
            .set_default("matching.infer_skills", false)?
            .set_default("latent.n_components", defaults.n_components as u64)?
            .set_default("latent.random_state", defaults.random_state)?
            .set_default("latent.max_iter", defaults.max_iter as u64)?
            .set_default("latent.tolerance", defaults.tolerance)
    }

    /// Flat environment variables only, without a config file.
    pub fn from_env() -> Self {
        let calibration = Calibration::default();
        let latent = LatentParams::default();
        Self {
            data: DataConfig {
                catalog_path: env::var("CATALOG_PATH")
                    .unwrap_or_else(|_| "data/course_skills.json".to_string())
                    .into(),
                model_path: env::var("MODEL_PATH")
                    .unwrap_or_else(|_| "models/latent_model.json".to_string())
                    .into(),
            },
            matching: MatchingConfig {
                default_top_n: env::var("DEFAULT_TOP_N")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
                strategy: env::var("MATCHING_STRATEGY")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_default(),
                latent_weight: env::var("LATENT_WEIGHT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0.7),
                direct_weight: env::var("DIRECT_WEIGHT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0.3),
                missing_threshold: env::var("MISSING_THRESHOLD")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(calibration.missing_threshold),
                infer_skills: env::var("INFER_SKILLS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(false),
            },
            latent: LatentParams {
                n_components: env::var("N_COMPONENTS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(latent.n_components),
                random_state: env::var("RANDOM_STATE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(latent.random_state),
                ..latent
            },
            calibration,
        }
    }

    /// Calibration with the matching section's missing threshold applied.
    pub fn calibration(&self) -> Calibration {
        Calibration {
            missing_threshold: self.matching.missing_threshold,
            ..self.calibration.clone()
        }
    }

    pub fn direct_scorer(&self) -> DirectScorer {
        DirectScorer::new(self.calibration()).with_inference(self.matching.infer_skills)
    }

    pub fn hybrid_weights(&self) -> Result<HybridWeights> {
        HybridWeights::new(self.matching.latent_weight, self.matching.direct_weight)
    }
}
