//! Skill-to-course matching and ranking.
//!
//! A person's self-reported skills are scored against every course of a
//! catalog, either directly requirement by requirement or through a latent
//! factor model trained on the catalog, and returned as ranked
//! [`MatchResult`]s with matched and missing skills.

pub mod catalog;
pub mod config;
pub mod error;
pub mod graph;
pub mod latent;
pub mod matching;
pub mod proficiency;
pub mod similarity;
pub mod skills;

pub use catalog::{Catalog, CatalogRepository, Course, SkillRequirement};
pub use error::{MatchError, Result};
pub use graph::{suggest_next_skills, LearningPathPlanner, SkillGraph, SkillSuggestion};
pub use latent::{query_latent_model, train_latent_model, LatentModel, LatentParams, ModelStore};
pub use matching::{
    rank_courses, score_course, HybridWeights, MatchResult, MatchingStrategy, Preferences, Ranker,
    StrategyKind,
};
pub use proficiency::{ProficiencyLevel, ProficiencyScale};
pub use similarity::{Calibration, DirectScorer};
pub use skills::{build_skill_vector, SkillProficiency, SkillSet, SkillVector, Vocabulary};
