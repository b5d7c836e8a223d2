//! Latent-factor course model.
//!
//! The catalog's `n_courses × n_skills` requirement matrix is factorised into
//! non-negative course factors (`n_courses × k`) and skill factors
//! (`k × n_skills`). A person's skill vector is projected into the same
//! `k`-dimensional space and compared with every course by cosine.

mod nmf;
mod store;

pub use store::{ModelStore, MODEL_FORMAT_VERSION};

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::error::{MatchError, Result};
use crate::proficiency::ProficiencyScale;
use crate::skills::{
    cosine, SkillSet, SkillVector, SkillVectorBuilder, Vocabulary, CERTIFICATION_BOOST,
};

/// Training options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatentParams {
    /// Number of latent dimensions.
    pub n_components: usize,
    /// Seed for the factor initialisation.
    pub random_state: u64,
    pub max_iter: usize,
    pub tolerance: f64,
}

impl Default for LatentParams {
    fn default() -> Self {
        Self {
            n_components: 10,
            random_state: 42,
            max_iter: 500,
            tolerance: 1e-4,
        }
    }
}

impl LatentParams {
    pub fn new(n_components: usize, random_state: u64) -> Self {
        Self {
            n_components,
            random_state,
            ..Self::default()
        }
    }
}

/// Trained factorisation plus the indexes aligning it with the catalog.
///
/// Immutable once trained; queries only read it, so a model can be shared
/// across threads behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatentModel {
    course_factors: Array2<f64>,
    skill_factors: Array2<f64>,
    course_codes: Vec<String>,
    vocabulary: Vocabulary,
    n_components: usize,
    scale: ProficiencyScale,
    params: LatentParams,
    reconstruction_error: f64,
}

fn sort_descending(scores: &mut [(String, f64)]) {
    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
}

impl LatentModel {
    /// Trains on the unit-scale requirement matrix of `catalog`.
    pub fn train(catalog: &Catalog, params: LatentParams) -> Result<Self> {
        Self::train_with_scale(catalog, params, ProficiencyScale::Unit)
    }

    pub fn train_with_scale(catalog: &Catalog, params: LatentParams, scale: ProficiencyScale) -> Result<Self> {
        if catalog.is_empty() {
            return Err(MatchError::config("cannot train on an empty catalog"));
        }
        Self::train_matrix(
            catalog.requirement_matrix(scale),
            catalog.course_codes(),
            catalog.vocabulary().clone(),
            params,
            scale,
        )
    }

    /// Trains on an explicit matrix whose rows follow `course_codes` and
    /// whose columns follow `vocabulary`.
    pub fn train_matrix(
        matrix: Array2<f64>,
        course_codes: Vec<String>,
        vocabulary: Vocabulary,
        params: LatentParams,
        scale: ProficiencyScale,
    ) -> Result<Self> {
        if params.n_components == 0 {
            return Err(MatchError::config("n_components must be at least 1"));
        }
        let (rows, cols) = matrix.dim();
        if rows == 0 || cols == 0 {
            return Err(MatchError::config(format!(
                "requirement matrix is empty ({}x{})",
                rows, cols
            )));
        }
        if rows != course_codes.len() || cols != vocabulary.len() {
            return Err(MatchError::config(format!(
                "matrix is {}x{} but index has {} courses and {} skills",
                rows,
                cols,
                course_codes.len(),
                vocabulary.len()
            )));
        }
        if matrix.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(MatchError::config(
                "requirement matrix must be finite and non-negative",
            ));
        }
        if matrix.iter().all(|v| *v == 0.0) {
            return Err(MatchError::config("requirement matrix is all zeros"));
        }

        info!(
            "Training latent model: {} courses x {} skills, k={}, seed={}",
            rows, cols, params.n_components, params.random_state
        );

        let factorization = nmf::factorize(&matrix, &params);

        info!(
            "Latent model trained in {} iterations (reconstruction error {:.4})",
            factorization.iterations, factorization.reconstruction_error
        );

        Ok(Self {
            course_factors: factorization.w,
            skill_factors: factorization.h,
            course_codes,
            vocabulary,
            n_components: params.n_components,
            scale,
            params,
            reconstruction_error: factorization.reconstruction_error,
        })
    }

    pub fn course_codes(&self) -> &[String] {
        &self.course_codes
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn n_components(&self) -> usize {
        self.n_components
    }

    pub fn scale(&self) -> ProficiencyScale {
        self.scale
    }

    pub fn params(&self) -> &LatentParams {
        &self.params
    }

    pub fn course_factors(&self) -> &Array2<f64> {
        &self.course_factors
    }

    pub fn skill_factors(&self) -> &Array2<f64> {
        &self.skill_factors
    }

    pub fn reconstruction_error(&self) -> f64 {
        self.reconstruction_error
    }

    /// Checks the alignment invariants; used after deserialisation.
    pub(crate) fn validate(&self) -> Result<()> {
        let (rows, k) = self.course_factors.dim();
        let (k2, cols) = self.skill_factors.dim();
        if rows != self.course_codes.len()
            || cols != self.vocabulary.len()
            || k != self.n_components
            || k2 != self.n_components
        {
            return Err(MatchError::config(format!(
                "inconsistent model: course factors {}x{}, skill factors {}x{}, {} courses, {} skills, k={}",
                rows,
                k,
                k2,
                cols,
                self.course_codes.len(),
                self.vocabulary.len(),
                self.n_components
            )));
        }
        Ok(())
    }

    fn course_index(&self, code: &str) -> Result<usize> {
        self.course_codes
            .iter()
            .position(|c| c == code)
            .ok_or_else(|| MatchError::UnknownCourse(code.to_string()))
    }

    /// Vector builder on the scale the model was trained with.
    pub fn vector_builder(&self, certification_boost: f64) -> SkillVectorBuilder {
        SkillVectorBuilder::new(self.scale, certification_boost)
    }

    /// Latent representation of a skill vector.
    pub fn project(&self, vector: &SkillVector) -> Result<Array1<f64>> {
        if vector.len() != self.vocabulary.len() {
            return Err(MatchError::config(format!(
                "skill vector has {} dimensions, model vocabulary has {}",
                vector.len(),
                self.vocabulary.len()
            )));
        }
        Ok(nmf::project(
            vector.as_array().view(),
            &self.skill_factors,
            self.params.max_iter,
            self.params.tolerance * 1e-2,
        ))
    }

    /// Similarity in [0, 100] of `vector` to every course, in model order.
    /// A vector with no known skills scores zero everywhere.
    pub fn similarities(&self, vector: &SkillVector) -> Result<Vec<(String, f64)>> {
        let projected = self.project(vector)?;
        Ok(self
            .course_codes
            .iter()
            .zip(self.course_factors.rows())
            .map(|(code, factors)| {
                let similarity = cosine(&projected, &factors.to_owned());
                (code.clone(), (similarity * 100.0).clamp(0.0, 100.0))
            })
            .collect())
    }

    /// Top `top_n` courses for `skills`, most similar first.
    pub fn query(&self, skills: &SkillSet, top_n: usize) -> Vec<(String, f64)> {
        let vector = self
            .vector_builder(CERTIFICATION_BOOST)
            .build(skills, &self.vocabulary);
        // Built against our own vocabulary, so the dimensions always agree.
        let mut scores = self.similarities(&vector).unwrap_or_default();
        sort_descending(&mut scores);
        scores.truncate(top_n);

        debug!("Latent query returned {} courses", scores.len());
        scores
    }

    pub fn course_factors_for(&self, code: &str) -> Result<ArrayView1<'_, f64>> {
        let idx = self.course_index(code)?;
        Ok(self.course_factors.row(idx))
    }

    /// Loadings of one skill on every latent component.
    pub fn skill_factors_for(&self, skill: &str) -> Result<ArrayView1<'_, f64>> {
        let idx = self
            .vocabulary
            .index_of(skill)
            .ok_or_else(|| MatchError::UnknownSkill(skill.to_string()))?;
        Ok(self.skill_factors.column(idx))
    }

    /// Cosine similarity in [0, 1] between two courses' factors.
    pub fn course_similarity(&self, a: &str, b: &str) -> Result<f64> {
        let a = self.course_factors.row(self.course_index(a)?).to_owned();
        let b = self.course_factors.row(self.course_index(b)?).to_owned();
        Ok(cosine(&a, &b))
    }

    /// Courses most similar to `code`, excluding itself.
    pub fn similar_courses(&self, code: &str, top_n: usize) -> Result<Vec<(String, f64)>> {
        let idx = self.course_index(code)?;
        let target = self.course_factors.row(idx).to_owned();

        let mut scores: Vec<(String, f64)> = self
            .course_codes
            .iter()
            .zip(self.course_factors.rows())
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .map(|(_, (other, factors))| (other.clone(), cosine(&target, &factors.to_owned())))
            .collect();

        sort_descending(&mut scores);
        scores.truncate(top_n);
        Ok(scores)
    }

    /// Total loading of every skill across all components, highest first.
    pub fn skill_importance(&self) -> Vec<(String, f64)> {
        let loadings = nmf::column_loadings(&self.skill_factors);
        let mut importance: Vec<(String, f64)> = self
            .vocabulary
            .names()
            .iter()
            .cloned()
            .zip(loadings.iter().copied())
            .collect();
        sort_descending(&mut importance);
        importance
    }
}

/// Trains on a raw requirement matrix with the unit proficiency scale.
pub fn train_latent_model(
    matrix: Array2<f64>,
    course_codes: Vec<String>,
    vocabulary: Vocabulary,
    n_components: usize,
    random_state: u64,
) -> Result<LatentModel> {
    LatentModel::train_matrix(
        matrix,
        course_codes,
        vocabulary,
        LatentParams::new(n_components, random_state),
        ProficiencyScale::Unit,
    )
}

pub fn query_latent_model(model: &LatentModel, skills: &SkillSet, top_n: usize) -> Vec<(String, f64)> {
    model.query(skills, top_n)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::Course;
    use crate::proficiency::ProficiencyLevel;

    pub(crate) fn catalog() -> Catalog {
        use ProficiencyLevel::*;
        Catalog::new(vec![
            Course::new("DB101", "Databases")
                .with_requirement("SQL", Intermediate)
                .with_requirement("Database Design", Beginner),
            Course::new("DB201", "Advanced Databases")
                .with_requirement("SQL", Advanced)
                .with_requirement("Database Design", Advanced)
                .with_requirement("Query Optimization", Intermediate),
            Course::new("WEB101", "Web Basics")
                .with_requirement("HTML", Beginner)
                .with_requirement("CSS", Beginner),
            Course::new("WEB201", "Frontend")
                .with_requirement("HTML", Advanced)
                .with_requirement("CSS", Intermediate)
                .with_requirement("JavaScript", Intermediate),
        ])
    }

    #[test]
    fn test_train_shapes() {
        let model = LatentModel::train(&catalog(), LatentParams::new(2, 42)).unwrap();
        assert_eq!(model.course_factors().dim(), (4, 2));
        assert_eq!(model.skill_factors().dim(), (2, 6));
        assert_eq!(model.course_codes().len(), 4);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_training_is_deterministic() {
        let a = LatentModel::train(&catalog(), LatentParams::new(2, 7)).unwrap();
        let b = LatentModel::train(&catalog(), LatentParams::new(2, 7)).unwrap();
        assert_eq!(a.course_factors(), b.course_factors());
    }

    #[test]
    fn test_invalid_training_input() {
        assert!(matches!(
            LatentModel::train(&catalog(), LatentParams::new(0, 42)),
            Err(MatchError::Config(_))
        ));
        assert!(matches!(
            LatentModel::train(&Catalog::default(), LatentParams::default()),
            Err(MatchError::Config(_))
        ));

        let zeros = Catalog::new(vec![Course::new("EMPTY", "Empty")]);
        assert!(matches!(
            LatentModel::train(&zeros, LatentParams::default()),
            Err(MatchError::Config(_))
        ));

        let mismatched = LatentModel::train_matrix(
            Array2::ones((2, 2)),
            vec!["A".to_string()],
            Vocabulary::new(["x", "y"]),
            LatentParams::new(1, 42),
            ProficiencyScale::Unit,
        );
        assert!(matches!(mismatched, Err(MatchError::Config(_))));
    }

    #[test]
    fn test_query_prefers_related_courses() {
        let model = LatentModel::train(&catalog(), LatentParams::new(2, 42)).unwrap();
        let skills = SkillSet::new()
            .with("HTML", ProficiencyLevel::Advanced)
            .with("CSS", ProficiencyLevel::Advanced);

        let results = model.query(&skills, 4);
        assert_eq!(results.len(), 4);
        assert!(results[0].0.starts_with("WEB"));
        assert!(results.iter().all(|(_, s)| (0.0..=100.0).contains(s)));
        assert!(results.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn test_unknown_skills_score_zero() {
        let model = LatentModel::train(&catalog(), LatentParams::new(2, 42)).unwrap();
        let skills = SkillSet::new().with("Cooking", ProficiencyLevel::Expert);
        assert!(model.query(&skills, 10).iter().all(|(_, s)| *s == 0.0));
    }

    #[test]
    fn test_similar_courses() {
        let model = LatentModel::train(&catalog(), LatentParams::new(2, 42)).unwrap();
        let similar = model.similar_courses("DB101", 3).unwrap();
        assert_eq!(similar.len(), 3);
        assert!(similar.iter().all(|(code, _)| code != "DB101"));

        let ab = model.course_similarity("DB101", "WEB201").unwrap();
        let ba = model.course_similarity("WEB201", "DB101").unwrap();
        assert!((ab - ba).abs() < 1e-12);

        assert!(matches!(
            model.similar_courses("NOPE", 3),
            Err(MatchError::UnknownCourse(_))
        ));
    }

    #[test]
    fn test_lookups() {
        let model = LatentModel::train(&catalog(), LatentParams::new(2, 42)).unwrap();
        assert_eq!(model.skill_factors_for("sql").unwrap().len(), 2);
        assert!(matches!(
            model.skill_factors_for("Cooking"),
            Err(MatchError::UnknownSkill(_))
        ));
        assert_eq!(model.course_factors_for("WEB101").unwrap().len(), 2);
        assert_eq!(model.skill_importance().len(), 6);
    }

    #[test]
    fn test_project_rejects_wrong_dimensions() {
        let model = LatentModel::train(&catalog(), LatentParams::new(2, 42)).unwrap();
        assert!(matches!(
            model.project(&SkillVector::zeros(3)),
            Err(MatchError::Config(_))
        ));
    }
}
