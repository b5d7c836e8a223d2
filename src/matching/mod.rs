mod hybrid;
mod preferences;
mod ranker;
mod result;

pub use hybrid::HybridWeights;
pub use preferences::{Preferences, BOOST_CEILING, PREFERRED_BOOST};
pub use ranker::Ranker;
pub use result::{skill_breakdown, MatchResult};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

use crate::catalog::{Catalog, Course};
use crate::error::{MatchError, Result};
use crate::latent::LatentModel;
use crate::similarity::{round2, DirectScorer};
use crate::skills::{SkillSet, CERTIFICATION_BOOST};

/// Which scorer a ranker runs, as named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Direct,
    Latent,
    #[default]
    Hybrid,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Direct => write!(f, "direct"),
            StrategyKind::Latent => write!(f, "latent"),
            StrategyKind::Hybrid => write!(f, "hybrid"),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "direct" | "semantic" => Ok(StrategyKind::Direct),
            "latent" | "nmf" => Ok(StrategyKind::Latent),
            "hybrid" => Ok(StrategyKind::Hybrid),
            other => Err(MatchError::config(format!("unknown matching strategy '{}'", other))),
        }
    }
}

/// Scores through a trained [`LatentModel`]. Skill breakdowns come from
/// plain level comparison since the latent space has no per-skill view.
#[derive(Debug, Clone)]
pub struct LatentScorer {
    model: Arc<LatentModel>,
    certification_boost: f64,
}

impl LatentScorer {
    pub fn new(model: Arc<LatentModel>) -> Self {
        Self {
            model,
            certification_boost: CERTIFICATION_BOOST,
        }
    }

    pub fn with_certification_boost(mut self, boost: f64) -> Self {
        self.certification_boost = boost;
        self
    }

    pub fn model(&self) -> &LatentModel {
        &self.model
    }

    fn similarities(&self, skills: &SkillSet) -> Result<Vec<(String, f64)>> {
        let vector = self
            .model
            .vector_builder(self.certification_boost)
            .build(skills, self.model.vocabulary());
        self.model.similarities(&vector)
    }

    fn result_for(skills: &SkillSet, course: &Course, percentage: f64) -> MatchResult {
        let (matched_skills, missing_skills) = skill_breakdown(skills, course);
        MatchResult {
            subject_id: None,
            course_code: course.code.clone(),
            course_name: Some(course.name.clone()),
            match_percentage: round2(percentage),
            matched_skills,
            missing_skills,
        }
    }

    /// Catalog courses unknown to the model are skipped.
    pub fn score_catalog(&self, skills: &SkillSet, catalog: &Catalog) -> Result<Vec<MatchResult>> {
        let similarities = self.similarities(skills)?;

        Ok(catalog
            .courses()
            .iter()
            .filter_map(|course| {
                match similarities.iter().find(|(code, _)| *code == course.code) {
                    Some((_, pct)) => Some(Self::result_for(skills, course, *pct)),
                    None => {
                        warn!("Course {} is not in the latent model, skipping", course.code);
                        None
                    }
                }
            })
            .collect())
    }

    pub fn match_course(&self, skills: &SkillSet, course: &Course) -> Result<MatchResult> {
        let similarities = self.similarities(skills)?;
        let (_, pct) = similarities
            .iter()
            .find(|(code, _)| *code == course.code)
            .ok_or_else(|| MatchError::UnknownCourse(course.code.clone()))?;
        Ok(Self::result_for(skills, course, *pct))
    }
}

/// The scoring approach, fixed when a ranker is built.
#[derive(Debug, Clone)]
pub enum MatchingStrategy {
    Direct(DirectScorer),
    Latent(LatentScorer),
    Hybrid {
        latent: LatentScorer,
        direct: DirectScorer,
        weights: HybridWeights,
    },
}

impl Default for MatchingStrategy {
    fn default() -> Self {
        MatchingStrategy::Direct(DirectScorer::default())
    }
}

impl MatchingStrategy {
    pub fn direct(scorer: DirectScorer) -> Self {
        MatchingStrategy::Direct(scorer)
    }

    pub fn latent(model: Arc<LatentModel>) -> Self {
        MatchingStrategy::Latent(LatentScorer::new(model))
    }

    pub fn hybrid(model: Arc<LatentModel>, direct: DirectScorer, weights: HybridWeights) -> Self {
        MatchingStrategy::Hybrid {
            latent: LatentScorer::new(model),
            direct,
            weights,
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            MatchingStrategy::Direct(_) => StrategyKind::Direct,
            MatchingStrategy::Latent(_) => StrategyKind::Latent,
            MatchingStrategy::Hybrid { .. } => StrategyKind::Hybrid,
        }
    }

    /// Scores every course, in catalog order.
    pub fn score_catalog(&self, skills: &SkillSet, catalog: &Catalog) -> Result<Vec<MatchResult>> {
        match self {
            MatchingStrategy::Direct(scorer) => Ok(catalog
                .courses()
                .iter()
                .map(|course| scorer.match_course(skills, course))
                .collect()),
            MatchingStrategy::Latent(scorer) => scorer.score_catalog(skills, catalog),
            MatchingStrategy::Hybrid {
                latent,
                direct,
                weights,
            } => {
                let latent_results = latent.score_catalog(skills, catalog)?;
                let direct_results = catalog
                    .courses()
                    .iter()
                    .map(|course| direct.match_course(skills, course))
                    .collect();
                Ok(weights.combine(latent_results, direct_results))
            }
        }
    }

    pub fn match_course(&self, skills: &SkillSet, course: &Course) -> Result<MatchResult> {
        match self {
            MatchingStrategy::Direct(scorer) => Ok(scorer.match_course(skills, course)),
            MatchingStrategy::Latent(scorer) => scorer.match_course(skills, course),
            MatchingStrategy::Hybrid {
                latent,
                direct,
                weights,
            } => {
                let latent_result = latent.match_course(skills, course)?;
                let direct_result = direct.match_course(skills, course);
                Ok(weights
                    .combine(vec![latent_result], vec![direct_result])
                    .remove(0))
            }
        }
    }
}

/// Stable sort, highest percentage first; ties keep their input order.
pub(crate) fn sort_by_percentage(results: &mut [MatchResult]) {
    results.sort_by(|a, b| {
        b.match_percentage
            .partial_cmp(&a.match_percentage)
            .unwrap_or(Ordering::Equal)
    });
}

/// Direct-strategy match of one course with default calibration.
pub fn score_course(skills: &SkillSet, course: &Course) -> MatchResult {
    DirectScorer::default().match_course(skills, course)
}

/// Direct-strategy ranking of `courses`, best `top_n` first.
pub fn rank_courses(skills: &SkillSet, courses: &[Course], top_n: usize) -> Vec<MatchResult> {
    let scorer = DirectScorer::default();
    let mut results: Vec<MatchResult> = courses
        .iter()
        .map(|course| scorer.match_course(skills, course))
        .collect();
    sort_by_percentage(&mut results);
    results.truncate(top_n);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::latent::LatentParams;
    use crate::proficiency::ProficiencyLevel;

    fn catalog() -> Catalog {
        crate::latent::tests::catalog()
    }

    fn web_skills() -> SkillSet {
        SkillSet::new()
            .with("HTML", ProficiencyLevel::Advanced)
            .with("CSS", ProficiencyLevel::Intermediate)
    }

    #[test]
    fn test_strategy_kind_parse() {
        assert_eq!("NMF".parse::<StrategyKind>().unwrap(), StrategyKind::Latent);
        assert_eq!("semantic".parse::<StrategyKind>().unwrap(), StrategyKind::Direct);
        assert!("magic".parse::<StrategyKind>().is_err());
        assert_eq!(StrategyKind::default().to_string(), "hybrid");
    }

    #[test]
    fn test_rank_courses_is_sorted_and_truncated() {
        let courses = catalog().courses().to_vec();
        let ranked = rank_courses(&web_skills(), &courses, 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].course_code, "WEB101");
        assert!(ranked[0].match_percentage >= ranked[1].match_percentage);
    }

    #[test]
    fn test_stable_tie_order() {
        let courses = vec![
            Course::new("B", "B").with_requirement("Rust", ProficiencyLevel::Beginner),
            Course::new("A", "A").with_requirement("Go", ProficiencyLevel::Beginner),
        ];
        let ranked = rank_courses(&SkillSet::new(), &courses, 10);
        assert_eq!(ranked[0].course_code, "B");
        assert_eq!(ranked[1].course_code, "A");
    }

    #[test]
    fn test_latent_strategy_breakdown_uses_levels() {
        let model = Arc::new(LatentModel::train(&catalog(), LatentParams::new(2, 42)).unwrap());
        let strategy = MatchingStrategy::latent(model);
        let catalog = catalog();
        let course = catalog.get("WEB201").unwrap();

        let result = strategy.match_course(&web_skills(), course).unwrap();
        let matched: Vec<_> = result.matched_names().collect();
        let missing: Vec<_> = result.missing_names().collect();
        assert_eq!(matched, vec!["HTML", "CSS"]);
        assert_eq!(missing, vec!["JavaScript"]);
        assert_eq!(strategy.kind(), StrategyKind::Latent);
    }

    #[test]
    fn test_latent_unknown_course_is_error() {
        let model = Arc::new(LatentModel::train(&catalog(), LatentParams::new(2, 42)).unwrap());
        let strategy = MatchingStrategy::latent(model);
        let stray = Course::new("NEW", "New").with_requirement("HTML", ProficiencyLevel::Beginner);
        assert!(matches!(
            strategy.match_course(&web_skills(), &stray),
            Err(MatchError::UnknownCourse(_))
        ));
    }

    #[test]
    fn test_hybrid_blends_both() {
        let model = Arc::new(LatentModel::train(&catalog(), LatentParams::new(2, 42)).unwrap());
        let catalog = catalog();
        let course = catalog.get("WEB101").unwrap();

        let direct = MatchingStrategy::default().match_course(&web_skills(), course).unwrap();
        let latent = MatchingStrategy::latent(model.clone())
            .match_course(&web_skills(), course)
            .unwrap();
        let hybrid = MatchingStrategy::hybrid(model, DirectScorer::default(), HybridWeights::default())
            .match_course(&web_skills(), course)
            .unwrap();

        let expected = 0.7 * latent.match_percentage + 0.3 * direct.match_percentage;
        assert!((hybrid.match_percentage - expected).abs() < 0.01);
        assert_eq!(hybrid.matched_skills, latent.matched_skills);
    }
}
