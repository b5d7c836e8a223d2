use std::borrow::Cow;
use tracing::debug;

use super::{Calibration, NameSimilarity};
use crate::catalog::{Course, SkillRequirement};
use crate::matching::MatchResult;
use crate::proficiency::ProficiencyLevel;
use crate::skills::{same_skill, taxonomy, SkillProficiency, SkillSet};

/// Best person skill found for one requirement.
#[derive(Debug, Clone, Copy)]
struct BestMatch<'a> {
    score: f64,
    is_exact: bool,
    skill: Option<&'a SkillProficiency>,
}

/// Scores a person's skills against course requirements by skill name.
#[derive(Debug, Clone, Default)]
pub struct DirectScorer {
    calibration: Calibration,
    names: NameSimilarity,
    infer_skills: bool,
}

impl DirectScorer {
    pub fn new(calibration: Calibration) -> Self {
        let names = NameSimilarity::from_calibration(&calibration);
        Self {
            calibration,
            names,
            infer_skills: false,
        }
    }

    pub fn with_names(mut self, names: NameSimilarity) -> Self {
        self.names = names;
        self
    }

    /// Adds taxonomy-inferred skills to the person's set before scoring.
    pub fn with_inference(mut self, infer_skills: bool) -> Self {
        self.infer_skills = infer_skills;
        self
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Score in [0, 1] of one person skill against one requirement, and
    /// whether the names matched exactly (ignoring case).
    pub fn score(
        &self,
        person_skill: &SkillProficiency,
        required_skill: &str,
        required_level: ProficiencyLevel,
    ) -> (f64, bool) {
        let factor = (person_skill.proficiency.weight() / required_level.weight()).min(1.0);

        if same_skill(&person_skill.skill, required_skill) {
            return (factor, true);
        }

        let similarity = self.names.similarity(&person_skill.skill, required_skill);
        ((similarity * factor).clamp(0.0, 1.0), false)
    }

    fn best_match<'a>(&self, skills: &'a SkillSet, requirement: &SkillRequirement) -> BestMatch<'a> {
        let mut best = BestMatch {
            score: 0.0,
            is_exact: false,
            skill: None,
        };

        for skill in skills {
            let (score, is_exact) = self.score(skill, &requirement.skill, requirement.level);
            if score > best.score {
                best = BestMatch {
                    score,
                    is_exact,
                    skill: Some(skill),
                };
            }
        }

        best
    }

    /// Calibrated match of `skills` against every requirement of `course`.
    pub fn match_course(&self, skills: &SkillSet, course: &Course) -> MatchResult {
        let mut result = MatchResult::new(&course.code, Some(course.name.clone()));
        let requirements = course.requirements();
        if requirements.is_empty() {
            return result;
        }

        let skills: Cow<'_, SkillSet> = if self.infer_skills {
            Cow::Owned(taxonomy::enrich_with_inferred(skills))
        } else {
            Cow::Borrowed(skills)
        };

        let mut total = 0.0;
        for requirement in requirements {
            let best = self.best_match(&skills, requirement);
            total += self.calibration.contribution(best.score, best.is_exact);

            match best.skill {
                Some(held) if !self.calibration.is_missing(best.score) => {
                    result.matched_skills.push(SkillProficiency {
                        skill: requirement.skill.clone(),
                        proficiency: held.proficiency,
                        is_certified: held.is_certified,
                    });
                }
                _ => result
                    .missing_skills
                    .push(SkillProficiency::new(requirement.skill.clone(), requirement.level)),
            }
        }

        let raw = total / requirements.len() as f64 * 100.0;
        result.match_percentage = self.calibration.calibrate(raw);

        debug!(
            "Direct match {}: raw={:.2} calibrated={:.2} ({} matched, {} missing)",
            course.code,
            raw,
            result.match_percentage,
            result.matched_skills.len(),
            result.missing_skills.len()
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::TaxonomySimilarity;

    fn intprog() -> Course {
        Course::new("INTPROG", "Intro Programming")
            .with_requirement("Python", ProficiencyLevel::Intermediate)
            .with_requirement("Problem Solving", ProficiencyLevel::Intermediate)
    }

    #[test]
    fn test_exact_match_is_case_insensitive_and_capped() {
        let scorer = DirectScorer::default();
        let skill = SkillProficiency::new("PYTHON", ProficiencyLevel::Expert);
        assert_eq!(scorer.score(&skill, "python", ProficiencyLevel::Beginner), (1.0, true));

        let weak = SkillProficiency::new("python", ProficiencyLevel::Beginner);
        let (score, exact) = scorer.score(&weak, "Python", ProficiencyLevel::Expert);
        assert!(exact);
        assert!((score - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_exact_match_folds_non_ascii_case() {
        let scorer = DirectScorer::default();
        let skill = SkillProficiency::new("ÉCONOMIE", ProficiencyLevel::Expert);
        assert_eq!(scorer.score(&skill, "économie", ProficiencyLevel::Intermediate), (1.0, true));

        let course = Course::new("ECO", "Économie").with_requirement("économie", ProficiencyLevel::Intermediate);
        let skills = SkillSet::new().with("ÉCONOMIE", ProficiencyLevel::Expert);
        let result = scorer.match_course(&skills, &course);
        assert!((result.match_percentage - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_substring_similarity_scaled_by_proficiency() {
        let scorer = DirectScorer::default();
        let skill = SkillProficiency::new("MySQL", ProficiencyLevel::Beginner);
        let (score, exact) = scorer.score(&skill, "SQL", ProficiencyLevel::Intermediate);
        assert!(!exact);
        assert!((score - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_default_calibration_counts_floor() {
        let skills = SkillSet::new().with("Python", ProficiencyLevel::Expert);
        let result = DirectScorer::default().match_course(&skills, &intprog());

        // (1.0 * 1.1 + 0.2 * 0.7) / 2
        assert!((result.match_percentage - 62.0).abs() < 1e-9);
        assert_eq!(result.matched_skills.len(), 1);
        assert_eq!(result.missing_skills[0].skill, "Problem Solving");
    }

    #[test]
    fn test_strict_calibration() {
        let skills = SkillSet::new().with("Python", ProficiencyLevel::Expert);
        let result = DirectScorer::new(Calibration::strict()).match_course(&skills, &intprog());
        assert!((result.match_percentage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_matched_skill_reports_person_proficiency() {
        let skills = SkillSet::new().with_certified("python", ProficiencyLevel::Advanced);
        let result = DirectScorer::default().match_course(&skills, &intprog());
        let matched = &result.matched_skills[0];
        assert_eq!(matched.skill, "Python");
        assert_eq!(matched.proficiency, ProficiencyLevel::Advanced);
        assert!(matched.is_certified);
    }

    #[test]
    fn test_inference_and_backends() {
        let course = Course::new("DB", "Databases")
            .with_requirement("Database Management", ProficiencyLevel::Intermediate);
        let skills = SkillSet::new().with("MySQL", ProficiencyLevel::Expert);

        let plain = DirectScorer::default().match_course(&skills, &course);
        assert_eq!(plain.missing_skills.len(), 1);

        let inferring = DirectScorer::default()
            .with_inference(true)
            .match_course(&skills, &course);
        assert_eq!(inferring.matched_skills.len(), 1);
        assert!(inferring.match_percentage > plain.match_percentage);

        let taxonomy = DirectScorer::default()
            .with_names(NameSimilarity::default().with_backend(TaxonomySimilarity))
            .match_course(&skills, &course);
        assert_eq!(taxonomy.matched_skills.len(), 1);
    }

    #[test]
    fn test_empty_inputs_score_zero() {
        let scorer = DirectScorer::default();
        let empty_course = Course::new("NONE", "Nothing");
        let skills = SkillSet::new().with("Python", ProficiencyLevel::Expert);
        assert_eq!(scorer.match_course(&skills, &empty_course).match_percentage, 0.0);

        let result = scorer.match_course(&SkillSet::new(), &intprog());
        assert_eq!(result.match_percentage, 0.0);
        assert_eq!(result.missing_skills.len(), 2);
        assert!(result.matched_skills.is_empty());
    }
}
