use serde::{Deserialize, Serialize};

use crate::catalog::Course;
use crate::proficiency::ProficiencyLevel;
use crate::skills::{SkillProficiency, SkillSet};

/// Outcome of matching one person against one course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    pub course_code: String,
    #[serde(default)]
    pub course_name: Option<String>,
    /// Calibrated score in [0, 100].
    pub match_percentage: f64,
    /// Requirements met, with the person's proficiency.
    pub matched_skills: Vec<SkillProficiency>,
    /// Requirements not met, with the required proficiency.
    pub missing_skills: Vec<SkillProficiency>,
}

impl MatchResult {
    pub fn new(course_code: impl Into<String>, course_name: Option<String>) -> Self {
        Self {
            subject_id: None,
            course_code: course_code.into(),
            course_name,
            match_percentage: 0.0,
            matched_skills: Vec::new(),
            missing_skills: Vec::new(),
        }
    }

    pub fn with_subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    pub fn matched_names(&self) -> impl Iterator<Item = &str> {
        self.matched_skills.iter().map(|s| s.skill.as_str())
    }

    pub fn missing_names(&self) -> impl Iterator<Item = &str> {
        self.missing_skills.iter().map(|s| s.skill.as_str())
    }

    /// At least one requirement met and at least one missing.
    pub fn has_partial_gap(&self) -> bool {
        !self.matched_skills.is_empty() && !self.missing_skills.is_empty()
    }
}

/// Matched/missing split by plain proficiency comparison: a requirement is
/// met when the person holds the skill at or above the required level.
pub fn skill_breakdown(skills: &SkillSet, course: &Course) -> (Vec<SkillProficiency>, Vec<SkillProficiency>) {
    let mut matched = Vec::new();
    let mut missing = Vec::new();

    for requirement in course.requirements() {
        match skills.get(&requirement.skill) {
            Some(held) if meets(held.proficiency, requirement.level) => matched.push(SkillProficiency {
                skill: requirement.skill.clone(),
                proficiency: held.proficiency,
                is_certified: held.is_certified,
            }),
            _ => missing.push(SkillProficiency::new(requirement.skill.clone(), requirement.level)),
        }
    }

    (matched, missing)
}

fn meets(held: ProficiencyLevel, required: ProficiencyLevel) -> bool {
    held.ordinal() >= required.ordinal()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakdown_by_level() {
        let course = Course::new("DB", "Databases")
            .with_requirement("SQL", ProficiencyLevel::Intermediate)
            .with_requirement("Indexing", ProficiencyLevel::Advanced)
            .with_requirement("Normalization", ProficiencyLevel::Beginner);
        let skills = SkillSet::new()
            .with("sql", ProficiencyLevel::Expert)
            .with("Indexing", ProficiencyLevel::Intermediate);

        let (matched, missing) = skill_breakdown(&skills, &course);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].skill, "SQL");
        assert_eq!(matched[0].proficiency, ProficiencyLevel::Expert);

        let missing: Vec<_> = missing.iter().map(|s| s.skill.as_str()).collect();
        assert_eq!(missing, vec!["Indexing", "Normalization"]);
    }

    #[test]
    fn test_subject_id_skipped_when_absent() {
        let json = serde_json::to_string(&MatchResult::new("DB", None)).unwrap();
        assert!(!json.contains("subject_id"));

        let tagged = MatchResult::new("DB", None).with_subject("f-17");
        assert_eq!(tagged.subject_id.as_deref(), Some("f-17"));
    }
}
