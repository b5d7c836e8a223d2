mod loader;
mod repository;

pub use loader::CatalogEntry;
pub use repository::CatalogRepository;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::proficiency::{ProficiencyLevel, ProficiencyScale};
use crate::skills::{same_skill, Vocabulary};

/// A single required skill of a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRequirement {
    pub skill: String,
    pub level: ProficiencyLevel,
}

impl SkillRequirement {
    pub fn new(skill: impl Into<String>, level: ProficiencyLevel) -> Self {
        Self {
            skill: skill.into(),
            level,
        }
    }
}

/// A course and its required skills, unique by case-insensitive name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    required_skills: Vec<SkillRequirement>,
}

impl Course {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            description: String::new(),
            required_skills: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_requirement(mut self, skill: &str, level: ProficiencyLevel) -> Self {
        self.set_requirement(SkillRequirement::new(skill, level));
        self
    }

    /// Adds a requirement, replacing an existing one with the same name.
    pub fn set_requirement(&mut self, requirement: SkillRequirement) {
        match self
            .required_skills
            .iter_mut()
            .find(|r| same_skill(&r.skill, &requirement.skill))
        {
            Some(existing) => *existing = requirement,
            None => self.required_skills.push(requirement),
        }
    }

    pub fn requirements(&self) -> &[SkillRequirement] {
        &self.required_skills
    }

    pub fn requirement(&self, skill: &str) -> Option<&SkillRequirement> {
        self.required_skills
            .iter()
            .find(|r| same_skill(&r.skill, skill))
    }

    pub fn requires(&self, skill: &str) -> bool {
        self.requirement(skill).is_some()
    }

    pub fn skill_names(&self) -> impl Iterator<Item = &str> {
        self.required_skills.iter().map(|r| r.skill.as_str())
    }
}

/// Read-only snapshot of all courses plus the derived skill vocabulary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    courses: Vec<Course>,
    vocabulary: Vocabulary,
}

impl Catalog {
    /// Later courses with a duplicate code replace earlier ones.
    pub fn new(courses: Vec<Course>) -> Self {
        let mut unique: Vec<Course> = Vec::with_capacity(courses.len());
        for course in courses {
            match unique.iter_mut().find(|c| c.code == course.code) {
                Some(existing) => *existing = course,
                None => unique.push(course),
            }
        }

        let vocabulary = Vocabulary::new(
            unique
                .iter()
                .flat_map(|c| c.skill_names().map(str::to_string)),
        );

        Self {
            courses: unique,
            vocabulary,
        }
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn get(&self, code: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.code == code)
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn course_codes(&self) -> Vec<String> {
        self.courses.iter().map(|c| c.code.clone()).collect()
    }

    /// `n_courses × n_skills` matrix of required levels on `scale`,
    /// rows in catalog order and columns in vocabulary order.
    pub fn requirement_matrix(&self, scale: ProficiencyScale) -> Array2<f64> {
        let mut matrix = Array2::zeros((self.courses.len(), self.vocabulary.len()));
        for (row, course) in self.courses.iter().enumerate() {
            for requirement in course.requirements() {
                if let Some(col) = self.vocabulary.index_of(&requirement.skill) {
                    matrix[[row, col]] = scale.weight(requirement.level);
                }
            }
        }
        matrix
    }
}

impl FromIterator<Course> for Catalog {
    fn from_iter<I: IntoIterator<Item = Course>>(iter: I) -> Self {
        Catalog::new(iter.into_iter().collect())
    }
}
