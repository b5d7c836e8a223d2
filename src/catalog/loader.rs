use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

use super::{Catalog, Course, SkillRequirement};
use crate::error::{MatchError, Result};
use crate::proficiency::ProficiencyLevel;

/// Persisted shape of one course: `{name, description?, required_skills}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required_skills: RequiredSkills,
}

/// Required skills either as `{skill: level}` or a bare list of names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequiredSkills {
    Levels(BTreeMap<String, String>),
    Names(Vec<String>),
}

impl Default for RequiredSkills {
    fn default() -> Self {
        RequiredSkills::Levels(BTreeMap::new())
    }
}

impl CatalogEntry {
    fn into_course(self, code: &str) -> Course {
        let name = self.name.unwrap_or_else(|| code.to_string());
        let description = self
            .description
            .unwrap_or_else(|| format!("Course on {}", name));

        let mut course = Course::new(code, name).with_description(description);
        match self.required_skills {
            RequiredSkills::Levels(levels) => {
                for (skill, level) in levels {
                    course.set_requirement(SkillRequirement::new(
                        skill,
                        ProficiencyLevel::parse_lenient(&level),
                    ));
                }
            }
            RequiredSkills::Names(names) => {
                for skill in names {
                    course.set_requirement(SkillRequirement::new(skill, ProficiencyLevel::default()));
                }
            }
        }
        course
    }

    fn from_course(course: &Course) -> Self {
        Self {
            name: Some(course.name.clone()),
            description: Some(course.description.clone()),
            required_skills: RequiredSkills::Levels(
                course
                    .requirements()
                    .iter()
                    .map(|r| (r.skill.clone(), r.level.to_string()))
                    .collect(),
            ),
        }
    }
}

impl Catalog {
    /// Parses the persisted mapping of course code → entry. Courses are kept
    /// in code order.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: BTreeMap<String, CatalogEntry> = serde_json::from_str(json)?;
        Ok(entries
            .into_iter()
            .map(|(code, entry)| entry.into_course(&code))
            .collect())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading course catalog from {:?}", path);

        let json = fs::read_to_string(path).map_err(|e| MatchError::io(path, e))?;
        let catalog = Self::from_json_str(&json)?;

        info!(
            "Catalog loaded: {} courses, {} distinct skills",
            catalog.len(),
            catalog.vocabulary().len()
        );
        Ok(catalog)
    }

    pub fn to_json_string(&self) -> Result<String> {
        let entries: BTreeMap<&str, CatalogEntry> = self
            .courses()
            .iter()
            .map(|c| (c.code.as_str(), CatalogEntry::from_course(c)))
            .collect();
        Ok(serde_json::to_string_pretty(&entries)?)
    }
}
