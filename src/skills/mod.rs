mod input;
pub mod taxonomy;
mod vector;

pub use input::{parse_skill_list, RawSkill};
pub use taxonomy::SkillCategory;
pub use vector::{
    build_skill_vector, cosine, SkillVector, SkillVectorBuilder, Vocabulary, CERTIFICATION_BOOST,
};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::proficiency::ProficiencyLevel;

/// Lookup key for a skill name: trimmed and Unicode-lowercased.
pub fn skill_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Whether two names denote the same skill. Every uniqueness and
/// exact-match check on skill names goes through this.
pub fn same_skill(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// One entry of a person's self-reported skill set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillProficiency {
    pub skill: String,
    pub proficiency: ProficiencyLevel,
    #[serde(default)]
    pub is_certified: bool,
}

impl SkillProficiency {
    pub fn new(skill: impl Into<String>, proficiency: ProficiencyLevel) -> Self {
        Self {
            skill: skill.into(),
            proficiency,
            is_certified: false,
        }
    }

    pub fn certified(mut self) -> Self {
        self.is_certified = true;
        self
    }
}

/// A person's skills, unique by case-insensitive name.
///
/// Insertion order is preserved; re-inserting a name replaces the earlier
/// entry in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillSet {
    skills: Vec<SkillProficiency>,
}

impl SkillSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalise a raw name → proficiency mapping from the system boundary.
    pub fn from_raw(raw: &BTreeMap<String, RawSkill>) -> Self {
        raw.iter()
            .map(|(name, value)| value.to_skill(name))
            .collect()
    }

    pub fn insert(&mut self, skill: SkillProficiency) {
        match self
            .skills
            .iter_mut()
            .find(|s| same_skill(&s.skill, &skill.skill))
        {
            Some(existing) => *existing = skill,
            None => self.skills.push(skill),
        }
    }

    pub fn with(mut self, name: &str, proficiency: ProficiencyLevel) -> Self {
        self.insert(SkillProficiency::new(name, proficiency));
        self
    }

    pub fn with_certified(mut self, name: &str, proficiency: ProficiencyLevel) -> Self {
        self.insert(SkillProficiency::new(name, proficiency).certified());
        self
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&SkillProficiency> {
        self.skills.iter().find(|s| same_skill(&s.skill, name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkillProficiency> {
        self.skills.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.skills.iter().map(|s| s.skill.as_str())
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

impl FromIterator<SkillProficiency> for SkillSet {
    fn from_iter<I: IntoIterator<Item = SkillProficiency>>(iter: I) -> Self {
        let mut set = SkillSet::new();
        for skill in iter {
            set.insert(skill);
        }
        set
    }
}

impl<'a> IntoIterator for &'a SkillSet {
    type Item = &'a SkillProficiency;
    type IntoIter = std::slice::Iter<'a, SkillProficiency>;

    fn into_iter(self) -> Self::IntoIter {
        self.skills.iter()
    }
}
