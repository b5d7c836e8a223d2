use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use super::{same_skill, skill_key, SkillSet};
use crate::proficiency::ProficiencyScale;

/// Default multiplier for certified skills.
pub const CERTIFICATION_BOOST: f64 = 1.5;

/// Sorted, case-insensitively unique skill names defining the vector space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Builds a vocabulary from arbitrary names. Ordering is by lowercase
    /// name; the first spelling seen after sorting wins for duplicates that
    /// differ only by case.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        names.sort_by(|a, b| skill_key(a).cmp(&skill_key(b)).then_with(|| a.cmp(b)));
        names.dedup_by(|a, b| same_skill(a, b));

        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (skill_key(name), i))
            .collect();

        Self { names, index }
    }

    /// Case-insensitive position of `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(&skill_key(name)).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl From<Vec<String>> for Vocabulary {
    fn from(names: Vec<String>) -> Self {
        Vocabulary::new(names)
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocabulary: Vocabulary) -> Self {
        vocabulary.names
    }
}

/// Dense skill representation over a [`Vocabulary`].
#[derive(Debug, Clone, PartialEq)]
pub struct SkillVector {
    values: Array1<f64>,
}

impl SkillVector {
    pub fn zeros(len: usize) -> Self {
        Self {
            values: Array1::zeros(len),
        }
    }

    pub fn from_array(values: Array1<f64>) -> Self {
        Self { values }
    }

    pub fn as_array(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn as_slice(&self) -> &[f64] {
        self.values.as_slice().unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True when no dimension is set.
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    pub fn norm(&self) -> f64 {
        self.values.dot(&self.values).sqrt()
    }
}

/// Converts a sparse [`SkillSet`] into a dense [`SkillVector`].
#[derive(Debug, Clone, Copy)]
pub struct SkillVectorBuilder {
    pub scale: ProficiencyScale,
    pub certification_boost: f64,
}

impl Default for SkillVectorBuilder {
    fn default() -> Self {
        Self {
            scale: ProficiencyScale::Unit,
            certification_boost: CERTIFICATION_BOOST,
        }
    }
}

impl SkillVectorBuilder {
    pub fn new(scale: ProficiencyScale, certification_boost: f64) -> Self {
        Self {
            scale,
            certification_boost,
        }
    }

    /// Skills outside `vocabulary` are dropped: the vector space belongs to
    /// the catalog, not to the input.
    pub fn build(&self, skills: &SkillSet, vocabulary: &Vocabulary) -> SkillVector {
        let mut vector = SkillVector::zeros(vocabulary.len());
        let cap = self.scale.max_weight();
        let mut dropped = 0usize;

        for skill in skills {
            let Some(idx) = vocabulary.index_of(&skill.skill) else {
                dropped += 1;
                continue;
            };

            let mut weight = self.scale.weight(skill.proficiency);
            if skill.is_certified {
                weight *= self.certification_boost;
            }
            vector.values[idx] = weight.min(cap);
        }

        if dropped > 0 {
            debug!(
                "Dropped {} of {} skills not present in the {}-skill vocabulary",
                dropped,
                skills.len(),
                vocabulary.len()
            );
        }

        vector
    }
}

/// Builds a unit-scale vector with the default certification boost.
pub fn build_skill_vector(skills: &SkillSet, vocabulary: &Vocabulary) -> SkillVector {
    SkillVectorBuilder::default().build(skills, vocabulary)
}

/// Cosine similarity; zero when either side has zero length.
pub fn cosine(a: &Array1<f64>, b: &Array1<f64>) -> f64 {
    let norm_a = a.dot(a).sqrt();
    let norm_b = b.dot(b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (a.dot(b) / (norm_a * norm_b)).clamp(-1.0, 1.0)
}
