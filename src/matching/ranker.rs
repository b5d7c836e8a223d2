use std::sync::Arc;
use tracing::debug;

use super::{sort_by_percentage, MatchResult, MatchingStrategy, Preferences};
use crate::catalog::Catalog;
use crate::error::{MatchError, Result};
use crate::skills::SkillSet;

/// Ranks a catalog snapshot for a person's skills with one strategy.
#[derive(Debug, Clone)]
pub struct Ranker {
    catalog: Arc<Catalog>,
    strategy: MatchingStrategy,
    preferences: Option<Preferences>,
    default_top_n: usize,
}

impl Ranker {
    pub fn new(catalog: Arc<Catalog>, strategy: MatchingStrategy) -> Self {
        Self {
            catalog,
            strategy,
            preferences: None,
            default_top_n: 10,
        }
    }

    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = Some(preferences);
        self
    }

    pub fn with_default_top_n(mut self, top_n: usize) -> Self {
        self.default_top_n = top_n;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn strategy(&self) -> &MatchingStrategy {
        &self.strategy
    }

    pub fn default_top_n(&self) -> usize {
        self.default_top_n
    }

    fn score_sorted(&self, skills: &SkillSet) -> Result<Vec<MatchResult>> {
        let mut results = self.strategy.score_catalog(skills, &self.catalog)?;
        sort_by_percentage(&mut results);

        if let Some(preferences) = &self.preferences {
            results = preferences.apply(results, &self.catalog);
        }
        Ok(results)
    }

    /// Best `top_n` courses, highest match first.
    pub fn recommend(&self, skills: &SkillSet, top_n: usize) -> Result<Vec<MatchResult>> {
        let mut results = self.score_sorted(skills)?;
        results.truncate(top_n);

        debug!(
            "Recommended {} of {} courses ({} strategy)",
            results.len(),
            self.catalog.len(),
            self.strategy.kind()
        );
        Ok(results)
    }

    pub fn recommend_default(&self, skills: &SkillSet) -> Result<Vec<MatchResult>> {
        self.recommend(skills, self.default_top_n)
    }

    /// Match against one catalog course.
    pub fn match_course(&self, skills: &SkillSet, course_code: &str) -> Result<MatchResult> {
        let course = self
            .catalog
            .get(course_code)
            .ok_or_else(|| MatchError::UnknownCourse(course_code.to_string()))?;
        self.strategy.match_course(skills, course)
    }

    /// Courses the person partly covers: at least one requirement met and at
    /// least one missing, highest match first.
    pub fn skill_gaps(&self, skills: &SkillSet, limit: usize) -> Result<Vec<MatchResult>> {
        let mut gaps: Vec<MatchResult> = self
            .score_sorted(skills)?
            .into_iter()
            .filter(MatchResult::has_partial_gap)
            .collect();
        gaps.truncate(limit);

        debug!("Found {} courses with partial skill gaps", gaps.len());
        Ok(gaps)
    }
}
