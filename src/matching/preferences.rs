use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::{sort_by_percentage, MatchResult};
use crate::catalog::Catalog;
use crate::skills::taxonomy::{categories_of, SkillCategory};

/// Boosted scores never exceed this.
pub const BOOST_CEILING: f64 = 99.0;
/// Multiplier for explicitly preferred courses.
pub const PREFERRED_BOOST: f64 = 1.1;

/// Post-scoring adjustments chosen by the user.
///
/// Applied to a finished result list; never touches the scorer itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    category_weights: BTreeMap<SkillCategory, f64>,
    preferred_courses: BTreeSet<String>,
    excluded_courses: BTreeSet<String>,
    min_match_percentage: f64,
}

impl Preferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Weight in [0, 2]; 1.0 is neutral.
    pub fn set_category_weight(&mut self, category: SkillCategory, weight: f64) {
        self.category_weights.insert(category, weight.clamp(0.0, 2.0));
    }

    pub fn category_weight(&self, category: SkillCategory) -> f64 {
        self.category_weights.get(&category).copied().unwrap_or(1.0)
    }

    pub fn prefer(&mut self, course_code: impl Into<String>) {
        self.preferred_courses.insert(course_code.into());
    }

    pub fn exclude(&mut self, course_code: impl Into<String>) {
        self.excluded_courses.insert(course_code.into());
    }

    /// Floor in [0, 100].
    pub fn set_min_match_percentage(&mut self, percentage: f64) {
        self.min_match_percentage = percentage.clamp(0.0, 100.0);
    }

    pub fn min_match_percentage(&self) -> f64 {
        self.min_match_percentage
    }

    pub fn with_category_weight(mut self, category: SkillCategory, weight: f64) -> Self {
        self.set_category_weight(category, weight);
        self
    }

    pub fn with_preferred(mut self, course_code: impl Into<String>) -> Self {
        self.prefer(course_code);
        self
    }

    pub fn with_excluded(mut self, course_code: impl Into<String>) -> Self {
        self.exclude(course_code);
        self
    }

    pub fn with_min_match_percentage(mut self, percentage: f64) -> Self {
        self.set_min_match_percentage(percentage);
        self
    }

    /// Filters, boosts and re-sorts `results`. Results for courses absent
    /// from `catalog` are dropped.
    pub fn apply(&self, results: Vec<MatchResult>, catalog: &Catalog) -> Vec<MatchResult> {
        let before = results.len();

        let mut adjusted: Vec<MatchResult> = results
            .into_iter()
            .filter(|r| !self.excluded_courses.contains(&r.course_code))
            .filter(|r| r.match_percentage >= self.min_match_percentage)
            .filter_map(|mut result| {
                let Some(course) = catalog.get(&result.course_code) else {
                    debug!("Dropping result for unknown course {}", result.course_code);
                    return None;
                };

                let categories = categories_of(course.skill_names());
                if !categories.is_empty() {
                    let average = categories
                        .iter()
                        .map(|c| self.category_weight(*c))
                        .sum::<f64>()
                        / categories.len() as f64;
                    if average > 1.0 {
                        result.match_percentage =
                            boost(result.match_percentage, 1.0 + average * 0.1);
                    }
                }

                if self.preferred_courses.contains(&result.course_code) {
                    result.match_percentage = boost(result.match_percentage, PREFERRED_BOOST);
                }

                Some(result)
            })
            .collect();

        sort_by_percentage(&mut adjusted);
        debug!("Preferences kept {} of {} results", adjusted.len(), before);
        adjusted
    }
}

/// Multiplies by `factor` up to the ceiling; a boost never lowers a score.
fn boost(percentage: f64, factor: f64) -> f64 {
    (percentage * factor).min(BOOST_CEILING).max(percentage)
}
