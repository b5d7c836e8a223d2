use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

use super::{Catalog, Course, SkillRequirement};
use crate::error::{MatchError, Result};
use crate::proficiency::ProficiencyLevel;

/// Owner of the live catalog.
///
/// Readers take an `Arc` snapshot and never observe a partial update; every
/// write builds a fresh [`Catalog`] and swaps it in whole.
#[derive(Debug, Default)]
pub struct CatalogRepository {
    current: RwLock<Arc<Catalog>>,
}

impl CatalogRepository {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    pub fn snapshot(&self) -> Arc<Catalog> {
        self.current.read().clone()
    }

    /// Replaces the whole catalog, returning the previous snapshot.
    pub fn replace(&self, catalog: Catalog) -> Arc<Catalog> {
        info!("Replacing catalog ({} courses)", catalog.len());
        std::mem::replace(&mut *self.current.write(), Arc::new(catalog))
    }

    pub fn upsert_course(&self, course: Course) {
        self.modify(|courses| {
            match courses.iter_mut().find(|c| c.code == course.code) {
                Some(existing) => *existing = course,
                None => courses.push(course),
            }
        });
    }

    /// Returns whether a course was removed.
    pub fn remove_course(&self, code: &str) -> bool {
        self.modify(|courses| {
            let before = courses.len();
            courses.retain(|c| c.code != code);
            courses.len() != before
        })
    }

    /// Sets (or adds) one required skill of an existing course.
    pub fn update_course_skill(&self, code: &str, skill: &str, level: ProficiencyLevel) -> Result<()> {
        self.try_modify(|courses| {
            let course = courses
                .iter_mut()
                .find(|c| c.code == code)
                .ok_or_else(|| MatchError::UnknownCourse(code.to_string()))?;
            course.set_requirement(SkillRequirement::new(skill, level));
            Ok(())
        })
    }

    fn modify<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&mut Vec<Course>) -> T,
    {
        let mut guard = self.current.write();
        let mut courses = guard.courses().to_vec();
        let out = f(&mut courses);
        *guard = Arc::new(Catalog::new(courses));
        out
    }

    /// Like `modify`, but the current snapshot stays in place on error.
    fn try_modify<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Course>) -> Result<T>,
    {
        let mut guard = self.current.write();
        let mut courses = guard.courses().to_vec();
        let out = f(&mut courses)?;
        *guard = Arc::new(Catalog::new(courses));
        Ok(out)
    }
}
