use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, info};

use super::SkillGraph;
use crate::catalog::{Catalog, Course};
use crate::proficiency::ProficiencyLevel;
use crate::skills::{SkillProficiency, SkillSet};

/// Minimum number of prerequisite links before one course leads to another.
const DEPENDENCY_THRESHOLD: usize = 2;
const STARTING_CANDIDATES: usize = 3;
const DIRECT_READINESS_WEIGHT: f64 = 0.7;
const PREPARATION_READINESS_WEIGHT: f64 = 0.3;

/// Course A leads to course B when A requires prerequisites of B's skills.
#[derive(Debug, Clone, PartialEq)]
struct Dependency {
    weight: usize,
    skills: Vec<String>,
}

/// One course of a learning path, scored against the skills the person
/// would hold after completing the earlier steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningStep {
    pub step: usize,
    pub course_code: String,
    pub course_name: String,
    /// Share of requirements already held, truncated to a whole percent.
    pub match_percentage: u32,
    pub matched_skills: Vec<SkillProficiency>,
    pub missing_skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

/// Orders catalog courses into multi-step sequences using the prerequisite
/// relationships of a [`SkillGraph`].
#[derive(Debug, Clone)]
pub struct LearningPathPlanner {
    catalog: Arc<Catalog>,
    graph: SkillGraph,
    /// from code → to code → dependency.
    dependencies: BTreeMap<String, BTreeMap<String, Dependency>>,
}

impl LearningPathPlanner {
    pub fn new(catalog: Arc<Catalog>, graph: SkillGraph) -> Self {
        let dependencies = build_dependencies(&catalog, &graph);
        let edges: usize = dependencies.values().map(BTreeMap::len).sum();
        info!(
            "Course dependency graph built: {} courses, {} edges",
            catalog.len(),
            edges
        );
        Self {
            catalog,
            graph,
            dependencies,
        }
    }

    /// Planner over a catalog's co-occurrence graph with the common
    /// relationships seeded.
    pub fn from_catalog(catalog: Arc<Catalog>) -> Self {
        let mut graph = SkillGraph::from_catalog(&catalog);
        graph.initialize_common_relationships();
        Self::new(catalog, graph)
    }

    pub fn graph(&self) -> &SkillGraph {
        &self.graph
    }

    /// Courses that `course_code` directly prepares for.
    pub fn successors(&self, course_code: &str) -> Vec<&str> {
        self.dependencies
            .get(course_code)
            .map(|next| next.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn dependency(&self, from: &str, to: &str) -> Option<&Dependency> {
        self.dependencies.get(from)?.get(to)
    }

    /// Proficiency-weighted share of each course's requirements the person
    /// already holds, in catalog order.
    fn course_affinity(&self, skills: &SkillSet) -> Vec<(&Course, f64)> {
        self.catalog
            .courses()
            .iter()
            .map(|course| (course, affinity(skills, course)))
            .collect()
    }

    /// Best path for `skills`, toward `goal` when it names a catalog course.
    ///
    /// Without a goal the path grows one readiest successor at a time, up to
    /// `max_len` courses. Toward a goal the shortest dependency chain is
    /// used, falling back to the progressive path when the goal is out of
    /// reach.
    pub fn generate_learning_path(
        &self,
        skills: &SkillSet,
        goal: Option<&str>,
        max_len: usize,
    ) -> Vec<LearningStep> {
        if max_len == 0 || self.catalog.is_empty() {
            return Vec::new();
        }

        let mut ranked = self.course_affinity(skills);
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        let starts: Vec<&str> = ranked
            .iter()
            .take(STARTING_CANDIDATES)
            .map(|(course, _)| course.code.as_str())
            .collect();

        let goal = goal.filter(|code| self.catalog.get(code).is_some());

        let mut best: Option<(Vec<String>, f64)> = None;
        for start in starts {
            let path = match goal {
                Some(goal) => self
                    .shortest_path(start, goal)
                    .unwrap_or_else(|| self.progressive_path(start, skills, max_len)),
                None => self.progressive_path(start, skills, max_len),
            };
            let score = self.path_score(&path, skills);
            if best.as_ref().map_or(true, |(_, s)| score > *s) {
                best = Some((path, score));
            }
        }

        let path = best.map(|(path, _)| path).unwrap_or_default();
        debug!("Learning path of {} courses (goal: {:?})", path.len(), goal);
        self.describe(&path, skills)
    }

    fn shortest_path(&self, start: &str, goal: &str) -> Option<Vec<String>> {
        let mut previous: HashMap<&str, &str> = HashMap::new();
        let mut visited: BTreeSet<&str> = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            if current == goal {
                let mut path = vec![current.to_string()];
                let mut cursor = current;
                while let Some(prev) = previous.get(cursor) {
                    path.push(prev.to_string());
                    cursor = *prev;
                }
                path.reverse();
                return Some(path);
            }
            for next in self.successors(current) {
                if visited.insert(next) {
                    previous.insert(next, current);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    fn progressive_path(&self, start: &str, skills: &SkillSet, max_len: usize) -> Vec<String> {
        let mut path = vec![start.to_string()];

        while path.len() < max_len {
            let current = path[path.len() - 1].as_str();
            let mut best: Option<(&str, f64)> = None;
            for next in self.successors(current) {
                if path.iter().any(|p| p == next) {
                    continue;
                }
                let readiness = self.readiness(next, skills, &path);
                if best.map_or(true, |(_, r)| readiness > r) {
                    best = Some((next, readiness));
                }
            }
            match best {
                Some((next, _)) => path.push(next.to_string()),
                None => break,
            }
        }
        path
    }

    /// Blend of requirements already held and requirements shared with
    /// courses earlier in the path.
    fn readiness(&self, course_code: &str, skills: &SkillSet, previous: &[String]) -> f64 {
        let Some(course) = self.catalog.get(course_code) else {
            return 0.0;
        };
        let total = course.requirements().len();
        if total == 0 {
            return 0.0;
        }

        let held = course.skill_names().filter(|s| skills.contains(s)).count();
        let prepared = course
            .skill_names()
            .filter(|s| {
                previous
                    .iter()
                    .filter_map(|code| self.catalog.get(code))
                    .any(|c| c.requires(s))
            })
            .count();

        let total = total as f64;
        DIRECT_READINESS_WEIGHT * held as f64 / total
            + PREPARATION_READINESS_WEIGHT * prepared as f64 / total
    }

    fn path_score(&self, path: &[String], skills: &SkillSet) -> f64 {
        let Some(first) = path.first() else {
            return 0.0;
        };
        let progression: usize = path
            .windows(2)
            .filter_map(|pair| self.dependency(&pair[0], &pair[1]))
            .map(|d| d.weight)
            .sum();
        let start_affinity = self
            .catalog
            .get(first)
            .map(|course| affinity(skills, course))
            .unwrap_or(0.0);

        progression as f64 * (0.5 + start_affinity) / path.len() as f64
    }

    fn describe(&self, path: &[String], skills: &SkillSet) -> Vec<LearningStep> {
        let mut acquired = skills.clone();
        let mut steps = Vec::with_capacity(path.len());

        for (i, code) in path.iter().enumerate() {
            let Some(course) = self.catalog.get(code) else {
                continue;
            };

            let mut matched_skills = Vec::new();
            let mut missing_skills = Vec::new();
            for requirement in course.requirements() {
                match acquired.get(&requirement.skill) {
                    Some(held) => matched_skills.push(SkillProficiency::new(
                        requirement.skill.clone(),
                        held.proficiency,
                    )),
                    None => missing_skills.push(requirement.skill.clone()),
                }
            }
            let total = course.requirements().len();
            let match_percentage = if total == 0 {
                0
            } else {
                (matched_skills.len() * 100 / total) as u32
            };

            let rationale = path.get(i + 1).and_then(|next| {
                let dependency = self.dependency(code, next)?;
                let next_name = self
                    .catalog
                    .get(next)
                    .map(|c| c.name.as_str())
                    .unwrap_or(next.as_str());
                Some(rationale(next_name, &dependency.skills))
            });

            steps.push(LearningStep {
                step: i + 1,
                course_code: course.code.clone(),
                course_name: course.name.clone(),
                match_percentage,
                matched_skills,
                missing_skills,
                rationale,
            });

            for name in course.skill_names() {
                let level = acquired
                    .get(name)
                    .map(|held| held.proficiency.next())
                    .unwrap_or(ProficiencyLevel::Beginner);
                let certified = acquired.get(name).map_or(false, |held| held.is_certified);
                let mut skill = SkillProficiency::new(name, level);
                skill.is_certified = certified;
                acquired.insert(skill);
            }
        }
        steps
    }

    /// Courses sharing skills with `goal`, ranked by the share of the goal's
    /// requirements they cover. Unknown goals yield an empty list.
    pub fn career_aligned_courses(&self, goal: &str, top_n: usize) -> Vec<(String, f64)> {
        let Some(goal_course) = self.catalog.get(goal) else {
            return Vec::new();
        };
        let total = goal_course.requirements().len();
        if total == 0 {
            return Vec::new();
        }

        let mut aligned: Vec<(String, f64)> = self
            .catalog
            .courses()
            .iter()
            .filter(|course| course.code != goal_course.code)
            .filter_map(|course| {
                let overlap = goal_course
                    .skill_names()
                    .filter(|s| course.requires(s))
                    .count();
                (overlap > 0).then(|| (course.code.clone(), overlap as f64 / total as f64))
            })
            .collect();
        aligned.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        aligned.truncate(top_n);
        aligned
    }
}

fn build_dependencies(
    catalog: &Catalog,
    graph: &SkillGraph,
) -> BTreeMap<String, BTreeMap<String, Dependency>> {
    let mut dependencies: BTreeMap<String, BTreeMap<String, Dependency>> = BTreeMap::new();

    for from in catalog.courses() {
        for to in catalog.courses() {
            if from.code == to.code {
                continue;
            }
            let mut weight = 0;
            let mut skills: BTreeSet<String> = BTreeSet::new();
            for skill in to.skill_names() {
                for prerequisite in graph.get_prerequisites(skill) {
                    if from.requires(&prerequisite) {
                        weight += 1;
                        skills.insert(prerequisite);
                    }
                }
            }
            if weight >= DEPENDENCY_THRESHOLD {
                dependencies.entry(from.code.clone()).or_default().insert(
                    to.code.clone(),
                    Dependency {
                        weight,
                        skills: skills.into_iter().collect(),
                    },
                );
            }
        }
    }
    dependencies
}

fn affinity(skills: &SkillSet, course: &Course) -> f64 {
    let total = course.requirements().len();
    if total == 0 {
        return 0.0;
    }
    let held: f64 = course
        .skill_names()
        .filter_map(|name| skills.get(name))
        .map(|s| s.proficiency.weight())
        .sum();
    held / total as f64
}

fn rationale(next_course: &str, skills: &[String]) -> String {
    let mut listed = skills.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
    if skills.len() > 3 {
        listed.push_str(&format!(", and {} more", skills.len() - 3));
    }
    format!(
        "This course helps prepare you for {} by teaching {}.",
        next_course, listed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ProficiencyLevel::*;

    fn catalog() -> Arc<Catalog> {
        Arc::new(Catalog::new(vec![
            Course::new("WEB101", "Web Foundations")
                .with_requirement("HTML", Beginner)
                .with_requirement("CSS", Beginner)
                .with_requirement("JavaScript", Beginner),
            Course::new("WEB201", "Frontend Frameworks")
                .with_requirement("React", Intermediate)
                .with_requirement("Angular", Beginner),
            Course::new("WEB301", "Single Page Apps")
                .with_requirement("Vue.js", Intermediate)
                .with_requirement("React", Advanced)
                .with_requirement("Angular", Intermediate),
            Course::new("MATH101", "Algebra")
                .with_requirement("Algebra", Beginner),
        ]))
    }

    fn planner() -> LearningPathPlanner {
        let catalog = catalog();
        let mut graph = SkillGraph::from_catalog(&catalog);
        for framework in ["React", "Angular", "Vue.js"] {
            for prerequisite in ["HTML", "CSS", "JavaScript"] {
                graph.add_prerequisite(framework, prerequisite);
            }
        }
        LearningPathPlanner::new(catalog, graph)
    }

    fn web_skills() -> SkillSet {
        SkillSet::new()
            .with("HTML", Advanced)
            .with("CSS", Intermediate)
            .with("JavaScript", Beginner)
    }

    #[test]
    fn test_dependency_edges_need_two_links() {
        let p = planner();
        assert_eq!(p.successors("WEB101"), vec!["WEB201", "WEB301"]);
        assert!(p.successors("WEB201").is_empty());
        assert!(p.successors("MATH101").is_empty());
        let dep = p.dependency("WEB101", "WEB201").unwrap();
        assert_eq!(dep.weight, 6);
        assert_eq!(dep.skills, vec!["CSS", "HTML", "JavaScript"]);
    }

    #[test]
    fn test_path_toward_goal() {
        let steps = planner().generate_learning_path(&web_skills(), Some("WEB301"), 5);
        let codes: Vec<&str> = steps.iter().map(|s| s.course_code.as_str()).collect();
        assert_eq!(codes, vec!["WEB101", "WEB301"]);

        assert_eq!(steps[0].step, 1);
        assert_eq!(steps[0].match_percentage, 100);
        let rationale = steps[0].rationale.as_deref().unwrap();
        assert!(rationale.contains("Single Page Apps"));
        assert!(rationale.contains("CSS, HTML, JavaScript"));
        assert!(steps[1].rationale.is_none());
    }

    #[test]
    fn test_progressive_path_without_goal() {
        let steps = planner().generate_learning_path(&web_skills(), None, 5);
        assert_eq!(steps[0].course_code, "WEB101");
        assert_eq!(steps.len(), 2);
        assert!(planner().generate_learning_path(&web_skills(), None, 0).is_empty());
    }

    #[test]
    fn test_simulated_acquisition() {
        let skills = SkillSet::new().with("React", Beginner);
        let planner = planner();
        let steps = planner.describe(&["WEB201".to_string(), "WEB301".to_string()], &skills);

        assert_eq!(steps[0].match_percentage, 50);
        assert_eq!(steps[0].missing_skills, vec!["Angular"]);
        // After WEB201: React one level up, Angular learned at Beginner.
        let react = steps[1]
            .matched_skills
            .iter()
            .find(|s| s.skill == "React")
            .unwrap();
        assert_eq!(react.proficiency, Intermediate);
        assert_eq!(steps[1].missing_skills, vec!["Vue.js"]);
        assert_eq!(steps[1].match_percentage, 66);
    }

    #[test]
    fn test_career_aligned_courses() {
        let p = planner();
        let aligned = p.career_aligned_courses("WEB301", 5);
        assert_eq!(aligned.len(), 1);
        assert_eq!(aligned[0].0, "WEB201");
        assert!((aligned[0].1 - 2.0 / 3.0).abs() < 1e-12);
        assert!(p.career_aligned_courses("NOPE", 5).is_empty());
    }

    #[test]
    fn test_rationale_truncates_long_lists() {
        let skills: Vec<String> = ["A", "B", "C", "D", "E"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            rationale("Next", &skills),
            "This course helps prepare you for Next by teaching A, B, C, and 2 more."
        );
    }
}
