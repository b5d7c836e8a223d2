//! Skill relationship graph.
//!
//! One edge-labelled graph holds co-occurrence counts from the catalog and
//! curated pedagogical relationships. Every public method resolves skill
//! names through the alias table first, and unknown skills yield empty
//! results rather than errors.

mod learning_path;

pub use learning_path::{LearningPathPlanner, LearningStep};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::error::{MatchError, Result};
use crate::skills::SkillSet;

/// Multiplier for a prerequisite of a held skill.
pub const PREREQUISITE_MULTIPLIER: f64 = 2.0;
/// Multiplier for an advanced version of a held skill.
pub const ADVANCED_VERSION_MULTIPLIER: f64 = 1.5;

/// Abbreviations resolved before any lookup.
static ALIAS_TABLE: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("js", "JavaScript"),
        ("javascript", "JavaScript"),
        ("ts", "TypeScript"),
        ("py", "Python"),
        ("python3", "Python"),
        ("ml", "Machine Learning"),
        ("ai", "Artificial Intelligence"),
        ("dl", "Deep Learning"),
        ("nlp", "Natural Language Processing"),
        ("k8s", "Kubernetes"),
        ("postgres", "PostgreSQL"),
        ("mongo", "MongoDB"),
        ("reactjs", "React"),
        ("react.js", "React"),
        ("vue", "Vue.js"),
        ("vuejs", "Vue.js"),
        ("node", "Node.js"),
        ("nodejs", "Node.js"),
        ("cpp", "C++"),
        ("c sharp", "C#"),
        ("gcp", "Google Cloud Platform"),
        ("oop", "Object-Oriented Programming"),
        ("ui", "UI Design"),
        ("ux", "UX Design"),
        ("stats", "Statistics"),
    ])
});

/// Edge label. Direction is from the owning node's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Both skills required by the same course; weight is the course count.
    CoOccurrence,
    /// The target is a prerequisite of the owner.
    Prerequisite,
    /// The target is a more advanced form of the owner.
    AdvancedVersion,
    Complementary,
    Alias,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub to: String,
    pub relation: Relation,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillNode {
    pub name: String,
    pub frequency: usize,
    pub courses: Vec<String>,
}

/// A suggested skill and its aggregate relevance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillSuggestion {
    pub skill: String,
    pub relevance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillGraph {
    /// Keyed by lowercase canonical name.
    nodes: BTreeMap<String, SkillNode>,
    edges: BTreeMap<String, Vec<Edge>>,
    /// User-registered aliases, lowercase alias → canonical name.
    aliases: BTreeMap<String, String>,
}

impl SkillGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Co-occurrence graph of every pair of skills required by one course.
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut graph = Self::new();

        for course in catalog.courses() {
            let skills: Vec<&str> = course.skill_names().collect();
            for skill in &skills {
                let key = graph.add_skill(skill);
                if let Some(node) = graph.nodes.get_mut(&key) {
                    node.frequency += 1;
                    node.courses.push(course.code.clone());
                }
            }
            for (i, a) in skills.iter().enumerate() {
                for b in &skills[i + 1..] {
                    graph.bump_co_occurrence(a, b);
                }
            }
        }

        info!(
            "Skill graph built: {} skills, {} edges",
            graph.nodes.len(),
            graph.edge_count()
        );
        graph
    }

    /// Canonical spelling of `name` after alias resolution.
    pub fn canonical(&self, name: &str) -> String {
        let trimmed = name.trim();
        let lower = trimmed.to_lowercase();
        if let Some(canonical) = self.aliases.get(&lower) {
            return canonical.clone();
        }
        if let Some(canonical) = ALIAS_TABLE.get(lower.as_str()) {
            return canonical.to_string();
        }
        trimmed.to_string()
    }

    fn key(&self, name: &str) -> String {
        self.canonical(name).to_lowercase()
    }

    fn display(&self, key: &str) -> String {
        self.nodes
            .get(key)
            .map(|n| n.name.clone())
            .unwrap_or_else(|| key.to_string())
    }

    pub fn contains(&self, skill: &str) -> bool {
        self.nodes.contains_key(&self.key(skill))
    }

    pub fn skill_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    pub fn node(&self, skill: &str) -> Option<&SkillNode> {
        self.nodes.get(&self.key(skill))
    }

    /// Adds a node if absent and returns its key.
    pub fn add_skill(&mut self, skill: &str) -> String {
        let name = self.canonical(skill);
        let key = name.to_lowercase();
        self.nodes.entry(key.clone()).or_insert_with(|| SkillNode {
            name,
            ..SkillNode::default()
        });
        key
    }

    fn upsert_edge(&mut self, from: &str, to: &str, relation: Relation, weight: f64) {
        let edges = self.edges.entry(from.to_string()).or_default();
        match edges.iter_mut().find(|e| e.to == to && e.relation == relation) {
            Some(edge) => edge.weight = weight,
            None => edges.push(Edge {
                to: to.to_string(),
                relation,
                weight,
            }),
        }
    }

    fn bump_co_occurrence(&mut self, a: &str, b: &str) {
        let (a, b) = (self.add_skill(a), self.add_skill(b));
        if a == b {
            return;
        }
        for (from, to) in [(&a, &b), (&b, &a)] {
            let current = self.edge_weight(from, to, Relation::CoOccurrence).unwrap_or(0.0);
            self.upsert_edge(from, to, Relation::CoOccurrence, current + 1.0);
        }
    }

    fn edge_weight(&self, from: &str, to: &str, relation: Relation) -> Option<f64> {
        self.edges
            .get(from)?
            .iter()
            .find(|e| e.to == to && e.relation == relation)
            .map(|e| e.weight)
    }

    pub fn add_prerequisite(&mut self, skill: &str, prerequisite: &str) {
        let (skill, prerequisite) = (self.add_skill(skill), self.add_skill(prerequisite));
        if skill != prerequisite {
            self.upsert_edge(&skill, &prerequisite, Relation::Prerequisite, 1.0);
        }
    }

    pub fn add_complementary(&mut self, a: &str, b: &str) {
        let (a, b) = (self.add_skill(a), self.add_skill(b));
        if a != b {
            self.upsert_edge(&a, &b, Relation::Complementary, 1.0);
            self.upsert_edge(&b, &a, Relation::Complementary, 1.0);
        }
    }

    pub fn add_advanced_version(&mut self, basic: &str, advanced: &str) {
        let (basic, advanced) = (self.add_skill(basic), self.add_skill(advanced));
        if basic != advanced {
            self.upsert_edge(&basic, &advanced, Relation::AdvancedVersion, 1.0);
        }
    }

    /// Registers `alias` as another spelling of `canonical`.
    pub fn add_alias(&mut self, alias: &str, canonical: &str) {
        let canonical_name = self.canonical(canonical);
        let alias_key = alias.trim().to_lowercase();
        if alias_key.is_empty() || alias_key == canonical_name.to_lowercase() {
            return;
        }
        let canonical_key = self.add_skill(&canonical_name);
        self.aliases.insert(alias_key.clone(), canonical_name);
        self.upsert_edge(&canonical_key, &alias_key, Relation::Alias, 1.0);
        self.upsert_edge(&alias_key, &canonical_key, Relation::Alias, 1.0);
    }

    fn targets(&self, skill: &str, relation: Relation) -> Vec<String> {
        let key = self.key(skill);
        self.edges
            .get(&key)
            .map(|edges| {
                edges
                    .iter()
                    .filter(|e| e.relation == relation)
                    .map(|e| self.display(&e.to))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get_prerequisites(&self, skill: &str) -> Vec<String> {
        self.targets(skill, Relation::Prerequisite)
    }

    pub fn get_complementary_skills(&self, skill: &str) -> Vec<String> {
        self.targets(skill, Relation::Complementary)
    }

    pub fn get_advanced_versions(&self, skill: &str) -> Vec<String> {
        self.targets(skill, Relation::AdvancedVersion)
    }

    /// Registered aliases of `skill`.
    pub fn get_aliases(&self, skill: &str) -> Vec<String> {
        let key = self.key(skill);
        self.edges
            .get(&key)
            .map(|edges| {
                edges
                    .iter()
                    .filter(|e| e.relation == Relation::Alias)
                    .map(|e| e.to.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn dependent_keys(&self, key: &str) -> Vec<String> {
        self.edges
            .iter()
            .filter(|(_, edges)| {
                edges
                    .iter()
                    .any(|e| e.relation == Relation::Prerequisite && e.to == key)
            })
            .map(|(from, _)| from.clone())
            .collect()
    }

    /// Skills that list `skill` as a prerequisite.
    pub fn get_dependents(&self, skill: &str) -> Vec<String> {
        self.dependent_keys(&self.key(skill))
            .iter()
            .map(|k| self.display(k))
            .collect()
    }

    /// Every non-alias relationship of `skill`, sorted by relation then name.
    pub fn related_skills(&self, skill: &str) -> Vec<(String, Relation)> {
        let key = self.key(skill);
        let mut related: BTreeSet<(Relation, String)> = self
            .edges
            .get(&key)
            .into_iter()
            .flatten()
            .filter(|e| e.relation != Relation::Alias)
            .map(|e| (e.relation, self.display(&e.to)))
            .collect();
        for dependent in self.get_dependents(skill) {
            related.insert((Relation::Prerequisite, dependent));
        }
        related.into_iter().map(|(rel, name)| (name, rel)).collect()
    }

    /// Keys reachable in one learning step: co-occurring, complementary,
    /// advanced versions, and skills this one is a prerequisite of.
    fn learning_neighbours(&self, key: &str) -> Vec<String> {
        let mut next: BTreeSet<String> = self
            .edges
            .get(key)
            .into_iter()
            .flatten()
            .filter(|e| {
                matches!(
                    e.relation,
                    Relation::CoOccurrence | Relation::Complementary | Relation::AdvancedVersion
                )
            })
            .map(|e| e.to.clone())
            .collect();
        next.extend(self.dependent_keys(key));
        next.into_iter().collect()
    }

    /// Shortest chain of learning steps from one skill to another.
    pub fn skill_path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        let (start, goal) = (self.key(from), self.key(to));
        if !self.nodes.contains_key(&start) || !self.nodes.contains_key(&goal) {
            return None;
        }

        let mut previous: HashMap<String, String> = HashMap::new();
        let mut visited: HashSet<String> = HashSet::from([start.clone()]);
        let mut queue = VecDeque::from([start.clone()]);

        while let Some(current) = queue.pop_front() {
            if current == goal {
                let mut path = vec![self.display(&current)];
                let mut cursor = current;
                while let Some(prev) = previous.get(&cursor) {
                    path.push(self.display(prev));
                    cursor = prev.clone();
                }
                path.reverse();
                return Some(path);
            }
            for next in self.learning_neighbours(&current) {
                if visited.insert(next.clone()) {
                    previous.insert(next.clone(), current.clone());
                    queue.push_back(next);
                }
            }
        }
        None
    }

    /// Ranks skills the person does not hold by how strongly their held
    /// skills point at them, weighted by proficiency.
    pub fn suggest_next_skills(&self, current: &SkillSet, top_n: usize) -> Vec<SkillSuggestion> {
        let held: HashSet<String> = current.names().map(|n| self.key(n)).collect();
        let mut scores: HashMap<String, f64> = HashMap::new();

        for skill in current {
            let key = self.key(&skill.skill);
            let weight = skill.proficiency.weight();
            let mut add = |target: &str, amount: f64| {
                if !held.contains(target) {
                    *scores.entry(target.to_string()).or_insert(0.0) += amount;
                }
            };

            let mut linked: HashSet<&str> = HashSet::new();
            for edge in self.edges.get(&key).into_iter().flatten() {
                if matches!(edge.relation, Relation::CoOccurrence | Relation::Complementary) {
                    linked.insert(edge.to.as_str());
                }
                let amount = match edge.relation {
                    Relation::CoOccurrence => edge.weight,
                    Relation::Complementary => 1.0,
                    Relation::Prerequisite => PREREQUISITE_MULTIPLIER,
                    Relation::AdvancedVersion => ADVANCED_VERSION_MULTIPLIER,
                    Relation::Alias => continue,
                };
                add(&edge.to, amount * weight);
            }
            // A dependent already reached through a co-occurrence or
            // complementary edge counts once.
            for dependent in self.dependent_keys(&key) {
                if !linked.contains(dependent.as_str()) {
                    add(&dependent, weight);
                }
            }
        }

        let mut ranked: Vec<SkillSuggestion> = scores
            .into_iter()
            .map(|(key, relevance)| SkillSuggestion {
                skill: self.display(&key),
                relevance,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.skill.cmp(&b.skill))
        });
        ranked.truncate(top_n);

        debug!("Suggested {} next skills from {} held", ranked.len(), current.len());
        ranked
    }

    /// Seeds well-known relationships between skills already in the graph.
    pub fn initialize_common_relationships(&mut self) {
        const BASICS: [&str; 4] = [
            "Programming Logic and Flow Control",
            "Basic Programming Concepts",
            "Computational Thinking",
            "Algorithm Design",
        ];
        const LANGUAGES: [&str; 6] = ["JavaScript", "Python", "Java", "C++", "PHP", "Ruby"];
        const JS_FRAMEWORKS: [&str; 3] = ["React", "Angular", "Vue.js"];
        const COMMUNICATION: [&str; 4] = [
            "Public Speaking",
            "Academic Writing",
            "Technical Writing",
            "Interpersonal Communication",
        ];

        let mut pending_prerequisites: Vec<(&str, &str)> = Vec::new();
        for basic in BASICS {
            for language in LANGUAGES {
                pending_prerequisites.push((language, basic));
            }
        }
        for framework in JS_FRAMEWORKS {
            for prerequisite in ["HTML", "CSS", "JavaScript"] {
                pending_prerequisites.push((framework, prerequisite));
            }
        }
        for framework in ["Django", "Flask"] {
            pending_prerequisites.push((framework, "Python"));
        }
        for advanced_math in ["Calculus", "Trigonometry", "Linear Algebra"] {
            pending_prerequisites.push((advanced_math, "Algebra"));
        }

        let mut added = 0usize;
        for (skill, prerequisite) in pending_prerequisites {
            if self.contains(skill) && self.contains(prerequisite) {
                self.add_prerequisite(skill, prerequisite);
                added += 1;
            }
        }

        let mut complementary = vec![("Database Design", "SQL")];
        for (i, a) in COMMUNICATION.iter().enumerate() {
            for b in &COMMUNICATION[i + 1..] {
                complementary.push((*a, *b));
            }
        }
        for (a, b) in complementary {
            if self.contains(a) && self.contains(b) {
                self.add_complementary(a, b);
                added += 1;
            }
        }

        info!("Seeded {} common skill relationships", added);
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?).map_err(|e| MatchError::io(path, e))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| MatchError::io(path, e))?;
        Self::from_json(&json)
    }
}

/// Top `top_n` skills to learn next, most relevant first.
pub fn suggest_next_skills(graph: &SkillGraph, current: &SkillSet, top_n: usize) -> Vec<SkillSuggestion> {
    graph.suggest_next_skills(current, top_n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Course;
    use crate::proficiency::ProficiencyLevel;

    fn catalog() -> Catalog {
        use ProficiencyLevel::*;
        Catalog::new(vec![
            Course::new("WEB101", "Web")
                .with_requirement("HTML", Beginner)
                .with_requirement("CSS", Beginner)
                .with_requirement("JavaScript", Beginner),
            Course::new("WEB201", "Frontend")
                .with_requirement("HTML", Intermediate)
                .with_requirement("CSS", Intermediate)
                .with_requirement("React", Intermediate),
            Course::new("DB101", "Databases")
                .with_requirement("SQL", Beginner)
                .with_requirement("Database Design", Beginner),
            Course::new("MATH", "Math")
                .with_requirement("Algebra", Beginner)
                .with_requirement("Calculus", Beginner),
        ])
    }

    fn graph() -> SkillGraph {
        let mut graph = SkillGraph::from_catalog(&catalog());
        graph.initialize_common_relationships();
        graph
    }

    #[test]
    fn test_co_occurrence_counts() {
        let g = SkillGraph::from_catalog(&catalog());
        assert_eq!(g.edge_weight("html", "css", Relation::CoOccurrence), Some(2.0));
        assert_eq!(g.edge_weight("css", "html", Relation::CoOccurrence), Some(2.0));
        assert_eq!(g.edge_weight("html", "react", Relation::CoOccurrence), Some(1.0));
        assert_eq!(g.node("HTML").unwrap().frequency, 2);
    }

    #[test]
    fn test_common_relationships() {
        let g = graph();
        let mut prereqs = g.get_prerequisites("React");
        prereqs.sort();
        assert_eq!(prereqs, vec!["CSS", "HTML", "JavaScript"]);
        assert_eq!(g.get_prerequisites("Calculus"), vec!["Algebra"]);
        assert_eq!(g.get_complementary_skills("SQL"), vec!["Database Design"]);
        // Vue.js is not in the catalog, so no relationship is seeded for it.
        assert!(g.get_prerequisites("Vue.js").is_empty());
    }

    #[test]
    fn test_unknown_skill_lookups_are_empty() {
        let g = graph();
        assert!(g.get_prerequisites("Basket Weaving").is_empty());
        assert!(g.get_complementary_skills("Basket Weaving").is_empty());
        assert!(g.get_advanced_versions("Basket Weaving").is_empty());
        assert!(g.skill_path("Basket Weaving", "HTML").is_none());
    }

    #[test]
    fn test_alias_resolution_everywhere() {
        let mut g = graph();
        assert_eq!(g.canonical(" js "), "JavaScript");
        assert!(g.contains("JS"));

        g.add_advanced_version("js", "TypeScript");
        assert_eq!(g.get_advanced_versions("JavaScript"), vec!["TypeScript"]);

        g.add_alias("Structured Query Language", "SQL");
        assert_eq!(
            g.get_complementary_skills("structured query language"),
            vec!["Database Design"]
        );
        assert_eq!(g.get_aliases("SQL"), vec!["structured query language"]);
    }

    #[test]
    fn test_suggest_next_skills() {
        let g = graph();
        let skills = SkillSet::new()
            .with("HTML", ProficiencyLevel::Expert)
            .with("CSS", ProficiencyLevel::Expert);

        let suggestions = g.suggest_next_skills(&skills, 5);
        let names: Vec<&str> = suggestions.iter().map(|s| s.skill.as_str()).collect();
        assert!(!names.contains(&"HTML"));
        assert!(!names.contains(&"CSS"));
        // JavaScript and React each co-occur once with both held skills.
        // React also depends on both, which adds nothing on top.
        assert_eq!(names[..2], ["JavaScript", "React"]);
        assert!((suggestions[0].relevance - 2.0).abs() < 1e-12);
        assert!((suggestions[1].relevance - 2.0).abs() < 1e-12);
        assert!(suggestions.windows(2).all(|w| w[0].relevance >= w[1].relevance));
    }

    #[test]
    fn test_co_occurring_dependent_counts_once() {
        let catalog = Catalog::new(vec![Course::new("WEB", "Web")
            .with_requirement("HTML", ProficiencyLevel::Beginner)
            .with_requirement("React", ProficiencyLevel::Beginner)]);
        let mut g = SkillGraph::from_catalog(&catalog);
        g.add_prerequisite("React", "HTML");
        let skills = SkillSet::new().with("HTML", ProficiencyLevel::Expert);

        let suggestions = g.suggest_next_skills(&skills, 5);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].skill, "React");
        assert!((suggestions[0].relevance - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_dependent_without_other_link_still_counts() {
        let mut g = SkillGraph::new();
        g.add_prerequisite("Calculus", "Algebra");
        let skills = SkillSet::new().with("Algebra", ProficiencyLevel::Advanced);

        let suggestions = g.suggest_next_skills(&skills, 5);
        assert_eq!(suggestions[0].skill, "Calculus");
        assert!((suggestions[0].relevance - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_prerequisites_weigh_double() {
        let mut g = SkillGraph::new();
        g.add_prerequisite("Calculus", "Algebra");
        g.add_advanced_version("Calculus", "Real Analysis");
        let skills = SkillSet::new().with("Calculus", ProficiencyLevel::Intermediate);

        let suggestions = g.suggest_next_skills(&skills, 10);
        assert_eq!(suggestions[0].skill, "Algebra");
        assert!((suggestions[0].relevance - 1.0).abs() < 1e-12);
        assert_eq!(suggestions[1].skill, "Real Analysis");
        assert!((suggestions[1].relevance - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_skill_path() {
        let g = graph();
        let path = g.skill_path("Algebra", "calculus").unwrap();
        assert_eq!(path, vec!["Algebra", "Calculus"]);
        let path = g.skill_path("JavaScript", "React").unwrap();
        assert_eq!(path.first().map(String::as_str), Some("JavaScript"));
        assert_eq!(path.last().map(String::as_str), Some("React"));
        assert!(g.skill_path("SQL", "HTML").is_none());
    }

    #[test]
    fn test_json_round_trip() {
        let g = graph();
        let back = SkillGraph::from_json(&g.to_json().unwrap()).unwrap();
        assert_eq!(back, g);
    }
}
