//! Static skill taxonomy: categories, inference rules and curated pairwise
//! similarities between skill names.
//!
//! All lookups are case-insensitive.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use super::{same_skill, SkillProficiency, SkillSet};

/// Broad skill area used by the preference layer.
///
/// Serialised by display name ("Web Development"); parsing is lenient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum SkillCategory {
    Database,
    Programming,
    WebDevelopment,
    CloudComputing,
    DataScience,
    Security,
    Networking,
    ProjectManagement,
    Design,
    Other,
}

impl SkillCategory {
    /// Categories in lookup priority order (a skill listed under several
    /// categories resolves to the first).
    pub const ALL: [SkillCategory; 10] = [
        SkillCategory::Database,
        SkillCategory::Programming,
        SkillCategory::WebDevelopment,
        SkillCategory::CloudComputing,
        SkillCategory::DataScience,
        SkillCategory::Security,
        SkillCategory::Networking,
        SkillCategory::ProjectManagement,
        SkillCategory::Design,
        SkillCategory::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SkillCategory::Database => "Database",
            SkillCategory::Programming => "Programming",
            SkillCategory::WebDevelopment => "Web Development",
            SkillCategory::CloudComputing => "Cloud Computing",
            SkillCategory::DataScience => "Data Science",
            SkillCategory::Security => "Security",
            SkillCategory::Networking => "Networking",
            SkillCategory::ProjectManagement => "Project Management",
            SkillCategory::Design => "Design",
            SkillCategory::Other => "Other",
        }
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['_', '-'], " ");
        SkillCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().to_lowercase() == wanted || c.as_str().to_lowercase().replace(' ', "") == wanted)
            .ok_or_else(|| format!("unknown skill category: {}", s))
    }
}

impl From<SkillCategory> for String {
    fn from(category: SkillCategory) -> Self {
        category.as_str().to_string()
    }
}

impl TryFrom<String> for SkillCategory {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

const CATEGORY_TABLE: &[(SkillCategory, &[&str])] = &[
    (
        SkillCategory::Database,
        &[
            "SQL", "MySQL", "MSSQL", "PostgreSQL", "SQLite", "Oracle Database", "NoSQL",
            "MongoDB", "Cassandra", "Redis", "Database Design", "Data Modeling",
            "Relational Database", "Database Management", "Database Administration",
            "Database Security", "Database Performance", "Database Optimization",
            "Query Optimization", "Indexing", "Entity-Relationship Diagrams", "ERD",
            "Normalization", "Denormalization", "ACID Properties", "Transactions",
            "Database Management Systems", "DBMS", "Data Warehousing", "ETL", "Big Data",
            "Data Lake", "Database Migration",
        ],
    ),
    (
        SkillCategory::Programming,
        &[
            "Python", "Java", "JavaScript", "C++", "C#", "Ruby", "PHP", "Go", "Rust", "Swift",
            "Kotlin", "TypeScript", "Object-Oriented Programming", "OOP",
            "Functional Programming", "Procedural Programming", "Data Structures",
            "Algorithms", "Debugging", "Version Control", "Git", "Testing", "Unit Testing",
            "Integration Testing", "Code Review", "Refactoring", "Clean Code",
            "Software Development", "API Development", "Web Development",
        ],
    ),
    (
        SkillCategory::WebDevelopment,
        &[
            "HTML", "CSS", "JavaScript", "React", "Angular", "Vue.js", "Node.js", "Express.js",
            "Django", "Flask", "Ruby on Rails", "ASP.NET", "PHP", "WordPress",
            "Frontend Development", "Backend Development", "Full Stack", "REST API",
            "GraphQL", "Web Services", "Web Design", "Responsive Design", "Bootstrap",
            "Tailwind CSS", "SASS", "LESS", "jQuery", "DOM Manipulation",
        ],
    ),
    (
        SkillCategory::CloudComputing,
        &[
            "AWS", "Amazon Web Services", "Azure", "Google Cloud", "GCP",
            "Cloud Architecture", "Cloud Security", "Cloud Migration", "IaaS", "PaaS", "SaaS",
            "Serverless", "Containers", "Docker", "Kubernetes", "Microservices", "DevOps",
            "CI/CD", "Infrastructure as Code", "IaC", "Terraform", "CloudFormation",
            "Ansible", "Puppet", "Chef",
        ],
    ),
    (
        SkillCategory::DataScience,
        &[
            "Machine Learning", "Deep Learning", "Artificial Intelligence", "AI",
            "Neural Networks", "Data Analysis", "Data Visualization", "Statistics", "R",
            "Python", "Pandas", "NumPy", "Scikit-learn", "TensorFlow", "PyTorch", "Big Data",
            "Hadoop", "Spark", "Data Mining", "Natural Language Processing", "NLP",
            "Computer Vision", "Predictive Modeling", "Regression", "Classification",
            "Clustering", "Time Series Analysis", "Feature Engineering",
        ],
    ),
    (
        SkillCategory::Security,
        &[
            "Cybersecurity", "Network Security", "Application Security", "Cloud Security",
            "Security Operations", "Vulnerability Assessment", "Penetration Testing",
            "Ethical Hacking", "Security Auditing", "Risk Assessment", "Threat Modeling",
            "Incident Response", "Forensics", "Malware Analysis", "Cryptography",
            "Authentication", "Authorization", "Identity Management", "IAM",
            "Security Compliance", "GDPR", "HIPAA", "PCI DSS", "ISO 27001",
        ],
    ),
    (
        SkillCategory::Networking,
        &[
            "Network Protocols", "TCP/IP", "HTTP", "DNS", "FTP", "SMTP", "Network Design",
            "Routing", "Switching", "Firewalls", "VPN", "Subnetting", "IP Addressing", "IPv4",
            "IPv6", "OSI Model", "Network Security", "LAN", "WAN", "VLAN",
            "Wireless Networking", "Network Troubleshooting", "Network Performance", "SDN",
        ],
    ),
    (
        SkillCategory::ProjectManagement,
        &[
            "Agile", "Scrum", "Kanban", "Waterfall", "Project Planning", "Risk Management",
            "Stakeholder Management", "Resource Allocation", "Budgeting",
            "Project Scheduling", "JIRA", "Trello", "Asana", "MS Project",
            "Project Documentation", "PMBOK", "PMP", "Prince2", "Sprint Planning",
            "Retrospectives", "Stand-ups",
        ],
    ),
    (
        SkillCategory::Design,
        &[
            "UX Design", "UI Design", "User Experience", "User Interface",
            "Interaction Design", "Visual Design", "Graphic Design", "Web Design",
            "Mobile Design", "Responsive Design", "Wireframing", "Prototyping", "Figma",
            "Sketch", "Adobe XD", "Photoshop", "Illustrator", "Design Thinking",
            "User Research", "Usability Testing", "Information Architecture",
            "Accessibility", "A11y", "Color Theory", "Typography",
        ],
    ),
];

const INFERENCE_TABLE: &[(&str, &[&str])] = &[
    ("MySQL", &["SQL", "Database Management", "Relational Database"]),
    ("MSSQL", &["SQL", "Database Management", "Relational Database"]),
    ("PostgreSQL", &["SQL", "Database Management", "Relational Database"]),
    ("Oracle Database", &["SQL", "Database Management", "Relational Database"]),
    ("NoSQL", &["Database Management", "Database Design"]),
    ("MongoDB", &["NoSQL", "Database Management"]),
    ("Database Design", &["Data Modeling", "Relational Database"]),
    (
        "Advanced Database Systems",
        &["Database Management", "Database Performance", "Database Optimization"],
    ),
    ("React", &["JavaScript", "Frontend Development", "Web Development"]),
    (
        "Angular",
        &["TypeScript", "JavaScript", "Frontend Development", "Web Development"],
    ),
    ("Django", &["Python", "Backend Development", "Web Development"]),
    ("Node.js", &["JavaScript", "Backend Development", "Web Development"]),
];

const SIMILARITY_TABLE: &[(&str, &str, f64)] = &[
    ("MySQL", "SQL", 0.95),
    ("MSSQL", "SQL", 0.95),
    ("PostgreSQL", "SQL", 0.95),
    ("SQLite", "SQL", 0.9),
    ("MySQL", "MSSQL", 0.85),
    ("MySQL", "PostgreSQL", 0.8),
    ("MSSQL", "PostgreSQL", 0.8),
    ("Database Design", "Data Modeling", 0.9),
    ("Database Design", "Relational Database", 0.85),
    ("Database Design", "Entity-Relationship Diagrams", 0.85),
    ("Database Design", "ERD", 0.85),
    ("Database Design", "Database Management", 0.8),
    ("Database Design", "Normalization", 0.85),
    ("Database Administration", "Database Management", 0.9),
    ("Advanced Database Systems", "Database Performance", 0.85),
    ("Advanced Database Systems", "Database Optimization", 0.85),
    ("Database Performance", "Query Optimization", 0.9),
    ("Database Performance", "Indexing", 0.85),
];

/// Similarity assumed between distinct skills of the same category.
pub const SAME_CATEGORY_SIMILARITY: f64 = 0.7;

static CATEGORY_INDEX: Lazy<HashMap<String, SkillCategory>> = Lazy::new(|| {
    let mut index = HashMap::new();
    for (category, skills) in CATEGORY_TABLE {
        for skill in *skills {
            index.entry(skill.to_lowercase()).or_insert(*category);
        }
    }
    index
});

static INFERENCE_INDEX: Lazy<HashMap<String, &'static [&'static str]>> = Lazy::new(|| {
    INFERENCE_TABLE
        .iter()
        .map(|(skill, implied)| (skill.to_lowercase(), *implied))
        .collect()
});

static SIMILARITY_INDEX: Lazy<HashMap<(String, String), f64>> = Lazy::new(|| {
    let mut index = HashMap::new();
    for (a, b, score) in SIMILARITY_TABLE {
        index.insert((a.to_lowercase(), b.to_lowercase()), *score);
        index.insert((b.to_lowercase(), a.to_lowercase()), *score);
    }
    index
});

/// Category of `skill`, or `Other` when uncategorised.
pub fn category_of(skill: &str) -> SkillCategory {
    CATEGORY_INDEX
        .get(&skill.trim().to_lowercase())
        .copied()
        .unwrap_or(SkillCategory::Other)
}

/// Distinct non-`Other` categories across `skills`.
pub fn categories_of<'a, I>(skills: I) -> BTreeSet<SkillCategory>
where
    I: IntoIterator<Item = &'a str>,
{
    skills
        .into_iter()
        .map(category_of)
        .filter(|c| *c != SkillCategory::Other)
        .collect()
}

/// Curated similarity, falling back to same-category similarity.
/// `None` when the taxonomy has no opinion.
pub fn taxonomy_similarity(a: &str, b: &str) -> Option<f64> {
    let key = (a.trim().to_lowercase(), b.trim().to_lowercase());
    if let Some(score) = SIMILARITY_INDEX.get(&key) {
        return Some(*score);
    }

    let (ca, cb) = (category_of(a), category_of(b));
    (ca == cb && ca != SkillCategory::Other).then_some(SAME_CATEGORY_SIMILARITY)
}

/// Skills implied by those already held, excluding any already present.
pub fn inferred_skills(skills: &SkillSet) -> Vec<String> {
    let mut inferred = BTreeSet::new();
    for held in skills {
        if let Some(implied) = INFERENCE_INDEX.get(&held.skill.to_lowercase()) {
            for skill in implied.iter().filter(|s| !skills.contains(s)) {
                inferred.insert(skill.to_string());
            }
        }
    }
    inferred.into_iter().collect()
}

/// Adds inferred skills one level below the strongest skill implying them.
pub fn enrich_with_inferred(skills: &SkillSet) -> SkillSet {
    let mut enriched = skills.clone();

    for inferred in inferred_skills(skills) {
        let source_level = skills
            .iter()
            .filter(|held| {
                INFERENCE_INDEX
                    .get(&held.skill.to_lowercase())
                    .is_some_and(|implied| implied.iter().any(|s| same_skill(s, &inferred)))
            })
            .map(|held| held.proficiency)
            .max();

        if let Some(level) = source_level {
            enriched.insert(SkillProficiency::new(inferred, level.previous()));
        }
    }

    enriched
}
