use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{SkillProficiency, SkillSet};
use crate::proficiency::ProficiencyLevel;

/// Skill entry as it arrives at the system boundary: either a bare
/// proficiency string or an object carrying a certification flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSkill {
    Level(String),
    Detailed {
        #[serde(default)]
        proficiency: Option<String>,
        #[serde(default, alias = "isBackedByCertificate")]
        is_certified: bool,
    },
}

impl RawSkill {
    pub fn to_skill(&self, name: &str) -> SkillProficiency {
        let (level, is_certified) = match self {
            RawSkill::Level(level) => (ProficiencyLevel::parse_lenient(level), false),
            RawSkill::Detailed {
                proficiency,
                is_certified,
            } => (
                proficiency
                    .as_deref()
                    .map(ProficiencyLevel::parse_lenient)
                    .unwrap_or_default(),
                *is_certified,
            ),
        };

        SkillProficiency {
            skill: name.trim().to_string(),
            proficiency: level,
            is_certified,
        }
    }
}

static ENTRY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<skill>[^:]+?)\s*:\s*(?P<level>[^:]+?)\s*(?::\s*(?P<cert>[^:]*?)\s*)?$")
        .unwrap()
});

/// Parse free text of the form `"MySQL : Intermediate, SQL : Expert : yes"`.
///
/// Entries without a `skill : level` shape are skipped. A third field of
/// yes/true/y marks the skill as certified.
pub fn parse_skill_list(input: &str) -> SkillSet {
    input
        .split(',')
        .filter_map(|entry| {
            let Some(caps) = ENTRY_RE.captures(entry) else {
                if !entry.trim().is_empty() {
                    debug!("Skipping malformed skill entry '{}'", entry.trim());
                }
                return None;
            };

            let is_certified = caps
                .name("cert")
                .map(|c| matches!(c.as_str().to_lowercase().as_str(), "yes" | "true" | "y"))
                .unwrap_or(false);

            Some(SkillProficiency {
                skill: caps["skill"].to_string(),
                proficiency: ProficiencyLevel::parse_lenient(&caps["level"]),
                is_certified,
            })
        })
        .collect()
}
