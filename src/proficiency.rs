use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Ordinal skill strength rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProficiencyLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

/// Numeric representation a computation runs in.
///
/// `Unit` maps levels to {0.25, 0.5, 0.75, 1.0}; `Ordinal` to {1, 2, 3, 4}.
/// A single computation must stay on one scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProficiencyScale {
    #[default]
    Unit,
    Ordinal,
}

impl ProficiencyScale {
    /// Weight of `level` on this scale.
    pub fn weight(self, level: ProficiencyLevel) -> f64 {
        match self {
            ProficiencyScale::Unit => level.weight(),
            ProficiencyScale::Ordinal => f64::from(level.ordinal()),
        }
    }

    /// Largest representable weight; certification boosts are capped here.
    pub fn max_weight(self) -> f64 {
        self.weight(ProficiencyLevel::Expert)
    }
}

impl ProficiencyLevel {
    pub const ALL: [ProficiencyLevel; 4] = [
        ProficiencyLevel::Beginner,
        ProficiencyLevel::Intermediate,
        ProficiencyLevel::Advanced,
        ProficiencyLevel::Expert,
    ];

    /// Weight in [0, 1].
    pub fn weight(self) -> f64 {
        match self {
            ProficiencyLevel::Beginner => 0.25,
            ProficiencyLevel::Intermediate => 0.5,
            ProficiencyLevel::Advanced => 0.75,
            ProficiencyLevel::Expert => 1.0,
        }
    }

    /// Integer rank in 1..=4.
    pub fn ordinal(self) -> u8 {
        match self {
            ProficiencyLevel::Beginner => 1,
            ProficiencyLevel::Intermediate => 2,
            ProficiencyLevel::Advanced => 3,
            ProficiencyLevel::Expert => 4,
        }
    }

    /// Lenient parse: case-insensitive, accepts common synonyms, and falls
    /// back to `Intermediate` for anything unrecognised.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "beginner" | "basic" | "novice" | "elementary" => ProficiencyLevel::Beginner,
            "intermediate" | "mid-level" | "moderate" => ProficiencyLevel::Intermediate,
            "advanced" | "proficient" | "high" => ProficiencyLevel::Advanced,
            "expert" | "master" | "professional" => ProficiencyLevel::Expert,
            other => {
                debug!("Unrecognised proficiency '{}', defaulting to Intermediate", other);
                ProficiencyLevel::Intermediate
            }
        }
    }

    /// One level up, saturating at `Expert`.
    pub fn next(self) -> Self {
        match self {
            ProficiencyLevel::Beginner => ProficiencyLevel::Intermediate,
            ProficiencyLevel::Intermediate => ProficiencyLevel::Advanced,
            ProficiencyLevel::Advanced | ProficiencyLevel::Expert => ProficiencyLevel::Expert,
        }
    }

    /// One level down, saturating at `Beginner`.
    pub fn previous(self) -> Self {
        match self {
            ProficiencyLevel::Expert => ProficiencyLevel::Advanced,
            ProficiencyLevel::Advanced => ProficiencyLevel::Intermediate,
            ProficiencyLevel::Intermediate | ProficiencyLevel::Beginner => {
                ProficiencyLevel::Beginner
            }
        }
    }
}

impl Default for ProficiencyLevel {
    fn default() -> Self {
        ProficiencyLevel::Intermediate
    }
}

impl fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProficiencyLevel::Beginner => write!(f, "Beginner"),
            ProficiencyLevel::Intermediate => write!(f, "Intermediate"),
            ProficiencyLevel::Advanced => write!(f, "Advanced"),
            ProficiencyLevel::Expert => write!(f, "Expert"),
        }
    }
}

impl From<&str> for ProficiencyLevel {
    fn from(raw: &str) -> Self {
        ProficiencyLevel::parse_lenient(raw)
    }
}
