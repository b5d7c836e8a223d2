use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the matching core.
///
/// Malformed user input (unknown proficiency strings, skills outside the
/// catalog vocabulary) is never an error; it degrades to a neutral default.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Invalid configuration or training input. Fatal for the operation.
    #[error("configuration error: {0}")]
    Config(String),

    /// A course code absent from the trained model's index.
    #[error("course not found in model index: {0}")]
    UnknownCourse(String),

    /// A skill name absent from the trained model's vocabulary.
    #[error("skill not found in model vocabulary: {0}")]
    UnknownSkill(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MatchError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        MatchError::Config(msg.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MatchError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, MatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_errors_are_distinct() {
        let course = MatchError::UnknownCourse("CS101".to_string());
        let skill = MatchError::UnknownSkill("Rust".to_string());
        assert!(course.to_string().contains("CS101"));
        assert!(skill.to_string().contains("Rust"));
        assert!(matches!(course, MatchError::UnknownCourse(_)));
    }
}
