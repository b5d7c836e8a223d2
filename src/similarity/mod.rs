//! Skill-name similarity and the direct (per-requirement) scorer.
//!
//! Name similarity is an ordered chain of [`SimilarityBackend`]s; the first
//! backend with an opinion wins and the containment heuristic answers
//! otherwise.

mod calibration;
mod scorer;

pub(crate) use calibration::round2;
pub use calibration::{Calibration, CurveSegment, Tier};
pub use scorer::DirectScorer;

use std::fmt;
use std::sync::Arc;
use trigram::similarity;

use crate::skills::taxonomy;

/// Source of a similarity score between two skill names.
pub trait SimilarityBackend: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Similarity in [0, 1], or `None` when this backend cannot represent
    /// one of the names.
    fn similarity(&self, a: &str, b: &str) -> Option<f64>;
}

/// Curated pairs and same-category fallback from the skill taxonomy.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaxonomySimilarity;

impl SimilarityBackend for TaxonomySimilarity {
    fn name(&self) -> &'static str {
        "taxonomy"
    }

    fn similarity(&self, a: &str, b: &str) -> Option<f64> {
        taxonomy::taxonomy_similarity(a, b)
    }
}

/// Character-trigram similarity. Scores under `min_similarity` are treated
/// as "no opinion" so the rest of the chain still applies.
#[derive(Debug, Clone, Copy)]
pub struct TrigramSimilarity {
    pub min_similarity: f64,
}

impl Default for TrigramSimilarity {
    fn default() -> Self {
        Self {
            min_similarity: 0.3,
        }
    }
}

impl SimilarityBackend for TrigramSimilarity {
    fn name(&self) -> &'static str {
        "trigram"
    }

    fn similarity(&self, a: &str, b: &str) -> Option<f64> {
        if a.trim().is_empty() || b.trim().is_empty() {
            return None;
        }
        let score = f64::from(similarity(&a.to_lowercase(), &b.to_lowercase())).clamp(0.0, 1.0);
        (score >= self.min_similarity).then_some(score)
    }
}

/// Ordered backend chain with the containment heuristic as last resort.
#[derive(Debug, Clone)]
pub struct NameSimilarity {
    backends: Vec<Arc<dyn SimilarityBackend>>,
    containment: f64,
    floor: f64,
}

impl Default for NameSimilarity {
    fn default() -> Self {
        let calibration = Calibration::default();
        Self::new(calibration.containment_similarity, calibration.similarity_floor)
    }
}

impl NameSimilarity {
    pub fn new(containment: f64, floor: f64) -> Self {
        Self {
            backends: Vec::new(),
            containment,
            floor,
        }
    }

    pub fn from_calibration(calibration: &Calibration) -> Self {
        Self::new(calibration.containment_similarity, calibration.similarity_floor)
    }

    pub fn with_backend<B: SimilarityBackend + 'static>(mut self, backend: B) -> Self {
        self.backends.push(Arc::new(backend));
        self
    }

    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        self.backends
            .iter()
            .find_map(|backend| backend.similarity(a, b))
            .map(|score| score.clamp(0.0, 1.0))
            .unwrap_or_else(|| self.containment(a, b))
    }

    /// Exact → 1.0, substring either way → containment score, else floor.
    pub fn containment(&self, a: &str, b: &str) -> f64 {
        let a = a.trim().to_lowercase();
        let b = b.trim().to_lowercase();

        if a == b {
            1.0
        } else if !a.is_empty() && !b.is_empty() && (a.contains(&b) || b.contains(&a)) {
            self.containment
        } else {
            self.floor
        }
    }
}
