use std::collections::HashMap;
use tracing::debug;

use super::MatchResult;
use crate::error::{MatchError, Result};
use crate::similarity::round2;

/// Blend weights of the hybrid strategy, normalised to sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridWeights {
    latent: f64,
    direct: f64,
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            latent: 0.7,
            direct: 0.3,
        }
    }
}

impl HybridWeights {
    pub fn new(latent: f64, direct: f64) -> Result<Self> {
        let valid = |w: f64| w.is_finite() && w >= 0.0;
        if !valid(latent) || !valid(direct) {
            return Err(MatchError::config(format!(
                "hybrid weights must be finite and non-negative (latent={}, direct={})",
                latent, direct
            )));
        }
        let total = latent + direct;
        if total <= 0.0 {
            return Err(MatchError::config("hybrid weights must not both be zero"));
        }
        Ok(Self {
            latent: latent / total,
            direct: direct / total,
        })
    }

    pub fn latent(&self) -> f64 {
        self.latent
    }

    pub fn direct(&self) -> f64 {
        self.direct
    }

    /// Weighted sum of two 0–100 percentages.
    pub fn blend(&self, latent: f64, direct: f64) -> f64 {
        self.latent * latent + self.direct * direct
    }

    /// Joins both strategies' results by course code.
    ///
    /// A course scored by only one strategy counts the other as zero. The
    /// latent result's skill breakdown is kept when present. Output follows
    /// the order of `direct`, then latent-only courses.
    pub(crate) fn combine(&self, latent: Vec<MatchResult>, direct: Vec<MatchResult>) -> Vec<MatchResult> {
        let mut latent_by_code: HashMap<String, MatchResult> = latent
            .into_iter()
            .map(|r| (r.course_code.clone(), r))
            .collect();

        let mut combined: Vec<MatchResult> = direct
            .into_iter()
            .map(|direct_result| {
                let direct_pct = direct_result.match_percentage;
                let (mut result, latent_pct) = match latent_by_code.remove(&direct_result.course_code) {
                    Some(latent_result) => {
                        let pct = latent_result.match_percentage;
                        (latent_result, pct)
                    }
                    None => (direct_result, 0.0),
                };
                result.match_percentage = finish(self.blend(latent_pct, direct_pct));
                result
            })
            .collect();

        let mut latent_only: Vec<MatchResult> = latent_by_code.into_values().collect();
        latent_only.sort_by(|a, b| a.course_code.cmp(&b.course_code));
        for mut result in latent_only {
            result.match_percentage = finish(self.blend(result.match_percentage, 0.0));
            combined.push(result);
        }

        debug!(
            "Hybrid blend of {} courses (latent={:.2}, direct={:.2})",
            combined.len(),
            self.latent,
            self.direct
        );
        combined
    }
}

fn finish(percentage: f64) -> f64 {
    round2(percentage.clamp(0.0, 100.0))
}
