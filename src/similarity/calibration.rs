use serde::{Deserialize, Serialize};

/// Non-exact best scores above `threshold` count with `multiplier`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub threshold: f64,
    pub multiplier: f64,
}

/// Percentages above `breakpoint` become `breakpoint + (raw - breakpoint) * slope`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveSegment {
    pub breakpoint: f64,
    pub slope: f64,
}

/// Empirical scoring constants of the direct scorer.
///
/// Defaults reproduce the long-standing production values. They are not
/// derived from data and are kept configurable for review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub certification_boost: f64,
    pub containment_similarity: f64,
    pub similarity_floor: f64,
    pub exact_match_bonus: f64,
    /// Checked in order; the first matching tier applies.
    pub tiers: Vec<Tier>,
    pub base_multiplier: f64,
    /// Checked in order; only the first matching segment applies.
    pub curve: Vec<CurveSegment>,
    pub missing_threshold: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            certification_boost: 1.5,
            containment_similarity: 0.8,
            similarity_floor: 0.2,
            exact_match_bonus: 1.1,
            tiers: vec![
                Tier { threshold: 0.8, multiplier: 1.0 },
                Tier { threshold: 0.6, multiplier: 0.9 },
                Tier { threshold: 0.4, multiplier: 0.8 },
            ],
            base_multiplier: 0.7,
            curve: vec![
                CurveSegment { breakpoint: 95.0, slope: 0.5 },
                CurveSegment { breakpoint: 90.0, slope: 0.6 },
                CurveSegment { breakpoint: 80.0, slope: 0.7 },
                CurveSegment { breakpoint: 70.0, slope: 0.8 },
            ],
            missing_threshold: 0.5,
        }
    }
}

impl Calibration {
    /// No exact-match bonus and no similarity floor: unrelated names score
    /// zero and a fully met course scores exactly 100 before the curve.
    pub fn strict() -> Self {
        Self {
            exact_match_bonus: 1.0,
            similarity_floor: 0.0,
            ..Self::default()
        }
    }

    /// Weighted contribution of one requirement's best score.
    pub fn contribution(&self, best_score: f64, is_exact: bool) -> f64 {
        if is_exact {
            return best_score * self.exact_match_bonus;
        }
        let multiplier = self
            .tiers
            .iter()
            .find(|tier| best_score > tier.threshold)
            .map(|tier| tier.multiplier)
            .unwrap_or(self.base_multiplier);
        best_score * multiplier
    }

    /// Applies the compression curve, clamps to [0, 100] and rounds to two
    /// decimals.
    pub fn calibrate(&self, raw_percentage: f64) -> f64 {
        let curved = self
            .curve
            .iter()
            .find(|segment| raw_percentage > segment.breakpoint)
            .map(|segment| segment.breakpoint + (raw_percentage - segment.breakpoint) * segment.slope)
            .unwrap_or(raw_percentage);

        round2(curved.clamp(0.0, 100.0))
    }

    pub fn is_missing(&self, best_score: f64) -> bool {
        best_score < self.missing_threshold
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
