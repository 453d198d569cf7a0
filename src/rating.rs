//! Qualitative session rating and the clamped session score.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::delta::DeltaComparison;
use crate::error::{Result, ScoringError};

/// Qualitative rating buckets, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Rating {
    /// Near-identical movement pattern.
    Excellent,
    /// Very close to the reference.
    Great,
    /// Recognizably correct.
    Good,
    /// Partly correct.
    Fair,
    /// Everything else, including undefined similarities.
    NeedsImprovement,
}

impl Rating {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Great => "Great",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lower cosine bound and upper delta-error bound of one bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RatingBound {
    /// Mean spatial cosine similarity must be strictly above this.
    pub min_cosine: f64,
    /// Mean spatial delta error must be strictly below this.
    pub max_delta_error: f64,
}

impl RatingBound {
    const fn new(min_cosine: f64, max_delta_error: f64) -> Self {
        Self {
            min_cosine,
            max_delta_error,
        }
    }

    // NaN fails both comparisons.
    fn admits(&self, cosine: f64, error: f64) -> bool {
        cosine > self.min_cosine && error < self.max_delta_error
    }
}

/// Bounds of the rating buckets, checked best first.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RatingThresholds {
    /// Bound for [`Rating::Excellent`].
    pub excellent: RatingBound,
    /// Bound for [`Rating::Great`].
    pub great: RatingBound,
    /// Bound for [`Rating::Good`].
    pub good: RatingBound,
    /// Bound for [`Rating::Fair`].
    pub fair: RatingBound,
}

impl Default for RatingThresholds {
    fn default() -> Self {
        Self {
            excellent: RatingBound::new(0.995, 0.1),
            great: RatingBound::new(0.98, 0.2),
            good: RatingBound::new(0.95, 0.4),
            fair: RatingBound::new(0.90, 0.6),
        }
    }
}

impl RatingThresholds {
    /// Reject NaN bounds. Infinite bounds are allowed.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::InvalidConfig`] naming the first NaN bound.
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("excellent", self.excellent),
            ("great", self.great),
            ("good", self.good),
            ("fair", self.fair),
        ];
        for (name, bound) in named {
            if bound.min_cosine.is_nan() || bound.max_delta_error.is_nan() {
                return Err(ScoringError::invalid_config(format!(
                    "rating bound `{name}` must not be NaN"
                )));
            }
        }
        Ok(())
    }

    /// Rate a mean spatial cosine similarity and mean spatial delta error.
    #[must_use]
    pub fn rate(&self, cosine: f64, delta_error: f64) -> Rating {
        [
            (self.excellent, Rating::Excellent),
            (self.great, Rating::Great),
            (self.good, Rating::Good),
            (self.fair, Rating::Fair),
        ]
        .into_iter()
        .find(|(bound, _)| bound.admits(cosine, delta_error))
        .map_or(Rating::NeedsImprovement, |(_, rating)| rating)
    }
}

/// Rate a delta comparison on its X, Y and Z channels.
#[must_use]
pub fn rate_performance(comparison: &DeltaComparison, thresholds: &RatingThresholds) -> Rating {
    thresholds.rate(comparison.mean_spatial_cosine(), comparison.mean_spatial_diff())
}

/// Mean of the defined frame scores, clamped to `[0, 100]`.
///
/// NaN scores (frames with an undefined similarity) are skipped. Returns
/// `None` when no defined score remains.
#[must_use]
pub fn session_score(frame_scores: &[f64]) -> Option<f64> {
    let (sum, count) = frame_scores
        .iter()
        .filter(|s| !s.is_nan())
        .fold((0.0, 0_usize), |(sum, n), s| (sum + s, n + 1));
    (count > 0).then(|| (sum / count as f64).clamp(0.0, 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::vector::Similarity;
    use approx::assert_relative_eq;

    fn comparison(cos: f64, diff: f64) -> DeltaComparison {
        DeltaComparison {
            avg_abs_diff: vec![diff; 4],
            cosine: vec![Similarity::Defined(cos); 4],
        }
    }

    #[test]
    fn test_buckets() {
        let t = RatingThresholds::default();
        assert_eq!(rate_performance(&comparison(0.999, 0.05), &t), Rating::Excellent);
        assert_eq!(rate_performance(&comparison(0.999, 0.15), &t), Rating::Great);
        assert_eq!(rate_performance(&comparison(0.96, 0.3), &t), Rating::Good);
        assert_eq!(rate_performance(&comparison(0.91, 0.5), &t), Rating::Fair);
        assert_eq!(rate_performance(&comparison(0.91, 0.7), &t), Rating::NeedsImprovement);
        assert_eq!(rate_performance(&comparison(0.5, 0.0), &t), Rating::NeedsImprovement);
    }

    #[test]
    fn test_bounds_are_strict() {
        let t = RatingThresholds::default();
        assert_eq!(t.rate(0.995, 0.05), Rating::Great);
        assert_eq!(t.rate(0.999, 0.1), Rating::Great);
    }

    #[test]
    fn test_height_channel_ignored() {
        let mut cmp = comparison(1.0, 0.0);
        cmp.cosine[3] = Similarity::Undefined;
        cmp.avg_abs_diff[3] = 50.0;
        assert_eq!(rate_performance(&cmp, &RatingThresholds::default()), Rating::Excellent);
    }

    #[test]
    fn test_undefined_similarity_lowest_bucket() {
        let mut cmp = comparison(1.0, 0.0);
        cmp.cosine[1] = Similarity::Undefined;
        assert_eq!(
            rate_performance(&cmp, &RatingThresholds::default()),
            Rating::NeedsImprovement
        );
    }

    #[test]
    fn test_session_score_clamped() {
        assert_eq!(session_score(&[]), None);
        assert_eq!(session_score(&[f64::NAN]), None);
        assert_relative_eq!(session_score(&[80.0, 90.0]).unwrap(), 85.0);
        assert_relative_eq!(session_score(&[104.0, 102.0]).unwrap(), 100.0);
        assert_relative_eq!(session_score(&[-5.0]).unwrap(), 0.0);
        assert_relative_eq!(session_score(&[60.0, f64::NAN, 70.0]).unwrap(), 65.0);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Rating::NeedsImprovement.to_string(), "Needs Improvement");
        assert!(Rating::Excellent < Rating::Fair);
    }
}
