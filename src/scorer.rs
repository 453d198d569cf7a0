//! Per-frame scoring against a reference vector and path.
//!
//! A frame score is a weighted sum of five bounded sub-scores: direction
//! (cosine similarity), shape (DTW over the live path), height difference,
//! verticality and range of motion. See [`ScoringConfig`] for the formula.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;
use crate::error::{Result, ScoringError};
use crate::math::dtw::path_dtw_distance;
use crate::math::vector::{cosine_similarity, movement_amplitude, vertical_angle, Similarity, Vector4};

/// Weights of the frame sub-scores.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScoreWeights {
    /// Weight for cosine similarity (dominant term).
    pub cosine: f64,
    /// Weight for the DTW term.
    pub dtw: f64,
    /// Weight for the height-difference term.
    pub height: f64,
    /// Weight for the vertical-angle term.
    pub angle: f64,
    /// Weight for the amplitude term.
    pub amplitude: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            cosine: 40.0,
            dtw: 2.0,
            height: 0.5,
            angle: 0.1,
            amplitude: 10.0,
        }
    }
}

impl ScoreWeights {
    /// Check that every weight is finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::InvalidConfig`] naming the offending weight.
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("cosine", self.cosine),
            ("dtw", self.dtw),
            ("height", self.height),
            ("angle", self.angle),
            ("amplitude", self.amplitude),
        ];
        for (name, w) in named {
            if !w.is_finite() || w < 0.0 {
                return Err(ScoringError::invalid_config(format!(
                    "weight `{name}` must be finite and non-negative"
                )));
            }
        }
        Ok(())
    }
}

/// Score of a single observation and the raw quantities behind it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameScoreResult {
    /// Weighted score. Nominally `[0, 100]` but not clamped; NaN when the
    /// cosine similarity is undefined.
    pub score: f64,
    /// Cosine similarity of the spatial channels.
    pub cosine: Similarity,
    /// DTW distance of the live path against the reference prefix (0 when skipped).
    pub dtw_distance: f64,
    /// Absolute height difference.
    pub height_diff: f64,
    /// Vertical angle of the sensor reading in degrees.
    pub vertical_angle_deg: f64,
    /// Spatial distance between first and last point of the live path.
    pub amplitude: f64,
}

impl FrameScoreResult {
    /// Cosine similarity as a number (NaN when undefined).
    #[must_use]
    pub const fn cosine_similarity(&self) -> f64 {
        self.cosine.value()
    }
}

/// Score `sensor` against `ideal`, using the accumulated `live_path` and the
/// reference `ideal_path` for the shape terms.
///
/// DTW compares the live path (or its trailing `dtw_window`) with the
/// reference frames at the same indices, and is skipped (0) while the live
/// path is shorter than `dtw_min_len`.
#[must_use]
pub fn score_frame(
    sensor: &Vector4,
    ideal: &Vector4,
    live_path: &[Vector4],
    ideal_path: &[Vector4],
    config: &ScoringConfig,
) -> FrameScoreResult {
    let w = &config.weights;

    let cosine = cosine_similarity(&sensor.spatial(), &ideal.spatial());
    let dtw_distance = windowed_dtw(live_path, ideal_path, config);
    let height_diff = (sensor.height - ideal.height).abs();
    let vertical_angle_deg = vertical_angle(sensor);
    let amplitude = movement_amplitude(live_path);

    // An undefined direction poisons the score instead of scoring as a match.
    let cosine_term = match cosine {
        Similarity::Defined(c) => w.cosine * c.min(1.0),
        Similarity::Undefined => f64::NAN,
    };

    let score = cosine_term
        + w.dtw * (config.dtw_cutoff - dtw_distance).max(0.0)
        + w.height * (config.height_cap - height_diff * config.height_scale).max(0.0)
        + w.angle * (config.angle_cap_deg - vertical_angle_deg.abs()).max(0.0)
        + w.amplitude * amplitude.min(config.amplitude_cap);

    FrameScoreResult {
        score,
        cosine,
        dtw_distance,
        height_diff,
        vertical_angle_deg,
        amplitude,
    }
}

fn windowed_dtw(live_path: &[Vector4], ideal_path: &[Vector4], config: &ScoringConfig) -> f64 {
    let n = live_path.len();
    if n < config.dtw_min_len {
        return 0.0;
    }

    let start = config.dtw_window.map_or(0, |window| n.saturating_sub(window));
    let ideal_end = n.min(ideal_path.len());
    let ideal_start = start.min(ideal_end);

    path_dtw_distance(&live_path[start..], &ideal_path[ideal_start..ideal_end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn v(x: f64, y: f64, z: f64, h: f64) -> Vector4 {
        Vector4::new(x, y, z, h)
    }

    #[test]
    fn test_identical_vertical_frame() {
        let config = ScoringConfig::default();
        let sensor = v(0.0, 0.0, 1.0, 0.0);
        let result = score_frame(&sensor, &sensor, &[sensor], &[sensor], &config);

        assert_relative_eq!(result.cosine_similarity(), 1.0, epsilon = 1e-12);
        assert_eq!(result.dtw_distance, 0.0);
        assert_eq!(result.height_diff, 0.0);
        assert_relative_eq!(result.vertical_angle_deg, 0.0, epsilon = 1e-9);
        assert_eq!(result.amplitude, 0.0);
        // 40 + 40 + 5 + 9 + 0
        assert_relative_eq!(result.score, 94.0, epsilon = 1e-9);
    }

    #[test]
    fn test_height_term_cutoff() {
        let config = ScoringConfig::default();
        let ideal = v(0.0, 0.0, 1.0, 0.0);

        let close = score_frame(&v(0.0, 0.0, 1.0, 0.04), &ideal, &[ideal], &[ideal], &config);
        let far = score_frame(&v(0.0, 0.0, 1.0, 0.5), &ideal, &[ideal], &[ideal], &config);

        assert_relative_eq!(close.height_diff, 0.04, epsilon = 1e-12);
        // 0.5 * (10 - 4) = 3 instead of 5
        assert_relative_eq!(close.score, 92.0, epsilon = 1e-9);
        // Height term fully decayed
        assert_relative_eq!(far.score, 89.0, epsilon = 1e-9);
    }

    #[test]
    fn test_dtw_skipped_below_min_len() {
        let config = ScoringConfig::default();
        let live: Vec<Vector4> = (0..4).map(|i| v(f64::from(i) * 10.0, 0.0, 0.0, 0.0)).collect();
        let ideal = vec![v(0.0, 0.0, 0.0, 0.0); 10];
        let result = score_frame(&live[3], &v(1.0, 0.0, 0.0, 0.0), &live, &ideal, &config);
        assert_eq!(result.dtw_distance, 0.0);
    }

    #[test]
    fn test_dtw_uses_reference_prefix() {
        let config = ScoringConfig::default();
        let live: Vec<Vector4> = (0..5).map(|i| v(f64::from(i), 0.0, 0.0, 0.0)).collect();
        let mut ideal = live.clone();
        // Frames past the live length must not matter.
        ideal.extend((0..5).map(|_| v(100.0, 0.0, 0.0, 0.0)));

        let result = score_frame(&live[4], &ideal[4], &live, &ideal, &config);
        assert_relative_eq!(result.dtw_distance, 0.0, epsilon = 1e-12);
        // Amplitude term saturates at 1
        assert_relative_eq!(result.amplitude, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_dtw_term_decays_to_zero() {
        let config = ScoringConfig::default();
        let live = vec![v(10.0, 0.0, 0.0, 0.0); 5];
        let ideal = vec![v(0.0, 0.0, 0.0, 0.0); 5];
        let result = score_frame(&live[4], &v(1.0, 0.0, 0.0, 0.0), &live, &ideal, &config);
        assert_relative_eq!(result.dtw_distance, 50.0, epsilon = 1e-12);
        // cos 40 + dtw 0 + height 5 + angle 0 + amplitude 0
        assert_relative_eq!(result.score, 45.0, epsilon = 1e-9);
    }

    #[test]
    fn test_dtw_window() {
        let config = ScoringConfig::default().with_dtw_window(5);
        // Early mismatch falls outside the trailing window.
        let mut live = vec![v(50.0, 0.0, 0.0, 0.0); 3];
        live.extend((0..5).map(|i| v(f64::from(i), 0.0, 0.0, 0.0)));
        let mut ideal = vec![v(0.0, 0.0, 0.0, 0.0); 3];
        ideal.extend((0..5).map(|i| v(f64::from(i), 0.0, 0.0, 0.0)));

        let windowed = score_frame(&live[7], &ideal[7], &live, &ideal, &config);
        assert_relative_eq!(windowed.dtw_distance, 0.0, epsilon = 1e-12);

        let full = score_frame(&live[7], &ideal[7], &live, &ideal, &ScoringConfig::default());
        assert!(full.dtw_distance > 0.0);
    }

    #[test]
    fn test_zero_sensor_undefined_cosine() {
        let config = ScoringConfig::default();
        let zero = Vector4::default();
        let result = score_frame(&zero, &v(0.0, 0.0, 1.0, 0.0), &[zero], &[zero], &config);
        assert_eq!(result.cosine, Similarity::Undefined);
        assert!(result.score.is_nan());
        // The remaining terms are still well defined.
        assert_relative_eq!(result.vertical_angle_deg, 90.0, epsilon = 1e-9);
        assert_eq!(result.height_diff, 0.0);
    }

    #[test]
    fn test_weights_validation() {
        assert!(ScoreWeights::default().validate().is_ok());
        let bad = ScoreWeights {
            dtw: -1.0,
            ..ScoreWeights::default()
        };
        let err = bad.validate().unwrap_err();
        assert!(err.to_string().contains("dtw"));
    }
}
