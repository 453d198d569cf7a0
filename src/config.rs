//! Configuration for movement scoring.
//!
//! This module provides the [`ScoringConfig`] struct which centralizes the
//! score weights, cutoffs and thresholds used by the frame scorer, the
//! repetition state machine and the session summary.
//!
//! # Example
//!
//! ```
//! use movement_scoring::ScoringConfig;
//!
//! // Use default configuration
//! let config = ScoringConfig::default();
//! assert!(config.validate().is_ok());
//!
//! // A 20 Hz sensor with a stricter deviation threshold
//! let config = ScoringConfig::new()
//!     .with_sample_rate(20.0)
//!     .with_deviation_threshold(0.05);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoringError};
use crate::rating::RatingThresholds;
use crate::scorer::ScoreWeights;

/// Configuration for movement scoring.
///
/// # Frame Score
///
/// ```text
/// score = w.cosine    * min(cos, 1)
///       + w.dtw       * max(0, dtw_cutoff - dtw)
///       + w.height    * max(0, height_cap - height_diff * height_scale)
///       + w.angle     * max(0, angle_cap_deg - |angle|)
///       + w.amplitude * min(amplitude, amplitude_cap)
/// ```
///
/// With the defaults this is `40 + 40 + 5 + 9 + 10`, so a perfect frame scores
/// 104. The frame score is not clamped; only the session score is.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScoringConfig {
    // Frame score
    /// Weights of the five sub-scores.
    pub weights: ScoreWeights,

    /// DTW distance at which the DTW term reaches zero.
    pub dtw_cutoff: f64,

    /// Multiplier applied to the height difference before subtracting from `height_cap`.
    pub height_scale: f64,

    /// Maximum value of the height term before weighting.
    /// With `height_scale = 100` the term reaches zero at a difference of 0.10.
    pub height_cap: f64,

    /// Vertical angle (degrees) at which the angle term reaches zero.
    pub angle_cap_deg: f64,

    /// Movement amplitude that earns the full amplitude term.
    pub amplitude_cap: f64,

    /// Minimum live path length before DTW is computed; shorter paths use 0.
    pub dtw_min_len: usize,

    /// Trailing window of the live path fed to DTW.
    /// `None` compares the whole accumulated path.
    pub dtw_window: Option<usize>,

    // Repetition state machine
    /// Per-channel absolute tolerance under which two consecutive readings
    /// count as a pause.
    pub pause_tolerance: f64,

    // Session summary
    /// Sensor sampling rate in frames per second, used for deviation timestamps.
    pub sample_rate_hz: f64,

    /// Per-channel absolute delta difference above which a frame is flagged.
    pub deviation_threshold: f64,

    /// Thresholds of the qualitative rating buckets.
    pub rating: RatingThresholds,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            dtw_cutoff: 20.0,
            height_scale: 100.0,
            height_cap: 10.0,
            angle_cap_deg: 90.0,
            amplitude_cap: 1.0,
            dtw_min_len: 5,
            dtw_window: None,

            pause_tolerance: 1e-6,

            // ESP32 posts five frames per second
            sample_rate_hz: 5.0,
            deviation_threshold: 0.1,
            rating: RatingThresholds::default(),
        }
    }
}

impl ScoringConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if !(self.sample_rate_hz.is_finite() && self.sample_rate_hz > 0.0) {
            return Err(ScoringError::invalid_config(
                "sample_rate_hz must be finite and positive",
            ));
        }
        let non_negative = [
            ("deviation_threshold", self.deviation_threshold),
            ("pause_tolerance", self.pause_tolerance),
            ("dtw_cutoff", self.dtw_cutoff),
            ("height_scale", self.height_scale),
            ("height_cap", self.height_cap),
            ("angle_cap_deg", self.angle_cap_deg),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ScoringError::invalid_config(format!(
                    "{name} must be finite and non-negative"
                )));
            }
        }
        if !(self.amplitude_cap.is_finite() && self.amplitude_cap > 0.0) {
            return Err(ScoringError::invalid_config(
                "amplitude_cap must be finite and positive",
            ));
        }
        if self.dtw_min_len < 1 {
            return Err(ScoringError::invalid_config(
                "dtw_min_len must be at least 1",
            ));
        }
        if matches!(self.dtw_window, Some(w) if w < self.dtw_min_len) {
            return Err(ScoringError::invalid_config(
                "dtw_window must not be shorter than dtw_min_len",
            ));
        }
        self.weights.validate()?;
        self.rating.validate()?;
        Ok(())
    }

    /// Set the sampling rate (frames per second).
    #[must_use]
    pub const fn with_sample_rate(mut self, hz: f64) -> Self {
        self.sample_rate_hz = hz;
        self
    }

    /// Set the deviation threshold.
    #[must_use]
    pub const fn with_deviation_threshold(mut self, threshold: f64) -> Self {
        self.deviation_threshold = threshold;
        self
    }

    /// Set the pause tolerance.
    #[must_use]
    pub const fn with_pause_tolerance(mut self, tolerance: f64) -> Self {
        self.pause_tolerance = tolerance;
        self
    }

    /// Set the minimum path length for DTW.
    #[must_use]
    pub const fn with_dtw_min_len(mut self, len: usize) -> Self {
        self.dtw_min_len = len;
        self
    }

    /// Restrict DTW to a trailing window of the live path.
    #[must_use]
    pub const fn with_dtw_window(mut self, window: usize) -> Self {
        self.dtw_window = Some(window);
        self
    }

    /// Replace the score weights.
    #[must_use]
    pub const fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Highest frame score reachable with the current weights and caps.
    #[must_use]
    pub fn max_frame_score(&self) -> f64 {
        let w = &self.weights;
        w.cosine
            + w.dtw * self.dtw_cutoff
            + w.height * self.height_cap
            + w.angle * self.angle_cap_deg
            + w.amplitude * self.amplitude_cap
    }
}
