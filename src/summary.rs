//! End-of-session summary: delta comparison, deviation report, rating and
//! repetition statistics.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;
use crate::delta::{compare_deltas, compute_vector_deltas, DeltaComparison, DeltaSequence};
use crate::diagnostics::{diagnose_with_config, DeviationReport};
use crate::error::{Result, ScoringError};
use crate::math::vector::{Channel, Vector4};
use crate::rating::{rate_performance, session_score, Rating};
use crate::session::RepetitionSummary;

/// Result of ending a session.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SessionSummary {
    /// Raw frames recorded, pauses included.
    pub frame_count: usize,
    /// Frames that were scored.
    pub scored_frames: usize,
    /// Mean defined frame score clamped to `[0, 100]`.
    pub final_score: Option<f64>,
    /// Per-channel delta comparison of recording and reference.
    pub comparison: DeltaComparison,
    /// Timestamped deviations between the two delta sequences.
    pub deviations: DeviationReport,
    /// Qualitative rating of the comparison.
    pub rating: Rating,
    /// Closed repetitions, the trailing partial one last.
    pub repetitions: Vec<RepetitionSummary>,
}

impl SessionSummary {
    /// Build a summary from precomputed delta sequences.
    ///
    /// Both sequences are cut to the shorter one before comparing. Without a
    /// common row the comparison is NaN and undefined on every channel.
    ///
    /// # Errors
    ///
    /// - [`ScoringError::ShapeMismatch`] if the channel counts differ.
    /// - [`ScoringError::InvalidInput`] if the configured sample rate is not positive.
    pub fn from_deltas(
        actual: &DeltaSequence,
        reference: &DeltaSequence,
        frame_scores: &[f64],
        repetitions: Vec<RepetitionSummary>,
        config: &ScoringConfig,
    ) -> Result<Self> {
        let rows = actual.len().min(reference.len());
        let (actual, reference) = (actual.truncated(rows), reference.truncated(rows));

        let comparison = compare_deltas(&actual, &reference)?;
        let deviations: DeviationReport = diagnose_with_config(&actual, &reference, config)?.collect();
        let rating = rate_performance(&comparison, &config.rating);

        Ok(Self {
            frame_count: rows + 1,
            scored_frames: frame_scores.len(),
            final_score: session_score(frame_scores),
            comparison,
            deviations,
            rating,
            repetitions,
        })
    }

    /// Completed repetitions.
    #[must_use]
    pub fn completed_repetitions(&self) -> usize {
        self.repetitions.iter().filter(|r| r.complete).count()
    }
}

/// Summarize a raw recording against a reference trajectory.
///
/// The recording and reference are cut to the shorter of the two before
/// differencing. A reference shorter than two frames leaves no delta to
/// compare; the summary then carries an undefined comparison.
///
/// # Errors
///
/// - [`ScoringError::InsufficientData`] if fewer than two frames were recorded.
/// - See [`SessionSummary::from_deltas`].
pub fn summarize(
    recording: &[Vector4],
    reference: &[Vector4],
    frame_scores: &[f64],
    repetitions: Vec<RepetitionSummary>,
    config: &ScoringConfig,
) -> Result<SessionSummary> {
    let frame_count = recording.len();
    if frame_count < 2 {
        return Err(ScoringError::insufficient_data(2, frame_count));
    }
    let (actual, ideal) = crate::delta::truncate_to_shorter(recording, reference);

    let mut summary = SessionSummary::from_deltas(
        &compute_vector_deltas(actual),
        &compute_vector_deltas(ideal),
        frame_scores,
        repetitions,
        config,
    )?;
    summary.frame_count = frame_count;
    Ok(summary)
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let channels: Vec<Channel> = (0..self.comparison.channels())
            .filter_map(Channel::from_index)
            .collect();

        writeln!(f, "Movement Pattern Comparison (Delta-based):")?;
        for &channel in &channels {
            if let Some(diff) = self.comparison.avg_abs_diff_of(channel) {
                writeln!(f, "Average Δ{channel}: {diff:.4}")?;
            }
        }

        writeln!(f, "\nCosine Similarity per Axis:")?;
        for &channel in &channels {
            if let Some(sim) = self.comparison.cosine_of(channel) {
                writeln!(f, "{channel}-axis: {sim}")?;
            }
        }

        writeln!(f, "\n{}", self.deviations)?;

        writeln!(f)?;
        match self.final_score {
            Some(score) => writeln!(f, "Session score: {score:.2}")?,
            None => writeln!(f, "Session score: n/a")?,
        }
        let partial = self.repetitions.len() - self.completed_repetitions();
        writeln!(
            f,
            "Repetitions: {} complete, {partial} partial",
            self.completed_repetitions()
        )?;
        write!(f, "Rating: {}", self.rating)
    }
}
