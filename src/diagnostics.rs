//! Timestamped deviation events between two delta sequences.
//!
//! [`diagnose_deviations`] returns a lazy iterator that walks both sequences
//! row by row and yields an event for every row where at least one channel's
//! absolute difference exceeds the threshold. Events come out in ascending
//! row order. Collecting them into a [`DeviationReport`] gives the textual
//! report: a [`REPORT_HEADING`] line followed by one line per event, or the
//! [`NO_DEVIATIONS`] sentinel alone when nothing was flagged.

use std::fmt;
use std::iter::FusedIterator;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;
use crate::delta::DeltaSequence;
use crate::error::{Result, ScoringError};
use crate::math::vector::Channel;

/// Report line used when no row exceeded the threshold.
pub const NO_DEVIATIONS: &str = "No major deviations were detected during the exercise.";

/// First line of a report with at least one event.
pub const REPORT_HEADING: &str = "Movement deviation summary:";

/// One flagged row.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviationEvent {
    /// Row index in the delta sequences.
    pub index: usize,
    /// `index / sample_rate_hz`.
    pub timestamp_secs: f64,
    /// Channels whose difference exceeded the threshold, in channel order.
    pub axes: Vec<Channel>,
}

impl fmt::Display for DeviationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "- At {:.2}s, high deviation on axis: ", self.timestamp_secs)?;
        for (i, axis) in self.axes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{axis}")?;
        }
        f.write_str(".")
    }
}

/// Lazy iterator over deviation events.
#[derive(Debug, Clone)]
pub struct Deviations<'a> {
    actual: &'a DeltaSequence,
    reference: &'a DeltaSequence,
    sample_rate_hz: f64,
    threshold: f64,
    next_row: usize,
}

impl Iterator for Deviations<'_> {
    type Item = DeviationEvent;

    fn next(&mut self) -> Option<DeviationEvent> {
        let (a, b) = (self.actual.as_matrix(), self.reference.as_matrix());
        while self.next_row < a.nrows() {
            let index = self.next_row;
            self.next_row += 1;

            let axes: Vec<Channel> = (0..a.ncols())
                .filter(|&c| (a[(index, c)] - b[(index, c)]).abs() > self.threshold)
                .filter_map(Channel::from_index)
                .collect();

            if !axes.is_empty() {
                return Some(DeviationEvent {
                    index,
                    timestamp_secs: index as f64 / self.sample_rate_hz,
                    axes,
                });
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.actual.len() - self.next_row))
    }
}

impl FusedIterator for Deviations<'_> {}

/// Flag rows where `actual` and `reference` differ by more than `threshold`
/// on any channel.
///
/// # Errors
///
/// - [`ScoringError::ShapeMismatch`] if the sequences differ in shape.
/// - [`ScoringError::InvalidInput`] if `sample_rate_hz` is not positive.
pub fn diagnose_deviations<'a>(
    actual: &'a DeltaSequence,
    reference: &'a DeltaSequence,
    sample_rate_hz: f64,
    threshold: f64,
) -> Result<Deviations<'a>> {
    if actual.shape() != reference.shape() {
        return Err(ScoringError::shape_mismatch(actual.shape(), reference.shape()));
    }
    if sample_rate_hz.is_nan() || sample_rate_hz <= 0.0 {
        return Err(ScoringError::invalid_input("sample rate must be positive"));
    }
    Ok(Deviations {
        actual,
        reference,
        sample_rate_hz,
        threshold,
        next_row: 0,
    })
}

/// [`diagnose_deviations`] with the rate and threshold from `config`.
///
/// # Errors
///
/// See [`diagnose_deviations`].
pub fn diagnose_with_config<'a>(
    actual: &'a DeltaSequence,
    reference: &'a DeltaSequence,
    config: &ScoringConfig,
) -> Result<Deviations<'a>> {
    diagnose_deviations(actual, reference, config.sample_rate_hz, config.deviation_threshold)
}

/// Ordered deviation events of a session.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviationReport {
    events: Vec<DeviationEvent>,
}

impl DeviationReport {
    /// Whether no deviation was detected.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.events.is_empty()
    }

    /// Flagged events in ascending row order.
    #[must_use]
    pub fn events(&self) -> &[DeviationEvent] {
        &self.events
    }

    /// Number of flagged rows where `channel` deviated.
    #[must_use]
    pub fn count_for(&self, channel: Channel) -> usize {
        self.events
            .iter()
            .filter(|e| e.axes.contains(&channel))
            .count()
    }
}

impl FromIterator<DeviationEvent> for DeviationReport {
    fn from_iter<I: IntoIterator<Item = DeviationEvent>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for DeviationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.events.is_empty() {
            return f.write_str(NO_DEVIATIONS);
        }
        f.write_str(REPORT_HEADING)?;
        for event in &self.events {
            write!(f, "\n{event}")?;
        }
        Ok(())
    }
}
