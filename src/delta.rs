//! Delta-pattern comparison between two position sequences.
//!
//! A [`DeltaSequence`] holds per-channel consecutive differences of a
//! sequence, one row per step. Two delta sequences are compared channel by
//! channel with a mean absolute difference and a cosine similarity. Shapes
//! must match exactly; truncating to a common length is the caller's job
//! (see [`truncate_to_shorter`]).

use nalgebra::DMatrix;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoringError};
use crate::math::vector::{Channel, Similarity, Vector4};

/// Per-channel consecutive differences of a position sequence.
///
/// Rows are steps, columns are channels in [`Channel`] order. A sequence
/// carries between one and four channels.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaSequence {
    data: DMatrix<f64>,
}

impl DeltaSequence {
    /// Wrap an already differenced matrix.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::InvalidInput`] if the matrix has zero or more
    /// than four channels.
    pub fn from_matrix(data: DMatrix<f64>) -> Result<Self> {
        check_channels(data.ncols())?;
        Ok(Self { data })
    }

    /// `(rows, channels)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }

    /// Number of delta rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    /// Whether there are no delta rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    /// Number of channels.
    #[must_use]
    pub fn channels(&self) -> usize {
        self.data.ncols()
    }

    /// Value at `(row, channel)`.
    #[must_use]
    pub fn get(&self, row: usize, channel: usize) -> Option<f64> {
        self.data.get((row, channel)).copied()
    }

    /// Underlying matrix.
    #[must_use]
    pub const fn as_matrix(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// First `rows` rows (or all of them if shorter).
    #[must_use]
    pub fn truncated(&self, rows: usize) -> Self {
        let rows = rows.min(self.len());
        Self {
            data: self.data.rows(0, rows).into_owned(),
        }
    }
}

fn check_channels(channels: usize) -> Result<()> {
    if channels == 0 || channels > Channel::ALL.len() {
        return Err(ScoringError::invalid_input(format!(
            "expected 1 to {} channels, got {channels}",
            Channel::ALL.len()
        )));
    }
    Ok(())
}

/// Stack readings into an `n x 4` matrix.
#[must_use]
pub fn to_matrix(samples: &[Vector4]) -> DMatrix<f64> {
    DMatrix::from_fn(samples.len(), Channel::ALL.len(), |r, c| {
        samples[r].to_array()[c]
    })
}

/// Consecutive differences of every channel of `sequence`.
///
/// The first row has no predecessor and is dropped, so the result has one
/// row fewer than the input (zero rows for inputs shorter than two).
///
/// # Errors
///
/// Returns [`ScoringError::InvalidInput`] if the sequence has zero or more
/// than four channels.
pub fn compute_deltas(sequence: &DMatrix<f64>) -> Result<DeltaSequence> {
    check_channels(sequence.ncols())?;
    Ok(DeltaSequence {
        data: difference(sequence),
    })
}

/// Consecutive differences of a reading sequence over all four channels.
#[must_use]
pub fn compute_vector_deltas(samples: &[Vector4]) -> DeltaSequence {
    DeltaSequence {
        data: difference(&to_matrix(samples)),
    }
}

fn difference(sequence: &DMatrix<f64>) -> DMatrix<f64> {
    let rows = sequence.nrows().saturating_sub(1);
    DMatrix::from_fn(rows, sequence.ncols(), |r, c| {
        sequence[(r + 1, c)] - sequence[(r, c)]
    })
}

/// Per-channel comparison of two delta sequences.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeltaComparison {
    /// Mean absolute difference per channel.
    pub avg_abs_diff: Vec<f64>,
    /// Cosine similarity per channel, treating each channel as one long vector.
    pub cosine: Vec<Similarity>,
}

impl DeltaComparison {
    /// Number of channels compared.
    #[must_use]
    pub fn channels(&self) -> usize {
        self.avg_abs_diff.len()
    }

    /// Mean absolute difference for `channel`, if it was compared.
    #[must_use]
    pub fn avg_abs_diff_of(&self, channel: Channel) -> Option<f64> {
        self.avg_abs_diff.get(channel.index()).copied()
    }

    /// Cosine similarity for `channel`, if it was compared.
    #[must_use]
    pub fn cosine_of(&self, channel: Channel) -> Option<Similarity> {
        self.cosine.get(channel.index()).copied()
    }

    /// Average cosine similarity over the spatial channels present (NaN if any is undefined).
    #[must_use]
    pub fn mean_spatial_cosine(&self) -> f64 {
        mean(self.cosine.iter().take(3).map(|s| s.value()))
    }

    /// Average of the mean absolute differences over the spatial channels present.
    #[must_use]
    pub fn mean_spatial_diff(&self) -> f64 {
        mean(self.avg_abs_diff.iter().take(3).copied())
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0_usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Compare two delta sequences channel by channel.
///
/// Sequences without rows compare to NaN differences and undefined
/// similarities on every channel.
///
/// # Errors
///
/// Returns [`ScoringError::ShapeMismatch`] if the shapes differ; nothing is
/// truncated here.
pub fn compare_deltas(a: &DeltaSequence, b: &DeltaSequence) -> Result<DeltaComparison> {
    if a.shape() != b.shape() {
        return Err(ScoringError::shape_mismatch(a.shape(), b.shape()));
    }
    if a.is_empty() {
        return Ok(DeltaComparison {
            avg_abs_diff: vec![f64::NAN; a.channels()],
            cosine: vec![Similarity::Undefined; a.channels()],
        });
    }

    let rows = a.len() as f64;
    let (avg_abs_diff, cosine): (Vec<f64>, Vec<Similarity>) = a
        .data
        .column_iter()
        .zip(b.data.column_iter())
        .map(|(ca, cb)| {
            let diff = ca.iter().zip(cb.iter()).map(|(x, y)| (x - y).abs()).sum::<f64>() / rows;
            let sim = Similarity::from_parts(ca.dot(&cb), ca.norm(), cb.norm());
            (diff, sim)
        })
        .unzip();

    Ok(DeltaComparison {
        avg_abs_diff,
        cosine,
    })
}

/// Cut two sequences to the length of the shorter one.
#[must_use]
pub fn truncate_to_shorter<'a, 'b, T>(a: &'a [T], b: &'b [T]) -> (&'a [T], &'b [T]) {
    let n = a.len().min(b.len());
    (&a[..n], &b[..n])
}
