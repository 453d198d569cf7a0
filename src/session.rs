//! Repetition state machine for one exercise session.
//!
//! [`RepetitionSession`] owns everything a session needs: the reference
//! trajectory, the live path of the current repetition, the last raw reading
//! (for pause detection) and the full raw recording used by the end-of-session
//! summary. Calls must be made in arrival order; the machine is not meant to
//! be shared between threads without a lock (see
//! [`SessionRegistry`](crate::registry::SessionRegistry)).
//!
//! # Phases
//!
//! ```text
//! Idle --start--> Armed --observe--> Tracking <--> Paused
//!   ^                                   |
//!   +---------------end-----------------+
//! ```
//!
//! Once the live path holds as many frames as the reference, the next moving
//! frame closes the repetition and starts a new live path.
//!
//! # Example
//!
//! ```
//! use movement_scoring::{Observation, ReferenceTrajectory, RepetitionSession, ScoringConfig, Vector4};
//!
//! let reference = ReferenceTrajectory::new(vec![
//!     Vector4::new(0.0, 0.0, 1.0, 0.0),
//!     Vector4::new(0.0, 0.0, 2.0, 0.0),
//! ])?;
//!
//! let mut session = RepetitionSession::new(ScoringConfig::default());
//! session.start(reference)?;
//!
//! session.observe(Vector4::new(0.0, 0.0, 1.0, 0.0))?;
//! match session.observe(Vector4::new(0.0, 0.0, 2.0, 0.0))? {
//!     Observation::Scored(frame) => assert!(frame.score > 0.0),
//!     Observation::Paused => unreachable!(),
//! }
//! # Ok::<(), movement_scoring::ScoringError>(())
//! ```

use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ScoringConfig;
use crate::error::{Result, ScoringError};
use crate::math::vector::Vector4;
use crate::scorer::{score_frame, FrameScoreResult};
use crate::summary::{summarize, SessionSummary};

/// Read-only reference trajectory of an exercise.
///
/// Cheap to clone; one instance can back many sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTrajectory {
    frames: Arc<[Vector4]>,
}

impl ReferenceTrajectory {
    /// Wrap reference frames.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::MissingReference`] for an empty trajectory.
    pub fn new(frames: Vec<Vector4>) -> Result<Self> {
        if frames.is_empty() {
            return Err(ScoringError::MissingReference);
        }
        Ok(Self {
            frames: frames.into(),
        })
    }

    /// Reference frames in order.
    #[must_use]
    pub fn frames(&self) -> &[Vector4] {
        &self.frames
    }

    /// Number of frames in one repetition.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always false; empty references are rejected on construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Externally visible phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No reference loaded.
    Idle,
    /// Reference loaded, nothing observed yet.
    Armed,
    /// Last reading moved.
    Tracking,
    /// Last reading repeated the one before it.
    Paused,
}

/// Outcome of one [`RepetitionSession::observe`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    /// The reading matched the previous one; nothing was scored.
    Paused,
    /// The reading was appended to the live path and scored.
    Scored(FrameScoreResult),
}

impl Observation {
    /// Frame score, if the reading was scored.
    #[must_use]
    pub const fn score(&self) -> Option<&FrameScoreResult> {
        match self {
            Self::Scored(result) => Some(result),
            Self::Paused => None,
        }
    }

    /// Whether the reading was treated as a pause.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        matches!(self, Self::Paused)
    }
}

/// Score statistics of one repetition.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RepetitionSummary {
    /// Zero-based repetition number.
    pub index: usize,
    /// Scored frames in the repetition.
    pub frames: usize,
    /// Mean of the defined frame scores (unclamped).
    pub mean_score: Option<f64>,
    /// Highest defined frame score.
    pub best_score: Option<f64>,
    /// Lowest defined frame score.
    pub worst_score: Option<f64>,
    /// Whether the live path reached the reference length.
    pub complete: bool,
}

#[derive(Debug, Default)]
struct RepAccumulator {
    frames: usize,
    defined: usize,
    sum: f64,
    best: Option<f64>,
    worst: Option<f64>,
}

impl RepAccumulator {
    fn push(&mut self, score: f64) {
        self.frames += 1;
        if score.is_nan() {
            return;
        }
        self.defined += 1;
        self.sum += score;
        self.best = Some(self.best.map_or(score, |b| b.max(score)));
        self.worst = Some(self.worst.map_or(score, |w| w.min(score)));
    }

    fn finish(self, index: usize, complete: bool) -> RepetitionSummary {
        RepetitionSummary {
            index,
            frames: self.frames,
            mean_score: (self.defined > 0).then(|| self.sum / self.defined as f64),
            best_score: self.best,
            worst_score: self.worst,
            complete,
        }
    }
}

/// Per-session repetition state machine.
#[derive(Debug)]
pub struct RepetitionSession {
    config: ScoringConfig,
    reference: Option<ReferenceTrajectory>,
    accumulated_path: Vec<Vector4>,
    last_vector: Option<Vector4>,
    is_moving: bool,
    recording: Vec<Vector4>,
    frame_scores: Vec<f64>,
    current_rep: RepAccumulator,
    repetitions: Vec<RepetitionSummary>,
}

impl RepetitionSession {
    /// Create an idle session.
    #[must_use]
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            config,
            reference: None,
            accumulated_path: Vec::new(),
            last_vector: None,
            is_moving: false,
            recording: Vec::new(),
            frame_scores: Vec::new(),
            current_rep: RepAccumulator::default(),
            repetitions: Vec::new(),
        }
    }

    /// Load `reference` and arm the session, discarding any previous progress.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::InvalidConfig`] if the configuration does not
    /// validate; the session is left untouched.
    pub fn start(&mut self, reference: ReferenceTrajectory) -> Result<()> {
        self.config.validate()?;

        info!(reference_frames = reference.len(), "session armed");
        self.clear_progress();
        self.reference = Some(reference);
        Ok(())
    }

    /// Build a reference from raw frames and [`start`](Self::start) with it.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::MissingReference`] for an empty frame list;
    /// the session stays in its current phase.
    pub fn start_from_frames(&mut self, frames: Vec<Vector4>) -> Result<()> {
        let reference = ReferenceTrajectory::new(frames)?;
        self.start(reference)
    }

    /// Feed one raw reading.
    ///
    /// Every reading is recorded for the session summary. A reading within
    /// `pause_tolerance` of the previous one is a pause and is neither added
    /// to the live path nor scored. Otherwise it is appended (after closing
    /// the repetition if the live path is already full) and scored against
    /// the reference frame at the same index.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::MissingReference`] while the session is idle.
    pub fn observe(&mut self, vector: Vector4) -> Result<Observation> {
        let reference = self
            .reference
            .clone()
            .ok_or(ScoringError::MissingReference)?;

        self.recording.push(vector);

        if let Some(last) = self.last_vector.replace(vector) {
            if vector.approx_eq(&last, self.config.pause_tolerance) {
                self.is_moving = false;
                debug!(frame = self.recording.len(), "pause detected");
                return Ok(Observation::Paused);
            }
        }
        self.is_moving = true;

        if self.accumulated_path.len() == reference.len() {
            self.close_repetition(true);
            self.accumulated_path.clear();
        }
        self.accumulated_path.push(vector);

        // Index-aligned: live frame i is compared with reference frame i.
        let ideal = reference.frames()[self.accumulated_path.len() - 1];
        let result = score_frame(
            &vector,
            &ideal,
            &self.accumulated_path,
            reference.frames(),
            &self.config,
        );

        if !result.cosine.is_defined() {
            warn!(?vector, "zero-norm reading, cosine similarity undefined");
        }
        debug!(
            score = result.score,
            cosine = result.cosine_similarity(),
            dtw = result.dtw_distance,
            height_diff = result.height_diff,
            angle = result.vertical_angle_deg,
            amplitude = result.amplitude,
            "frame scored"
        );

        self.frame_scores.push(result.score);
        self.current_rep.push(result.score);
        Ok(Observation::Scored(result))
    }

    /// End the session and summarize the full recording against the reference.
    ///
    /// The session returns to [`Phase::Idle`] whether or not the summary
    /// succeeds.
    ///
    /// # Errors
    ///
    /// - [`ScoringError::MissingReference`] if the session was idle.
    /// - [`ScoringError::InsufficientData`] if fewer than two frames were
    ///   recorded.
    pub fn end(&mut self) -> Result<SessionSummary> {
        let reference = self.reference.take().ok_or(ScoringError::MissingReference)?;

        if self.current_rep.frames > 0 {
            let complete = self.accumulated_path.len() == reference.len();
            self.close_repetition(complete);
        }

        let recording = std::mem::take(&mut self.recording);
        let frame_scores = std::mem::take(&mut self.frame_scores);
        let repetitions = std::mem::take(&mut self.repetitions);
        self.clear_progress();

        info!(
            frames = recording.len(),
            repetitions = repetitions.iter().filter(|r| r.complete).count(),
            "session ended"
        );
        summarize(
            &recording,
            reference.frames(),
            &frame_scores,
            repetitions,
            &self.config,
        )
    }

    fn close_repetition(&mut self, complete: bool) {
        let index = self.repetitions.len();
        let rep = std::mem::take(&mut self.current_rep).finish(index, complete);
        debug!(index, frames = rep.frames, mean = ?rep.mean_score, complete, "repetition closed");
        self.repetitions.push(rep);
    }

    fn clear_progress(&mut self) {
        self.accumulated_path.clear();
        self.last_vector = None;
        self.is_moving = false;
        self.recording.clear();
        self.frame_scores.clear();
        self.current_rep = RepAccumulator::default();
        self.repetitions.clear();
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        match (&self.reference, self.last_vector, self.is_moving) {
            (None, _, _) => Phase::Idle,
            (Some(_), None, _) => Phase::Armed,
            (Some(_), Some(_), true) => Phase::Tracking,
            (Some(_), Some(_), false) => Phase::Paused,
        }
    }

    /// Whether the last reading moved.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.is_moving
    }

    /// Live path of the current repetition.
    #[must_use]
    pub fn accumulated_path(&self) -> &[Vector4] {
        &self.accumulated_path
    }

    /// Most recent raw reading.
    #[must_use]
    pub const fn last_vector(&self) -> Option<Vector4> {
        self.last_vector
    }

    /// Loaded reference, if any.
    #[must_use]
    pub const fn reference(&self) -> Option<&ReferenceTrajectory> {
        self.reference.as_ref()
    }

    /// Every reading observed since `start`, pauses included.
    #[must_use]
    pub fn recording(&self) -> &[Vector4] {
        &self.recording
    }

    /// Scores of every scored frame since `start`.
    #[must_use]
    pub fn frame_scores(&self) -> &[f64] {
        &self.frame_scores
    }

    /// Repetitions closed so far.
    #[must_use]
    pub fn repetitions(&self) -> &[RepetitionSummary] {
        &self.repetitions
    }

    /// Number of repetitions that reached the reference length.
    #[must_use]
    pub fn completed_repetitions(&self) -> usize {
        self.repetitions.iter().filter(|r| r.complete).count()
    }

    /// Get reference to configuration.
    #[must_use]
    pub const fn config(&self) -> &ScoringConfig {
        &self.config
    }
}

impl Default for RepetitionSession {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}
