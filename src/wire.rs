//! JSON message shapes exchanged with sensor devices and clients.
//!
//! Inbound readings may carry their numbers either as JSON numbers or as
//! numeric strings. Outbound reports round their quantities to a fixed number
//! of decimals and encode undefined values as `null`.

use serde::{Deserialize, Deserializer, Serialize};

use crate::math::vector::{Channel, Vector4};
use crate::session::Observation;
use crate::summary::SessionSummary;

/// One reading as posted by a device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorFrame {
    /// Acceleration along the X axis.
    #[serde(deserialize_with = "number_or_string")]
    pub acceleration_x: f64,
    /// Acceleration along the Y axis.
    #[serde(deserialize_with = "number_or_string")]
    pub acceleration_y: f64,
    /// Acceleration along the Z axis.
    #[serde(deserialize_with = "number_or_string")]
    pub acceleration_z: f64,
    /// Missing altitude reads as 0.
    #[serde(default, deserialize_with = "number_or_string")]
    pub altitude: f64,
}

impl From<SensorFrame> for Vector4 {
    fn from(frame: SensorFrame) -> Self {
        Self::new(
            frame.acceleration_x,
            frame.acceleration_y,
            frame.acceleration_z,
            frame.altitude,
        )
    }
}

/// Request to start a session for a named exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRequest {
    /// Exercise name; selects the `ideal_<exercise>.csv` reference.
    pub exercise: String,
}

/// Reply to one posted reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FrameReport {
    /// The reading was scored.
    Ok {
        /// Frame score, `null` when the cosine is undefined.
        score: Option<f64>,
        /// Cosine similarity to the reference frame, 4 decimals.
        cosine_similarity: Option<f64>,
        /// DTW distance of the live path, 4 decimals.
        dtw: f64,
        /// Absolute height difference, 2 decimals.
        height_diff: f64,
        /// Vertical angle in degrees, 2 decimals.
        angle: f64,
        /// Movement amplitude, 2 decimals.
        amplitude: f64,
    },
    /// The reading was a pause and was not scored.
    Paused,
    /// The reading was rejected.
    Error {
        /// Why the reading was rejected.
        message: String,
    },
}

impl FrameReport {
    /// Error reply carrying `message`.
    #[must_use]
    pub fn error(message: impl ToString) -> Self {
        Self::Error {
            message: message.to_string(),
        }
    }
}

impl From<&Observation> for FrameReport {
    fn from(observation: &Observation) -> Self {
        match observation {
            Observation::Paused => Self::Paused,
            Observation::Scored(frame) => Self::Ok {
                score: defined(frame.score),
                cosine_similarity: defined(frame.cosine_similarity()).map(|c| round_to(c, 4)),
                dtw: round_to(frame.dtw_distance, 4),
                height_diff: round_to(frame.height_diff, 2),
                angle: round_to(frame.vertical_angle_deg, 2),
                amplitude: round_to(frame.amplitude, 2),
            },
        }
    }
}

/// End-of-session reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Clamped session score, 2 decimals; `null` without a defined frame score.
    pub final_score: Option<f64>,
    /// Rating label.
    pub rating: String,
    /// Mean absolute delta difference on X, Y and Z.
    pub avg_deltas: Vec<f64>,
    /// Delta cosine similarity on X, Y and Z; `null` where undefined.
    pub cos_sim_per_axis: Vec<Option<f64>>,
    /// Number of recorded frames.
    pub point_count: usize,
    /// Completed repetitions.
    pub repetitions: usize,
    /// Rendered deviation report.
    pub movement_context: String,
}

impl From<&SessionSummary> for SessionReport {
    fn from(summary: &SessionSummary) -> Self {
        let spatial = Channel::SPATIAL.len();
        Self {
            final_score: summary.final_score.map(|s| round_to(s, 2)),
            rating: summary.rating.to_string(),
            avg_deltas: summary.comparison.avg_abs_diff.iter().take(spatial).copied().collect(),
            cos_sim_per_axis: summary
                .comparison
                .cosine
                .iter()
                .take(spatial)
                .map(|s| defined(s.value()))
                .collect(),
            point_count: summary.frame_count,
            repetitions: summary.completed_repetitions(),
            movement_context: summary.deviations.to_string(),
        }
    }
}

fn defined(v: f64) -> Option<f64> {
    (!v.is_nan()).then_some(v)
}

/// Round half away from zero to `decimals` places.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

fn number_or_string<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(v) => Ok(v),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("`{s}` is not a number"))),
    }
}
