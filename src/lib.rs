//! Movement Scoring Library
//!
//! Real-time scoring of motion-sensor streams against a reference exercise
//! trajectory.
//!
//! Each sensor reading is a 4-channel vector (X, Y, Z, Height). The library
//! scores every reading against the index-aligned reference frame, segments
//! the stream into repetitions, and at the end of a session compares the
//! delta patterns of the whole recording with the reference.
//!
//! # Features
//!
//! - **Frame scoring**: direction, path shape (DTW), height, posture and amplitude
//! - **Repetition tracking**: pause detection and automatic repetition boundaries
//! - **Delta comparison**: per-axis mean difference and cosine similarity of movement patterns
//! - **Diagnostics**: timestamped deviation events and a qualitative rating
//! - **Concurrent sessions**: a registry of independent sessions keyed by id
//!
//! # Quick Start
//!
//! ```
//! use movement_scoring::{Observation, ReferenceTrajectory, RepetitionSession, ScoringConfig, Vector4};
//!
//! let reference: Vec<Vector4> = (0..10)
//!     .map(|i| Vector4::new(0.1 * i as f64, 0.0, 1.0, 0.0))
//!     .collect();
//!
//! let mut session = RepetitionSession::new(ScoringConfig::default());
//! session.start(ReferenceTrajectory::new(reference.clone())?)?;
//!
//! for frame in &reference {
//!     if let Observation::Scored(result) = session.observe(*frame)? {
//!         assert!(result.score > 0.0);
//!     }
//! }
//!
//! let summary = session.end()?;
//! assert!(summary.final_score.is_some());
//! println!("{summary}");
//! # Ok::<(), movement_scoring::ScoringError>(())
//! ```
//!
//! # Cargo Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `serde` | yes | `Serialize`/`Deserialize` on public types, the [`wire`] module |
//! | `csv` | yes | the [`store`] module (CSV trajectories and recordings) |
//! | `cli` | no | the `movement-score` binary |

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod cache;
pub mod config;
pub mod delta;
pub mod diagnostics;
pub mod error;
pub mod math;
pub mod rating;
pub mod registry;
pub mod scorer;
pub mod session;
#[cfg(feature = "csv")]
pub mod store;
pub mod summary;
#[cfg(feature = "serde")]
pub mod wire;

// Re-exports for convenient access
pub use cache::{CacheStats, DeltaCache, DeltaSource};
pub use config::ScoringConfig;
pub use delta::{
    compare_deltas, compute_deltas, compute_vector_deltas, truncate_to_shorter, DeltaComparison,
    DeltaSequence,
};
pub use diagnostics::{
    diagnose_deviations, DeviationEvent, DeviationReport, NO_DEVIATIONS, REPORT_HEADING,
};
pub use error::{Result, ScoringError};
pub use math::dtw::dtw_distance;
pub use math::vector::{
    cosine_similarity, movement_amplitude, normalize, vertical_angle, Channel, Similarity, Vector4,
};
pub use rating::{rate_performance, session_score, Rating, RatingThresholds};
pub use registry::SessionRegistry;
pub use scorer::{score_frame, FrameScoreResult, ScoreWeights};
pub use session::{Observation, Phase, ReferenceTrajectory, RepetitionSession, RepetitionSummary};
pub use summary::{summarize, SessionSummary};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of channels in a sensor reading.
pub const CHANNELS: usize = 4;
