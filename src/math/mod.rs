//! Mathematical primitives for movement scoring.
//!
//! This module provides:
//! - [`vector`]: the [`Vector4`] reading, normalization, cosine similarity,
//!   vertical angle and movement amplitude
//! - [`dtw`]: dynamic time warping over spatial-norm projections

pub mod dtw;
pub mod vector;

pub use dtw::{dtw_distance, path_dtw_distance, project_path};
pub use vector::{
    cosine_similarity, movement_amplitude, normalize, vertical_angle, Channel, Similarity, Vector4,
};
