//! Sensor vector type and the vector primitives used by the scorer.
//!
//! Spatial math is done on `nalgebra` fixed-size vectors. Degenerate inputs
//! (zero-norm readings) never panic or error: [`normalize`] returns its input
//! unchanged and [`cosine_similarity`] reports [`Similarity::Undefined`].

use std::fmt;
use std::ops::Index;

use nalgebra::{SVector, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The fixed channel set of a sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Channel {
    /// Acceleration/position along X.
    X,
    /// Acceleration/position along Y.
    Y,
    /// Acceleration/position along Z.
    Z,
    /// Altitude/height.
    Height,
}

impl Channel {
    /// All channels in storage order.
    pub const ALL: [Self; 4] = [Self::X, Self::Y, Self::Z, Self::Height];

    /// The three spatial channels.
    pub const SPATIAL: [Self; 3] = [Self::X, Self::Y, Self::Z];

    /// Column index of the channel.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
            Self::Height => 3,
        }
    }

    /// Channel stored at column `index`, if any.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::X),
            1 => Some(Self::Y),
            2 => Some(Self::Z),
            3 => Some(Self::Height),
            _ => None,
        }
    }

    /// Display name used in reports and CSV headers.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
            Self::Height => "Height",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One instantaneous sensor reading: three spatial channels plus height.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vector4 {
    /// X channel.
    pub x: f64,
    /// Y channel.
    pub y: f64,
    /// Z channel.
    pub z: f64,
    /// Height channel.
    pub height: f64,
}

impl Vector4 {
    /// Create a new reading.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64, height: f64) -> Self {
        Self { x, y, z, height }
    }

    /// The `(X, Y, Z)` projection.
    #[must_use]
    pub fn spatial(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Channels as an array in storage order.
    #[must_use]
    pub const fn to_array(self) -> [f64; 4] {
        [self.x, self.y, self.z, self.height]
    }

    /// Whether every channel is within `tolerance` of `other`.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        self.to_array()
            .iter()
            .zip(other.to_array().iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

impl From<[f64; 4]> for Vector4 {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<Vector4> for nalgebra::Vector4<f64> {
    fn from(v: Vector4) -> Self {
        Self::new(v.x, v.y, v.z, v.height)
    }
}

impl Index<Channel> for Vector4 {
    type Output = f64;

    fn index(&self, channel: Channel) -> &f64 {
        match channel {
            Channel::X => &self.x,
            Channel::Y => &self.y,
            Channel::Z => &self.z,
            Channel::Height => &self.height,
        }
    }
}

/// Cosine similarity that keeps track of where an undefined value came from.
///
/// A zero-norm operand has no direction, so the similarity is
/// [`Similarity::Undefined`]. Numeric consumers see it as NaN through
/// [`Similarity::value`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Similarity {
    /// A finite similarity in (approximately) `[-1, 1]`.
    Defined(f64),
    /// At least one operand had zero (or non-finite) norm.
    Undefined,
}

impl Similarity {
    /// Build a similarity from a dot product and the two operand norms.
    #[must_use]
    pub fn from_parts(dot: f64, norm_a: f64, norm_b: f64) -> Self {
        let denom = norm_a * norm_b;
        if denom == 0.0 || !denom.is_finite() || !dot.is_finite() {
            Self::Undefined
        } else {
            Self::Defined(dot / denom)
        }
    }

    /// Numeric value; NaN when undefined.
    #[must_use]
    pub const fn value(self) -> f64 {
        match self {
            Self::Defined(v) => v,
            Self::Undefined => f64::NAN,
        }
    }

    /// Whether the similarity is defined.
    #[must_use]
    pub const fn is_defined(self) -> bool {
        matches!(self, Self::Defined(_))
    }
}

impl fmt::Display for Similarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defined(v) => write!(f, "{v:.4}"),
            Self::Undefined => f.write_str("undefined"),
        }
    }
}

/// Normalize a vector to unit length; a zero vector is returned unchanged.
#[must_use]
pub fn normalize<const D: usize>(v: &SVector<f64, D>) -> SVector<f64, D> {
    let norm = v.norm();
    if norm == 0.0 {
        *v
    } else {
        v / norm
    }
}

/// Cosine similarity `dot(a, b) / (|a| |b|)`.
#[must_use]
pub fn cosine_similarity<const D: usize>(a: &SVector<f64, D>, b: &SVector<f64, D>) -> Similarity {
    Similarity::from_parts(a.dot(b), a.norm(), b.norm())
}

/// Angle in degrees between the spatial part of `v` and the up axis `(0, 0, 1)`.
///
/// A zero spatial vector normalizes to itself, giving a dot product of zero
/// and therefore 90 degrees.
#[must_use]
pub fn vertical_angle(v: &Vector4) -> f64 {
    let unit = normalize(&v.spatial());
    unit.dot(&Vector3::z()).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Straight-line spatial distance between the first and last point of `path`.
///
/// Zero for paths with fewer than two points.
#[must_use]
pub fn movement_amplitude(path: &[Vector4]) -> f64 {
    match (path.first(), path.last()) {
        (Some(first), Some(last)) if path.len() >= 2 => (last.spatial() - first.spatial()).norm(),
        _ => 0.0,
    }
}
