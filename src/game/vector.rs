//! Three-component vector used for positions and headings

use std::fmt;
use std::ops::{Add, AddAssign, Mul};

use serde::{Deserialize, Serialize};

/// Position or direction in arena space.
///
/// Serialized as a `[x, y, z]` array. Positions are compared exactly, so
/// everything that moves players keeps them on the integer grid.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Heading every player gets on spawn
    pub const FORWARD: Self = Self::new(0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Rotate 90 degrees counter-clockwise about the vertical (y) axis
    pub fn rotated_left(self) -> Self {
        Self::new(-self.z, self.y, self.x)
    }

    /// Rotate 90 degrees clockwise about the vertical (y) axis
    pub fn rotated_right(self) -> Self {
        Self::new(self.z, self.y, -self.x)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vector3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vector3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Mul<f32> for Vector3 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl From<[f32; 3]> for Vector3 {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<Vector3> for [f32; 3] {
    fn from(v: Vector3) -> Self {
        [v.x, v.y, v.z]
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotations_are_inverse() {
        let headings = [
            Vector3::FORWARD,
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, -1.0),
            Vector3::new(-1.0, 0.0, 0.0),
            Vector3::new(2.0, 3.0, -5.0),
        ];

        for heading in headings {
            assert_eq!(heading.rotated_left().rotated_right(), heading);
            assert_eq!(heading.rotated_right().rotated_left(), heading);
        }
    }

    #[test]
    fn test_four_left_turns_is_identity() {
        let start = Vector3::new(1.0, 0.0, 0.0);
        let turned = start
            .rotated_left()
            .rotated_left()
            .rotated_left()
            .rotated_left();
        assert_eq!(turned, start);
    }

    #[test]
    fn test_serializes_as_array() {
        let json = serde_json::to_string(&Vector3::new(1.0, 0.0, -2.5)).unwrap();
        assert_eq!(json, "[1.0,0.0,-2.5]");

        let back: Vector3 = serde_json::from_str("[3.0, 4.0, 5.0]").unwrap();
        assert_eq!(back, Vector3::new(3.0, 4.0, 5.0));
    }

    #[test]
    fn test_non_finite_detection() {
        assert!(Vector3::FORWARD.is_finite());
        assert!(!Vector3::new(f32::NAN, 0.0, 0.0).is_finite());
        assert!(!Vector3::new(0.0, 0.0, f32::INFINITY).is_finite());
    }
}
