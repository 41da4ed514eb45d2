//! Position paired with a facing direction
//!
//! The atomic unit of motion math: every sprite, limb anchor and bullet trace
//! is a `Heading` being projected, rotated or measured against another.

use std::ops::AddAssign;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{angle_between, angle_toward, rotate_step};

/// A 2D position plus a facing angle in degrees.
///
/// Facing is stored in degrees and not wrap-normalized; math that needs
/// radians converts on the way in. A copy is an independent value - clone
/// freely for speculative moves.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Heading {
    /// World-space position
    pub position: Vec2,
    /// Facing angle in degrees (any range)
    pub facing: f32,
}

impl Heading {
    pub fn new(x: f32, y: f32, facing: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            facing,
        }
    }

    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            facing: 0.0,
        }
    }

    /// Facing angle in radians.
    #[inline]
    pub fn facing_radians(&self) -> f32 {
        self.facing.to_radians()
    }

    /// Advance the position by `distance` along the current facing.
    ///
    /// The step `(0, distance)` is rotated into the facing basis and added to
    /// the position. Negative distances project backward.
    pub fn project(&mut self, distance: f32) {
        let step = rotate_step(Vec2::new(0.0, distance), self.facing_radians());
        self.translate(step);
    }

    /// Add an offset to the position in place.
    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// Turn to face a target point, measured as `self - target`.
    pub fn face_target(&mut self, target: Vec2) {
        self.facing = angle_between(self.position, target);
    }

    /// Turn to face a target point, measured as `target - self`.
    ///
    /// The argument-order twin of [`face_target`](Self::face_target); the two
    /// produce facings 180 degrees apart and callers rely on each.
    pub fn face_toward(&mut self, target: Vec2) {
        self.facing = angle_toward(self.position, target);
    }

    /// Euclidean distance to a point.
    pub fn distance_to(&self, point: Vec2) -> f32 {
        self.position.distance(point)
    }

    /// Euclidean distance to another heading's position.
    pub fn distance_to_vector(&self, other: &Heading) -> f32 {
        self.distance_to(other.position)
    }

    /// Turn around: adds 180 degrees to the facing.
    pub fn flip(&mut self) {
        self.facing += 180.0;
    }
}

/// Coordinate sum with another heading; the facing is left unchanged.
impl AddAssign<Heading> for Heading {
    fn add_assign(&mut self, rhs: Heading) {
        self.position += rhs.position;
    }
}
