//! Transformable polygon geometry
//!
//! An ordered, closed vertex sequence in world space plus a pivot point and a
//! cached facing angle. Used both as a collision shape and as a renderable
//! model outline. Rotation is incremental: the vertices always reflect the
//! cumulative transforms applied since construction, there is no stored base
//! orientation to recompute from.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::heading::Heading;

/// Geometry construction failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    /// A regular polygon needs at least 3 sides.
    TooFewSides { sides: usize },
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::TooFewSides { sides } => {
                write!(f, "regular polygon needs at least 3 sides, got {sides}")
            }
        }
    }
}

impl std::error::Error for GeometryError {}

/// Axis-aligned box covering a vertex set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Center point of the box.
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) / 2.0
    }
}

/// A closed polygon with a transform pivot and a cached facing angle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Vec2>,
    pivot: Vec2,
    /// Facing in degrees, accumulated across rotations
    facing: f32,
}

impl Polygon {
    /// Build from a vertex list; the pivot is centered at the vertex centroid.
    pub fn new(points: Vec<Vec2>) -> Self {
        let pivot = centroid(&points);
        Self {
            points,
            pivot,
            facing: 0.0,
        }
    }

    /// Build from a vertex list with an explicit transform pivot.
    pub fn with_pivot(points: Vec<Vec2>, pivot: Vec2) -> Self {
        Self {
            points,
            pivot,
            facing: 0.0,
        }
    }

    /// Rectangular polygon from position and size (4 corners, clockwise).
    pub fn from_rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(vec![
            Vec2::new(x, y),
            Vec2::new(x + width, y),
            Vec2::new(x + width, y + height),
            Vec2::new(x, y + height),
        ])
    }

    /// Regular polygon approximating a circle of the given radius.
    ///
    /// Steps a heading around `360/sides` degree increments, projecting by
    /// the radius for each vertex. Fails for fewer than 3 sides.
    pub fn circle(sides: usize, radius: f32) -> Result<Self, GeometryError> {
        if sides < 3 {
            return Err(GeometryError::TooFewSides { sides });
        }

        let anchor = Heading::new(radius, radius, 0.0);
        let points = (0..sides)
            .map(|i| {
                let mut v = anchor;
                v.facing = i as f32 * 360.0 / sides as f32;
                v.project(radius);
                v.position
            })
            .collect();

        Ok(Self::new(points))
    }

    /// Current vertex sequence, in insertion order.
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// The point transforms are applied around.
    pub fn pivot(&self) -> Vec2 {
        self.pivot
    }

    /// Cached facing in degrees.
    pub fn facing(&self) -> f32 {
        self.facing
    }

    /// Axis-aligned box that just contains all current vertices.
    pub fn bounds(&self) -> Aabb {
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for p in &self.points {
            min = min.min(*p);
            max = max.max(*p);
        }
        Aabb { min, max }
    }

    /// Even-odd point-in-polygon test against the current vertices.
    pub fn contains_point(&self, point: Vec2) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }

        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[j];
            if (a.y > point.y) != (b.y > point.y)
                && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// First vertex of `other` contained by this polygon, if any.
    ///
    /// Vertex-sampled: two polygons that overlap without either's vertices
    /// landing inside the other are not reported. Gameplay balance is tuned
    /// against this approximation, so keep it.
    pub fn collides_with(&self, other: &Polygon) -> Option<Vec2> {
        other
            .points
            .iter()
            .copied()
            .find(|p| self.contains_point(*p))
    }

    /// Rotate every vertex about the pivot by a delta in degrees.
    pub fn rotate(&mut self, delta_degrees: f32) {
        if delta_degrees != 0.0 {
            self.rotate_points(delta_degrees);
        }
        self.facing += delta_degrees;
    }

    /// Rotate to an absolute facing; setting the current value is a no-op.
    pub fn set_facing(&mut self, degrees: f32) {
        if degrees == self.facing {
            return;
        }
        self.rotate_points(degrees - self.facing);
        self.facing = degrees;
    }

    // Turns the same way an increasing heading facing projects, so a vertex
    // placed on the projection ray stays on it as the facing changes.
    fn rotate_points(&mut self, delta_degrees: f32) {
        let (s, c) = delta_degrees.to_radians().sin_cos();
        for p in &mut self.points {
            let d = *p - self.pivot;
            *p = self.pivot + Vec2::new(d.x * c + d.y * s, d.y * c - d.x * s);
        }
    }

    /// Move the pivot to an absolute point, carrying the vertices with it.
    pub fn move_to(&mut self, point: Vec2) {
        let diff = point - self.pivot;
        self.pivot = point;
        self.offset(diff.x, diff.y);
    }

    /// Shift the vertices only; the pivot stays where it is.
    ///
    /// Used when the shape moves while a separate transform anchor is managed
    /// by the caller.
    pub fn offset(&mut self, dx: f32, dy: f32) {
        let delta = Vec2::new(dx, dy);
        for p in &mut self.points {
            *p += delta;
        }
    }
}

fn centroid(points: &[Vec2]) -> Vec2 {
    if points.is_empty() {
        return Vec2::ZERO;
    }
    points.iter().copied().sum::<Vec2>() / points.len() as f32
}
