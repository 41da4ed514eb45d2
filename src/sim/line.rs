//! Start/end point pairs for line-shaped sprites and limb figures.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A line segment between two world-space points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: Vec2,
    pub end: Vec2,
}

impl Line {
    pub fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    pub fn from_coords(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::new(Vec2::new(x1, y1), Vec2::new(x2, y2))
    }

    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }
}
