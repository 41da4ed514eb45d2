//! Shamble - top-down zombie survival
//!
//! Core modules:
//! - `sim`: Tick-driven simulation (headings, polygon geometry, sprite
//!   registry, constrained movement, scheduler)
//! - `input`: Key command bindings with per-key fire intervals
//! - `game`: The survival session wiring it all together

pub mod game;
pub mod input;
pub mod sim;

pub use game::SurvivalSession;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Tick rate assumed before the first measured window completes
    pub const DEFAULT_TICK_RATE: u32 = 60;
    /// Timer interval the demo loop paces itself at (milliseconds)
    pub const TIMER_INTERVAL_MS: u64 = 10;

    /// Map dimensions
    pub const MAP_WIDTH: f32 = 1000.0;
    pub const MAP_HEIGHT: f32 = 1000.0;
    /// Thickness of the boundary blockers fencing the map
    pub const BOUNDARY_THICKNESS: f32 = 20.0;

    /// Biped proportions (shared by players and zombies)
    pub const SHOULDER_WIDTH: f32 = 30.0;
    pub const ARM_LENGTH: f32 = 27.0;

    /// Hitscan bullet range and contrail lifetime
    pub const BULLET_RANGE: f32 = 1000.0;
    pub const CONTRAIL_TTL_TICKS: u32 = 100;

    /// Zombie population cap
    pub const MAX_ZOMBIES: usize = 30;
}

/// Angle, in degrees, from `from` to `to` using the difference `from - to`.
///
/// Screen-space convention: y grows downward, hence the final negation.
#[inline]
pub fn angle_between(from: Vec2, to: Vec2) -> f32 {
    let dx = from.x - to.x;
    let dy = from.y - to.y;
    -dy.atan2(dx).to_degrees()
}

/// Angle, in degrees, from `from` to `to` using the difference `to - from`.
///
/// The argument-order twin of [`angle_between`]; callers rely on each
/// separately, so both are kept.
#[inline]
pub fn angle_toward(from: Vec2, to: Vec2) -> f32 {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    -dy.atan2(dx).to_degrees()
}

/// Rotate a step vector by an angle in radians.
///
/// `rx = x*sin - y*cos, ry = y*sin + x*cos`: the projection basis every
/// heading uses, applied to the step `(0, distance)`.
#[inline]
pub fn rotate_step(v: Vec2, radians: f32) -> Vec2 {
    let (s, c) = radians.sin_cos();
    Vec2::new(v.x * s - v.y * c, v.y * s + v.x * c)
}
