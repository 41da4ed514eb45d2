//! Sprites and their capability facets
//!
//! A sprite is one struct carrying optional facets instead of a class
//! hierarchy: a `Collidable` facet for anything with mass and collision
//! polygons, and a `LineBody` facet for two-point sprites like contrails.
//! Registry subset membership is derived from facet presence, never from
//! runtime type checks.

use std::cell::RefCell;
use std::ops::{BitOr, BitOrAssign};
use std::rc::Rc;

use super::heading::Heading;
use super::line::Line;
use super::polygon::Polygon;

/// A polygon shared between the movement/projectile/model roles of a sprite.
///
/// A sprite that uses one shape for all three purposes aliases the same
/// instance; mutating it through one role mutates all roles.
pub type SharedPolygon = Rc<RefCell<Polygon>>;

/// Wrap a polygon for role sharing.
pub fn shared(polygon: Polygon) -> SharedPolygon {
    Rc::new(RefCell::new(polygon))
}

/// Registry handle for a sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpriteId(pub(crate) u32);

/// What a sprite is, for diagnostic naming and gameplay dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteKind {
    Player,
    Zombie,
    Vehicle,
    Blocker,
    Contrail,
}

impl SpriteKind {
    /// Name stem used by diagnostic auto-naming.
    pub fn name(&self) -> &'static str {
        match self {
            SpriteKind::Player => "Player",
            SpriteKind::Zombie => "Zombie",
            SpriteKind::Vehicle => "Vehicle",
            SpriteKind::Blocker => "Blocker",
            SpriteKind::Contrail => "Contrail",
        }
    }
}

/// Bit-combination of movement directions for one tick of input intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveDirection(u8);

impl MoveDirection {
    pub const NONE: Self = Self(0);
    pub const FORWARD: Self = Self(1);
    pub const BACKWARD: Self = Self(2);
    pub const LEFT: Self = Self(4);
    pub const RIGHT: Self = Self(8);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for MoveDirection {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for MoveDirection {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// How directional input maps onto the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementKind {
    /// Each flag is a fixed screen-axis offset (forward is always up-screen).
    Global,
    /// Forward/backward project along the sprite's current facing.
    Local,
}

/// Collidable facet: mass, speed, and up to three collision/model polygons.
#[derive(Debug, Clone, Default)]
pub struct Collidable {
    pub mass: f32,
    pub move_speed: f32,
    /// Polygon tested by the constrained-movement engine
    pub movement: Option<SharedPolygon>,
    /// Polygon tested by projectile traces
    pub projectile: Option<SharedPolygon>,
    /// Polygon handed to the renderer as the model outline
    pub model: Option<SharedPolygon>,
}

impl Collidable {
    pub fn new(mass: f32, move_speed: f32) -> Self {
        Self {
            mass,
            move_speed,
            ..Default::default()
        }
    }

    /// Re-anchor every present polygon to the sprite's heading.
    ///
    /// Positions first, then facings, matching the per-tick update order.
    /// Role-aliased polygons are anchored once effectively since both
    /// operations are absolute.
    fn reanchor(&self, heading: &Heading) {
        for poly in [&self.movement, &self.projectile, &self.model]
            .into_iter()
            .flatten()
        {
            poly.borrow_mut().move_to(heading.position);
        }
        for poly in [&self.movement, &self.projectile, &self.model]
            .into_iter()
            .flatten()
        {
            poly.borrow_mut().set_facing(heading.facing);
        }
    }
}

/// Line-shaped facet: the sprite's heading is the start, this is the end.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineBody {
    pub end: Heading,
}

impl LineBody {
    /// The segment between the owning sprite's heading and the end heading.
    pub fn line(&self, start: &Heading) -> Line {
        Line::new(start.position, self.end.position)
    }
}

/// A simulated entity: identity, heading, expiry, and optional facets.
#[derive(Debug, Clone, Default)]
pub struct Sprite {
    pub(crate) id: Option<SpriteId>,
    /// Diagnostic name, auto-assigned by the registry when left empty
    pub name: String,
    pub kind: SpriteKind,
    pub heading: Heading,
    pub expired: bool,
    /// Animation playback rate hint, read at the renderer boundary
    pub animation_speed: f32,
    /// Remaining ticks before this sprite expires, if it is short-lived
    pub ttl_ticks: Option<u32>,
    pub collidable: Option<Collidable>,
    pub line: Option<LineBody>,
}

impl Default for SpriteKind {
    fn default() -> Self {
        SpriteKind::Blocker
    }
}

impl Sprite {
    pub fn new(kind: SpriteKind, heading: Heading) -> Self {
        Self {
            kind,
            heading,
            ..Default::default()
        }
    }

    pub fn with_collidable(mut self, collidable: Collidable) -> Self {
        self.collidable = Some(collidable);
        self
    }

    pub fn with_line(mut self, line: LineBody) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_ttl(mut self, ticks: u32) -> Self {
        self.ttl_ticks = Some(ticks);
        self
    }

    pub fn with_animation_speed(mut self, speed: f32) -> Self {
        self.animation_speed = speed;
        self
    }

    /// Registry handle, present once the sprite has been added.
    pub fn id(&self) -> Option<SpriteId> {
        self.id
    }

    /// Mark this sprite for the end-of-tick sweep.
    pub fn expire(&mut self) {
        self.expired = true;
    }

    /// Per-tick update: re-anchor polygons to the current heading and tick
    /// down the TTL.
    ///
    /// Polygons only follow the heading here, once per tick. A move made
    /// during the same tick is therefore tested against polygons still at
    /// last tick's placement - an intentional one-tick lag the collision
    /// tuning depends on.
    pub fn update(&mut self) {
        if let Some(col) = &self.collidable {
            col.reanchor(&self.heading);
        }

        if let Some(ttl) = &mut self.ttl_ticks {
            *ttl = ttl.saturating_sub(1);
            if *ttl == 0 {
                self.expired = true;
            }
        }
    }
}
