//! Tick-driven simulation module
//!
//! All engine logic lives here, independent of any window or drawing layer:
//! - Headings and transformable polygon geometry
//! - The sprite registry with its movement/projectile-blocking subsets
//! - The constrained movement/rotation engine
//! - The fixed-tick scheduler that measures the realized tick rate
//!
//! The simulation is single-threaded and frame-synchronous: everything
//! mutates inside one tick callback, and the registry is the only shared
//! state, owned by the session that drives it.

pub mod heading;
pub mod line;
pub mod motion;
pub mod polygon;
pub mod registry;
pub mod session;
pub mod sprite;

pub use heading::Heading;
pub use line::Line;
pub use polygon::{Aabb, GeometryError, Polygon};
pub use registry::SpriteRegistry;
pub use session::{Session, TickContext, TickScheduler};
pub use sprite::{
    Collidable, LineBody, MoveDirection, MovementKind, SharedPolygon, Sprite, SpriteId, SpriteKind,
    shared,
};
