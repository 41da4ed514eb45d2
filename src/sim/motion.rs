//! Constrained movement and rotation
//!
//! The heart of the simulation: whether a sprite may move or turn this tick
//! given the registry's movement-blocking subset. Collision tests run against
//! polygons as placed by the *previous* per-tick update (the one-tick lag);
//! mass decides who yields. Rotation is never blocked, only accompanied by a
//! positional separation.

use glam::Vec2;

use super::heading::Heading;
use super::registry::SpriteRegistry;
use super::sprite::{MoveDirection, MovementKind, SharedPolygon, SpriteId};

/// Obstacle snapshot taken before a constraint scan mutates anything.
struct Candidate {
    id: SpriteId,
    mass: f32,
    polygon: SharedPolygon,
}

impl SpriteRegistry {
    /// Candidates from the movement-blocking subset, minus self, the excluded
    /// set, and anything without a movement polygon.
    fn movement_candidates(&self, id: SpriteId, excluded: &[SpriteId]) -> Vec<Candidate> {
        self.movement_blocking()
            .iter()
            .copied()
            .filter(|&cand| cand != id && !excluded.contains(&cand))
            .filter_map(|cand| {
                let col = self.get(cand)?.collidable.as_ref()?;
                Some(Candidate {
                    id: cand,
                    mass: col.mass,
                    polygon: col.movement.clone()?,
                })
            })
            .collect()
    }

    /// Try to move a sprite to `(new_x, new_y)`, constrained by obstacles.
    ///
    /// Without a movement polygon the move is unconditional. Otherwise every
    /// movement-blocking candidate is tested at its current polygon placement;
    /// on a hit the lighter party separates:
    ///
    /// - lighter than the obstacle, or the obstacle is massless: this sprite
    ///   is nudged one unit off the hit point and both axes are suppressed;
    /// - at least as heavy as a massive obstacle: the obstacle is pushed one
    ///   unit back and this sprite keeps moving through.
    ///
    /// The axis suppression flags are per branch; the surviving axes are
    /// applied independently at the end. Returns the first obstacle hit.
    pub fn move_constrained(
        &mut self,
        id: SpriteId,
        new_x: f32,
        new_y: f32,
        excluded: &[SpriteId],
    ) -> Option<SpriteId> {
        let (self_mass, self_poly) = match self.get(id) {
            Some(sprite) => match &sprite.collidable {
                Some(col) => (col.mass, col.movement.clone()),
                None => (0.0, None),
            },
            None => return None,
        };

        let Some(self_poly) = self_poly else {
            if let Some(sprite) = self.get_mut(id) {
                sprite.heading.position = Vec2::new(new_x, new_y);
            }
            return None;
        };

        let mut should_move_x = true;
        let mut should_move_y = true;
        let mut collides_with = None;

        for cand in self.movement_candidates(id, excluded) {
            let point = cand.polygon.borrow().collides_with(&self_poly.borrow());
            let Some(point) = point else { continue };
            if collides_with.is_none() {
                collides_with = Some(cand.id);
            }

            if self_mass < cand.mass || cand.mass == 0.0 {
                self.nudge_from_point(id, &self_poly, point);
                should_move_y = false;
                should_move_x = false;
            } else if self_mass >= cand.mass && cand.mass != 0.0 {
                self.push_sprite(id, cand.id);
            } else {
                should_move_y = false;
                should_move_x = false;
            }
        }

        if let Some(sprite) = self.get_mut(id) {
            if should_move_y {
                sprite.heading.position.y = new_y;
            }
            if should_move_x {
                sprite.heading.position.x = new_x;
            }
        }
        collides_with
    }

    /// Turn a sprite to `facing` (degrees), separating from obstacles.
    ///
    /// Setting the current facing is a complete no-op. A speculative clone of
    /// the movement polygon is rotated and tested against the subset; lighter
    /// sprites take the separation nudge. Heavier sprites take no corrective
    /// action here - unlike [`move_constrained`](Self::move_constrained) the
    /// push is never invoked during rotation. The facing is then
    /// applied unconditionally: rotation is never blocked.
    pub fn rotate_constrained(&mut self, id: SpriteId, facing: f32, excluded: &[SpriteId]) {
        let (current, self_mass, self_poly) = match self.get(id) {
            Some(sprite) => (
                sprite.heading.facing,
                sprite.collidable.as_ref().map_or(0.0, |c| c.mass),
                sprite.collidable.as_ref().and_then(|c| c.movement.clone()),
            ),
            None => return,
        };
        if facing == current {
            return;
        }

        if let Some(self_poly) = &self_poly {
            let mut cloned = self_poly.borrow().clone();
            cloned.set_facing(facing);

            for cand in self.movement_candidates(id, excluded) {
                let point = cloned.collides_with(&cand.polygon.borrow());
                if let Some(point) = point
                    && (self_mass < cand.mass || cand.mass == 0.0)
                {
                    self.nudge_from_point(id, self_poly, point);
                }
            }
        }

        if let Some(sprite) = self.get_mut(id) {
            sprite.heading.facing = facing;
        }
    }

    /// Move a sprite one unit away from a collision point.
    ///
    /// A heading anchored at the hit point is faced toward the center of this
    /// sprite's movement bounds; the sprite briefly adopts that direction,
    /// projects forward by exactly one unit, and gets its facing back. The
    /// polygons catch up at the next per-tick update.
    fn nudge_from_point(&mut self, id: SpriteId, movement: &SharedPolygon, point: Vec2) {
        let center = movement.borrow().bounds().center();
        let mut v = Heading::from_position(point);
        v.face_target(center);

        if let Some(sprite) = self.get_mut(id) {
            let last = sprite.heading.facing;
            sprite.heading.facing = v.facing;
            sprite.heading.project(1.0);
            sprite.heading.facing = last;
        }
    }

    /// Shove `target` one unit directly away from `pusher`.
    fn push_sprite(&mut self, pusher: SpriteId, target: SpriteId) {
        let Some(pusher_pos) = self.get(pusher).map(|s| s.heading.position) else {
            return;
        };
        if let Some(sprite) = self.get_mut(target) {
            let last = sprite.heading.facing;
            sprite.heading.face_target(pusher_pos);
            sprite.heading.project(-1.0);
            sprite.heading.facing = last;
        }
    }

    /// Apply one tick of directional input to a sprite.
    ///
    /// The per-tick increment is `move_speed / tick_rate` - normalized by the
    /// last measured tick rate, not by this tick's true elapsed time.
    pub fn move_directed(
        &mut self,
        id: SpriteId,
        direction: MoveDirection,
        kind: MovementKind,
        tick_rate: u32,
    ) -> Option<SpriteId> {
        if direction.is_empty() {
            return None;
        }

        match kind {
            MovementKind::Global => {
                self.move_global(id, direction, tick_rate);
                None
            }
            MovementKind::Local => self.move_local(id, direction, tick_rate, &[]),
        }
    }

    /// Screen-axis movement: each set flag issues an independent constrained
    /// move, so a diagonal can be blocked on one axis and succeed on the
    /// other.
    fn move_global(&mut self, id: SpriteId, direction: MoveDirection, tick_rate: u32) {
        let Some(increment) = self.move_increment(id, tick_rate) else {
            return;
        };

        if direction.contains(MoveDirection::FORWARD) {
            if let Some(pos) = self.position(id) {
                self.move_constrained(id, pos.x, pos.y - increment, &[]);
            }
        }
        if direction.contains(MoveDirection::BACKWARD) {
            if let Some(pos) = self.position(id) {
                self.move_constrained(id, pos.x, pos.y + increment, &[]);
            }
        }
        if direction.contains(MoveDirection::LEFT) {
            if let Some(pos) = self.position(id) {
                self.move_constrained(id, pos.x - increment, pos.y, &[]);
            }
        }
        if direction.contains(MoveDirection::RIGHT) {
            if let Some(pos) = self.position(id) {
                self.move_constrained(id, pos.x + increment, pos.y, &[]);
            }
        }
    }

    /// Heading-relative movement: forward/backward project along the current
    /// facing. Left/right are accepted but have no effect in this engine.
    pub fn move_local(
        &mut self,
        id: SpriteId,
        direction: MoveDirection,
        tick_rate: u32,
        excluded: &[SpriteId],
    ) -> Option<SpriteId> {
        let increment = self.move_increment(id, tick_rate)?;
        let mut vector = self.get(id)?.heading;

        if direction.contains(MoveDirection::FORWARD) {
            vector.project(increment);
            return self.move_constrained(id, vector.position.x, vector.position.y, excluded);
        }
        if direction.contains(MoveDirection::BACKWARD) {
            vector.project(-increment);
            return self.move_constrained(id, vector.position.x, vector.position.y, excluded);
        }

        None
    }

    fn move_increment(&self, id: SpriteId, tick_rate: u32) -> Option<f32> {
        let col = self.get(id)?.collidable.as_ref()?;
        Some(col.move_speed / tick_rate as f32)
    }

    fn position(&self, id: SpriteId) -> Option<Vec2> {
        self.get(id).map(|s| s.heading.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::polygon::Polygon;
    use crate::sim::sprite::{Collidable, Sprite, SpriteKind, shared};

    const EPS: f32 = 1e-3;

    /// Collidable sprite with a 4x4 square movement polygon centered on it.
    fn square_sprite(x: f32, y: f32, mass: f32) -> Sprite {
        let mut col = Collidable::new(mass, 50.0);
        col.movement = Some(shared(Polygon::from_rect(0.0, 0.0, 4.0, 4.0)));
        Sprite::new(SpriteKind::Zombie, Heading::new(x, y, 0.0)).with_collidable(col)
    }

    fn anchored_registry(sprites: Vec<Sprite>) -> (SpriteRegistry, Vec<SpriteId>) {
        let mut reg = SpriteRegistry::new().with_diagnostic_naming(false);
        let ids = sprites.into_iter().map(|s| reg.add(s)).collect();
        reg.update_all();
        (reg, ids)
    }

    #[test]
    fn test_move_without_polygon_is_unconditional() {
        let mut reg = SpriteRegistry::new().with_diagnostic_naming(false);
        let id = reg.add(
            Sprite::new(SpriteKind::Player, Heading::new(0.0, 0.0, 0.0))
                .with_collidable(Collidable::new(10.0, 50.0)),
        );

        let hit = reg.move_constrained(id, 42.0, -7.0, &[]);
        assert_eq!(hit, None);
        assert_eq!(reg.get(id).unwrap().heading.position, Vec2::new(42.0, -7.0));
    }

    #[test]
    fn test_massless_obstacle_suppresses_and_nudges_mover() {
        // Overlapping squares: the mover's vertex (2,2) sits inside the
        // blocker's polygon.
        let (mut reg, ids) =
            anchored_registry(vec![square_sprite(0.0, 0.0, 10.0), square_sprite(1.0, 1.0, 0.0)]);
        let (mover, blocker) = (ids[0], ids[1]);

        let hit = reg.move_constrained(mover, 5.0, 5.0, &[]);
        assert_eq!(hit, Some(blocker));

        // Requested axes suppressed; the mover only took the 1-unit nudge.
        let pos = reg.get(mover).unwrap().heading.position;
        assert_ne!(pos, Vec2::new(5.0, 5.0));
        assert!((pos.length() - 1.0).abs() < EPS);
        // Nudge points away from the hit corner (2,2), toward the bounds
        // center side.
        assert!(pos.x < 0.0 && pos.y < 0.0);
        // Facing restored.
        assert_eq!(reg.get(mover).unwrap().heading.facing, 0.0);
        // The massless blocker itself is never displaced.
        assert_eq!(reg.get(blocker).unwrap().heading.position, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_heavier_mover_pushes_and_keeps_moving() {
        let (mut reg, ids) =
            anchored_registry(vec![square_sprite(0.0, 0.0, 10.0), square_sprite(1.0, 1.0, 5.0)]);
        let (mover, pushed) = (ids[0], ids[1]);

        let hit = reg.move_constrained(mover, 0.5, 0.25, &[]);
        assert_eq!(hit, Some(pushed));

        // No axis suppression on the push branch: the move lands.
        assert_eq!(reg.get(mover).unwrap().heading.position, Vec2::new(0.5, 0.25));

        // The lighter sprite was shoved one unit away from the mover.
        let pushed_pos = reg.get(pushed).unwrap().heading.position;
        let displacement = pushed_pos - Vec2::new(1.0, 1.0);
        assert!((displacement.length() - 1.0).abs() < EPS);
        assert!(pushed_pos.x > 1.0 && pushed_pos.y > 1.0);
        assert_eq!(reg.get(pushed).unwrap().heading.facing, 0.0);
    }

    #[test]
    fn test_lighter_mover_yields() {
        let (mut reg, ids) =
            anchored_registry(vec![square_sprite(0.0, 0.0, 1.0), square_sprite(1.0, 1.0, 5.0)]);
        let (mover, blocker) = (ids[0], ids[1]);

        let hit = reg.move_constrained(mover, 5.0, 5.0, &[]);
        assert_eq!(hit, Some(blocker));
        let pos = reg.get(mover).unwrap().heading.position;
        assert_ne!(pos, Vec2::new(5.0, 5.0));
        // Heavier blocker stays put.
        assert_eq!(reg.get(blocker).unwrap().heading.position, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_excluded_sprites_are_skipped() {
        let (mut reg, ids) =
            anchored_registry(vec![square_sprite(0.0, 0.0, 1.0), square_sprite(1.0, 1.0, 5.0)]);
        let (mover, other) = (ids[0], ids[1]);

        let hit = reg.move_constrained(mover, 5.0, 5.0, &[other]);
        assert_eq!(hit, None);
        assert_eq!(reg.get(mover).unwrap().heading.position, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn test_collision_uses_current_not_prospective_placement() {
        // Far apart now; the target position would overlap, but the test runs
        // against current polygons, so the move goes through.
        let (mut reg, ids) =
            anchored_registry(vec![square_sprite(0.0, 0.0, 1.0), square_sprite(100.0, 100.0, 5.0)]);
        let mover = ids[0];

        let hit = reg.move_constrained(mover, 100.0, 100.0, &[]);
        assert_eq!(hit, None);
        assert_eq!(
            reg.get(mover).unwrap().heading.position,
            Vec2::new(100.0, 100.0)
        );
    }

    #[test]
    fn test_rotate_to_same_facing_is_noop() {
        let (mut reg, ids) =
            anchored_registry(vec![square_sprite(0.0, 0.0, 1.0), square_sprite(1.0, 1.0, 5.0)]);
        let mover = ids[0];

        // Overlapping, so any real rotation would nudge - but same facing
        // does nothing at all.
        reg.rotate_constrained(mover, 0.0, &[]);
        assert_eq!(reg.get(mover).unwrap().heading.position, Vec2::ZERO);
        assert_eq!(reg.get(mover).unwrap().heading.facing, 0.0);
    }

    #[test]
    fn test_rotation_is_never_blocked() {
        let (mut reg, ids) =
            anchored_registry(vec![square_sprite(0.0, 0.0, 1.0), square_sprite(1.0, 1.0, 5.0)]);
        let mover = ids[0];

        reg.rotate_constrained(mover, 90.0, &[]);
        let sprite = reg.get(mover).unwrap();
        assert_eq!(sprite.heading.facing, 90.0);
        // Lighter sprite separated by the nudge.
        assert!((sprite.heading.position.length() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_heavy_rotation_takes_no_corrective_action() {
        let (mut reg, ids) =
            anchored_registry(vec![square_sprite(0.0, 0.0, 10.0), square_sprite(1.0, 1.0, 5.0)]);
        let (mover, other) = (ids[0], ids[1]);

        reg.rotate_constrained(mover, 45.0, &[]);
        assert_eq!(reg.get(mover).unwrap().heading.facing, 45.0);
        // No push during rotation, no nudge for the heavier party.
        assert_eq!(reg.get(mover).unwrap().heading.position, Vec2::ZERO);
        assert_eq!(reg.get(other).unwrap().heading.position, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_rotate_without_polygon_sets_facing() {
        let mut reg = SpriteRegistry::new().with_diagnostic_naming(false);
        let id = reg.add(Sprite::new(SpriteKind::Player, Heading::new(0.0, 0.0, 0.0)));
        reg.rotate_constrained(id, 123.0, &[]);
        assert_eq!(reg.get(id).unwrap().heading.facing, 123.0);
    }

    #[test]
    fn test_move_directed_global_scales_by_tick_rate() {
        let (mut reg, ids) = anchored_registry(vec![square_sprite(0.0, 0.0, 10.0)]);
        let id = ids[0];

        // move_speed 50 at tick rate 100 -> 0.5 units per tick
        reg.move_directed(id, MoveDirection::FORWARD, MovementKind::Global, 100);
        assert_eq!(reg.get(id).unwrap().heading.position, Vec2::new(0.0, -0.5));

        reg.move_directed(
            id,
            MoveDirection::BACKWARD | MoveDirection::RIGHT,
            MovementKind::Global,
            100,
        );
        assert_eq!(reg.get(id).unwrap().heading.position, Vec2::new(0.5, 0.0));
    }

    #[test]
    fn test_move_directed_local_projects_along_facing() {
        let (mut reg, ids) = anchored_registry(vec![square_sprite(0.0, 0.0, 10.0)]);
        let id = ids[0];
        reg.get_mut(id).unwrap().heading.facing = 90.0;
        reg.update_all();

        reg.move_directed(id, MoveDirection::FORWARD, MovementKind::Local, 100);
        // Facing 90: the projection basis sends (0, d) to (0, d)
        let pos = reg.get(id).unwrap().heading.position;
        assert!(pos.x.abs() < EPS);
        assert!((pos.y - 0.5).abs() < EPS);

        // Local left/right have no effect
        reg.move_directed(id, MoveDirection::LEFT, MovementKind::Local, 100);
        assert_eq!(reg.get(id).unwrap().heading.position, pos);
    }
}
