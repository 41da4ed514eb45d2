//! The survival session
//!
//! Wires the simulation together: a fenced map, a heavy abandoned vehicle,
//! the player, and a growing zombie horde that converges on the player every
//! tick. Shots are hitscan traces against the projectile-blocking subset,
//! leaving short-lived contrail sprites behind.

use std::error::Error;
use std::fmt;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::{
    ARM_LENGTH, BOUNDARY_THICKNESS, BULLET_RANGE, CONTRAIL_TTL_TICKS, MAP_HEIGHT, MAP_WIDTH,
    MAX_ZOMBIES, SHOULDER_WIDTH, TIMER_INTERVAL_MS,
};
use crate::input::{InputError, KeyCode, KeyCommandTable};
use crate::sim::{
    Collidable, GeometryError, Heading, Line, LineBody, MoveDirection, MovementKind, Polygon,
    Session, SharedPolygon, Sprite, SpriteId, SpriteKind, SpriteRegistry, TickContext, shared,
};
use crate::angle_between;

/// Session construction failure.
#[derive(Debug)]
pub enum SessionError {
    Geometry(GeometryError),
    Input(InputError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Geometry(e) => write!(f, "geometry: {e}"),
            SessionError::Input(e) => write!(f, "input: {e}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SessionError::Geometry(e) => Some(e),
            SessionError::Input(e) => Some(e),
        }
    }
}

impl From<GeometryError> for SessionError {
    fn from(e: GeometryError) -> Self {
        SessionError::Geometry(e)
    }
}

impl From<InputError> for SessionError {
    fn from(e: InputError) -> Self {
        SessionError::Input(e)
    }
}

/// Player commands produced by the key binding table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Forward,
    Backward,
    Left,
    Right,
    Fire,
}

/// Limb lines for a biped: shoulder bar, left arm, right arm.
///
/// Shoulders sit half a shoulder-width to either side of the heading,
/// perpendicular to the facing; each hand is an arm's length forward from its
/// shoulder. The right hand doubles as the muzzle.
pub fn biped_figure(heading: &Heading) -> [Line; 3] {
    let mut left_shoulder = *heading;
    left_shoulder.facing -= 90.0;
    left_shoulder.project(SHOULDER_WIDTH / 2.0);

    let mut right_shoulder = *heading;
    right_shoulder.facing += 90.0;
    right_shoulder.project(SHOULDER_WIDTH / 2.0);

    let mut left_hand = Heading::from_position(left_shoulder.position);
    left_hand.facing = heading.facing;
    left_hand.project(ARM_LENGTH);

    let mut right_hand = Heading::from_position(right_shoulder.position);
    right_hand.facing = heading.facing;
    right_hand.project(ARM_LENGTH);

    [
        Line::new(left_shoulder.position, right_shoulder.position),
        Line::new(left_shoulder.position, left_hand.position),
        Line::new(right_shoulder.position, right_hand.position),
    ]
}

/// Fence a `width` x `height` area with four massless blocker sprites.
///
/// Each wall shares one rectangle across its movement and projectile roles,
/// so it stops walkers and bullets alike but is never displaced by either.
pub fn rectangular_enclosure(
    registry: &mut SpriteRegistry,
    width: f32,
    height: f32,
    thickness: f32,
) {
    let walls = [
        (0.0, 0.0, width, thickness),
        (0.0, height - thickness, width, thickness),
        (0.0, 0.0, thickness, height),
        (width - thickness, 0.0, thickness, height),
    ];
    for (x, y, w, h) in walls {
        let poly = shared(Polygon::from_rect(x, y, w, h));
        let center = poly.borrow().pivot();
        let mut col = Collidable::new(0.0, 0.0);
        col.movement = Some(poly.clone());
        col.projectile = Some(poly);
        registry.add(
            Sprite::new(SpriteKind::Blocker, Heading::from_position(center)).with_collidable(col),
        );
    }
}

/// Top-down zombie survival on one map.
pub struct SurvivalSession {
    registry: SpriteRegistry,
    commands: KeyCommandTable<Command>,
    player: SpriteId,
    rng: Pcg32,
    /// Body shape cloned for each spawned zombie
    zombie_body: Polygon,
    clock_ms: u64,
    score: u32,
}

impl SurvivalSession {
    pub fn new(seed: u64) -> Result<Self, SessionError> {
        let mut registry = SpriteRegistry::new();

        rectangular_enclosure(&mut registry, MAP_WIDTH, MAP_HEIGHT, BOUNDARY_THICKNESS);

        // Abandoned vehicle, heavy enough to shove anything that walks into it
        let vehicle_poly = shared(Polygon::from_rect(640.0, 280.0, 80.0, 40.0));
        let vehicle_center = vehicle_poly.borrow().pivot();
        let mut vehicle_col = Collidable::new(100.0, 0.0);
        vehicle_col.movement = Some(vehicle_poly.clone());
        vehicle_col.projectile = Some(vehicle_poly.clone());
        vehicle_col.model = Some(vehicle_poly);
        registry.add(
            Sprite::new(SpriteKind::Vehicle, Heading::from_position(vehicle_center))
                .with_collidable(vehicle_col),
        );

        let body = shared(Polygon::circle(8, 15.0)?);
        let mut player_col = Collidable::new(10.0, 60.0);
        player_col.movement = Some(body.clone());
        player_col.projectile = Some(body.clone());
        player_col.model = Some(body);
        let player = registry.add(
            Sprite::new(
                SpriteKind::Player,
                Heading::new(MAP_WIDTH / 2.0, MAP_HEIGHT / 2.0, 0.0),
            )
            .with_collidable(player_col),
        );

        let mut commands = KeyCommandTable::new();
        commands.bind(KeyCode::W, Command::Forward, 0)?;
        commands.bind(KeyCode::S, Command::Backward, 0)?;
        commands.bind(KeyCode::A, Command::Left, 0)?;
        commands.bind(KeyCode::D, Command::Right, 0)?;
        commands.bind(KeyCode::SPACE, Command::Fire, 300)?;

        Ok(Self {
            registry,
            commands,
            player,
            rng: Pcg32::seed_from_u64(seed),
            zombie_body: Polygon::circle(8, 14.0)?,
            clock_ms: 0,
            score: 0,
        })
    }

    pub fn press(&mut self, key: KeyCode) {
        self.commands.press(key);
    }

    pub fn release(&mut self, key: KeyCode) {
        self.commands.release(key);
    }

    pub fn registry(&self) -> &SpriteRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SpriteRegistry {
        &mut self.registry
    }

    pub fn player_id(&self) -> SpriteId {
        self.player
    }

    /// Zombies put down so far.
    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn zombie_count(&self) -> usize {
        self.registry
            .iter()
            .filter(|s| s.kind == SpriteKind::Zombie && !s.expired)
            .count()
    }

    fn spawn_zombie(&mut self) {
        if self.zombie_count() >= MAX_ZOMBIES {
            return;
        }

        let inset = BOUNDARY_THICKNESS + 20.0;
        let along = self.rng.random_range(inset..MAP_WIDTH - inset);
        let position = match self.rng.random_range(0..4) {
            0 => Vec2::new(along, inset),
            1 => Vec2::new(along, MAP_HEIGHT - inset),
            2 => Vec2::new(inset, along),
            _ => Vec2::new(MAP_WIDTH - inset, along),
        };

        let body = shared(self.zombie_body.clone());
        let mut col = Collidable::new(5.0, 30.0);
        col.movement = Some(body.clone());
        col.projectile = Some(body.clone());
        col.model = Some(body);
        let id = self.registry.add(
            Sprite::new(SpriteKind::Zombie, Heading::from_position(position)).with_collidable(col),
        );
        log::debug!("zombie {id:?} shambles in at {position}");
    }

    /// Turn each zombie toward the player and shuffle it forward.
    fn drive_zombies(&mut self, tick_rate: u32) {
        let Some(player_pos) = self.registry.get(self.player).map(|s| s.heading.position) else {
            return;
        };

        let zombies: Vec<SpriteId> = self
            .registry
            .iter()
            .filter(|s| s.kind == SpriteKind::Zombie)
            .filter_map(|s| s.id())
            .collect();

        for id in zombies {
            let Some(pos) = self.registry.get(id).map(|s| s.heading.position) else {
                continue;
            };
            self.registry
                .rotate_constrained(id, angle_between(pos, player_pos), &[]);
            self.registry
                .move_directed(id, MoveDirection::FORWARD, MovementKind::Local, tick_rate);
        }
    }

    /// Hitscan shot from the player's right hand.
    ///
    /// Aims at the nearest zombie if there is one, otherwise straight along
    /// the player's facing. The trace steps one unit at a time against the
    /// projectile-blocking subset up to the bullet range; whatever it hits
    /// first stops it, and a hit zombie expires. A contrail sprite marks the
    /// path either way.
    fn fire_bullet(&mut self) {
        let Some(player) = self.registry.get(self.player) else {
            return;
        };
        let heading = player.heading;
        let [_, _, right_arm] = biped_figure(&heading);
        let muzzle = right_arm.end;

        let aim = self
            .registry
            .nearest(heading.position, |s| {
                s.kind == SpriteKind::Zombie && !s.expired
            })
            .and_then(|(id, _)| self.registry.get(id))
            .map(|s| s.heading.position);

        let mut trace = Heading::from_position(muzzle);
        trace.facing = match aim {
            Some(target) => angle_between(muzzle, target),
            None => heading.facing,
        };

        let candidates: Vec<(SpriteId, SharedPolygon)> = self
            .registry
            .projectile_blocking()
            .iter()
            .copied()
            .filter(|&id| id != self.player)
            .filter_map(|id| {
                let col = self.registry.get(id)?.collidable.as_ref()?;
                Some((id, col.projectile.clone()?))
            })
            .collect();

        let mut hit = None;
        'trace: for _ in 0..BULLET_RANGE as usize {
            trace.project(1.0);
            for (id, poly) in &candidates {
                if poly.borrow().contains_point(trace.position) {
                    hit = Some(*id);
                    break 'trace;
                }
            }
        }

        if let Some(id) = hit
            && self.registry.get(id).map(|s| s.kind) == Some(SpriteKind::Zombie)
        {
            if let Some(zombie) = self.registry.get_mut(id) {
                zombie.expire();
            }
            self.score += 1;
            log::info!("zombie down, score {}", self.score);
        }

        self.registry.add(
            Sprite::new(SpriteKind::Contrail, Heading::from_position(muzzle))
                .with_line(LineBody {
                    end: Heading::from_position(trace.position),
                })
                .with_ttl(CONTRAIL_TTL_TICKS)
                .with_animation_speed(1.0),
        );
    }
}

impl Session for SurvivalSession {
    fn game_loop(&mut self, ctx: TickContext) {
        self.clock_ms += TIMER_INTERVAL_MS;
        self.registry.update_all();

        let mut direction = MoveDirection::NONE;
        let mut fire = false;
        for command in self.commands.poll(self.clock_ms) {
            match command {
                Command::Forward => direction |= MoveDirection::FORWARD,
                Command::Backward => direction |= MoveDirection::BACKWARD,
                Command::Left => direction |= MoveDirection::LEFT,
                Command::Right => direction |= MoveDirection::RIGHT,
                Command::Fire => fire = true,
            }
        }
        if !direction.is_empty() {
            self.registry
                .move_directed(self.player, direction, MovementKind::Global, ctx.tick_rate);
        }

        self.drive_zombies(ctx.tick_rate);

        if fire {
            self.fire_bullet();
        }

        self.registry.remove_expired();
    }

    fn on_second_elapsed(&mut self, ctx: TickContext) {
        self.spawn_zombie();
        log::trace!(
            "second {}: {} ticks/s, {} zombies",
            ctx.seconds_elapsed,
            ctx.tick_rate,
            self.zombie_count()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::DEFAULT_TICK_RATE;

    fn ctx() -> TickContext {
        TickContext {
            tick_rate: 100,
            seconds_elapsed: 0,
        }
    }

    fn tick(session: &mut SurvivalSession) {
        session.game_loop(ctx());
    }

    /// Square-bodied zombie big enough that a hitscan trace cannot miss.
    fn add_square_zombie(session: &mut SurvivalSession, x: f32, y: f32) -> SpriteId {
        let body = shared(Polygon::from_rect(x - 20.0, y - 20.0, 40.0, 40.0));
        let mut col = Collidable::new(5.0, 30.0);
        col.movement = Some(body.clone());
        col.projectile = Some(body);
        session.registry_mut().add(
            Sprite::new(SpriteKind::Zombie, Heading::new(x, y, 0.0)).with_collidable(col),
        )
    }

    #[test]
    fn test_world_setup() {
        let session = SurvivalSession::new(1).unwrap();
        // 4 walls, the vehicle, the player
        assert_eq!(session.registry().sprite_count(), 6);
        assert_eq!(session.registry().movement_blocking().len(), 6);
        assert_eq!(session.registry().projectile_blocking().len(), 6);

        let player = session.registry().get(session.player_id()).unwrap();
        assert_eq!(player.kind, SpriteKind::Player);
        assert_eq!(
            player.heading.position,
            Vec2::new(MAP_WIDTH / 2.0, MAP_HEIGHT / 2.0)
        );
        assert_eq!(session.zombie_count(), 0);
    }

    #[test]
    fn test_boundary_blocks_player() {
        let mut session = SurvivalSession::new(1).unwrap();
        session.press(KeyCode::A);

        for _ in 0..2000 {
            tick(&mut session);
        }

        let player = session.registry().get(session.player_id()).unwrap();
        // Walked into the west wall and stopped there, never through it
        assert!(player.heading.position.x > 0.0);
        assert!(player.heading.position.x < MAP_WIDTH / 2.0);
    }

    #[test]
    fn test_fire_kills_nearest_zombie() {
        let mut session = SurvivalSession::new(2).unwrap();
        let zombie = add_square_zombie(&mut session, 500.0, 700.0);

        session.press(KeyCode::SPACE);
        tick(&mut session);

        assert_eq!(session.score(), 1);
        // Expired and swept at end of tick
        assert!(session.registry().get(zombie).is_none());
        assert!(
            session
                .registry()
                .iter()
                .any(|s| s.kind == SpriteKind::Contrail)
        );
    }

    #[test]
    fn test_fire_without_target_hits_wall() {
        let mut session = SurvivalSession::new(3).unwrap();
        session.press(KeyCode::SPACE);
        tick(&mut session);

        // No score, but the shot still leaves a contrail ending at the wall
        assert_eq!(session.score(), 0);
        let contrail = session
            .registry()
            .iter()
            .find(|s| s.kind == SpriteKind::Contrail)
            .unwrap();
        let line = contrail.line.unwrap().line(&contrail.heading);
        assert!(line.length() < BULLET_RANGE);
    }

    #[test]
    fn test_contrail_expires() {
        let mut session = SurvivalSession::new(4).unwrap();
        session.press(KeyCode::SPACE);
        tick(&mut session);
        session.release(KeyCode::SPACE);
        assert!(
            session
                .registry()
                .iter()
                .any(|s| s.kind == SpriteKind::Contrail)
        );

        for _ in 0..CONTRAIL_TTL_TICKS + 1 {
            tick(&mut session);
        }
        assert!(
            !session
                .registry()
                .iter()
                .any(|s| s.kind == SpriteKind::Contrail)
        );
    }

    #[test]
    fn test_zombie_chases_player() {
        let mut session = SurvivalSession::new(5).unwrap();
        let zombie = add_square_zombie(&mut session, 800.0, 500.0);
        let player_pos = session
            .registry()
            .get(session.player_id())
            .unwrap()
            .heading
            .position;
        let start = session
            .registry()
            .get(zombie)
            .unwrap()
            .heading
            .distance_to(player_pos);

        for _ in 0..50 {
            tick(&mut session);
        }

        let end = session
            .registry()
            .get(zombie)
            .unwrap()
            .heading
            .distance_to(player_pos);
        assert!(end < start - 10.0);
    }

    #[test]
    fn test_zombie_spawn_cap() {
        let mut session = SurvivalSession::new(6).unwrap();
        let ctx = TickContext {
            tick_rate: DEFAULT_TICK_RATE,
            seconds_elapsed: 0,
        };
        for _ in 0..MAX_ZOMBIES + 10 {
            session.on_second_elapsed(ctx);
        }
        assert_eq!(session.zombie_count(), MAX_ZOMBIES);
    }

    #[test]
    fn test_biped_figure_proportions() {
        let heading = Heading::new(100.0, 100.0, 37.0);
        let [shoulders, left_arm, right_arm] = biped_figure(&heading);

        assert!((shoulders.length() - SHOULDER_WIDTH).abs() < 1e-3);
        assert!((left_arm.length() - ARM_LENGTH).abs() < 1e-3);
        assert!((right_arm.length() - ARM_LENGTH).abs() < 1e-3);
        // Arms start at the shoulder endpoints
        assert_eq!(left_arm.start, shoulders.start);
        assert_eq!(right_arm.start, shoulders.end);
    }
}
