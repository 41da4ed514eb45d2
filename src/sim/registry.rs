//! Sprite registry
//!
//! Owns every sprite in a session plus the two derived obstacle subsets the
//! collision engine queries: movement-blocking and projectile-blocking.
//! Subset membership is decided from polygon presence at add time and
//! maintained incrementally on remove and expiry sweep.

use glam::Vec2;

use super::sprite::{Sprite, SpriteId};

/// All sprites in a session, with derived obstacle subsets.
///
/// One registry per session; the constrained-movement engine takes the
/// registry it should treat as the obstacle source, so multiple sessions
/// never share collision state.
#[derive(Debug, Default)]
pub struct SpriteRegistry {
    sprites: Vec<Sprite>,
    movement_blocking: Vec<SpriteId>,
    projectile_blocking: Vec<SpriteId>,
    next_id: u32,
    diagnostic_naming: bool,
}

impl SpriteRegistry {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            diagnostic_naming: cfg!(debug_assertions),
            ..Default::default()
        }
    }

    /// Override the debug-build default for diagnostic auto-naming.
    pub fn with_diagnostic_naming(mut self, enabled: bool) -> Self {
        self.diagnostic_naming = enabled;
        self
    }

    /// Add a sprite, assigning its handle and (in diagnostic mode) a name.
    ///
    /// A collidable sprite joins the movement-blocking subset when it has a
    /// movement polygon and the projectile-blocking subset when it has a
    /// projectile polygon; the two checks are independent.
    pub fn add(&mut self, mut sprite: Sprite) -> SpriteId {
        let id = SpriteId(self.next_id);
        self.next_id += 1;
        sprite.id = Some(id);

        if self.diagnostic_naming && sprite.name.is_empty() {
            sprite.name = self.generate_name(sprite.kind.name());
        }

        if let Some(col) = &sprite.collidable {
            if col.movement.is_some() {
                self.movement_blocking.push(id);
            }
            if col.projectile.is_some() {
                self.projectile_blocking.push(id);
            }
        }

        log::debug!(
            "add sprite {:?} {} ({:?})",
            id,
            if sprite.name.is_empty() { "<unnamed>" } else { &sprite.name },
            sprite.kind
        );
        self.sprites.push(sprite);
        id
    }

    /// Smallest free `{stem}{n}` name among all registered sprites.
    fn generate_name(&self, stem: &str) -> String {
        let mut n = 1;
        loop {
            let candidate = format!("{stem}{n}");
            if !self.sprites.iter().any(|s| s.name == candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Remove a sprite from the registry and every subset.
    pub fn remove(&mut self, id: SpriteId) {
        self.sprites.retain(|s| s.id != Some(id));
        self.movement_blocking.retain(|&m| m != id);
        self.projectile_blocking.retain(|&m| m != id);
    }

    /// Sweep out every sprite whose `expired` flag is set.
    ///
    /// Called once per tick after all sprite updates, so collision queries
    /// made during the tick still saw the about-to-expire sprites.
    pub fn remove_expired(&mut self) {
        let expired: Vec<SpriteId> = self
            .sprites
            .iter()
            .filter(|s| s.expired)
            .filter_map(|s| s.id)
            .collect();
        if expired.is_empty() {
            return;
        }

        self.sprites.retain(|s| !s.expired);
        self.movement_blocking.retain(|m| !expired.contains(m));
        self.projectile_blocking.retain(|m| !expired.contains(m));
        log::debug!("swept {} expired sprites", expired.len());
    }

    pub fn get(&self, id: SpriteId) -> Option<&Sprite> {
        self.sprites.iter().find(|s| s.id == Some(id))
    }

    pub fn get_mut(&mut self, id: SpriteId) -> Option<&mut Sprite> {
        self.sprites.iter_mut().find(|s| s.id == Some(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sprite> {
        self.sprites.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Sprite> {
        self.sprites.iter_mut()
    }

    /// Total sprites registered.
    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }

    /// Sprites whose movement polygon participates in movement constraints.
    pub fn movement_blocking(&self) -> &[SpriteId] {
        &self.movement_blocking
    }

    /// Sprites whose projectile polygon participates in projectile traces.
    pub fn projectile_blocking(&self) -> &[SpriteId] {
        &self.projectile_blocking
    }

    /// Run the per-tick update on every sprite.
    pub fn update_all(&mut self) {
        for sprite in &mut self.sprites {
            sprite.update();
        }
    }

    /// Nearest sprite (by heading position) satisfying the filter.
    ///
    /// An empty result is a normal outcome, not an error.
    pub fn nearest(
        &self,
        from: Vec2,
        mut filter: impl FnMut(&Sprite) -> bool,
    ) -> Option<(SpriteId, f32)> {
        let mut best: Option<(SpriteId, f32)> = None;
        for sprite in self.sprites.iter().filter(|s| filter(s)) {
            let dist = sprite.heading.distance_to(from);
            if best.is_none_or(|(_, d)| dist < d) {
                best = sprite.id.map(|id| (id, dist));
            }
        }
        best
    }
}
