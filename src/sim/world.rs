//! Entity World - per-tick simulation of everything in the arena
//!
//! # Tick Order
//!
//! ```text
//! move player ─► fire ─► move others ─► convert ─► food ─► converted enemies
//!     ─► adversary contact ─► bullets ─► zoom ─► enemy floor
//! ```
//!
//! Zoom and the enemy floor only run for [`Variant::Arcade`]. A zoom
//! renormalizes the view: sizes, offsets, speeds and growth all shrink by the
//! same factor, so relative sizes evolve exactly as they would unzoomed.
//!
//! All randomness comes from the [`StdRng`] handed to [`EntityWorld::new`], so
//! a seeded world replays identically for the same inputs.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::iter;
use tracing::{debug, info, warn};

use super::entity::{EnemyMotion, Entity, EntityId, EntityKind, EntityTag};
use super::geometry::{overlaps, Arena, Vec2};
use super::variant::Variant;
use crate::device::{AxisTriple, ButtonEdges};

const CARDINALS: [Vec2; 4] = [
    Vec2::new(1.0, 0.0),
    Vec2::new(-1.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(0.0, -1.0),
];

/// How axis input turns into player movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlayerMotion {
    /// `axis * player_speed` per tick
    Direct,
    /// Deflection accelerates, a centered stick decelerates, walls bounce
    Inertial,
}

/// Tuning knobs for the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    /// Overrides the variant's movement model
    pub player_motion: Option<PlayerMotion>,
    pub player_speed: f32,
    /// Inertial velocity gained per tick at full deflection
    pub acceleration: f32,
    /// Inertial velocity factor per tick with a centered stick
    pub deceleration: f32,
    /// Deflection below which the stick counts as centered
    pub deadzone: f32,
    pub player_start_size: f32,
    /// Player growth per unit of eaten value
    pub growth_per_value: f32,
    /// Distance from the walls the player respawns at
    pub player_spawn_margin: f32,

    pub food_size: f32,
    pub food_speed: f32,
    pub food_value: u32,
    pub food_cap: usize,
    pub initial_food: usize,

    pub enemy_min_size: f32,
    pub enemy_max_size: f32,
    pub enemy_step: f32,
    pub enemy_value: u32,
    pub enemy_points: u64,
    pub converted_speed: f32,
    /// Minimum number of unconverted enemies after every arcade tick
    pub enemy_floor: usize,

    /// Player size as a fraction of the arena width that triggers a zoom out
    pub zoom_target: f32,
    /// Rejection sampling budget for spawn positions
    pub spawn_attempts: u32,

    pub bullet_size: f32,
    pub bullet_speed: f32,
    pub asteroid_size: f32,
    pub asteroid_min_speed: u32,
    pub asteroid_max_speed: u32,
    pub asteroid_points: u64,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            player_motion: None,
            player_speed: 5.0,
            acceleration: 1.17,
            deceleration: 0.95,
            deadzone: 0.004,
            player_start_size: 50.0,
            growth_per_value: 5.0,
            player_spawn_margin: 50.0,

            food_size: 20.0,
            food_speed: 1.0,
            food_value: 1,
            food_cap: 10,
            initial_food: 5,

            enemy_min_size: 60.0,
            enemy_max_size: 100.0,
            enemy_step: 2.0,
            enemy_value: 1,
            enemy_points: 5,
            converted_speed: 1.0,
            enemy_floor: 3,

            zoom_target: 0.15,
            spawn_attempts: 1000,

            bullet_size: 5.0,
            bullet_speed: 10.0,
            asteroid_size: 30.0,
            asteroid_min_speed: 1,
            asteroid_max_speed: 3,
            asteroid_points: 100,
        }
    }
}

/// Input for one tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickInput {
    pub axes: AxisTriple,
    pub pressed: ButtonEdges,
}

/// What happened during one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    pub points: u64,
    /// The player touched at least one adversary
    pub player_hit: bool,
    pub food_eaten: u32,
    pub enemies_eaten: u32,
    pub adversaries_shot: u32,
    pub bullets_fired: u32,
}

pub struct EntityWorld {
    settings: WorldSettings,
    variant: Variant,
    arena: Arena,
    rng: StdRng,
    next_id: u64,
    player: Entity,
    entities: Vec<Entity>,
    player_velocity: Vec2,
    view_scale: f32,
}

impl EntityWorld {
    /// Creates a world already reset for `variant`.
    pub fn new(variant: Variant, arena: Arena, settings: WorldSettings, rng: StdRng) -> Self {
        let player = Entity {
            id: EntityId(0),
            pos: arena.center(),
            size: settings.player_start_size,
            kind: EntityKind::Player { turret_deg: 0.0 },
        };

        let mut world = Self {
            settings,
            variant,
            arena,
            rng,
            next_id: 1,
            player,
            entities: Vec::new(),
            player_velocity: Vec2::ZERO,
            view_scale: 1.0,
        };
        world.reset();
        world
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn arena(&self) -> Arena {
        self.arena
    }

    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    pub fn player(&self) -> &Entity {
        &self.player
    }

    /// Every entity except the player
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn view_scale(&self) -> f32 {
        self.view_scale
    }

    pub fn player_motion(&self) -> PlayerMotion {
        self.settings
            .player_motion
            .unwrap_or_else(|| self.variant.default_motion())
    }

    /// Only non-zero under [`PlayerMotion::Inertial`]
    pub fn player_velocity(&self) -> Vec2 {
        self.player_velocity
    }

    pub fn turret_deg(&self) -> f32 {
        match self.player.kind {
            EntityKind::Player { turret_deg } => turret_deg,
            _ => 0.0,
        }
    }

    pub fn count(&self, tag: EntityTag) -> usize {
        self.entities.iter().filter(|e| e.tag() == tag).count()
    }

    pub fn unconverted_enemy_count(&self) -> usize {
        self.entities
            .iter()
            .filter(|e| matches!(e.kind, EntityKind::Enemy { converted: false, .. }))
            .count()
    }

    /// Starting layout for the variant.
    ///
    /// Arcade: player back to start size clear of enemies, initial food, the
    /// enemy floor and a view scale of 1. Shooter and monitor: player centered
    /// and an empty field; shooter adversaries come from
    /// [`EntityWorld::populate_asteroids`].
    pub fn reset(&mut self) {
        self.entities.clear();
        self.view_scale = 1.0;
        self.player_velocity = Vec2::ZERO;
        self.player.size = self.settings.player_start_size;
        self.player.pos = self.arena.center();
        self.player.kind = EntityKind::Player { turret_deg: 0.0 };

        if self.variant == Variant::Arcade {
            for _ in 0..self.settings.enemy_floor {
                self.spawn_enemy();
            }
            self.place_player();
            for _ in 0..self.settings.initial_food {
                self.spawn_food();
            }
        }

        info!(
            "World reset for {:?}: {} food, {} enemies",
            self.variant,
            self.count(EntityTag::Food),
            self.count(EntityTag::Enemy)
        );
    }

    /// Replaces all asteroids and bullets with `count` fresh asteroids.
    pub fn populate_asteroids(&mut self, color: [u8; 3], count: usize) {
        self.entities
            .retain(|e| !matches!(e.tag(), EntityTag::Asteroid | EntityTag::Bullet));

        for _ in 0..count {
            let size = self.settings.asteroid_size;
            let pos = self.find_clear_position(size, 0.0, true);
            let speed = self
                .rng
                .gen_range(self.settings.asteroid_min_speed..=self.settings.asteroid_max_speed)
                as f32;
            let angle = self.rng.gen_range(0..=360) as f32;
            self.insert(
                pos,
                size,
                EntityKind::Asteroid {
                    velocity: Vec2::from_angle_deg(angle) * speed,
                    color,
                },
            );
        }

        debug!("Populated {} asteroids with color {:?}", count, color);
    }

    /// Adds an entity as-is and returns its id.
    pub fn insert(&mut self, pos: Vec2, size: f32, kind: EntityKind) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.push(Entity {
            id,
            pos,
            size,
            kind,
        });
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Removes everything but the player
    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Moves and resizes the player without any checks
    pub fn set_player(&mut self, pos: Vec2, size: f32) {
        self.player.pos = pos;
        self.player.size = size;
    }

    pub fn tick(&mut self, input: &TickInput) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        self.move_player(input.axes);

        if let Some(fire) = self.variant.fire_button() {
            if input.pressed.contains(fire) {
                self.fire_bullet();
                outcome.bullets_fired += 1;
            }
        }

        self.move_entities();
        self.convert_enemies();
        self.eat_food(&mut outcome);
        self.eat_converted_enemies(&mut outcome);
        self.touch_adversaries(&mut outcome);
        self.resolve_bullets(&mut outcome);

        if self.variant == Variant::Arcade {
            self.adjust_zoom();
            self.maintain_enemy_floor();
        }

        outcome
    }

    fn move_player(&mut self, axes: AxisTriple) {
        let stick = Vec2::new(axes.x, axes.y);

        match self.player_motion() {
            PlayerMotion::Direct => {
                let delta = stick * (self.settings.player_speed * self.view_scale);
                self.player.pos = self.arena.clamp(self.player.pos + delta, self.player.size);
            }
            PlayerMotion::Inertial => {
                let deadzone = self.settings.deadzone;
                if axes.x.abs() > deadzone || axes.y.abs() > deadzone {
                    self.player_velocity += stick * (self.settings.acceleration * self.view_scale);
                } else {
                    self.player_velocity = self.player_velocity * self.settings.deceleration;
                }
                let (pos, velocity) = self.arena.reflect(
                    self.player.pos + self.player_velocity,
                    self.player.size,
                    self.player_velocity,
                );
                self.player.pos = pos;
                self.player_velocity = velocity;
            }
        }

        if self.variant.has_turret() {
            if let EntityKind::Player { turret_deg } = &mut self.player.kind {
                *turret_deg = (axes.z * 180.0).rem_euclid(360.0);
            }
        }
    }

    fn fire_bullet(&mut self) {
        let velocity = Vec2::from_angle_deg(self.turret_deg()) * self.settings.bullet_speed;
        let id = self.insert(
            self.player.pos,
            self.settings.bullet_size,
            EntityKind::Bullet { velocity },
        );
        debug!("Bullet {} fired at {:.1}°", id, self.turret_deg());
    }

    fn move_entities(&mut self) {
        let arena = self.arena;

        for entity in &mut self.entities {
            match &mut entity.kind {
                EntityKind::Food { velocity, .. }
                | EntityKind::Asteroid { velocity, .. }
                | EntityKind::Enemy {
                    motion: EnemyMotion::Drift { velocity },
                    ..
                } => {
                    let (pos, reflected) =
                        arena.reflect(entity.pos + *velocity, entity.size, *velocity);
                    entity.pos = pos;
                    *velocity = reflected;
                }
                EntityKind::Enemy {
                    motion: EnemyMotion::RandomWalk { step },
                    ..
                } => {
                    let dx = if self.rng.gen_bool(0.5) { *step } else { -*step };
                    let dy = if self.rng.gen_bool(0.5) { *step } else { -*step };
                    entity.pos = arena.clamp(entity.pos + Vec2::new(dx, dy), entity.size);
                }
                EntityKind::Bullet { velocity } => entity.pos += *velocity,
                EntityKind::Player { .. } => {}
            }
        }

        self.entities.retain(|e| {
            !matches!(e.kind, EntityKind::Bullet { .. }) || arena.contains_fully(e.pos, e.size)
        });
    }

    /// One-way switch for every enemy the player has outgrown
    fn convert_enemies(&mut self) {
        let player_size = self.player.size;
        let speed = self.settings.converted_speed * self.view_scale;

        for entity in &mut self.entities {
            if let EntityKind::Enemy {
                converted, motion, ..
            } = &mut entity.kind
            {
                if !*converted && player_size > entity.size {
                    *converted = true;
                    *motion = EnemyMotion::Drift {
                        velocity: random_cardinal(&mut self.rng) * speed,
                    };
                    debug!("Enemy {} converted (size {:.1})", entity.id, entity.size);
                }
            }
        }
    }

    fn eat_food(&mut self, outcome: &mut TickOutcome) {
        let (player_pos, player_size) = (self.player.pos, self.player.size);
        let mut eaten = 0u32;
        let mut value = 0u32;

        self.entities.retain(|e| match e.kind {
            EntityKind::Food { value: v, .. } if overlaps(e.pos, e.size, player_pos, player_size) => {
                eaten += 1;
                value += v;
                false
            }
            _ => true,
        });

        if eaten == 0 {
            return;
        }

        self.grow_player(value);
        outcome.food_eaten += eaten;
        outcome.points += value as u64;

        for _ in 0..eaten {
            if self.count(EntityTag::Food) < self.settings.food_cap {
                self.spawn_food();
            } else {
                debug!("Food cap reached, not replenishing");
            }
        }
        debug!("Ate {} food, player size {:.1}", eaten, self.player.size);
    }

    fn eat_converted_enemies(&mut self, outcome: &mut TickOutcome) {
        let (player_pos, player_size) = (self.player.pos, self.player.size);
        let mut eaten = 0u32;
        let mut value = 0u32;

        self.entities.retain(|e| match e.kind {
            EntityKind::Enemy {
                converted: true,
                value: v,
                ..
            } if overlaps(e.pos, e.size, player_pos, player_size) => {
                eaten += 1;
                value += v;
                false
            }
            _ => true,
        });

        if eaten == 0 {
            return;
        }

        self.grow_player(value);
        outcome.enemies_eaten += eaten;
        outcome.points += eaten as u64 * self.settings.enemy_points;
        debug!("Ate {} converted enemies, player size {:.1}", eaten, self.player.size);
    }

    /// Unconverted enemies stay put; asteroids break on contact.
    fn touch_adversaries(&mut self, outcome: &mut TickOutcome) {
        let (player_pos, player_size) = (self.player.pos, self.player.size);
        let mut hit = false;

        self.entities.retain(|e| {
            if e.is_adversary() && overlaps(e.pos, e.size, player_pos, player_size) {
                hit = true;
                !matches!(e.kind, EntityKind::Asteroid { .. })
            } else {
                true
            }
        });

        if hit {
            debug!("Player touched an adversary");
            outcome.player_hit = true;
        }
    }

    /// A bullet destroys every adversary it overlaps and is consumed.
    fn resolve_bullets(&mut self, outcome: &mut TickOutcome) {
        let mut destroyed: Vec<EntityId> = Vec::new();

        for bullet in self.entities.iter().filter(|e| e.tag() == EntityTag::Bullet) {
            let mut spent = false;
            for target in self.entities.iter().filter(|t| t.is_adversary()) {
                if destroyed.contains(&target.id)
                    || !overlaps(bullet.pos, bullet.size, target.pos, target.size)
                {
                    continue;
                }
                destroyed.push(target.id);
                spent = true;
                outcome.adversaries_shot += 1;
                outcome.points += match target.kind {
                    EntityKind::Asteroid { .. } => self.settings.asteroid_points,
                    _ => self.settings.enemy_points,
                };
            }
            if spent {
                destroyed.push(bullet.id);
            }
        }

        if !destroyed.is_empty() {
            self.entities.retain(|e| !destroyed.contains(&e.id));
        }
    }

    fn adjust_zoom(&mut self) {
        let target = self.settings.zoom_target * self.arena.width;
        if self.player.size <= target {
            return;
        }

        let factor = target / self.player.size;
        let center = self.arena.center();
        for entity in iter::once(&mut self.player).chain(self.entities.iter_mut()) {
            entity.size *= factor;
            entity.pos = center + (entity.pos - center) * factor;
            match &mut entity.kind {
                EntityKind::Food { velocity, .. }
                | EntityKind::Asteroid { velocity, .. }
                | EntityKind::Bullet { velocity }
                | EntityKind::Enemy {
                    motion: EnemyMotion::Drift { velocity },
                    ..
                } => *velocity = *velocity * factor,
                EntityKind::Enemy {
                    motion: EnemyMotion::RandomWalk { step },
                    ..
                } => *step *= factor,
                EntityKind::Player { .. } => {}
            }
        }
        self.player_velocity = self.player_velocity * factor;
        self.view_scale *= factor;

        info!(
            "Zoomed out by {:.3}, view scale now {:.3}",
            factor, self.view_scale
        );
    }

    fn maintain_enemy_floor(&mut self) {
        while self.unconverted_enemy_count() < self.settings.enemy_floor {
            self.spawn_enemy();
        }
    }

    fn grow_player(&mut self, value: u32) {
        self.player.size += self.settings.growth_per_value * self.view_scale * value as f32;
        self.player.pos = self.arena.clamp(self.player.pos, self.player.size);
    }

    fn spawn_food(&mut self) -> EntityId {
        let size = self.settings.food_size * self.view_scale;
        let pos = random_position(&mut self.rng, self.arena, size, 0.0);
        let velocity = random_cardinal(&mut self.rng) * (self.settings.food_speed * self.view_scale);
        self.insert(
            pos,
            size,
            EntityKind::Food {
                velocity,
                value: self.settings.food_value,
            },
        )
    }

    fn spawn_enemy(&mut self) -> EntityId {
        let base = self
            .rng
            .gen_range(self.settings.enemy_min_size..=self.settings.enemy_max_size);
        let size = base * self.view_scale;
        let pos = self.find_clear_position(size, 0.0, true);
        let id = self.insert(
            pos,
            size,
            EntityKind::Enemy {
                converted: false,
                value: self.settings.enemy_value,
                motion: EnemyMotion::RandomWalk {
                    step: self.settings.enemy_step * self.view_scale,
                },
            },
        );
        debug!("Spawned enemy {} of size {:.1}", id, size);
        id
    }

    /// Puts the player somewhere that does not touch an enemy
    fn place_player(&mut self) {
        let size = self.player.size;
        let margin = self.settings.player_spawn_margin;
        self.player.pos = self.find_clear_position(size, margin, false);
    }

    /// Rejection-samples a spot clear of every enemy and, if `avoid_player`,
    /// the player. Falls back to the last candidate once the budget is spent.
    fn find_clear_position(&mut self, size: f32, margin: f32, avoid_player: bool) -> Vec2 {
        let mut candidate = random_position(&mut self.rng, self.arena, size, margin);

        for _ in 0..self.settings.spawn_attempts {
            let touches_player =
                avoid_player && overlaps(candidate, size, self.player.pos, self.player.size);
            let touches_enemy = self.entities.iter().any(|e| {
                e.tag() == EntityTag::Enemy && overlaps(candidate, size, e.pos, e.size)
            });
            if !touches_player && !touches_enemy {
                return candidate;
            }
            candidate = random_position(&mut self.rng, self.arena, size, margin);
        }

        warn!(
            "No clear spawn position after {} attempts, using {:?}",
            self.settings.spawn_attempts, candidate
        );
        candidate
    }
}

fn random_cardinal(rng: &mut StdRng) -> Vec2 {
    CARDINALS[rng.gen_range(0..CARDINALS.len())]
}

/// Uniform center position keeping the square inside the arena and at least
/// `margin` away from the walls.
fn random_position(rng: &mut StdRng, arena: Arena, size: f32, margin: f32) -> Vec2 {
    let inset = (size / 2.0).max(margin);
    Vec2::new(
        random_coord(rng, inset, arena.width),
        random_coord(rng, inset, arena.height),
    )
}

fn random_coord(rng: &mut StdRng, inset: f32, extent: f32) -> f32 {
    if inset * 2.0 >= extent {
        extent / 2.0
    } else {
        rng.gen_range(inset..=extent - inset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::ButtonId;
    use rand::SeedableRng;

    fn world(variant: Variant, seed: u64) -> EntityWorld {
        EntityWorld::new(
            variant,
            Arena::default(),
            WorldSettings::default(),
            StdRng::seed_from_u64(seed),
        )
    }

    fn still() -> TickInput {
        TickInput::default()
    }

    fn fire() -> TickInput {
        TickInput {
            axes: AxisTriple::ZERO,
            pressed: [ButtonId::new(1).unwrap()].into_iter().collect(),
        }
    }

    fn enemy_kind(converted: bool) -> EntityKind {
        EntityKind::Enemy {
            converted,
            value: 1,
            motion: EnemyMotion::RandomWalk { step: 0.0 },
        }
    }

    #[test]
    fn arcade_reset_layout() {
        let w = world(Variant::Arcade, 1);

        assert_eq!(w.count(EntityTag::Food), 5);
        assert_eq!(w.unconverted_enemy_count(), 3);
        assert_eq!(w.player().size, 50.0);
        assert_eq!(w.view_scale(), 1.0);

        let p = w.player();
        assert!(p.pos.x >= 50.0 && p.pos.x <= 750.0);
        assert!(w
            .entities()
            .iter()
            .filter(|e| e.tag() == EntityTag::Enemy)
            .all(|e| !overlaps(e.pos, e.size, p.pos, p.size)));
    }

    #[test]
    fn shooter_reset_is_empty() {
        let w = world(Variant::Shooter, 1);
        assert!(w.entities().is_empty());
        assert_eq!(w.player().pos, Arena::default().center());
    }

    #[test]
    fn player_moves_and_clamps() {
        let mut w = world(Variant::Shooter, 2);
        let left = TickInput {
            axes: AxisTriple::new(-1.0, 0.0, 0.0),
            pressed: ButtonEdges::empty(),
        };

        w.tick(&left);
        assert_eq!(w.player().pos, Vec2::new(395.0, 300.0));

        w.set_player(Vec2::new(27.0, 300.0), 50.0);
        w.tick(&left);
        assert_eq!(w.player().pos, Vec2::new(25.0, 300.0));
    }

    #[test]
    fn food_cap_and_enemy_floor_hold_over_time() {
        let mut w = world(Variant::Arcade, 7);
        let mut rng = StdRng::seed_from_u64(99);

        for _ in 0..2000 {
            let input = TickInput {
                axes: AxisTriple::new(rng.gen_range(-1.0..=1.0), rng.gen_range(-1.0..=1.0), 0.0),
                pressed: ButtonEdges::empty(),
            };
            w.tick(&input);
            assert!(w.count(EntityTag::Food) <= w.settings().food_cap);
            assert!(w.unconverted_enemy_count() >= w.settings().enemy_floor);
        }
    }

    #[test]
    fn conversion_is_one_way() {
        let mut w = world(Variant::Arcade, 3);
        w.clear();
        w.set_player(Vec2::new(100.0, 100.0), 80.0);
        let id = w.insert(Vec2::new(600.0, 450.0), 60.0, enemy_kind(false));

        w.tick(&still());
        assert!(w.get(id).unwrap().is_converted());

        // Shrinking the player again never reverts it
        w.set_player(Vec2::new(100.0, 100.0), 10.0);
        for _ in 0..20 {
            w.tick(&still());
            if let Some(enemy) = w.get(id) {
                assert!(enemy.is_converted());
            }
        }
    }

    #[test]
    fn eating_food_grows_and_replenishes() {
        let mut w = world(Variant::Arcade, 4);
        w.clear();
        w.set_player(Vec2::new(400.0, 300.0), 50.0);
        w.insert(
            Vec2::new(400.0, 300.0),
            20.0,
            EntityKind::Food {
                velocity: Vec2::ZERO,
                value: 1,
            },
        );

        let outcome = w.tick(&still());
        assert_eq!(outcome.food_eaten, 1);
        assert_eq!(outcome.points, 1);
        assert_eq!(w.player().size, 55.0);
        assert_eq!(w.count(EntityTag::Food), 1);
    }

    #[test]
    fn unconverted_contact_is_a_hit_and_converted_contact_is_a_meal() {
        let mut w = world(Variant::Arcade, 5);
        w.clear();
        w.set_player(Vec2::new(400.0, 300.0), 50.0);
        let big = w.insert(Vec2::new(400.0, 300.0), 60.0, enemy_kind(false));

        let outcome = w.tick(&still());
        assert!(outcome.player_hit);
        assert!(w.get(big).is_some());

        w.clear();
        w.set_player(Vec2::new(400.0, 300.0), 70.0);
        let small = w.insert(Vec2::new(400.0, 300.0), 60.0, enemy_kind(false));

        let outcome = w.tick(&still());
        assert!(!outcome.player_hit);
        assert_eq!(outcome.enemies_eaten, 1);
        assert_eq!(outcome.points, 5);
        assert!(w.get(small).is_none());
        assert_eq!(w.player().size, 75.0);
    }

    #[test]
    fn zoom_scales_about_the_center() {
        let mut w = world(Variant::Arcade, 6);
        w.clear();
        w.set_player(Vec2::new(200.0, 300.0), 240.0);
        let food = w.insert(
            Vec2::new(700.0, 100.0),
            20.0,
            EntityKind::Food {
                velocity: Vec2::ZERO,
                value: 1,
            },
        );

        w.tick(&still());

        assert!((w.player().size - 120.0).abs() < 1e-3);
        assert!((w.view_scale() - 0.5).abs() < 1e-6);
        assert!((w.player().pos.x - 300.0).abs() < 1e-3);
        let food = w.get(food).unwrap();
        assert!((food.size - 10.0).abs() < 1e-3);
        assert!((food.pos.x - 550.0).abs() < 1e-3);
        assert!((food.pos.y - 200.0).abs() < 1e-3);

        // Enemies spawned after the zoom are scaled too
        assert!(w
            .entities()
            .iter()
            .filter(|e| e.tag() == EntityTag::Enemy)
            .all(|e| e.size <= 50.0 + 1e-3));
    }

    /// Feeds `meals` food items straight into the player and returns the
    /// player size relative to a resting food item in the corner.
    fn size_ratio_after_meals(zoom_target: f32, meals: usize) -> f32 {
        let settings = WorldSettings {
            zoom_target,
            enemy_floor: 0,
            food_cap: 0,
            ..Default::default()
        };
        let mut w = EntityWorld::new(
            Variant::Arcade,
            Arena::default(),
            settings,
            StdRng::seed_from_u64(13),
        );
        w.clear();
        w.set_player(Vec2::new(400.0, 300.0), 118.0);
        let reference = w.insert(
            Vec2::new(30.0, 30.0),
            20.0,
            EntityKind::Food {
                velocity: Vec2::ZERO,
                value: 1,
            },
        );

        for _ in 0..meals {
            let pos = w.player().pos;
            w.insert(
                pos,
                10.0,
                EntityKind::Food {
                    velocity: Vec2::ZERO,
                    value: 1,
                },
            );
            w.tick(&still());
        }

        w.player().size / w.get(reference).unwrap().size
    }

    #[test]
    fn zoom_does_not_change_relative_growth() {
        let zoomed = size_ratio_after_meals(0.15, 12);
        let unzoomed = size_ratio_after_meals(100.0, 12);

        assert!((unzoomed - 8.9).abs() < 1e-4);
        assert!(
            (zoomed - unzoomed).abs() < 1e-3,
            "zoomed {} vs unzoomed {}",
            zoomed,
            unzoomed
        );
    }

    #[test]
    fn zoom_scales_speeds_with_sizes() {
        let mut w = world(Variant::Arcade, 14);
        w.clear();
        w.set_player(Vec2::new(400.0, 300.0), 240.0);
        let food = w.insert(
            Vec2::new(700.0, 100.0),
            20.0,
            EntityKind::Food {
                velocity: Vec2::new(1.0, 0.0),
                value: 1,
            },
        );
        // Larger than the player so it stays unconverted
        let walker = w.insert(
            Vec2::new(650.0, 450.0),
            300.0,
            EntityKind::Enemy {
                converted: false,
                value: 1,
                motion: EnemyMotion::RandomWalk { step: 2.0 },
            },
        );

        w.tick(&still());
        assert!((w.view_scale() - 0.5).abs() < 1e-6);

        match &w.get(food).unwrap().kind {
            EntityKind::Food { velocity, .. } => assert_eq!(*velocity, Vec2::new(0.5, 0.0)),
            other => panic!("unexpected kind {:?}", other),
        }
        match &w.get(walker).unwrap().kind {
            EntityKind::Enemy {
                motion: EnemyMotion::RandomWalk { step },
                ..
            } => assert_eq!(*step, 1.0),
            other => panic!("unexpected kind {:?}", other),
        }

        // Full deflection now covers half the distance
        let before = w.player().pos;
        w.tick(&TickInput {
            axes: AxisTriple::new(1.0, 0.0, 0.0),
            pressed: ButtonEdges::empty(),
        });
        assert!((w.player().pos.x - before.x - 2.5).abs() < 1e-4);
    }

    #[test]
    fn food_cap_stops_replenishing() {
        let settings = WorldSettings {
            food_cap: 3,
            enemy_floor: 0,
            ..Default::default()
        };
        let mut w = EntityWorld::new(
            Variant::Arcade,
            Arena::default(),
            settings,
            StdRng::seed_from_u64(15),
        );
        w.clear();
        w.set_player(Vec2::new(400.0, 300.0), 50.0);
        let resting = EntityKind::Food {
            velocity: Vec2::ZERO,
            value: 1,
        };
        // Two under the player, two far away in the corners
        w.insert(Vec2::new(400.0, 300.0), 20.0, resting.clone());
        w.insert(Vec2::new(405.0, 300.0), 20.0, resting.clone());
        w.insert(Vec2::new(30.0, 30.0), 20.0, resting.clone());
        w.insert(Vec2::new(770.0, 570.0), 20.0, resting);

        let outcome = w.tick(&still());

        // 2 left after eating: one replacement brings it to the cap, the
        // second meal is not replaced
        assert_eq!(outcome.food_eaten, 2);
        assert_eq!(w.count(EntityTag::Food), 3);
    }

    #[test]
    fn food_at_cap_minus_one_is_replenished() {
        let settings = WorldSettings {
            food_cap: 2,
            enemy_floor: 0,
            ..Default::default()
        };
        let mut w = EntityWorld::new(
            Variant::Arcade,
            Arena::default(),
            settings,
            StdRng::seed_from_u64(16),
        );
        w.clear();
        w.set_player(Vec2::new(400.0, 300.0), 50.0);
        w.insert(
            Vec2::new(400.0, 300.0),
            20.0,
            EntityKind::Food {
                velocity: Vec2::ZERO,
                value: 1,
            },
        );
        w.insert(
            Vec2::new(30.0, 30.0),
            20.0,
            EntityKind::Food {
                velocity: Vec2::ZERO,
                value: 1,
            },
        );

        w.tick(&still());
        assert_eq!(w.count(EntityTag::Food), 2);
    }

    fn inertial_world() -> EntityWorld {
        let settings = WorldSettings {
            player_motion: Some(PlayerMotion::Inertial),
            acceleration: 1.0,
            deceleration: 0.5,
            ..Default::default()
        };
        EntityWorld::new(
            Variant::Shooter,
            Arena::default(),
            settings,
            StdRng::seed_from_u64(17),
        )
    }

    #[test]
    fn inertial_motion_accelerates_and_coasts() {
        let mut w = inertial_world();
        assert_eq!(w.player_motion(), PlayerMotion::Inertial);
        let push = TickInput {
            axes: AxisTriple::new(1.0, 0.0, 0.0),
            pressed: ButtonEdges::empty(),
        };

        w.tick(&push);
        w.tick(&push);
        assert_eq!(w.player_velocity(), Vec2::new(2.0, 0.0));
        assert_eq!(w.player().pos, Vec2::new(403.0, 300.0));

        // Centered stick: velocity halves each tick but the player keeps going
        w.tick(&still());
        assert_eq!(w.player_velocity(), Vec2::new(1.0, 0.0));
        assert_eq!(w.player().pos, Vec2::new(404.0, 300.0));
    }

    #[test]
    fn inertial_motion_bounces_off_walls() {
        let mut w = inertial_world();
        w.set_player(Vec2::new(773.0, 300.0), 50.0);
        let push = TickInput {
            axes: AxisTriple::new(1.0, 0.0, 0.0),
            pressed: ButtonEdges::empty(),
        };

        w.tick(&push);
        w.tick(&push);
        assert_eq!(w.player().pos, Vec2::new(775.0, 300.0));
        assert!(w.player_velocity().x < 0.0);
    }

    #[test]
    fn monitor_world_is_empty_and_inertial() {
        let mut w = world(Variant::Monitor, 18);
        assert!(w.entities().is_empty());
        assert_eq!(w.player_motion(), PlayerMotion::Inertial);

        let outcome = w.tick(&TickInput {
            axes: AxisTriple::new(0.5, 0.0, 0.5),
            pressed: [ButtonId::new(1).unwrap()].into_iter().collect(),
        });
        assert_eq!(outcome, TickOutcome::default());
        assert!(w.player().pos.x > 400.0);
        assert!((w.turret_deg() - 90.0).abs() < 1e-3);
        assert!(w.entities().is_empty());
    }

    #[test]
    fn turret_follows_twist() {
        let mut w = world(Variant::Shooter, 8);
        w.tick(&TickInput {
            axes: AxisTriple::new(0.0, 0.0, -0.5),
            pressed: ButtonEdges::empty(),
        });
        assert!((w.turret_deg() - 270.0).abs() < 1e-3);
    }

    #[test]
    fn bullets_fly_and_leave_the_arena() {
        let mut w = world(Variant::Shooter, 9);
        let outcome = w.tick(&fire());
        assert_eq!(outcome.bullets_fired, 1);

        let bullet = w.entities()[0].clone();
        assert_eq!(bullet.tag(), EntityTag::Bullet);
        assert!((bullet.pos.x - 410.0).abs() < 1e-3);

        for _ in 0..50 {
            w.tick(&still());
        }
        assert_eq!(w.count(EntityTag::Bullet), 0);
    }

    #[test]
    fn bullet_destroys_asteroid_for_points() {
        let mut w = world(Variant::Shooter, 10);
        w.insert(
            Vec2::new(460.0, 300.0),
            30.0,
            EntityKind::Asteroid {
                velocity: Vec2::ZERO,
                color: [255, 0, 0],
            },
        );

        let mut points = w.tick(&fire()).points;
        for _ in 0..8 {
            points += w.tick(&still()).points;
        }

        assert_eq!(points, 100);
        assert_eq!(w.count(EntityTag::Asteroid), 0);
        assert_eq!(w.count(EntityTag::Bullet), 0);
    }

    #[test]
    fn asteroid_contact_costs_a_hit_and_breaks_it() {
        let mut w = world(Variant::Shooter, 11);
        w.insert(
            Vec2::new(410.0, 300.0),
            30.0,
            EntityKind::Asteroid {
                velocity: Vec2::ZERO,
                color: [0, 0, 255],
            },
        );

        let outcome = w.tick(&still());
        assert!(outcome.player_hit);
        assert_eq!(outcome.points, 0);
        assert_eq!(w.count(EntityTag::Asteroid), 0);
    }

    #[test]
    fn populate_replaces_asteroids_away_from_player() {
        let mut w = world(Variant::Shooter, 12);
        w.populate_asteroids([1, 2, 3], 10);
        w.populate_asteroids([4, 5, 6], 4);

        assert_eq!(w.count(EntityTag::Asteroid), 4);
        let p = w.player();
        for asteroid in w.entities() {
            assert_eq!(asteroid.color(), [4, 5, 6]);
            assert!(!overlaps(asteroid.pos, asteroid.size, p.pos, p.size));
        }
    }

    #[test]
    fn seeded_worlds_replay_identically() {
        let mut a = world(Variant::Arcade, 42);
        let mut b = world(Variant::Arcade, 42);
        let input = TickInput {
            axes: AxisTriple::new(0.3, -0.7, 0.0),
            pressed: ButtonEdges::empty(),
        };

        for _ in 0..200 {
            assert_eq!(a.tick(&input), b.tick(&input));
        }
        assert_eq!(a.entities(), b.entities());
        assert_eq!(a.player(), b.player());
    }
}
