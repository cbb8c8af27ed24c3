//! Entity model
//!
//! Every object in the arena is an [`Entity`]: an id, a center, a side length
//! and a closed [`EntityKind`] tag carrying the per-kind state.

use serde::Serialize;
use std::fmt;

use super::geometry::Vec2;

pub const PLAYER_COLOR: [u8; 3] = [0, 255, 0];
pub const FOOD_COLOR: [u8; 3] = [255, 255, 255];
pub const ENEMY_COLOR: [u8; 3] = [255, 0, 0];
pub const CONVERTED_ENEMY_COLOR: [u8; 3] = [255, 255, 0];
pub const BULLET_COLOR: [u8; 3] = [255, 255, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Movement of an enemy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnemyMotion {
    /// Moves `±step` on each axis every tick
    RandomWalk { step: f32 },
    /// Constant velocity, reflecting off walls
    Drift { velocity: Vec2 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    Player { turret_deg: f32 },
    Food { velocity: Vec2, value: u32 },
    Enemy {
        converted: bool,
        value: u32,
        motion: EnemyMotion,
    },
    Bullet { velocity: Vec2 },
    Asteroid { velocity: Vec2, color: [u8; 3] },
}

/// Flat tag for snapshots and counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityTag {
    Player,
    Food,
    Enemy,
    Bullet,
    Asteroid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub pos: Vec2,
    pub size: f32,
    pub kind: EntityKind,
}

impl Entity {
    pub fn tag(&self) -> EntityTag {
        match self.kind {
            EntityKind::Player { .. } => EntityTag::Player,
            EntityKind::Food { .. } => EntityTag::Food,
            EntityKind::Enemy { .. } => EntityTag::Enemy,
            EntityKind::Bullet { .. } => EntityTag::Bullet,
            EntityKind::Asteroid { .. } => EntityTag::Asteroid,
        }
    }

    pub fn is_converted(&self) -> bool {
        matches!(self.kind, EntityKind::Enemy { converted: true, .. })
    }

    /// Unconverted enemies and asteroids: whatever hurts the player
    pub fn is_adversary(&self) -> bool {
        matches!(
            self.kind,
            EntityKind::Enemy {
                converted: false,
                ..
            } | EntityKind::Asteroid { .. }
        )
    }

    pub fn color(&self) -> [u8; 3] {
        match self.kind {
            EntityKind::Player { .. } => PLAYER_COLOR,
            EntityKind::Food { .. } => FOOD_COLOR,
            EntityKind::Enemy {
                converted: true, ..
            } => CONVERTED_ENEMY_COLOR,
            EntityKind::Enemy { .. } => ENEMY_COLOR,
            EntityKind::Bullet { .. } => BULLET_COLOR,
            EntityKind::Asteroid { color, .. } => color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enemy(converted: bool) -> Entity {
        Entity {
            id: EntityId(1),
            pos: Vec2::ZERO,
            size: 60.0,
            kind: EntityKind::Enemy {
                converted,
                value: 1,
                motion: EnemyMotion::RandomWalk { step: 2.0 },
            },
        }
    }

    #[test]
    fn adversary_classification() {
        assert!(enemy(false).is_adversary());
        assert!(!enemy(true).is_adversary());
        assert!(enemy(true).is_converted());

        let asteroid = Entity {
            id: EntityId(2),
            pos: Vec2::ZERO,
            size: 30.0,
            kind: EntityKind::Asteroid {
                velocity: Vec2::ZERO,
                color: [1, 2, 3],
            },
        };
        assert!(asteroid.is_adversary());
        assert_eq!(asteroid.color(), [1, 2, 3]);
        assert_eq!(asteroid.tag(), EntityTag::Asteroid);
    }

    #[test]
    fn conversion_changes_color() {
        assert_eq!(enemy(false).color(), ENEMY_COLOR);
        assert_eq!(enemy(true).color(), CONVERTED_ENEMY_COLOR);
    }
}
