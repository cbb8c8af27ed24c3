//! Plane geometry shared by every entity
//!
//! Positions are entity centers. Entities are axis-aligned squares described by
//! their side length.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector for `degrees`, 0° pointing along +x, growing toward +y
    pub fn from_angle_deg(degrees: f32) -> Self {
        let radians = degrees.to_radians();
        Self::new(radians.cos(), radians.sin())
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Strict square overlap; touching edges do not count.
pub fn overlaps(a_pos: Vec2, a_size: f32, b_pos: Vec2, b_size: f32) -> bool {
    let reach = (a_size + b_size) / 2.0;
    (a_pos.x - b_pos.x).abs() < reach && (a_pos.y - b_pos.y).abs() < reach
}

/// Playing field, origin top-left
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

impl Arena {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Keeps a square of side `size` centered at `pos` inside the arena.
    ///
    /// A square larger than the arena is pinned to the center on that axis.
    pub fn clamp(&self, pos: Vec2, size: f32) -> Vec2 {
        let half = size / 2.0;
        Vec2::new(
            clamp_axis(pos.x, half, self.width),
            clamp_axis(pos.y, half, self.height),
        )
    }

    pub fn contains_fully(&self, pos: Vec2, size: f32) -> bool {
        let half = size / 2.0;
        pos.x - half >= 0.0
            && pos.y - half >= 0.0
            && pos.x + half <= self.width
            && pos.y + half <= self.height
    }

    /// Flips each velocity component whose axis crossed a wall, then clamps.
    pub fn reflect(&self, pos: Vec2, size: f32, velocity: Vec2) -> (Vec2, Vec2) {
        let half = size / 2.0;
        let mut velocity = velocity;
        if pos.x - half < 0.0 || pos.x + half > self.width {
            velocity.x = -velocity.x;
        }
        if pos.y - half < 0.0 || pos.y + half > self.height {
            velocity.y = -velocity.y;
        }
        (self.clamp(pos, size), velocity)
    }
}

fn clamp_axis(value: f32, half: f32, extent: f32) -> f32 {
    if half * 2.0 >= extent {
        extent / 2.0
    } else {
        value.clamp(half, extent - half)
    }
}
