//! Game variants and their fixed control layout

use serde::{Deserialize, Serialize};

use super::world::PlayerMotion;
use crate::device::{AxisPolicies, AxisPolicy, AxisTriple, ButtonId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Predator/prey: eat food and converted enemies, avoid the rest
    #[default]
    Arcade,
    /// Asteroids with a turret and rounds
    Shooter,
    /// Input monitor: an empty field, a coasting pointer with the twist
    /// shown as a turret, and the held state of every key
    Monitor,
}

impl Variant {
    /// Button that fires a bullet, if the variant has one
    pub fn fire_button(self) -> Option<ButtonId> {
        match self {
            Variant::Arcade | Variant::Monitor => None,
            Variant::Shooter => ButtonId::new(1),
        }
    }

    pub fn restart_button(self) -> Option<ButtonId> {
        match self {
            Variant::Arcade => ButtonId::new(1),
            Variant::Shooter => ButtonId::new(2),
            Variant::Monitor => None,
        }
    }

    /// Whether the twist axis steers a turret
    pub fn has_turret(self) -> bool {
        matches!(self, Variant::Shooter | Variant::Monitor)
    }

    pub fn default_motion(self) -> PlayerMotion {
        match self {
            Variant::Arcade | Variant::Shooter => PlayerMotion::Direct,
            Variant::Monitor => PlayerMotion::Inertial,
        }
    }

    /// Whether the restart edge also resets a game still in progress
    pub fn restart_while_playing(self) -> bool {
        matches!(self, Variant::Arcade)
    }

    pub fn initial_lives(self) -> u32 {
        match self {
            Variant::Arcade | Variant::Monitor => 1,
            Variant::Shooter => 3,
        }
    }

    pub fn default_layout(self) -> AxisLayout {
        let signed = AxisChannel::new(AxisPolicy::SignedByte, false);
        match self {
            Variant::Arcade => AxisLayout {
                x: signed,
                y: signed,
                z: AxisChannel::new(AxisPolicy::SignedByte, true),
            },
            Variant::Shooter => AxisLayout {
                x: signed,
                y: signed,
                z: signed,
            },
            // Directional y is positive for upward deflection, screen y grows downward
            Variant::Monitor => AxisLayout {
                x: signed,
                y: AxisChannel::new(AxisPolicy::Directional, true),
                z: signed,
            },
        }
    }
}

/// Policy and sign for one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisChannel {
    pub policy: AxisPolicy,
    pub invert: bool,
}

impl AxisChannel {
    pub const fn new(policy: AxisPolicy, invert: bool) -> Self {
        Self { policy, invert }
    }

    fn apply(self, value: f32) -> f32 {
        if self.invert {
            -value
        } else {
            value
        }
    }
}

/// How decoded axes map onto screen movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisLayout {
    pub x: AxisChannel,
    pub y: AxisChannel,
    pub z: AxisChannel,
}

impl AxisLayout {
    /// Same policy on every axis, no inversion
    pub fn uniform(policy: AxisPolicy) -> Self {
        let channel = AxisChannel::new(policy, false);
        Self {
            x: channel,
            y: channel,
            z: channel,
        }
    }

    pub fn policies(&self) -> AxisPolicies {
        AxisPolicies {
            x: self.x.policy,
            y: self.y.policy,
            z: self.z.policy,
        }
    }

    /// Applies the per-axis sign to a decoded triple
    pub fn orient(&self, axes: AxisTriple) -> AxisTriple {
        AxisTriple {
            x: self.x.apply(axes.x),
            y: self.y.apply(axes.y),
            z: self.z.apply(axes.z),
        }
    }
}
