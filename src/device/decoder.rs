//! Report decoding: button edges and normalized axes
//!
//! The XK-12 reports its 12 keys as four column bytes with three bits each.
//! Buttons are numbered column-major, so the bit layout does not follow the
//! button numbers:
//!
//! ```text
//!            bit 0   bit 1   bit 2
//! column 0     1       5       9
//! column 1     2       6      10
//! column 2     3       7      11
//! column 3     4       8      12
//! ```
//!
//! Decoding keeps a [`ButtonLatch`] between reports so a held key produces a
//! single press edge. Axes are derived fresh from every report using an
//! [`AxisPolicy`] per axis; any sign flip for screen coordinates is left to
//! the caller.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use super::report::{RawReport, BUTTON_COLUMNS};

/// Number of keys on the XK-12
pub const BUTTON_COUNT: usize = 12;

/// Column → button number table, indexed `[column][bit]`
pub const BUTTON_MAP: [[u8; 3]; BUTTON_COLUMNS] = [[1, 5, 9], [2, 6, 10], [3, 7, 11], [4, 8, 12]];

/// 1-based button number as printed on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ButtonId(u8);

impl ButtonId {
    /// Returns `None` outside `1..=12`.
    pub const fn new(number: u8) -> Option<Self> {
        if number >= 1 && number as usize <= BUTTON_COUNT {
            Some(Self(number))
        } else {
            None
        }
    }

    pub const fn number(self) -> u8 {
        self.0
    }

    /// Position in the [`ButtonLatch`]
    pub const fn index(self) -> usize {
        self.0 as usize - 1
    }
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "button {}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ButtonState {
    #[default]
    Released,
    Pressed,
}

/// Last observed state of every button
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ButtonLatch([ButtonState; BUTTON_COUNT]);

impl ButtonLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, button: ButtonId) -> ButtonState {
        self.0[button.index()]
    }

    pub fn is_pressed(&self, button: ButtonId) -> bool {
        self.get(button) == ButtonState::Pressed
    }

    pub fn states(&self) -> &[ButtonState; BUTTON_COUNT] {
        &self.0
    }

    pub fn clear(&mut self) {
        self.0 = [ButtonState::Released; BUTTON_COUNT];
    }
}

/// Set of buttons that went from released to pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ButtonEdges(u16);

impl ButtonEdges {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, button: ButtonId) {
        self.0 |= 1 << button.index();
    }

    pub fn contains(&self, button: ButtonId) -> bool {
        self.0 & (1 << button.index()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Adds every edge of `other`
    pub fn merge(&mut self, other: ButtonEdges) {
        self.0 |= other.0;
    }

    /// Buttons in ascending order
    pub fn iter(&self) -> impl Iterator<Item = ButtonId> + '_ {
        (1..=BUTTON_COUNT as u8)
            .filter_map(ButtonId::new)
            .filter(move |button| self.contains(*button))
    }
}

impl FromIterator<ButtonId> for ButtonEdges {
    fn from_iter<I: IntoIterator<Item = ButtonId>>(iter: I) -> Self {
        let mut edges = Self::empty();
        for button in iter {
            edges.insert(button);
        }
        edges
    }
}

/// Normalized joystick position: x, y and twist
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisTriple {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl AxisTriple {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// How a raw axis byte maps onto `[-1.0, 1.0]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AxisPolicy {
    /// Byte read as a signed value around 0: `v > 128 → (v - 256) / 128`,
    /// otherwise `v / 127`.
    #[default]
    SignedByte,
    /// Offset binary around 128: `v <= 128 → (v - 128) / 128`,
    /// otherwise `(v - 128) / 127`. 0 → -1.0, 128 → 0.0, 255 → 1.0.
    Midpoint,
    /// Split at 127: `v <= 127 → (v - 127) / 127` (downward half),
    /// otherwise `(255 - v) / 128` (upward half).
    Directional,
}

impl AxisPolicy {
    pub fn normalize(self, raw: u8) -> f32 {
        let value = raw as f32;
        match self {
            AxisPolicy::SignedByte => {
                if raw > 128 {
                    (value - 256.0) / 128.0
                } else {
                    value / 127.0
                }
            }
            AxisPolicy::Midpoint => {
                if raw > 128 {
                    (value - 128.0) / 127.0
                } else {
                    (value - 128.0) / 128.0
                }
            }
            AxisPolicy::Directional => {
                if raw <= 127 {
                    (value - 127.0) / 127.0
                } else {
                    (255.0 - value) / 128.0
                }
            }
        }
    }
}

/// Normalization policy for each axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AxisPolicies {
    pub x: AxisPolicy,
    pub y: AxisPolicy,
    pub z: AxisPolicy,
}

impl AxisPolicies {
    pub fn uniform(policy: AxisPolicy) -> Self {
        Self {
            x: policy,
            y: policy,
            z: policy,
        }
    }
}

/// Result of decoding one report
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DecodedReport {
    pub axes: AxisTriple,
    pub pressed: ButtonEdges,
}

/// Decodes one report, updating `latch` in place.
///
/// Only released → pressed transitions are returned. A pressed → released
/// transition rearms the latch so the next press reports again.
pub fn decode(report: &RawReport, latch: &mut ButtonLatch, policies: &AxisPolicies) -> DecodedReport {
    let mut pressed = ButtonEdges::empty();

    for (column, buttons) in BUTTON_MAP.iter().enumerate() {
        let byte_value = report.button_column(column);
        for (bit, number) in buttons.iter().enumerate() {
            let index = *number as usize - 1;
            let down = byte_value & (1 << bit) != 0;
            match (down, latch.0[index]) {
                (true, ButtonState::Released) => {
                    latch.0[index] = ButtonState::Pressed;
                    if let Some(button) = ButtonId::new(*number) {
                        pressed.insert(button);
                    }
                }
                (false, ButtonState::Pressed) => latch.0[index] = ButtonState::Released,
                _ => {}
            }
        }
    }

    let [raw_x, raw_y, raw_z] = report.raw_axes();
    let axes = AxisTriple {
        x: policies.x.normalize(raw_x),
        y: policies.y.normalize(raw_y),
        z: policies.z.normalize(raw_z),
    };

    DecodedReport { axes, pressed }
}

/// Stateful decoder owning the latch for one device
#[derive(Debug, Clone, Default)]
pub struct ReportDecoder {
    latch: ButtonLatch,
    policies: AxisPolicies,
}

impl ReportDecoder {
    pub fn new(policies: AxisPolicies) -> Self {
        Self {
            latch: ButtonLatch::new(),
            policies,
        }
    }

    pub fn decode(&mut self, report: &RawReport) -> DecodedReport {
        let decoded = decode(report, &mut self.latch, &self.policies);
        if !decoded.pressed.is_empty() {
            let names: Vec<String> = decoded.pressed.iter().map(|b| b.number().to_string()).collect();
            debug!("Buttons {} pressed", names.join(" and "));
        }
        decoded
    }

    pub fn latch(&self) -> &ButtonLatch {
        &self.latch
    }

    pub fn policies(&self) -> &AxisPolicies {
        &self.policies
    }

    /// Forgets every held button
    pub fn reset_latch(&mut self) {
        self.latch.clear();
    }
}
