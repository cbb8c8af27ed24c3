//! Simulation subsystem
//!
//! 1. [`world`] - Entities, movement, collisions and spawning
//! 2. [`rounds`] - Score, lives, rounds and the game state machine
//! 3. [`runner`] - Fixed-rate loop consuming device reports
//!
//! [`variant`] holds the per-variant control layout, [`entity`] and
//! [`geometry`] the shared model.

pub mod entity;
pub mod geometry;
pub mod rounds;
pub mod runner;
pub mod variant;
pub mod world;

pub use entity::{EnemyMotion, Entity, EntityId, EntityKind, EntityTag};
pub use geometry::{Arena, Vec2};
pub use rounds::{GameState, Round, RoundController};
pub use runner::{drain_reports, EntityView, Simulation, SimulationError, SimulationHandle, WorldSnapshot};
pub use variant::{AxisChannel, AxisLayout, Variant};
pub use world::{EntityWorld, PlayerMotion, TickInput, TickOutcome, WorldSettings};
