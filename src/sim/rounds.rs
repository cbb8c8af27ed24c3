//! Round Controller - score, lives and the Playing/GameOver machine
//!
//! ```text
//!            lives reach 0
//! Playing ──────────────────► GameOver
//!    ▲  │                         │
//!    │  └─ field cleared:         │ restart edge
//!    │     next round (clamped)   │
//!    └────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::entity::EntityTag;
use super::variant::Variant;
use super::world::{EntityWorld, TickOutcome};
use crate::device::ButtonEdges;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Playing,
    GameOver,
}

fn default_enemy_count() -> usize {
    10
}

/// One entry of the rounds file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub enemy_color: [u8; 3],
    #[serde(default = "default_enemy_count")]
    pub enemy_count: usize,
}

#[derive(Debug, Clone)]
pub struct RoundController {
    variant: Variant,
    rounds: Vec<Round>,
    index: usize,
    score: u64,
    lives: u32,
    state: GameState,
}

impl RoundController {
    /// A controller waiting for [`RoundController::start`].
    pub fn new(variant: Variant, rounds: Vec<Round>) -> Self {
        Self {
            variant,
            rounds,
            index: 0,
            score: 0,
            lives: variant.initial_lives(),
            state: GameState::Playing,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn round_index(&self) -> usize {
        self.index
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn current_round(&self) -> Option<&Round> {
        self.rounds.get(self.index)
    }

    /// Fresh game: score, lives, round index, world and first round population.
    pub fn start(&mut self, world: &mut EntityWorld) {
        self.index = 0;
        self.score = 0;
        self.lives = self.variant.initial_lives();
        self.state = GameState::Playing;

        world.reset();
        self.populate(world);

        info!(
            "New {:?} game: {} lives, {} rounds",
            self.variant,
            self.lives,
            self.rounds.len()
        );
    }

    /// Books one tick's outcome. Nothing happens once the game is over.
    pub fn apply(&mut self, outcome: &TickOutcome, world: &mut EntityWorld) {
        if self.state == GameState::GameOver {
            return;
        }

        self.score += outcome.points;

        if outcome.player_hit {
            self.lose_life();
        }

        if self.state == GameState::Playing
            && self.variant == Variant::Shooter
            && !self.rounds.is_empty()
            && world.count(EntityTag::Asteroid) == 0
        {
            self.advance_round(world);
        }
    }

    /// Restarts on the variant's restart edge. Returns whether it restarted.
    pub fn handle_restart(&mut self, pressed: ButtonEdges, world: &mut EntityWorld) -> bool {
        let Some(button) = self.variant.restart_button() else {
            return false;
        };
        if !pressed.contains(button) {
            return false;
        }
        if self.state == GameState::Playing && !self.variant.restart_while_playing() {
            return false;
        }

        info!("Restart requested with {}", button);
        self.start(world);
        true
    }

    /// Moves to the next round, staying on the last one, and repopulates.
    pub fn advance_round(&mut self, world: &mut EntityWorld) {
        let last = self.rounds.len().saturating_sub(1);
        self.index = (self.index + 1).min(last);
        self.populate(world);
        info!("Round {} started, score {}", self.index + 1, self.score);
    }

    fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        debug!("Life lost, {} left", self.lives);

        if self.lives == 0 {
            self.state = GameState::GameOver;
            info!("Game over with score {}", self.score);
        }
    }

    fn populate(&self, world: &mut EntityWorld) {
        if self.variant != Variant::Shooter {
            return;
        }
        if let Some(round) = self.current_round() {
            world.populate_asteroids(round.enemy_color, round.enemy_count);
        }
    }
}
