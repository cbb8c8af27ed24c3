//! Simulation Loop - fixed-rate consumer of the report queue
//!
//! Each tick drains every queued report, decodes them in order and advances
//! the game by exactly one step:
//!
//! ```text
//! mpsc ──drain──► ReportDecoder ──► AxisLayout ──► EntityWorld ──► RoundController
//!                 (edges unioned,                                        │
//!                  last axes win)                        WorldSnapshot ◄─┘
//!                                                             │
//!                                                        watch channel
//! ```
//!
//! [`Simulation`] is the synchronous core and can be stepped directly.
//! [`SimulationHandle`] runs it on a tokio interval and publishes snapshots.

use chrono::{DateTime, Local};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::entity::{Entity, EntityId, EntityTag};
use super::geometry::{Arena, Vec2};
use super::rounds::{GameState, RoundController};
use super::variant::{AxisLayout, Variant};
use super::world::{EntityWorld, TickInput};
use crate::device::{AxisTriple, ButtonEdges, ButtonState, RawReport, ReportDecoder, BUTTON_COUNT};

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Tick rate must be a positive number, got {0}")]
    InvalidTickRate(f64),

    #[error("Simulation task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

/// Read-only view of one entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityView {
    pub id: EntityId,
    pub tag: EntityTag,
    pub pos: Vec2,
    pub size: f32,
    pub converted: bool,
    pub color: [u8; 3],
}

impl From<&Entity> for EntityView {
    fn from(entity: &Entity) -> Self {
        Self {
            id: entity.id,
            tag: entity.tag(),
            pos: entity.pos,
            size: entity.size,
            converted: entity.is_converted(),
            color: entity.color(),
        }
    }
}

/// Everything a renderer needs for one frame. The player comes first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub variant: Variant,
    pub state: GameState,
    pub score: u64,
    pub lives: u32,
    pub round_index: usize,
    pub arena: Arena,
    pub view_scale: f32,
    pub turret_deg: f32,
    /// Oriented axes applied on this tick
    pub axes: AxisTriple,
    /// Held state of every key, button 1 first
    pub buttons: [ButtonState; BUTTON_COUNT],
    pub input_connected: bool,
    pub last_report_at: Option<DateTime<Local>>,
    pub entities: Vec<EntityView>,
}

pub struct Simulation {
    decoder: ReportDecoder,
    layout: AxisLayout,
    world: EntityWorld,
    rounds: RoundController,
    tick: u64,
    axes: AxisTriple,
    input_connected: bool,
    last_report_at: Option<DateTime<Local>>,
}

impl Simulation {
    /// Starts a fresh game on `world`.
    pub fn new(layout: AxisLayout, mut world: EntityWorld, mut rounds: RoundController) -> Self {
        rounds.start(&mut world);
        Self {
            decoder: ReportDecoder::new(layout.policies()),
            layout,
            world,
            rounds,
            tick: 0,
            axes: AxisTriple::ZERO,
            input_connected: true,
            last_report_at: None,
        }
    }

    pub fn world(&self) -> &EntityWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut EntityWorld {
        &mut self.world
    }

    pub fn rounds(&self) -> &RoundController {
        &self.rounds
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Axes currently applied each tick, after layout orientation
    pub fn axes(&self) -> AxisTriple {
        self.axes
    }

    /// Advances one tick with the reports drained since the last one.
    ///
    /// Axes of the last report win and persist while no reports arrive, so a
    /// held stick keeps moving the player on quiet ticks instead of moving it
    /// only when a report comes in. Press edges of all reports are combined.
    /// While the game is over the world is frozen and only the restart edge is
    /// honored.
    pub fn step(&mut self, reports: &[RawReport]) -> WorldSnapshot {
        let mut pressed = ButtonEdges::empty();
        for report in reports {
            let decoded = self.decoder.decode(report);
            self.axes = self.layout.orient(decoded.axes);
            pressed.merge(decoded.pressed);
            self.last_report_at = Some(report.received_at());
        }

        let restarted = self.rounds.handle_restart(pressed, &mut self.world);

        if !restarted && self.rounds.state() == GameState::Playing {
            let input = TickInput {
                axes: self.axes,
                pressed,
            };
            let outcome = self.world.tick(&input);
            self.rounds.apply(&outcome, &mut self.world);
        }

        self.tick += 1;
        self.snapshot()
    }

    /// The producer is gone: stop applying stale axes and forget held keys.
    ///
    /// Returns `true` only on the first call.
    pub fn mark_disconnected(&mut self) -> bool {
        if !self.input_connected {
            return false;
        }
        warn!("Report stream disconnected, continuing without input");
        self.input_connected = false;
        self.axes = AxisTriple::ZERO;
        self.decoder.reset_latch();
        true
    }

    /// Receive time of the newest decoded report
    pub fn last_report_at(&self) -> Option<DateTime<Local>> {
        self.last_report_at
    }

    pub fn input_connected(&self) -> bool {
        self.input_connected
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        let entities = std::iter::once(self.world.player())
            .chain(self.world.entities())
            .map(EntityView::from)
            .collect();

        WorldSnapshot {
            tick: self.tick,
            variant: self.world.variant(),
            state: self.rounds.state(),
            score: self.rounds.score(),
            lives: self.rounds.lives(),
            round_index: self.rounds.round_index(),
            arena: self.world.arena(),
            view_scale: self.world.view_scale(),
            turret_deg: self.world.turret_deg(),
            axes: self.axes,
            buttons: *self.decoder.latch().states(),
            input_connected: self.input_connected,
            last_report_at: self.last_report_at,
            entities,
        }
    }
}

/// Takes everything currently queued. The flag is set once the sender is gone.
pub fn drain_reports(receiver: &mut mpsc::UnboundedReceiver<RawReport>) -> (Vec<RawReport>, bool) {
    let mut reports = Vec::new();
    loop {
        match receiver.try_recv() {
            Ok(report) => reports.push(report),
            Err(mpsc::error::TryRecvError::Empty) => return (reports, false),
            Err(mpsc::error::TryRecvError::Disconnected) => return (reports, true),
        }
    }
}

/// Running simulation task
pub struct SimulationHandle {
    snapshot_receiver: watch::Receiver<WorldSnapshot>,
    cancel: CancellationToken,
    task: JoinHandle<Simulation>,
}

impl SimulationHandle {
    pub fn spawn(
        simulation: Simulation,
        receiver: mpsc::UnboundedReceiver<RawReport>,
        tick_rate_hz: f64,
        cancel: CancellationToken,
    ) -> Result<Self, SimulationError> {
        if !tick_rate_hz.is_finite() || tick_rate_hz <= 0.0 {
            error!("Refusing to start simulation at {} Hz", tick_rate_hz);
            return Err(SimulationError::InvalidTickRate(tick_rate_hz));
        }
        let period = Duration::from_secs_f64(1.0 / tick_rate_hz);

        let (snapshot_sender, snapshot_receiver) = watch::channel(simulation.snapshot());

        info!("Spawning simulation task at {} Hz", tick_rate_hz);
        let task = tokio::spawn(run_simulation_loop(
            simulation,
            receiver,
            period,
            snapshot_sender,
            cancel.clone(),
        ));

        Ok(Self {
            snapshot_receiver,
            cancel,
            task,
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<WorldSnapshot> {
        self.snapshot_receiver.clone()
    }

    /// Cancels the loop and returns the simulation in its final state.
    pub async fn stop(self) -> Result<Simulation, SimulationError> {
        debug!("Stopping simulation task");
        self.cancel.cancel();
        let simulation = self.task.await?;
        info!("Simulation stopped after {} ticks", simulation.tick_count());
        Ok(simulation)
    }
}

async fn run_simulation_loop(
    mut simulation: Simulation,
    mut receiver: mpsc::UnboundedReceiver<RawReport>,
    period: Duration,
    snapshot_sender: watch::Sender<WorldSnapshot>,
    cancel: CancellationToken,
) -> Simulation {
    info!("Starting simulation loop with {:?} period", period);

    let mut interval_timer = tokio::time::interval(period);
    interval_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut ticks = 0u64;
    let mut total_reports = 0usize;
    let mut last_stats_time = Local::now();
    let stats_interval = chrono::Duration::seconds(30);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Cancellation requested, leaving simulation loop");
                break;
            }
            _ = interval_timer.tick() => {}
        }

        let (reports, disconnected) = drain_reports(&mut receiver);
        total_reports += reports.len();

        // Reports that made it out before the disconnect still count
        let mut snapshot = simulation.step(&reports);
        if disconnected && simulation.mark_disconnected() {
            snapshot = simulation.snapshot();
        }
        snapshot_sender.send_replace(snapshot);
        ticks += 1;

        let now = Local::now();
        if now - last_stats_time > stats_interval {
            let elapsed_seconds = (now - last_stats_time).num_seconds().max(1);
            info!(
                "Simulation stats: {} ticks, {} reports in {} seconds ({:.2} ticks/sec)",
                ticks,
                total_reports,
                elapsed_seconds,
                ticks as f64 / elapsed_seconds as f64
            );
            match simulation.last_report_at() {
                Some(at) => debug!("Newest report is {} ms old", (now - at).num_milliseconds()),
                None => debug!("No reports received yet"),
            }
            ticks = 0;
            total_reports = 0;
            last_stats_time = now;
        }
    }

    simulation
}
