//! Arena viewer
//!
//! Paints the latest [`WorldSnapshot`] from the simulation's watch channel.
//! The viewer only reads; closing the window is the signal for shutdown.

use eframe::egui::{self, pos2, vec2, Align2, Color32, FontId, Pos2, Rect, Sense, Stroke};
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

use crate::device::{ButtonState, BUTTON_COUNT};
use crate::sim::{Arena, EntityTag, GameState, Variant, WorldSnapshot};

const TURRET_LENGTH: f32 = 30.0;

const KEYPAD_COLUMNS: usize = 4;
const KEY_SIZE: f32 = 40.0;
const KEY_GAP: f32 = 10.0;
const KEY_HELD: Color32 = Color32::from_rgb(173, 216, 230);
const KEYPAD_BACKGROUND: Color32 = Color32::from_rgb(169, 169, 169);

/// Maps arena coordinates onto a screen rectangle, keeping the aspect ratio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaTransform {
    origin: Pos2,
    scale: f32,
}

impl ArenaTransform {
    pub fn fit(arena: Arena, screen: Rect) -> Self {
        let scale = (screen.width() / arena.width).min(screen.height() / arena.height);
        let used = vec2(arena.width * scale, arena.height * scale);
        let origin = screen.center() - used / 2.0;
        Self { origin, scale }
    }

    pub fn point(&self, x: f32, y: f32) -> Pos2 {
        pos2(self.origin.x + x * self.scale, self.origin.y + y * self.scale)
    }

    pub fn square(&self, x: f32, y: f32, size: f32) -> Rect {
        Rect::from_center_size(self.point(x, y), vec2(size, size) * self.scale)
    }

    pub fn length(&self, value: f32) -> f32 {
        value * self.scale
    }
}

pub struct ArenaView {
    snapshots: watch::Receiver<WorldSnapshot>,
}

impl ArenaView {
    pub fn new(_cc: &eframe::CreationContext<'_>, snapshots: watch::Receiver<WorldSnapshot>) -> Self {
        info!("Arena viewer created");
        Self { snapshots }
    }

    fn status_line(snapshot: &WorldSnapshot) -> String {
        let mut line = match snapshot.variant {
            Variant::Arcade => format!("Score: {}", snapshot.score),
            Variant::Shooter => format!(
                "Score: {}   Lives: {}   Round: {}",
                snapshot.score,
                snapshot.lives,
                snapshot.round_index + 1
            ),
            Variant::Monitor => {
                let axes = snapshot.axes;
                let last = snapshot
                    .last_report_at
                    .map(|at| at.format("%H:%M:%S%.3f").to_string())
                    .unwrap_or_else(|| "never".to_string());
                format!(
                    "X: {:+.2}   Y: {:+.2}   Twist: {:+.2}   Last report: {}",
                    axes.x, axes.y, axes.z, last
                )
            }
        };
        if !snapshot.input_connected {
            line.push_str("   (joystick disconnected)");
        }
        line
    }

    fn paint(ui: &mut egui::Ui, snapshot: &WorldSnapshot) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::hover());
        let screen = response.rect;
        painter.rect_filled(screen, 0.0, Color32::BLACK);

        let transform = ArenaTransform::fit(snapshot.arena, screen);

        for entity in &snapshot.entities {
            let [r, g, b] = entity.color;
            painter.rect_filled(
                transform.square(entity.pos.x, entity.pos.y, entity.size),
                0.0,
                Color32::from_rgb(r, g, b),
            );

            if entity.tag == EntityTag::Player && snapshot.variant.has_turret() {
                let radians = snapshot.turret_deg.to_radians();
                let tip = (
                    entity.pos.x + TURRET_LENGTH * radians.cos(),
                    entity.pos.y + TURRET_LENGTH * radians.sin(),
                );
                painter.line_segment(
                    [
                        transform.point(entity.pos.x, entity.pos.y),
                        transform.point(tip.0, tip.1),
                    ],
                    Stroke::new(transform.length(5.0), Color32::RED),
                );
            }
        }

        if snapshot.variant == Variant::Monitor {
            Self::paint_keypad(&painter, &transform, snapshot);
        }

        if snapshot.state == GameState::GameOver {
            if let Some(button) = snapshot.variant.restart_button() {
                painter.text(
                    screen.center(),
                    Align2::CENTER_CENTER,
                    format!("Game Over! Press button {} to restart", button.number()),
                    FontId::proportional(32.0),
                    Color32::RED,
                );
            }
        }
    }

    /// XK-12 key grid below the arena center, held keys filled
    fn paint_keypad(painter: &egui::Painter, transform: &ArenaTransform, snapshot: &WorldSnapshot) {
        let rows = BUTTON_COUNT.div_ceil(KEYPAD_COLUMNS);
        let width = KEYPAD_COLUMNS as f32 * (KEY_SIZE + KEY_GAP) + KEY_GAP;
        let height = rows as f32 * (KEY_SIZE + KEY_GAP) + KEY_GAP;
        let left = (snapshot.arena.width - width) / 2.0;
        let top = snapshot.arena.height / 2.0 + 50.0;

        let outline = Stroke::new(transform.length(2.0), Color32::RED);
        let pad = Rect::from_two_pos(
            transform.point(left, top),
            transform.point(left + width, top + height),
        );
        painter.rect_filled(pad, 0.0, KEYPAD_BACKGROUND);

        for (index, state) in snapshot.buttons.iter().enumerate() {
            let (row, column) = key_cell(index);
            let key = Rect::from_min_size(
                transform.point(
                    left + KEY_GAP + column as f32 * (KEY_SIZE + KEY_GAP),
                    top + KEY_GAP + row as f32 * (KEY_SIZE + KEY_GAP),
                ),
                vec2(transform.length(KEY_SIZE), transform.length(KEY_SIZE)),
            );
            if *state == ButtonState::Pressed {
                painter.rect_filled(key, 0.0, KEY_HELD);
            }
            painter.rect_stroke(key, 0.0, outline, egui::StrokeKind::Inside);
            painter.text(
                key.center(),
                Align2::CENTER_CENTER,
                (index + 1).to_string(),
                FontId::proportional(transform.length(24.0)),
                Color32::WHITE,
            );
        }
    }
}

/// Row and column of the key for latch index `index`
fn key_cell(index: usize) -> (usize, usize) {
    (index / KEYPAD_COLUMNS, index % KEYPAD_COLUMNS)
}

impl eframe::App for ArenaView {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.request_repaint_after(Duration::from_millis(16));
        let snapshot = self.snapshots.borrow_and_update().clone();

        egui::TopBottomPanel::top("status_panel")
            .show_separator_line(false)
            .show(ctx, |ui| {
                ui.label(Self::status_line(&snapshot));
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| Self::paint(ui, &snapshot));
    }
}
