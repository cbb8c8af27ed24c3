//! XK-12 joystick arena games
//!
//! ```text
//! XK-12 ──► device::DeviceStream ──► sim::SimulationHandle ──► ui::ArenaView
//!           (polling thread)          (fixed tick, tokio)       (eframe)
//! ```

pub mod config;
pub mod device;
pub mod sim;
pub mod ui;
