use color_eyre::{eyre::eyre, Result};
use eframe::egui;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use xkarena::config::{load_config, load_rounds};
use xkarena::device::{open_device, DeviceStream};
use xkarena::sim::{EntityWorld, RoundController, Simulation, SimulationHandle, Variant};
use xkarena::ui::ArenaView;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let loaded = load_config().await?;
    let config = loaded.config.clone();
    info!("Starting {:?} at {} Hz", config.variant, config.tick_rate_hz);

    let rounds = match config.variant {
        Variant::Shooter => load_rounds(&loaded.rounds_path()).await?,
        Variant::Arcade | Variant::Monitor => Vec::new(),
    };

    let opened = open_device(config.device.vendor_id, config.device.product_id)?;
    info!("Using {}", opened.description);

    let (report_sender, report_receiver) = mpsc::unbounded_channel();
    let stream = DeviceStream::start(
        Box::new(opened.device),
        config.stream_settings(),
        report_sender,
    )?;

    let world = EntityWorld::new(
        config.variant,
        config.arena,
        config.world.clone(),
        config.rng(),
    );
    let simulation = Simulation::new(
        config.axis_layout(),
        world,
        RoundController::new(config.variant, rounds),
    );
    let cancel = CancellationToken::new();
    let sim_handle =
        SimulationHandle::spawn(simulation, report_receiver, config.tick_rate_hz, cancel.clone())?;

    info!("Starting arena viewer");
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.arena.width, config.arena.height])
            .with_title("XK-12 Arena"),
        ..Default::default()
    };

    let snapshots = sim_handle.subscribe();
    let viewer_result = eframe::run_native(
        "xkarena",
        native_options,
        Box::new(|cc| Ok(Box::new(ArenaView::new(cc, snapshots)))),
    );

    info!("Viewer closed, shutting down");
    cancel.cancel();
    match sim_handle.stop().await {
        Ok(simulation) => info!("Final score {}", simulation.rounds().score()),
        Err(e) => error!("Simulation did not stop cleanly: {}", e),
    }

    let stopped = tokio::task::spawn_blocking(move || stream.stop())
        .await
        .map_err(|e| eyre!("Failed to join device shutdown: {}", e))??;
    info!(
        "Device stream stopped ({:?}) after {} reports",
        stopped.reason, stopped.reports_sent
    );
    drop(stopped.source);

    if let Err(e) = viewer_result {
        warn!("Viewer exited with error: {}", e);
        return Err(eyre!("Viewer failed: {}", e));
    }
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
