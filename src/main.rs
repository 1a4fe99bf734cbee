pub mod bridge;
pub mod config;
pub mod error;
pub mod mqtt;
pub mod sensor;
pub mod ui;

use crate::bridge::SensorBridge;
use crate::config::BridgeConfig;
use crate::ui::DashboardUI;
use color_eyre::{eyre::eyre, Result};
use eframe::egui;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config_path = BridgeConfig::default_path();
    let config = BridgeConfig::load_or_create(&config_path)
        .await
        .map_err(|e| eyre!("Failed to load {}: {}", config_path.display(), e))?;
    info!(
        "Using broker {}:{}, sensor topic {}, control topic {}",
        config.broker.host, config.broker.port, config.topics.sensor, config.topics.control
    );

    let bridge = SensorBridge::new(config, tokio::runtime::Handle::current());

    info!("Starting dashboard");
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("IoT Sensor Dashboard")
            .with_inner_size([1000.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "IoT Sensor Dashboard",
        native_options,
        Box::new(|cc| Ok(Box::new(DashboardUI::new(cc, bridge)))),
    )
    .map_err(|e| eyre!("Dashboard exited with error: {}", e))?;

    info!("Dashboard closed, shutting down");
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
        .init();
}
