//! Pond engine binary for the Shoal simulation.
//!
//! This is the main entry point that wires together the simulation
//! clock, the pond actor, the Dragonfly record mirror, the metric
//! series, the NATS transport, and the control surface. It loads
//! configuration, initializes all subsystems, and runs the actor loop
//! until a shutdown signal arrives.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `shoal-config.yaml`
//! 3. Create the simulation clock
//! 4. Connect to Dragonfly (fish record mirror)
//! 5. Build the metric series
//! 6. Connect to NATS, announce hello, subscribe to the shared topic
//! 7. Start the transport tasks (subscriber, publisher, link watcher)
//! 8. Start the control HTTP surface
//! 9. Assemble the pond and arm ctrl-c shutdown
//! 10. Run the pond actor and log the result

mod control;
mod error;
mod transport;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use shoal_core::clock::TickClock;
use shoal_core::config::ShoalConfig;
use shoal_core::lifecycle::{Pond, PondSettings};
use shoal_core::runner::{self, PondCommand, PondView};
use shoal_db::DragonflyStore;
use shoal_metrics::PondGauges;
use shoal_protocol::BusLink;
use shoal_types::PondName;
use tokio::sync::{RwLock, mpsc};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::control::ControlState;
use crate::error::EngineError;
use crate::transport::BusClient;

/// Application entry point for the pond engine.
///
/// Initializes all subsystems and runs the actor loop.
///
/// # Errors
///
/// Returns an error if any initialization step or the actor itself
/// fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("shoal-engine starting");

    // 2. Load configuration.
    let config = load_config()?;
    let pond_name = PondName::from(config.world.pond_name.clone());
    let topic = config.infrastructure.topic.clone();
    info!(
        pond = %pond_name,
        seed = config.world.seed,
        tick_interval_ms = config.simulation.tick_interval_ms,
        spawn_interval_secs = config.simulation.spawn_interval_secs,
        topic = %topic,
        "Configuration loaded"
    );

    // 3. Create the simulation clock.
    let clock = TickClock::new(
        config.simulation.tick_interval_ms,
        config.simulation.lifetime_decay_per_tick,
        config.simulation.spawn_interval_secs,
        Instant::now(),
    )
    .map_err(EngineError::from)?;
    info!("Simulation clock initialized");

    // 4. Connect to the fish record mirror.
    let store = DragonflyStore::connect(&config.infrastructure.dragonfly_url)
        .await
        .map_err(EngineError::from)?;

    // 5. Build the metric series.
    let gauges = PondGauges::new().map_err(EngineError::from)?;
    info!("Metric series registered");

    // 6. Connect to NATS. The initial successful connect counts as the
    //    first link-up; later transitions arrive as client events.
    let mut link = BusLink::new();
    link.connecting();
    let (bus, link_events) = BusClient::connect(&config.infrastructure.nats_url)
        .await
        .map_err(EngineError::from)?;
    link.connected();
    let subscriber = bus.subscribe(&topic).await.map_err(EngineError::from)?;
    if link.take_hello_due() {
        transport::announce(&bus, &pond_name, &topic).await;
    }

    // 7. Start the transport tasks.
    let (inbound_tx, inbound_rx) = mpsc::channel(64);
    let (command_tx, command_rx) = mpsc::channel(16);
    let (outbound_tx, outbound_rx) = mpsc::channel(16);

    tokio::spawn(transport::run_subscriber(
        subscriber,
        pond_name.clone(),
        inbound_tx,
    ));
    tokio::spawn(transport::run_publisher(bus.clone(), outbound_rx));
    tokio::spawn(transport::run_link(
        bus,
        pond_name.clone(),
        topic.clone(),
        link_events,
        link,
    ));
    info!("Transport tasks started");

    // 8. Start the control HTTP surface.
    let view = Arc::new(RwLock::new(PondView::new(topic.clone())));
    let control_state = ControlState {
        view: Arc::clone(&view),
        commands: command_tx.clone(),
        gauges: gauges.clone(),
    };
    let _control_handle =
        control::spawn_control(config.infrastructure.control_port, control_state)
            .await
            .map_err(EngineError::from)?;
    info!(
        port = config.infrastructure.control_port,
        "Control surface started"
    );

    // 9. Assemble the pond and arm ctrl-c shutdown.
    let pond = Pond::new(
        pond_name,
        PondSettings::from_config(&config.world, &config.simulation),
        config.world.seed,
        store,
        gauges,
    );

    let stop_tx = command_tx;
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = stop_tx.send(PondCommand::Stop).await;
        }
    });

    // 10. Run the pond actor.
    let report = runner::run_pond(
        pond,
        clock,
        inbound_rx,
        command_rx,
        outbound_tx,
        view,
        topic,
    )
    .await
    .map_err(EngineError::from)?;

    info!(
        end_reason = ?report.end_reason,
        total_ticks = report.total_ticks,
        total_fish = report.final_stats.total,
        "shoal-engine shutdown complete"
    );

    Ok(())
}

/// Load the pond configuration from `shoal-config.yaml`.
///
/// Looks for the config file relative to the current working
/// directory and falls back to defaults when it is absent.
fn load_config() -> Result<ShoalConfig, EngineError> {
    let config_path = Path::new("shoal-config.yaml");
    if config_path.exists() {
        let config = ShoalConfig::from_file(config_path)?;
        Ok(config)
    } else {
        info!("Config file not found, using defaults");
        Ok(ShoalConfig::default())
    }
}
