//! `nfcwatch`: watch a USB NFC reader and log connection and tag changes.
//!
//! Runs the poll loop against the simulated reader until Ctrl-C. Logging is
//! controlled with `RUST_LOG` (default `info`).

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use nfcwatch_hardware::AnyReaderDevice;
use nfcwatch_hardware::mock::{MockReader, MockTag};
use nfcwatch_monitor::{EventBus, spawn_event_logger, spawn_monitor_with_bus};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = cli.monitor_config();
    config.validate().context("invalid configuration")?;

    let (reader, handle) = MockReader::new();
    if let Some(device_type) = cli.device_type {
        handle.set_device_type(device_type);
    }
    if let Some(uid) = cli.demo_uid {
        info!(uid = %uid, text = %cli.demo_text, "placing demo tag on simulated reader");
        handle.present_tag(MockTag::new(uid.to_le_bytes()).with_text(cli.demo_text.as_str()));
    }

    let bus = Arc::new(EventBus::new(config.event_capacity));
    let logger = spawn_event_logger(bus.subscribe());
    let monitor = spawn_monitor_with_bus(AnyReaderDevice::Mock(reader), config, bus)
        .context("failed to start reader monitor")?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown requested");

    monitor
        .shutdown()
        .await
        .context("reader monitor did not stop cleanly")?;
    logger.await.context("event logger task failed")?;

    Ok(())
}
