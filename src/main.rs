// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the mfc-control project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Main entry point for the mass flow controller station
use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;
use log::info;
use std::path::PathBuf;
use tokio::runtime::Runtime;
use tokio::signal;

use mfc_control::config::{self, Config, DeviceDriver};
use mfc_control::daemon::Daemon;
use mfc_control::device::{create_gateway, share_gateway};
use mfc_control::gui::{try_load_layout_image, ControlPanel, MfcApp};
use mfc_control::VERSION;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file (default: mfc_config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Validate a configuration file and exit
    #[arg(long)]
    validate_config: Option<PathBuf>,

    /// Print the configuration JSON schema and exit
    #[arg(long)]
    show_config_schema: bool,

    /// Use the simulated device whatever the configuration says
    #[arg(long)]
    mock: bool,

    /// Run without a window until Ctrl-C
    #[arg(long)]
    headless: bool,

    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.quiet {
        log::LevelFilter::Off
    } else if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if args.show_config_schema {
        return config::output_config_schema();
    }

    if let Some(validate_path) = args.validate_config {
        if !validate_path.exists() {
            return Err(anyhow::anyhow!(
                "Configuration file does not exist: {}",
                validate_path.display()
            ));
        }

        Config::from_file(&validate_path)
            .map_err(|err| anyhow::anyhow!("Configuration validation failed: {:#}", err))?;
        println!("Configuration file is valid: {}", validate_path.display());
        return Ok(());
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("mfc_config.yaml"));
    let mut config = Config::from_file(&config_path)?;
    if args.mock {
        info!("Simulation forced from the command line");
        config.device.driver = DeviceDriver::Mock;
    }

    let gateway = share_gateway(create_gateway(&config.device).context("Failed to open the device")?);

    let runtime = Runtime::new().context("Failed to start the async runtime")?;
    let mut daemon = Daemon::new();
    runtime.block_on(daemon.launch(&config, gateway))?;

    let outcome = if args.headless {
        info!("Running headless, press Ctrl-C to stop");
        runtime
            .block_on(signal::ctrl_c())
            .context("Failed to wait for the shutdown signal")
    } else {
        run_window(&config, &daemon)
    };

    info!("Terminating");
    daemon.shutdown();
    runtime.block_on(daemon.join())?;
    outcome
}

/// Run the control window on the main thread until it is closed
fn run_window(config: &Config, daemon: &Daemon) -> Result<()> {
    let sink = daemon
        .poller()
        .context("Flow poller is not running")?;
    let state = daemon.state().context("Flow poller is not running")?;

    let panel = ControlPanel::new(config);
    let layout_image =
        try_load_layout_image(config.ui.layout_image.as_deref(), config.ui.image_max_size);
    let app = MfcApp::new(
        panel,
        Box::new(sink),
        state,
        layout_image,
        config.acquisition.read_interval_duration()?,
    );

    let title = format!("{} v{}", config.ui.title, VERSION);
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_title(&title),
        ..Default::default()
    };

    eframe::run_native(&title, options, Box::new(|_cc| Ok(Box::new(app))))
        .map_err(|e| anyhow::anyhow!("Window error: {}", e))
}
