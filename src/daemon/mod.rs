// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the mfc-control project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Daemon Module
//!
//! The daemon module runs and manages the background services of the
//! application: the flow poller and a heartbeat monitor.
//!
//! ## Usage
//!
//! ```no_run
//! use mfc_control::{config::Config, daemon::Daemon, device};
//!
//! async fn run() -> anyhow::Result<()> {
//!     let config = Config::from_file("mfc_config.yaml")?;
//!     let gateway = device::share_gateway(device::create_gateway(&config.device)?);
//!
//!     let mut daemon = Daemon::new();
//!     daemon.launch(&config, gateway).await?;
//!
//!     tokio::signal::ctrl_c().await?;
//!
//!     daemon.shutdown();
//!     daemon.join().await?;
//!     Ok(())
//! }
//! ```

pub mod launch_daemon;

pub use launch_daemon::Daemon;
