// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the mfc-control project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Daemon Management
//!
//! Lifecycle of the background tasks:
//!
//! - Flow poller reading the controllers and writing the data log
//! - Heartbeat logging the poller status
//!
//! Tasks share a `watch` stop signal. [`Daemon::shutdown`] raises it and
//! [`Daemon::join`] waits for every task before closing the device.

use anyhow::{Context, Result};
use chrono::Local;
use log::{debug, error, info};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::acquisition::{create_shared_monitor_state, FlowPoller, PollerHandle, SharedMonitorState};
use crate::config::Config;
use crate::datalog::{header_for, log_file_path, CsvLogWriter};
use crate::device::SharedGateway;
use crate::mfc::MassFlowController;

const HEARTBEAT_PERIOD: Duration = Duration::from_secs(60);

/// Coordinator of the background tasks
///
/// # Fields
///
/// * `tasks` - Handles of the running tasks, awaited by [`Daemon::join`]
/// * `shutdown_tx` - Stop signal observed by every task
/// * `poller` - Command handle of the flow poller once launched
/// * `state` - Display state written by the flow poller
/// * `gateway` - Device connection closed after the tasks end
pub struct Daemon {
    tasks: Vec<JoinHandle<Result<()>>>,
    shutdown_tx: watch::Sender<bool>,
    poller: Option<PollerHandle>,
    state: Option<SharedMonitorState>,
    gateway: Option<SharedGateway>,
}

impl Default for Daemon {
    fn default() -> Self {
        Self::new()
    }
}

impl Daemon {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Daemon {
            tasks: Vec::new(),
            shutdown_tx,
            poller: None,
            state: None,
            gateway: None,
        }
    }

    /// Launch the flow poller and the heartbeat.
    ///
    /// # Errors
    ///
    /// Fails if the polling periods are invalid, a controller cannot be
    /// built from its configuration or the data log cannot be created.
    pub async fn launch(&mut self, config: &Config, gateway: SharedGateway) -> Result<()> {
        let state = self.start_flow_poller(config, gateway.clone())?;
        self.start_heartbeat(state)?;
        self.gateway = Some(gateway);
        Ok(())
    }

    fn start_flow_poller(
        &mut self,
        config: &Config,
        gateway: SharedGateway,
    ) -> Result<SharedMonitorState> {
        info!("Starting flow poller");

        let read_interval = config.acquisition.read_interval_duration()?;
        let error_backoff = config.acquisition.error_backoff_duration()?;

        let controllers = config
            .controllers
            .iter()
            .map(|c| {
                MassFlowController::new(c, gateway.clone())
                    .with_context(|| format!("Failed to create controller '{}'", c.name))
            })
            .collect::<Result<Vec<_>>>()?;

        let path = log_file_path(
            &config.datalog.directory,
            &config.datalog.file_prefix,
            &Local::now(),
        );
        let log = CsvLogWriter::open_log(&path, &header_for(config.controller_names()))
            .with_context(|| format!("Failed to create data log {}", path.display()))?;
        info!("Logging readings to {}", path.display());

        let state = create_shared_monitor_state(
            config.controllers.iter().map(|c| (c.name.clone(), c.setpoint)),
        );

        let poller = FlowPoller::new(
            controllers,
            log,
            state.clone(),
            read_interval,
            error_backoff,
        );

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let shutdown_rx = self.shutdown_tx.subscribe();
        let task = tokio::spawn(poller.run(command_rx, shutdown_rx));

        self.tasks.push(task);
        self.poller = Some(PollerHandle::new(command_tx));
        self.state = Some(state.clone());
        Ok(state)
    }

    /// Periodically log the poller status
    fn start_heartbeat(&mut self, state: SharedMonitorState) -> Result<()> {
        debug!("Starting heartbeat monitor");

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let task = tokio::spawn(async move {
            let mut interval = time::interval(HEARTBEAT_PERIOD);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let state = state.read().await;
                        debug!(
                            "Daemon heartbeat: poller {:?}, {} cycles, {} failures",
                            state.status(),
                            state.cycles(),
                            state.failures()
                        );
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            Ok(())
        });

        self.tasks.push(task);
        Ok(())
    }

    /// Command handle of the flow poller, once launched
    pub fn poller(&self) -> Option<PollerHandle> {
        self.poller.clone()
    }

    /// Display state written by the flow poller, once launched
    pub fn state(&self) -> Option<SharedMonitorState> {
        self.state.clone()
    }

    /// Signal every task to stop
    pub fn shutdown(&self) {
        info!("Shutting down daemon tasks");
        self.shutdown_tx.send_replace(true);
    }

    /// Wait for every task to complete, then close the device
    pub async fn join(self) -> Result<()> {
        for task in self.tasks {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("Task failed: {:#}", e),
                Err(e) => error!("Task panicked: {}", e),
            }
        }

        if let Some(gateway) = self.gateway {
            let mut gateway = gateway.lock().await;
            let kind = gateway.kind();
            gateway
                .close()
                .await
                .with_context(|| format!("Failed to close {} device", kind))?;
            info!("{} device closed", kind);
        }
        Ok(())
    }
}
