// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the mfc-control project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Background flow polling
//!
//! The [`FlowPoller`] owns the controllers and the data log. Once started
//! with [`FlowPoller::run`] it reads every controller at a fixed interval,
//! publishes the flows into the [`SharedMonitorState`] and appends one row
//! to the CSV log per successful cycle.
//!
//! Setpoint changes are sent through a [`PollerHandle`] so that every device
//! access happens from the polling task.
//!
//! ## Timing
//!
//! Cycles are started by a [`tokio::time::Interval`] with
//! [`MissedTickBehavior::Delay`]: a slow cycle pushes the following ticks
//! back instead of firing a burst, so two cycle starts are never closer than
//! the read interval. After a failed cycle the task pauses for the error
//! backoff, which never exceeds the read interval.

use anyhow::{Context, Result};
use chrono::Local;
use log::{debug, error, info, warn};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, MissedTickBehavior};

use super::{ControllerSample, PollerStatus, Reading, SharedMonitorState};
use crate::config::acquisition::MIN_PERIOD;
use crate::datalog::CsvLogWriter;
use crate::mfc::MassFlowController;

/// Commands accepted by a running poller
#[derive(Debug, Clone, PartialEq)]
pub enum PollerCommand {
    /// Set the flow of the named controllers, in the given order
    ApplySetpoints(Vec<(String, f64)>),
    /// Terminate the polling task
    Stop,
}

/// Sending side of the poller command channel
#[derive(Debug, Clone)]
pub struct PollerHandle {
    commands: mpsc::UnboundedSender<PollerCommand>,
}

impl PollerHandle {
    pub fn new(commands: mpsc::UnboundedSender<PollerCommand>) -> Self {
        Self { commands }
    }

    /// Queue new setpoints for the poller
    pub fn apply_setpoints(&self, setpoints: Vec<(String, f64)>) -> Result<()> {
        self.send(PollerCommand::ApplySetpoints(setpoints))
    }

    pub fn stop(&self) -> Result<()> {
        self.send(PollerCommand::Stop)
    }

    fn send(&self, command: PollerCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|e| anyhow::anyhow!("Flow poller is not running: {:?}", e.0))
    }
}

/// Periodic reader of the mass flow controllers
pub struct FlowPoller {
    controllers: Vec<MassFlowController>,
    log: CsvLogWriter,
    state: SharedMonitorState,
    read_interval: Duration,
    error_backoff: Duration,
}

impl FlowPoller {
    /// Create a poller.
    ///
    /// `read_interval` is raised to at least [`MIN_PERIOD`] and
    /// `error_backoff` is clamped to `read_interval`.
    pub fn new(
        controllers: Vec<MassFlowController>,
        log: CsvLogWriter,
        state: SharedMonitorState,
        read_interval: Duration,
        error_backoff: Duration,
    ) -> Self {
        let read_interval = read_interval.max(MIN_PERIOD);
        Self {
            controllers,
            log,
            state,
            read_interval,
            error_backoff: error_backoff.min(read_interval),
        }
    }

    pub fn controllers(&self) -> &[MassFlowController] {
        &self.controllers
    }

    pub fn log(&self) -> &CsvLogWriter {
        &self.log
    }

    /// Write the given setpoints to their controllers.
    ///
    /// Every entry is attempted even if an earlier one fails; the returned
    /// error lists all the failures.
    pub async fn apply_setpoints(&mut self, setpoints: &[(String, f64)]) -> Result<()> {
        let mut failures = Vec::new();

        for (name, value) in setpoints {
            let Some(controller) = self.controllers.iter_mut().find(|c| c.name() == name) else {
                failures.push(format!("unknown controller '{}'", name));
                continue;
            };

            let result = controller.set_flow(*value).await;
            let stored = controller.setpoint();
            self.state.write().await.record_setpoint(name, stored);

            match result {
                Ok(()) => info!("Setpoint of '{}' set to {}", name, value),
                Err(e) => failures.push(e.to_string()),
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            let message = failures.join("; ");
            self.state.write().await.record_error(message.clone());
            anyhow::bail!("Failed to apply setpoints: {}", message)
        }
    }

    /// Run one poll cycle: read every controller, publish the flows and
    /// append a row to the log.
    ///
    /// Nothing is published or logged if any controller fails to read.
    pub async fn poll_once(&mut self) -> Result<Reading> {
        let timestamp = Local::now();
        let mut samples = Vec::with_capacity(self.controllers.len());

        for controller in &self.controllers {
            let flow = controller
                .get_flow()
                .await
                .with_context(|| format!("Failed to read flow of '{}'", controller.name()))?;
            samples.push(ControllerSample {
                name: controller.name().to_string(),
                setpoint: controller.setpoint(),
                flow,
            });
        }

        let reading = Reading::new(timestamp, samples);
        self.state.write().await.record_reading(&reading);
        self.log
            .append(&reading)
            .context("Failed to append reading to the data log")?;

        debug!("Poll cycle complete: {:?}", reading.flows());
        Ok(reading)
    }

    async fn set_status(&self, status: PollerStatus) {
        self.state.write().await.set_status(status);
    }

    /// Poll until a [`PollerCommand::Stop`] is received, the command channel
    /// is closed or `shutdown` turns true.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<PollerCommand>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        info!(
            "Starting flow poller for {} controllers (interval {:?}, backoff {:?})",
            self.controllers.len(),
            self.read_interval,
            self.error_backoff
        );
        self.state
            .write()
            .await
            .set_log_path(self.log.path().to_path_buf());

        let mut interval = time::interval(self.read_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cycle: u64 = 0;

        self.set_status(PollerStatus::Idle).await;

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Shutdown signal received, stopping flow poller");
                        break;
                    }
                }
                command = commands.recv() => match command {
                    Some(PollerCommand::ApplySetpoints(setpoints)) => {
                        if let Err(e) = self.apply_setpoints(&setpoints).await {
                            error!("{:#}", e);
                        }
                    }
                    Some(PollerCommand::Stop) => {
                        info!("Stop command received, stopping flow poller");
                        break;
                    }
                    None => {
                        warn!("Command channel closed, stopping flow poller");
                        break;
                    }
                },
                _ = interval.tick() => {
                    cycle += 1;
                    self.set_status(PollerStatus::Polling).await;

                    match self.poll_once().await {
                        Ok(_) => self.set_status(PollerStatus::Idle).await,
                        Err(e) => {
                            error!("Poll cycle {} failed: {:#}", cycle, e);
                            {
                                let mut state = self.state.write().await;
                                state.record_failure(format!("{:#}", e));
                                state.set_status(PollerStatus::Backoff);
                            }

                            let stopped = tokio::select! {
                                _ = time::sleep(self.error_backoff) => false,
                                changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
                            };
                            if stopped {
                                info!("Shutdown signal received during backoff");
                                break;
                            }
                            self.set_status(PollerStatus::Idle).await;
                        }
                    }
                }
            }
        }

        self.set_status(PollerStatus::Stopped).await;
        info!("Flow poller stopped after {} cycles", cycle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::create_shared_monitor_state;
    use crate::config::ControllerConfig;
    use crate::datalog::header_for;
    use crate::device::{share_gateway, DeviceError, DeviceGateway};
    use async_trait::async_trait;
    use tempfile::tempdir;

    struct ConstantGateway {
        raw: f64,
        fail_channel: Option<String>,
    }

    #[async_trait]
    impl DeviceGateway for ConstantGateway {
        async fn write(&mut self, channel: &str, value: f64) -> Result<(), DeviceError> {
            if self.fail_channel.as_deref() == Some(channel) {
                return Err(DeviceError::Write {
                    channel: channel.to_string(),
                    value,
                    message: "refused".into(),
                });
            }
            Ok(())
        }

        async fn read(&mut self, _channel: &str) -> Result<f64, DeviceError> {
            Ok(self.raw)
        }

        async fn close(&mut self) -> Result<(), DeviceError> {
            Ok(())
        }

        fn kind(&self) -> &'static str {
            "constant"
        }
    }

    fn poller(dir: &std::path::Path, fail_channel: Option<&str>) -> FlowPoller {
        let gateway = share_gateway(Box::new(ConstantGateway {
            raw: 7.0,
            fail_channel: fail_channel.map(str::to_string),
        }));
        let configs = [
            ControllerConfig::new("A", "TDAC0", "AIN0", 1.0, 0.0, 10.0),
            ControllerConfig::new("B", "TDAC1", "AIN1", 2.0, 1.0, 20.0),
        ];
        let controllers = configs
            .iter()
            .map(|c| MassFlowController::new(c, gateway.clone()).unwrap())
            .collect();
        let log =
            CsvLogWriter::open_log(dir.join("log.csv"), &header_for(["A", "B"])).unwrap();
        let state = create_shared_monitor_state(
            configs.iter().map(|c| (c.name.clone(), c.setpoint)),
        );
        FlowPoller::new(
            controllers,
            log,
            state,
            Duration::from_secs(1),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_backoff_is_clamped_to_interval() {
        let dir = tempdir().unwrap();
        let poller = poller(dir.path(), None);
        assert_eq!(poller.error_backoff, Duration::from_secs(1));
    }

    #[test]
    fn test_zero_interval_is_raised_to_minimum() {
        let dir = tempdir().unwrap();
        let base = poller(dir.path(), None);
        let poller = FlowPoller::new(
            base.controllers,
            base.log,
            base.state,
            Duration::ZERO,
            Duration::ZERO,
        );
        assert_eq!(poller.read_interval, MIN_PERIOD);
        assert_eq!(poller.error_backoff, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_poll_once_publishes_flows() {
        let dir = tempdir().unwrap();
        let mut poller = poller(dir.path(), None);
        let reading = poller.poll_once().await.unwrap();
        assert_eq!(reading.flows().get("A"), Some(&7));
        assert_eq!(reading.flows().get("B"), Some(&15));

        let state = poller.state.read().await;
        assert_eq!(state.flow("B"), Some(15));
        assert_eq!(state.cycles(), 1);
    }

    #[tokio::test]
    async fn test_apply_setpoints_reports_every_failure() {
        let dir = tempdir().unwrap();
        let mut poller = poller(dir.path(), Some("TDAC0"));
        let err = poller
            .apply_setpoints(&[
                ("A".to_string(), 100.0),
                ("B".to_string(), 200.0),
                ("Z".to_string(), 1.0),
            ])
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("TDAC0"));
        assert!(err.contains("unknown controller 'Z'"));

        // B was written despite the failure on A, and A keeps the request
        assert_eq!(poller.controllers()[0].setpoint(), 100.0);
        assert_eq!(poller.controllers()[1].setpoint(), 200.0);
        let state = poller.state.read().await;
        assert_eq!(state.setpoint("B"), Some(200.0));
        assert!(state.last_error().is_some());
    }
}
