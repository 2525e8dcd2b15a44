// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the mfc-control project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Shared state between the polling task and the display
//!
//! The poller is the only writer. The control panel reads it on every frame
//! without blocking. Only the latest value of each controller is kept.

use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::Reading;

/// Status of the polling task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerStatus {
    /// Task created, first cycle not started yet
    Starting,
    /// Waiting for the next interval
    Idle,
    /// Reading every controller
    Polling,
    /// Pausing after a failed cycle
    Backoff,
    /// Task terminated
    Stopped,
}

/// Latest known state of the controllers
#[derive(Debug, Clone)]
pub struct MonitorState {
    status: PollerStatus,
    flows: HashMap<String, i64>,
    setpoints: HashMap<String, f64>,
    last_update: Option<DateTime<Local>>,
    last_error: Option<String>,
    cycles: u64,
    failures: u64,
    errors: u64,
    log_path: Option<PathBuf>,
}

/// Handle to the monitor state shared across tasks
pub type SharedMonitorState = Arc<RwLock<MonitorState>>;

/// Create a shared state seeded with the initial setpoints
pub fn create_shared_monitor_state<I>(setpoints: I) -> SharedMonitorState
where
    I: IntoIterator<Item = (String, f64)>,
{
    Arc::new(RwLock::new(MonitorState::new(setpoints)))
}

impl MonitorState {
    pub fn new<I>(setpoints: I) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        Self {
            status: PollerStatus::Starting,
            flows: HashMap::new(),
            setpoints: setpoints.into_iter().collect(),
            last_update: None,
            last_error: None,
            cycles: 0,
            failures: 0,
            errors: 0,
            log_path: None,
        }
    }

    /// Store the flows of a successful cycle
    pub fn record_reading(&mut self, reading: &Reading) {
        for sample in &reading.samples {
            self.flows.insert(sample.name.clone(), sample.flow);
            self.setpoints.insert(sample.name.clone(), sample.setpoint);
        }
        self.last_update = Some(reading.timestamp);
        self.cycles += 1;
    }

    /// Store the text of a failed cycle
    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.failures += 1;
        self.record_error(message);
    }

    /// Store an error that is not a poll cycle failure (e.g. a rejected setpoint)
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors += 1;
        self.last_error = Some(message.into());
    }

    pub fn record_setpoint(&mut self, name: &str, setpoint: f64) {
        self.setpoints.insert(name.to_string(), setpoint);
    }

    pub fn set_status(&mut self, status: PollerStatus) {
        self.status = status;
    }

    pub fn set_log_path(&mut self, path: impl Into<PathBuf>) {
        self.log_path = Some(path.into());
    }

    pub fn status(&self) -> PollerStatus {
        self.status
    }

    pub fn flows(&self) -> &HashMap<String, i64> {
        &self.flows
    }

    pub fn flow(&self, name: &str) -> Option<i64> {
        self.flows.get(name).copied()
    }

    pub fn setpoint(&self, name: &str) -> Option<f64> {
        self.setpoints.get(name).copied()
    }

    pub fn last_update(&self) -> Option<DateTime<Local>> {
        self.last_update
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Number of poll cycles whose reading was published
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Number of failed poll cycles
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Number of errors recorded, cycle failures included
    pub fn error_count(&self) -> u64 {
        self.errors
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }
}
