// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the mfc-control project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Control panel model
//!
//! [`ControlPanel`] holds everything the window shows for each controller:
//! the editable setpoint field, the setpoint label and the flow label, plus
//! the error line. It does not depend on the GUI toolkit so it can be driven
//! from tests.

use log::{debug, info};
use std::collections::HashMap;
use thiserror::Error;

use crate::acquisition::PollerHandle;
use crate::config::Config;

/// Operator input errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PanelError {
    #[error("Unknown controller '{0}'")]
    UnknownController(String),
    #[error("Setpoint of '{name}' is empty")]
    Empty { name: String },
    #[error("Setpoint of '{name}' is not a number: '{input}'")]
    NotANumber { name: String, input: String },
    #[error("Setpoint of '{name}' must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Receiver of the setpoints applied from the panel
pub trait SetpointSink {
    fn apply_setpoints(&self, setpoints: Vec<(String, f64)>) -> anyhow::Result<()>;
}

impl SetpointSink for PollerHandle {
    fn apply_setpoints(&self, setpoints: Vec<(String, f64)>) -> anyhow::Result<()> {
        PollerHandle::apply_setpoints(self, setpoints)
    }
}

/// Display state of one controller
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerView {
    name: String,
    entry: String,
    setpoint_label: String,
    flow_label: String,
    pending: Option<f64>,
}

impl ControllerView {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current text of the editable setpoint field
    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn setpoint_label(&self) -> &str {
        &self.setpoint_label
    }

    pub fn flow_label(&self) -> &str {
        &self.flow_label
    }

    /// Setpoint sent to the poller and not yet seen in the monitor state
    pub fn pending(&self) -> Option<f64> {
        self.pending
    }
}

fn setpoint_text(value: f64) -> String {
    // Truncated toward zero
    format!("Setpoint: {}", value as i64)
}

fn flow_text(flow: i64) -> String {
    format!("Flowrate: {}", flow)
}

/// Per-controller display state in configured order
#[derive(Debug, Clone)]
pub struct ControlPanel {
    views: Vec<ControllerView>,
    setpoint_min: f64,
    setpoint_max: f64,
    setpoint_step: f64,
    controllers_per_column: usize,
    error: Option<String>,
}

impl ControlPanel {
    /// Build the panel from the controllers and the `ui` section
    pub fn new(config: &Config) -> Self {
        let views = config
            .controllers
            .iter()
            .map(|c| ControllerView {
                name: c.name.clone(),
                entry: c.setpoint.to_string(),
                setpoint_label: setpoint_text(c.setpoint),
                flow_label: flow_text(0),
                pending: None,
            })
            .collect();

        Self {
            views,
            setpoint_min: config.ui.setpoint_min,
            setpoint_max: config.ui.setpoint_max,
            setpoint_step: config.ui.setpoint_step,
            controllers_per_column: config.ui.controllers_per_column.max(1),
            error: None,
        }
    }

    pub fn views(&self) -> &[ControllerView] {
        &self.views
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    fn view(&self, name: &str) -> Result<&ControllerView, PanelError> {
        self.views
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| PanelError::UnknownController(name.to_string()))
    }

    fn view_mut(&mut self, name: &str) -> Result<&mut ControllerView, PanelError> {
        self.views
            .iter_mut()
            .find(|v| v.name == name)
            .ok_or_else(|| PanelError::UnknownController(name.to_string()))
    }

    /// Mutable access to the editable field of `name`
    pub fn entry_mut(&mut self, name: &str) -> Option<&mut String> {
        self.view_mut(name).ok().map(|v| &mut v.entry)
    }

    /// Replace the text of the editable field of `name`
    pub fn set_entry(&mut self, name: &str, text: impl Into<String>) -> Result<(), PanelError> {
        self.view_mut(name)?.entry = text.into();
        Ok(())
    }

    fn parse_entry(&self, view: &ControllerView) -> Result<f64, PanelError> {
        let input = view.entry.trim();
        if input.is_empty() {
            return Err(PanelError::Empty {
                name: view.name.clone(),
            });
        }
        let value: f64 = input.parse().map_err(|_| PanelError::NotANumber {
            name: view.name.clone(),
            input: input.to_string(),
        })?;
        if !value.is_finite() {
            return Err(PanelError::NotANumber {
                name: view.name.clone(),
                input: input.to_string(),
            });
        }
        if value < self.setpoint_min || value > self.setpoint_max {
            return Err(PanelError::OutOfRange {
                name: view.name.clone(),
                value,
                min: self.setpoint_min,
                max: self.setpoint_max,
            });
        }
        Ok(value)
    }

    fn ordered_setpoints(&self) -> Result<Vec<(String, f64)>, PanelError> {
        self.views
            .iter()
            .map(|v| Ok((v.name.clone(), self.parse_entry(v)?)))
            .collect()
    }

    /// Parse every editable field.
    ///
    /// Fails on the first empty, non-numeric or out-of-range field.
    pub fn get_setpoints(&self) -> Result<HashMap<String, f64>, PanelError> {
        Ok(self.ordered_setpoints()?.into_iter().collect())
    }

    /// Show the latest measured flows. Unknown names are ignored.
    pub fn update_flow_labels(&mut self, flows: &HashMap<String, i64>) {
        for (name, flow) in flows {
            match self.view_mut(name) {
                Ok(view) => view.flow_label = flow_text(*flow),
                Err(_) => debug!("Ignoring flow of unknown controller '{}'", name),
            }
        }
    }

    pub fn update_setpoint_label(&mut self, name: &str, setpoint: f64) -> Result<(), PanelError> {
        self.view_mut(name)?.setpoint_label = setpoint_text(setpoint);
        Ok(())
    }

    /// Show the setpoint stored by the poller.
    ///
    /// While a value sent by [`ControlPanel::apply`] is pending, the label
    /// keeps that value until the poller reports it.
    pub fn sync_setpoint(&mut self, name: &str, stored: f64) -> Result<(), PanelError> {
        let view = self.view_mut(name)?;
        if let Some(pending) = view.pending {
            if pending != stored {
                return Ok(());
            }
            view.pending = None;
        }
        view.setpoint_label = setpoint_text(stored);
        Ok(())
    }

    /// Send every field to `sink` in configured order, then refresh the
    /// setpoint labels.
    ///
    /// Nothing is sent if any field is invalid. Failures are also shown on
    /// the error line.
    pub fn apply(&mut self, sink: &dyn SetpointSink) -> anyhow::Result<()> {
        let setpoints = match self.ordered_setpoints() {
            Ok(setpoints) => setpoints,
            Err(e) => {
                self.set_error(e.to_string());
                return Err(e.into());
            }
        };

        if let Err(e) = sink.apply_setpoints(setpoints.clone()) {
            self.set_error(format!("{:#}", e));
            return Err(e);
        }

        for (name, value) in &setpoints {
            self.update_setpoint_label(name, *value)?;
            self.view_mut(name)?.pending = Some(*value);
        }
        info!("Applied {} setpoints", setpoints.len());
        self.clear_error();
        Ok(())
    }

    /// Move the field of `name` by `steps` increments, clamped to the
    /// setpoint range. An unparseable field restarts from the minimum.
    pub fn step_entry(&mut self, name: &str, steps: i32) -> Result<f64, PanelError> {
        let (min, max, step) = (self.setpoint_min, self.setpoint_max, self.setpoint_step);
        let current = self
            .view(name)?
            .entry
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(min);
        let value = (current + f64::from(steps) * step).clamp(min, max);
        self.view_mut(name)?.entry = value.to_string();
        Ok(value)
    }

    /// `(column, row)` of the controller at `index`, filling columns first
    pub fn grid_position(&self, index: usize) -> (usize, usize) {
        (
            index / self.controllers_per_column,
            index % self.controllers_per_column,
        )
    }

    /// Indices of the controllers, grouped by column
    pub fn columns(&self) -> Vec<Vec<usize>> {
        let mut columns: Vec<Vec<usize>> = Vec::new();
        for index in 0..self.views.len() {
            let (column, _) = self.grid_position(index);
            if columns.len() <= column {
                columns.resize_with(column + 1, Vec::new);
            }
            columns[column].push(index);
        }
        columns
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Text of the most recent failure, if any
    pub fn error_line(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
