// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the mfc-control project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Mass flow controller model
//!
//! A [`MassFlowController`] knows its two hardware channels and the linear
//! calibration between raw device values and engineering units:
//!
//! ```text
//! engineering = raw * scale + offset
//! raw         = (engineering - offset) / scale
//! ```
//!
//! It talks to the hardware through the shared device gateway.

use log::debug;
use thiserror::Error;

use crate::config::ControllerConfig;
use crate::device::{DeviceError, SharedGateway};

/// Errors raised by a controller
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Controller '{name}' has an invalid calibration (scale={scale}, offset={offset})")]
    InvalidCalibration { name: String, scale: f64, offset: f64 },
    #[error("Controller '{name}' got a non-finite reading: {raw}")]
    InvalidReading { name: String, raw: f64 },
    #[error("Controller '{name}' rejected setpoint {setpoint}")]
    InvalidSetpoint { name: String, setpoint: f64 },
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// One mass flow controller
pub struct MassFlowController {
    name: String,
    flow_set: String,
    flow_read: String,
    scale: f64,
    offset: f64,
    setpoint: f64,
    gateway: SharedGateway,
}

impl std::fmt::Debug for MassFlowController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MassFlowController")
            .field("name", &self.name)
            .field("flow_set", &self.flow_set)
            .field("flow_read", &self.flow_read)
            .field("scale", &self.scale)
            .field("offset", &self.offset)
            .field("setpoint", &self.setpoint)
            .finish()
    }
}

impl MassFlowController {
    /// Build a controller from its configuration.
    ///
    /// The scale must be finite and non-zero, the offset finite.
    pub fn new(config: &ControllerConfig, gateway: SharedGateway) -> Result<Self, ControllerError> {
        if !config.scale.is_finite() || config.scale == 0.0 || !config.offset.is_finite() {
            return Err(ControllerError::InvalidCalibration {
                name: config.name.clone(),
                scale: config.scale,
                offset: config.offset,
            });
        }

        Ok(Self {
            name: config.name.clone(),
            flow_set: config.flow_set.clone(),
            flow_read: config.flow_read.clone(),
            scale: config.scale,
            offset: config.offset,
            setpoint: config.setpoint,
            gateway,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current setpoint in engineering units
    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// Convert an engineering value to the raw device value
    pub fn to_raw(&self, engineering: f64) -> f64 {
        (engineering - self.offset) / self.scale
    }

    /// Convert a raw device value to engineering units
    pub fn to_engineering(&self, raw: f64) -> f64 {
        raw * self.scale + self.offset
    }

    /// Store `setpoint` and command it to the device.
    ///
    /// The stored setpoint is updated before the write, so a failed write
    /// still leaves the requested value as the controller's setpoint.
    pub async fn set_flow(&mut self, setpoint: f64) -> Result<(), ControllerError> {
        if !setpoint.is_finite() {
            return Err(ControllerError::InvalidSetpoint {
                name: self.name.clone(),
                setpoint,
            });
        }
        self.setpoint = setpoint;
        let raw = self.to_raw(setpoint);
        debug!("{}: setpoint {} -> raw {}", self.name, setpoint, raw);
        let mut gateway = self.gateway.lock().await;
        gateway.write(&self.flow_set, raw).await?;
        Ok(())
    }

    /// Read the measured flow, in engineering units rounded to an integer.
    ///
    /// Halfway values are rounded away from zero.
    pub async fn get_flow(&self) -> Result<i64, ControllerError> {
        let raw = {
            let mut gateway = self.gateway.lock().await;
            gateway.read(&self.flow_read).await?
        };
        if !raw.is_finite() {
            return Err(ControllerError::InvalidReading {
                name: self.name.clone(),
                raw,
            });
        }
        Ok(self.to_engineering(raw).round() as i64)
    }
}
