// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the mfc-control project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Mass flow controller configuration

use serde::{Deserialize, Serialize};

/// Static description of one mass flow controller.
///
/// The calibration maps raw device values to engineering units with
/// `engineering = raw * scale + offset`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Human readable name, unique across all controllers
    pub name: String,

    /// Channel written to command a flow (e.g. "TDAC0")
    pub flow_set: String,

    /// Channel read to measure the flow (e.g. "AIN0")
    pub flow_read: String,

    /// Calibration slope, must not be zero
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// Calibration offset in engineering units
    #[serde(default)]
    pub offset: f64,

    /// Setpoint shown at startup, in engineering units
    #[serde(default)]
    pub setpoint: f64,
}

fn default_scale() -> f64 {
    1.0
}

impl ControllerConfig {
    /// Convenience constructor used by defaults and tests
    pub fn new(
        name: impl Into<String>,
        flow_set: impl Into<String>,
        flow_read: impl Into<String>,
        scale: f64,
        offset: f64,
        setpoint: f64,
    ) -> Self {
        Self {
            name: name.into(),
            flow_set: flow_set.into(),
            flow_read: flow_read.into(),
            scale,
            offset,
            setpoint,
        }
    }
}
