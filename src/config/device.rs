// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the mfc-control project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Device gateway configuration
//!
//! Selects the driver used to talk to the data-acquisition hardware and
//! carries the connection parameters for each driver.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Driver used by the device gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceDriver {
    /// Simulated hardware returning random readings
    Mock,
    /// LabJack device through the vendor LJM library
    Labjack,
}

/// Device gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Which gateway implementation to construct at startup
    #[serde(default = "default_driver")]
    pub driver: DeviceDriver,

    /// LJM device type filter (e.g. "T7", "T4" or "ANY")
    #[serde(default = "default_any")]
    pub device_type: String,

    /// LJM connection type filter (e.g. "USB", "ETHERNET" or "ANY")
    #[serde(default = "default_any")]
    pub connection_type: String,

    /// LJM identifier (serial number, IP address, name or "ANY")
    #[serde(default = "default_any")]
    pub identifier: String,

    /// Explicit path to the LJM shared library.
    ///
    /// When absent the platform default name is resolved by the dynamic loader.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_path: Option<PathBuf>,

    /// Parameters of the simulation driver
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Range of the raw values produced by the simulation driver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Lower bound (inclusive) of simulated raw readings
    #[serde(default)]
    pub min_raw: f64,

    /// Upper bound (exclusive) of simulated raw readings
    #[serde(default = "default_max_raw")]
    pub max_raw: f64,
}

fn default_driver() -> DeviceDriver {
    DeviceDriver::Mock
}

fn default_any() -> String {
    "ANY".to_string()
}

fn default_max_raw() -> f64 {
    100.0
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            min_raw: 0.0,
            max_raw: default_max_raw(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            device_type: default_any(),
            connection_type: default_any(),
            identifier: default_any(),
            library_path: None,
            simulation: SimulationConfig::default(),
        }
    }
}
