// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the mfc-control project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Operator interface configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for the desktop control panel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Window title, the crate version is appended at runtime
    #[serde(default = "default_title")]
    pub title: String,

    /// Static picture of the gas line layout shown next to the controllers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_image: Option<PathBuf>,

    /// Number of controller blocks stacked in one column
    #[serde(default = "default_controllers_per_column")]
    pub controllers_per_column: usize,

    /// Longest side of the layout image once resized, in pixels
    #[serde(default = "default_image_max_size")]
    pub image_max_size: u32,

    /// Smallest setpoint accepted from the operator
    #[serde(default)]
    pub setpoint_min: f64,

    /// Largest setpoint accepted from the operator
    #[serde(default = "default_setpoint_max")]
    pub setpoint_max: f64,

    /// Increment applied by the spin buttons
    #[serde(default = "default_setpoint_step")]
    pub setpoint_step: f64,
}

fn default_title() -> String {
    "MFC Controller".to_string()
}

fn default_controllers_per_column() -> usize {
    4
}

fn default_image_max_size() -> u32 {
    400
}

fn default_setpoint_max() -> f64 {
    100_000.0
}

fn default_setpoint_step() -> f64 {
    100.0
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            layout_image: None,
            controllers_per_column: default_controllers_per_column(),
            image_max_size: default_image_max_size(),
            setpoint_min: 0.0,
            setpoint_max: default_setpoint_max(),
            setpoint_step: default_setpoint_step(),
        }
    }
}
