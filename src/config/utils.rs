// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the mfc-control project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! This module provides utility functions for working with configuration
//! settings, including validation and schema management.

use std::collections::HashSet;

use anyhow::{Context, Result};
use log::{debug, warn};

use super::{Config, CONFIG_SCHEMA};

/// Output the embedded JSON schema to the console.
///
/// This function is called when the `--show-config-schema` flag is provided
/// on the command line.
///
/// ### Example
///
/// ```bash
/// ./mfc_control --show-config-schema > config_schema.json
/// ```
pub fn output_config_schema() -> Result<()> {
    let schema: serde_json::Value =
        serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;

    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;

    println!("{}", formatted_schema);

    Ok(())
}

/// Validates the configuration against rules that the JSON schema cannot express.
///
/// ### Validation Rules
///
/// - **Controllers**: at least one, with unique non-empty names and channels
/// - **Calibration**: finite, non-zero scale and finite offset and setpoint
/// - **Timing**: read interval and backoff of at least 1 ms and
///   representable as a duration, backoff not longer than the interval
/// - **Simulation**: `min_raw < max_raw`
/// - **Operator limits**: `setpoint_min < setpoint_max`, positive step,
///   at least one controller per column
///
/// ### Returns
///
/// * `Ok(())` if all validations pass
/// * `Err(anyhow::Error)` describing the first violated rule
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    debug!("Performing additional validation checks");

    if config.controllers.is_empty() {
        anyhow::bail!("At least one controller must be configured");
    }

    let mut names = HashSet::new();
    for controller in &config.controllers {
        if controller.name.trim().is_empty() {
            anyhow::bail!("Controller names must not be empty");
        }
        if !names.insert(controller.name.as_str()) {
            anyhow::bail!("Duplicate controller name: {}", controller.name);
        }
        if controller.flow_set.trim().is_empty() || controller.flow_read.trim().is_empty() {
            anyhow::bail!("Controller '{}' has an empty channel name", controller.name);
        }
        if !controller.scale.is_finite() || controller.scale == 0.0 {
            anyhow::bail!(
                "Controller '{}' has an invalid scale: {}",
                controller.name,
                controller.scale
            );
        }
        if !controller.offset.is_finite() {
            anyhow::bail!(
                "Controller '{}' has an invalid offset: {}",
                controller.name,
                controller.offset
            );
        }
        if !controller.setpoint.is_finite() {
            anyhow::bail!(
                "Controller '{}' has an invalid setpoint: {}",
                controller.name,
                controller.setpoint
            );
        }
        if controller.setpoint < config.ui.setpoint_min
            || controller.setpoint > config.ui.setpoint_max
        {
            // The operator can still correct it from the panel
            warn!(
                "Initial setpoint {} of '{}' is outside the panel range",
                controller.setpoint, controller.name
            );
        }
    }

    let acquisition = &config.acquisition;
    acquisition.read_interval_duration()?;
    acquisition.error_backoff_duration()?;
    if acquisition.error_backoff > acquisition.read_interval {
        anyhow::bail!(
            "Error backoff ({} s) must not exceed the read interval ({} s)",
            acquisition.error_backoff,
            acquisition.read_interval
        );
    }

    let simulation = &config.device.simulation;
    if !(simulation.min_raw < simulation.max_raw) {
        anyhow::bail!(
            "Simulation range is empty: [{}, {})",
            simulation.min_raw,
            simulation.max_raw
        );
    }

    let ui = &config.ui;
    if !(ui.setpoint_min < ui.setpoint_max) {
        anyhow::bail!(
            "Setpoint range is empty: [{}, {}]",
            ui.setpoint_min,
            ui.setpoint_max
        );
    }
    if !(ui.setpoint_step > 0.0) {
        anyhow::bail!("Setpoint step must be positive: {}", ui.setpoint_step);
    }
    if ui.controllers_per_column == 0 {
        anyhow::bail!("controllers_per_column must be at least 1");
    }

    Ok(())
}
