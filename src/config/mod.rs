// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the mfc-control project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration management for the MFC control application
//!
//! This module provides functionality for loading and validating the
//! configuration of the application. The configuration is backed by a YAML
//! file and validated against a JSON schema before being deserialized.
//!
//! ## Configuration Structure
//!
//! - `acquisition`: Polling interval and error backoff
//! - `device`: Gateway driver selection and connection parameters
//! - `datalog`: Location of the per-run CSV logs
//! - `ui`: Control panel settings
//! - `controllers`: The mass flow controllers, in display and log order
//!
//! The configuration is read once at startup and never reloaded.
//!
//! ## Usage
//!
//! ```no_run
//! use mfc_control::config::Config;
//!
//! let config = Config::from_file("mfc_config.yaml").unwrap();
//! println!("Polling every {} s", config.acquisition.read_interval);
//! ```

pub mod acquisition;
pub mod controller;
pub mod datalog;
pub mod device;
pub mod ui;
pub mod utils;

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};

pub use acquisition::AcquisitionConfig;
pub use controller::ControllerConfig;
pub use datalog::DatalogConfig;
pub use device::{DeviceConfig, DeviceDriver, SimulationConfig};
pub use ui::UiConfig;
pub use utils::{output_config_schema, validate_specific_rules};

/// JSON schema embedded in the binary, used to validate configuration files
pub const CONFIG_SCHEMA: &str = include_str!("../../resources/config.schema.json");

/// Root configuration structure.
///
/// Every section falls back to its defaults when absent from the file,
/// except `controllers` which must list at least one controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Polling loop timing
    #[serde(default)]
    pub acquisition: AcquisitionConfig,

    /// Hardware gateway selection
    #[serde(default)]
    pub device: DeviceConfig,

    /// CSV log location
    #[serde(default)]
    pub datalog: DatalogConfig,

    /// Control panel settings
    #[serde(default)]
    pub ui: UiConfig,

    /// Mass flow controllers in configured order
    pub controllers: Vec<ControllerConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            acquisition: AcquisitionConfig::default(),
            device: DeviceConfig::default(),
            datalog: DatalogConfig::default(),
            ui: UiConfig::default(),
            controllers: vec![
                ControllerConfig::new("MFC1", "TDAC0", "AIN0", 1.0, 0.0, 0.0),
                ControllerConfig::new("MFC2", "TDAC1", "AIN1", 1.0, 0.0, 0.0),
            ],
        }
    }
}

impl Config {
    /// Helper method to create a sample config file when loading fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let sample_path = path.with_extension("sample.yaml");
        debug!("Config path: {:?}, sample path: {:?}", path, sample_path);

        if let Some(parent) = sample_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create parent directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        Self::default()
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a YAML file.
    ///
    /// A missing or invalid file is an error. In both cases a
    /// `<name>.sample.yaml` file holding the default configuration is written
    /// next to the requested path so the operator has a starting point.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            error!("Configuration file not found at {:?}", path);
            Self::create_sample_config(path)?;
            anyhow::bail!("Configuration file not found: {}", path.display());
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        Self::from_yaml_str(&contents).map_err(|err| {
            if let Err(e) = Self::create_sample_config(path) {
                error!("Failed to create sample config: {}", e);
            }
            err.context(format!("Invalid configuration in {}", path.display()))
        })
    }

    /// Parse, validate and deserialize a configuration held in memory
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        // First step: convert YAML to a generic Value
        let yaml_value: serde_yml::Value =
            serde_yml::from_str(contents).context("Failed to parse YAML configuration")?;

        // Convert to JSON Value for validation
        let json_value = serde_json::to_value(&yaml_value)
            .context("Failed to convert YAML to JSON for validation")?;

        let schema: serde_json::Value =
            serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;

        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&schema)
            .map_err(|e| anyhow::anyhow!("Failed to build schema validator: {}", e))?;

        debug!("Validating configuration against schema");
        if let Err(error) = validator.validate(&json_value) {
            error!("Configuration validation error before deserialization");
            anyhow::bail!("Configuration validation failed: {}", error);
        }

        debug!("Schema validation passed, deserializing into Config structure");
        let config: Config = serde_yml::from_str(contents).map_err(|err| {
            error!("Configuration deserialization error: {}", err);
            anyhow::anyhow!("Failed to deserialize configuration: {}", err)
        })?;

        if let Err(err) = validate_specific_rules(&config) {
            error!("Configuration specific validation error: {}", err);
            return Err(err);
        }

        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Controller names in configured order
    pub fn controller_names(&self) -> Vec<String> {
        self.controllers.iter().map(|c| c.name.clone()).collect()
    }
}
