// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the mfc-control project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Simulated device gateway
//!
//! Every read returns a value drawn uniformly from the configured raw range,
//! whatever the channel. Writes have no side effect on readings; they are
//! logged and remembered so that the last commanded value of a channel can be
//! inspected.

use async_trait::async_trait;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

use super::{DeviceError, DeviceGateway};
use crate::config::SimulationConfig;

/// Simulation driver used when no hardware is attached
pub struct MockGateway {
    rng: StdRng,
    min_raw: f64,
    max_raw: f64,
    written: HashMap<String, f64>,
    closed: bool,
}

impl MockGateway {
    /// Create a simulation driver seeded from the operating system
    pub fn new(config: &SimulationConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Create a reproducible simulation driver
    pub fn with_seed(config: &SimulationConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &SimulationConfig, rng: StdRng) -> Self {
        Self {
            rng,
            min_raw: config.min_raw,
            max_raw: config.max_raw,
            written: HashMap::new(),
            closed: false,
        }
    }

    /// Last raw value written to `channel`, if any
    pub fn last_written(&self, channel: &str) -> Option<f64> {
        self.written.get(channel).copied()
    }
}

#[async_trait]
impl DeviceGateway for MockGateway {
    async fn write(&mut self, channel: &str, value: f64) -> Result<(), DeviceError> {
        if self.closed {
            return Err(DeviceError::Closed);
        }
        info!("Mock write: {} = {}", channel, value);
        self.written.insert(channel.to_string(), value);
        Ok(())
    }

    async fn read(&mut self, channel: &str) -> Result<f64, DeviceError> {
        if self.closed {
            return Err(DeviceError::Closed);
        }
        let value = self.rng.random_range(self.min_raw..self.max_raw);
        debug!("Mock read: {} = {}", channel, value);
        Ok(value)
    }

    async fn close(&mut self) -> Result<(), DeviceError> {
        self.closed = true;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "mock"
    }
}
