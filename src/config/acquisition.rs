// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the mfc-control project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Polling cadence configuration
//!
//! This module defines the timing parameters of the background polling loop.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shortest accepted interval or backoff
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Configuration for the flow polling loop.
///
/// Both values are expressed in seconds so that existing controller
/// configuration files can keep their fractional intervals (e.g. `0.5`).
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AcquisitionConfig {
    /// Time in seconds between the start of two consecutive poll cycles.
    ///
    /// Must be greater than zero.
    #[serde(default = "default_read_interval")]
    pub read_interval: f64,

    /// Pause in seconds after a failed poll cycle before polling resumes.
    ///
    /// Must be greater than zero and not longer than `read_interval`.
    #[serde(default = "default_error_backoff")]
    pub error_backoff: f64,
}

fn default_read_interval() -> f64 {
    1.0
}

fn default_error_backoff() -> f64 {
    1.0
}

impl AcquisitionConfig {
    /// Interval between poll cycles as a [`Duration`]
    pub fn read_interval_duration(&self) -> Result<Duration> {
        seconds_to_period("read interval", self.read_interval)
    }

    /// Backoff after a failed cycle as a [`Duration`]
    pub fn error_backoff_duration(&self) -> Result<Duration> {
        seconds_to_period("error backoff", self.error_backoff)
    }
}

/// Convert seconds to a period of at least [`MIN_PERIOD`]
fn seconds_to_period(what: &str, seconds: f64) -> Result<Duration> {
    let period = Duration::try_from_secs_f64(seconds)
        .map_err(|e| anyhow::anyhow!("Invalid {}: {} s ({})", what, seconds, e))?;
    if period < MIN_PERIOD {
        anyhow::bail!(
            "Invalid {}: {} s is shorter than {:?}",
            what,
            seconds,
            MIN_PERIOD
        );
    }
    Ok(period)
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            read_interval: default_read_interval(),
            error_backoff: default_error_backoff(),
        }
    }
}
