// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the mfc-control project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Result of one poll cycle

use chrono::{DateTime, Local};
use std::collections::HashMap;

use crate::datalog::TIMESTAMP_FORMAT;

/// Setpoint and measured flow of one controller at the time of a poll
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSample {
    pub name: String,
    /// Setpoint in engineering units when the flow was read
    pub setpoint: f64,
    /// Measured flow in engineering units, rounded
    pub flow: i64,
}

/// One poll cycle worth of samples, in configured controller order
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub timestamp: DateTime<Local>,
    pub samples: Vec<ControllerSample>,
}

impl Reading {
    pub fn new(timestamp: DateTime<Local>, samples: Vec<ControllerSample>) -> Self {
        Self { timestamp, samples }
    }

    /// Measured flow of every controller, keyed by name
    pub fn flows(&self) -> HashMap<String, i64> {
        self.samples
            .iter()
            .map(|s| (s.name.clone(), s.flow))
            .collect()
    }

    /// CSV row matching [`crate::datalog::header_for`]
    pub fn to_record(&self) -> Vec<String> {
        let mut record = Vec::with_capacity(1 + 2 * self.samples.len());
        record.push(self.timestamp.format(TIMESTAMP_FORMAT).to_string());
        for sample in &self.samples {
            record.push(sample.setpoint.to_string());
            record.push(sample.flow.to_string());
        }
        record
    }
}
