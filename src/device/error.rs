// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the mfc-control project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use thiserror::Error;

/// Errors raised by a device gateway
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Failed to load device library '{library}': {message}")]
    Library { library: String, message: String },
    #[error("Failed to open device: {0}")]
    Open(String),
    #[error("Failed to read channel '{channel}': {message}")]
    Read { channel: String, message: String },
    #[error("Failed to write {value} to channel '{channel}': {message}")]
    Write {
        channel: String,
        value: f64,
        message: String,
    },
    #[error("Failed to close device: {0}")]
    Close(String),
    #[error("Invalid channel name '{0}'")]
    InvalidChannel(String),
    #[error("Device connection is closed")]
    Closed,
}
