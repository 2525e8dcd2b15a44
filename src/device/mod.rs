// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the mfc-control project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Device gateway for the data-acquisition hardware
//!
//! This module provides the hardware abstraction used by the mass flow
//! controllers. Two drivers implement [`DeviceGateway`]:
//! - LabJack: real hardware through the vendor LJM library
//! - Mock: simulation returning random readings, for testing and development
//!
//! The driver is chosen once at startup from the configuration. Callers only
//! see the trait object wrapped in a [`SharedGateway`].

pub mod error;
pub mod labjack;
pub mod mock;

pub use error::DeviceError;
pub use labjack::LabJackGateway;
pub use mock::MockGateway;

use async_trait::async_trait;
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::{DeviceConfig, DeviceDriver};

/// Named-channel access to the acquisition hardware
#[async_trait]
pub trait DeviceGateway {
    /// Send a raw value to a command channel
    async fn write(&mut self, channel: &str, value: f64) -> Result<(), DeviceError>;

    /// Fetch the raw value of a measurement channel
    async fn read(&mut self, channel: &str) -> Result<f64, DeviceError>;

    /// Release the hardware connection. Closing twice is not an error.
    async fn close(&mut self) -> Result<(), DeviceError>;

    /// Short driver name used in log messages
    fn kind(&self) -> &'static str;
}

/// The single hardware connection shared by every controller.
///
/// Every access goes through the mutex so reads and writes issued from
/// different tasks are never interleaved on the wire.
pub type SharedGateway = Arc<Mutex<Box<dyn DeviceGateway + Send + Sync>>>;

/// Wrap a gateway so it can be shared between controllers
pub fn share_gateway(gateway: Box<dyn DeviceGateway + Send + Sync>) -> SharedGateway {
    Arc::new(Mutex::new(gateway))
}

/// Create the gateway selected by the configuration.
///
/// Opening the real hardware happens here; a failure is returned to the
/// caller, which treats it as fatal.
pub fn create_gateway(config: &DeviceConfig) -> Result<Box<dyn DeviceGateway + Send + Sync>, DeviceError> {
    match config.driver {
        DeviceDriver::Mock => {
            info!("Using simulated device gateway");
            Ok(Box::new(MockGateway::new(&config.simulation)))
        }
        DeviceDriver::Labjack => {
            info!(
                "Opening LabJack device (type={}, connection={}, identifier={})",
                config.device_type, config.connection_type, config.identifier
            );
            Ok(Box::new(LabJackGateway::open(config)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_mock_gateway() {
        let config = DeviceConfig::default();
        let gateway = share_gateway(create_gateway(&config).unwrap());
        let mut guard = gateway.lock().await;
        assert_eq!(guard.kind(), "mock");
        let value = guard.read("AIN0").await.unwrap();
        assert!((0.0..100.0).contains(&value));
    }

    #[test]
    fn test_missing_ljm_library_fails_construction() {
        let config = DeviceConfig {
            driver: DeviceDriver::Labjack,
            library_path: Some("/nonexistent/libLabJackM.so".into()),
            ..DeviceConfig::default()
        };
        assert!(matches!(
            create_gateway(&config),
            Err(DeviceError::Library { .. })
        ));
    }
}
