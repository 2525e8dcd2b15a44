// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the mfc-control project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Flow acquisition
//!
//! This module handles the periodic polling of the mass flow controllers:
//! - [`FlowPoller`]: the background poll loop and its command channel
//! - [`Reading`]: the result of one poll cycle
//! - [`MonitorState`]: the latest values shared with the display

pub mod poller;
pub mod reading;
pub mod shared_state;

pub use poller::{FlowPoller, PollerCommand, PollerHandle};
pub use reading::{ControllerSample, Reading};
pub use shared_state::{create_shared_monitor_state, MonitorState, PollerStatus, SharedMonitorState};
