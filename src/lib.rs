// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the mfc-control project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Mass flow controller control library
//!
//! Polls a set of mass flow controllers through a data-acquisition device,
//! logs every reading to CSV and lets an operator change the setpoints.

pub mod acquisition;
pub mod config;
pub mod daemon;
pub mod datalog;
pub mod device;
pub mod gui;
pub mod mfc;

/// Version shown in the window title
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
