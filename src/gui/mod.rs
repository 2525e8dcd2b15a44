// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the mfc-control project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Operator interface
//!
//! - [`ControlPanel`]: toolkit independent model of the window
//! - [`MfcApp`]: the eframe application drawing it
//! - [`layout_image`]: loading of the optional gas line picture

pub mod app;
pub mod layout_image;
pub mod panel;

pub use app::MfcApp;
pub use layout_image::{fit_within, load_layout_image, try_load_layout_image};
pub use panel::{ControlPanel, ControllerView, PanelError, SetpointSink};
