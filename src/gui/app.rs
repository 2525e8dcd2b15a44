// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the mfc-control project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Desktop window
//!
//! [`MfcApp`] renders the [`ControlPanel`] with egui. Each frame it copies
//! the latest values from the shared monitor state without blocking; if the
//! poller holds the lock the previous values stay on screen.

use eframe::egui;
use log::error;
use std::time::Duration;

use super::{ControlPanel, SetpointSink};
use crate::acquisition::SharedMonitorState;

const TITLE_SIZE: f32 = 16.0;
const ENTRY_WIDTH: f32 = 80.0;

/// eframe application showing the controllers
pub struct MfcApp {
    panel: ControlPanel,
    sink: Box<dyn SetpointSink>,
    state: SharedMonitorState,
    layout_image: Option<egui::ColorImage>,
    layout_texture: Option<egui::TextureHandle>,
    repaint_after: Duration,
    seen_errors: u64,
}

impl MfcApp {
    pub fn new(
        panel: ControlPanel,
        sink: Box<dyn SetpointSink>,
        state: SharedMonitorState,
        layout_image: Option<egui::ColorImage>,
        repaint_after: Duration,
    ) -> Self {
        Self {
            panel,
            sink,
            state,
            layout_image,
            layout_texture: None,
            repaint_after,
            seen_errors: 0,
        }
    }

    /// Copy flows, setpoints and the latest poller error into the panel
    fn refresh_from_state(&mut self) {
        let Ok(state) = self.state.try_read() else {
            return;
        };

        self.panel.update_flow_labels(state.flows());

        let names: Vec<String> = self.panel.views().iter().map(|v| v.name().to_string()).collect();
        for name in names {
            if let Some(setpoint) = state.setpoint(&name) {
                // Names come from the panel itself
                let _ = self.panel.sync_setpoint(&name, setpoint);
            }
        }

        if state.error_count() != self.seen_errors {
            self.seen_errors = state.error_count();
            if let Some(message) = state.last_error() {
                self.panel.set_error(message);
            }
        }
    }

    fn controller_block(&mut self, ui: &mut egui::Ui, index: usize) {
        let Some(view) = self.panel.views().get(index).cloned() else {
            return;
        };
        let mut steps = 0;

        ui.group(|ui| {
            ui.label(
                egui::RichText::new(format!("{}:", view.name()))
                    .strong()
                    .size(TITLE_SIZE),
            );
            ui.horizontal(|ui| {
                ui.label(view.setpoint_label());
                if ui.small_button("-").clicked() {
                    steps -= 1;
                }
                if let Some(entry) = self.panel.entry_mut(view.name()) {
                    ui.add(egui::TextEdit::singleline(entry).desired_width(ENTRY_WIDTH));
                }
                if ui.small_button("+").clicked() {
                    steps += 1;
                }
            });
            ui.label(view.flow_label());
        });

        if steps != 0 {
            if let Err(e) = self.panel.step_entry(view.name(), steps) {
                self.panel.set_error(e.to_string());
            }
        }
    }
}

impl eframe::App for MfcApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.refresh_from_state();

        if let Some(image) = self.layout_image.take() {
            self.layout_texture =
                Some(ctx.load_texture("layout_image", image, egui::TextureOptions::LINEAR));
        }

        egui::TopBottomPanel::bottom("error_line").show(ctx, |ui| match self.panel.error_line() {
            Some(message) => {
                ui.colored_label(egui::Color32::RED, message);
            }
            None => {
                ui.label("");
            }
        });

        if let Some(texture) = &self.layout_texture {
            egui::SidePanel::right("layout_image")
                .resizable(false)
                .show(ctx, |ui| {
                    ui.image((texture.id(), texture.size_vec2()));
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            let columns = self.panel.columns();
            ui.horizontal_top(|ui| {
                for column in columns {
                    ui.vertical(|ui| {
                        for index in column {
                            self.controller_block(ui, index);
                        }
                    });
                }
            });

            ui.separator();
            if ui.button("Set All").clicked() {
                if let Err(e) = self.panel.apply(self.sink.as_ref()) {
                    error!("Failed to apply setpoints: {:#}", e);
                }
            }
        });

        ctx.request_repaint_after(self.repaint_after);
    }
}
