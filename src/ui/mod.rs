//! # Sensor Dashboard
//!
//! egui front end for the bridge. The dashboard is the presentation driver:
//! every frame it asks the bridge to fold queued readings, then renders the
//! resulting [`crate::sensor::SensorState`] and offers the buzzer commands.
//!
//! ## Layout
//! - **Top Panel**: title and latest value per metric
//! - **Central Panel**: buzzer controls, chart, history table
//! - **Bottom Panel**: connection state and message counters
//!
//! Repaints are requested every `ui.refresh_ms`, so new readings show up even
//! when the window receives no input.

pub mod charts;
pub mod common;

use eframe::egui::{self, Button, Vec2};
use std::time::Duration;
use tracing::debug;

use crate::bridge::SensorBridge;

use self::common::{connection_color, metric_tile, UiColors};

/// Outcome of the last buzzer button press, as shown to the operator.
#[derive(Debug, Clone, PartialEq)]
enum CommandFeedback {
    Dispatched(String),
    Failed(String),
}

pub struct DashboardUI {
    bridge: SensorBridge,
    refresh: Duration,
    history_rows: usize,
    feedback: Option<CommandFeedback>,
}

impl DashboardUI {
    /// Takes ownership of the bridge and starts its subscriber.
    pub fn new(cc: &eframe::CreationContext<'_>, mut bridge: SensorBridge) -> Self {
        cc.egui_ctx.set_theme(egui::Theme::Dark);
        bridge.start();
        let refresh = Duration::from_millis(bridge.config().ui.refresh_ms);
        let history_rows = bridge.config().ui.history_rows;
        DashboardUI {
            bridge,
            refresh,
            history_rows,
            feedback: None,
        }
    }

    fn buzzer(&mut self, on: bool) {
        let label = if on { "Buzzer ON" } else { "Buzzer OFF" };
        self.feedback = Some(match self.bridge.set_buzzer(on) {
            Ok(()) => CommandFeedback::Dispatched(format!("{} dispatched", label)),
            Err(e) => CommandFeedback::Failed(format!("{} not sent: {}", label, e)),
        });
    }

    fn latest_values(&self, ui: &mut egui::Ui) {
        let state = self.bridge.state();
        ui.horizontal(|ui| {
            metric_tile(ui, "Asap", state.latest_smoke(), "", UiColors::SMOKE);
            metric_tile(ui, "Cahaya", state.latest_light(), "", UiColors::LIGHT);
            metric_tile(
                ui,
                "Suhu",
                state.latest_temperature(),
                "°C",
                UiColors::TEMPERATURE,
            );
        });
    }

    fn buzzer_controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("Buzzer");
        ui.horizontal(|ui| {
            let size = Vec2 { x: 140.0, y: 28.0 };
            if ui.add(Button::new("Turn buzzer on").min_size(size)).clicked() {
                self.buzzer(true);
            }
            if ui.add(Button::new("Turn buzzer off").min_size(size)).clicked() {
                self.buzzer(false);
            }
            match &self.feedback {
                Some(CommandFeedback::Dispatched(text)) => {
                    ui.colored_label(UiColors::ACTIVE, text);
                }
                Some(CommandFeedback::Failed(text)) => {
                    ui.colored_label(UiColors::INACTIVE, text);
                }
                None => {}
            }
        });
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        let status = self.bridge.status();
        let broker = &self.bridge.config().broker;
        ui.horizontal(|ui| {
            ui.colored_label(
                connection_color(status.connection_state),
                format!("● {}", status.connection_state),
            );
            ui.label(format!("{}:{}", broker.host, broker.port));
            if !self.bridge.is_running() {
                ui.colored_label(UiColors::INACTIVE, "subscriber stopped");
            }
            ui.separator();
            ui.label(format!("Received: {}", status.messages_received));
            ui.label(format!("Rejected: {}", status.messages_rejected));
            if let Some(last) = status.last_activity {
                ui.separator();
                ui.label(format!("Last message: {}", last.format("%H:%M:%S")));
            }
        });
    }
}

impl eframe::App for DashboardUI {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let folded = self.bridge.refresh();
        if folded > 0 {
            debug!("Frame picked up {} new reading(s)", folded);
        }
        ctx.request_repaint_after(self.refresh);

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.heading("IoT Sensor Dashboard");
            self.latest_values(ui);
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("bottom_panel").show(ctx, |ui| {
            self.status_bar(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.buzzer_controls(ui);
                ui.separator();

                ui.heading("Sensor chart");
                charts::sensor_chart(ui, self.bridge.state());
                ui.separator();

                ui.heading("History");
                charts::history_table(ui, self.bridge.state(), self.history_rows);
            });
        });
    }
}
