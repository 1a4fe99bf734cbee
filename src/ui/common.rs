//! # UI Common Components
//!
//! Shared palette and small widgets used by the dashboard panels.

use eframe::egui::{self, Color32, Frame, RichText, Stroke};

use crate::mqtt::status::ConnectionState;
use crate::sensor::reading::display_value;

/// Dark theme palette for the dashboard.
pub struct UiColors;

impl UiColors {
    /// Secondary background color for nested components (RGB: 25, 25, 25)
    pub const INNER_BG: Color32 = Color32::from_rgb(25, 25, 25);

    /// Border color for component separation (RGB: 60, 60, 60)
    pub const BORDER: Color32 = Color32::from_rgb(60, 60, 60);

    /// Connected / command dispatched (RGB: 50, 200, 20)
    pub const ACTIVE: Color32 = Color32::from_rgb(50, 200, 20);

    /// Disconnected / command failed (RGB: 200, 50, 20)
    pub const INACTIVE: Color32 = Color32::from_rgb(200, 50, 20);

    /// Connecting or reconnecting (RGB: 220, 170, 30)
    pub const PENDING: Color32 = Color32::from_rgb(220, 170, 30);

    pub const SMOKE: Color32 = Color32::from_rgb(160, 160, 170);
    pub const LIGHT: Color32 = Color32::from_rgb(240, 200, 60);
    pub const TEMPERATURE: Color32 = Color32::from_rgb(230, 90, 60);
}

pub fn connection_color(state: ConnectionState) -> Color32 {
    match state {
        ConnectionState::Connected => UiColors::ACTIVE,
        ConnectionState::Connecting | ConnectionState::Reconnecting => UiColors::PENDING,
        ConnectionState::Disconnected => UiColors::INACTIVE,
    }
}

/// Creates a bordered frame with the dashboard's margins.
pub fn create_frame(bg_color: Color32, border_color: Color32) -> Frame {
    Frame::new()
        .stroke(Stroke::new(1.0, border_color))
        .fill(bg_color)
        .inner_margin(8)
        .outer_margin(2)
}

/// One "latest value" tile: label on top, value below, `-` when absent.
pub fn metric_tile(ui: &mut egui::Ui, label: &str, value: Option<f64>, unit: &str, color: Color32) {
    create_frame(UiColors::INNER_BG, UiColors::BORDER).show(ui, |ui| {
        ui.vertical(|ui| {
            ui.label(RichText::new(label).color(color));
            let text = match value {
                Some(_) if !unit.is_empty() => format!("{} {}", display_value(value), unit),
                _ => display_value(value),
            };
            ui.label(RichText::new(text).size(28.0).strong());
        });
    });
}
