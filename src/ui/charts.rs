use eframe::egui::{Grid, ScrollArea, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoints};

use super::common::UiColors;
use crate::sensor::reading::display_value;
use crate::sensor::SensorState;

/// Line chart of all three histories, x axis is the arrival index.
pub fn sensor_chart(ui: &mut Ui, state: &SensorState) {
    if state.is_empty() {
        ui.label("Waiting for data from the device...");
        return;
    }

    let series = [
        ("Asap", state.smoke().points(), UiColors::SMOKE),
        ("Cahaya", state.light().points(), UiColors::LIGHT),
        ("Suhu", state.temperature().points(), UiColors::TEMPERATURE),
    ];

    Plot::new("sensor_chart")
        .height(260.0)
        .legend(Legend::default())
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (name, points, color) in series {
                plot_ui.line(Line::new(PlotPoints::from(points)).name(name).color(color));
            }
        });
}

/// Time-stamped table of the most recent `max_rows` readings, oldest first.
pub fn history_table(ui: &mut Ui, state: &SensorState, max_rows: usize) {
    if state.is_empty() {
        ui.label("No readings stored yet.");
        return;
    }

    let start = state.len().saturating_sub(max_rows);
    if start > 0 {
        ui.label(format!("Showing last {} of {} readings", max_rows, state.len()));
    }

    ScrollArea::vertical()
        .id_salt("history_table")
        .max_height(240.0)
        .stick_to_bottom(true)
        .show(ui, |ui| {
            Grid::new("history_grid")
                .striped(true)
                .num_columns(4)
                .show(ui, |ui| {
                    ui.strong("Time");
                    ui.strong("Asap");
                    ui.strong("Cahaya");
                    ui.strong("Suhu");
                    ui.end_row();

                    for index in start..state.len() {
                        if let Some((time, smoke, light, temperature)) = state.row(index) {
                            ui.label(time.format("%H:%M:%S").to_string());
                            ui.label(display_value(smoke));
                            ui.label(display_value(light));
                            ui.label(display_value(temperature));
                            ui.end_row();
                        }
                    }
                });
        });
}
