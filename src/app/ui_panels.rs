//! UI panels for the application
//!
//! Reusable panels for the sidebar (variable selection, breakdown results,
//! datasets, map settings), the bike-lane legend overlay, and the help
//! overlay. Every panel takes the application state explicitly.

use crate::app::plugin::LANE_COLOR;
use crate::app::state::{AppState, TilesProvider};
use crate::data::{AggregateError, Variable};
use egui::{Color32, RichText, Stroke, Ui};

/// Render the sidebar with all control panels.
pub fn render_sidebar(ctx: &egui::Context, state: &mut AppState) {
    if !state.ui_settings.sidebar_open {
        return;
    }

    egui::SidePanel::right("sidebar")
        .resizable(true)
        .default_width(260.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                variable_panel(ui, state);
                ui.separator();
                results_panel(ui, state);
                ui.separator();
                datasets_panel(ui, state);
                ui.separator();
                settings_panel(ui, state);
            });
        });
}

/// Render the variable-selection menu (single choice).
pub fn variable_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Select Variable");
    ui.add_space(4.0);

    for variable in Variable::all() {
        let selected = state.selected_variable == Some(*variable);
        if ui.radio(selected, variable.name()).clicked() {
            state.select_variable(*variable);
        }
    }
}

/// Render the compute trigger and the breakdown result lines.
pub fn results_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Breakdown");
    ui.add_space(4.0);

    if ui
        .add_enabled(state.data_ready(), egui::Button::new("Compute"))
        .clicked()
    {
        state.compute_breakdown();
    }

    if let Some(error) = state.loader.error {
        ui.add_space(4.0);
        ui.label(RichText::new(error).color(Color32::RED));
        return;
    }

    let Some(result) = &state.last_breakdown else {
        ui.label(
            RichText::new("Select a variable and press Compute")
                .small()
                .italics()
                .weak(),
        );
        return;
    };

    ui.add_space(4.0);
    match result {
        Ok(breakdown) => {
            for entry in breakdown.entries() {
                ui.horizontal(|ui| {
                    ui.label(format!("{}:", entry.label));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(RichText::new(format!("{:.1}%", entry.percent)).strong());
                    });
                });
            }
        }
        Err(AggregateError::NoVariableSelected) => {
            ui.label("Select a variable first.");
        }
        Err(AggregateError::NoData) => {
            ui.label("No accident data loaded.");
        }
    }
}

/// Render the dataset loading status and loaded file list.
pub fn datasets_panel(ui: &mut Ui, state: &AppState) {
    ui.heading("Datasets");
    ui.add_space(4.0);

    if state.loader.is_loading() {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label("Loading datasets...");
        });
        return;
    }

    for file in &state.loader.loaded_files {
        ui.label(
            RichText::new(format!(
                "✓ {}",
                file.file_name().unwrap_or_default().to_string_lossy()
            ))
            .small()
            .color(Color32::GREEN),
        );
    }

    if let Some(error) = state.loader.error {
        ui.label(RichText::new(error).small().color(Color32::RED));
    }

    if state.data_ready() {
        ui.add_space(4.0);
        ui.label(format!("Accidents: {}", state.stats.accident_count));
        ui.label(format!("Lane paths: {}", state.stats.lane_path_count));
        ui.label(
            RichText::new(format!(
                "Markers in view: {}",
                state.stats.markers_rendered
            ))
            .small()
            .weak(),
        );
        ui.label(
            RichText::new(format!("Map render: {:.1} ms", state.stats.last_render_ms))
                .small()
                .weak(),
        );
    }
}

/// Render the map settings section.
pub fn settings_panel(ui: &mut Ui, state: &mut AppState) {
    ui.collapsing("Map", |ui| {
        ui.label("Tile Provider");
        for provider in TilesProvider::all() {
            let selected = state.ui_settings.tiles_provider == *provider;
            if ui.selectable_label(selected, provider.name()).clicked() {
                state.ui_settings.tiles_provider = *provider;
            }
        }

        ui.add_space(4.0);
        ui.horizontal(|ui| {
            ui.label("Marker Radius:");
            ui.add(
                egui::Slider::new(&mut state.ui_settings.marker_radius, 1.0..=10.0)
                    .suffix(" px")
                    .step_by(0.5),
            );
        });

        ui.checkbox(&mut state.ui_settings.show_legend, "Show legend");
    });
}

/// Button overlaid on the map to toggle the sidebar.
pub fn sidebar_toggle_button(ui: &mut Ui, state: &mut AppState) {
    let icon = if state.ui_settings.sidebar_open {
        "▶"
    } else {
        "◀"
    };
    let rect = egui::Rect::from_min_size(
        ui.max_rect().right_top() + egui::vec2(-36.0, 8.0),
        egui::vec2(28.0, 28.0),
    );
    if ui.put(rect, egui::Button::new(icon)).clicked() {
        state.ui_settings.sidebar_open = !state.ui_settings.sidebar_open;
    }
}

/// Static legend for the bike-lane overlay, bottom-left of the map.
pub fn legend_overlay(ui: &Ui) {
    let map_rect = ui.max_rect();

    egui::Area::new(egui::Id::new("lane_legend"))
        .pivot(egui::Align2::LEFT_BOTTOM)
        .fixed_pos(map_rect.left_bottom() + egui::vec2(10.0, -24.0))
        .show(ui.ctx(), |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.horizontal(|ui| {
                    let (response, painter) =
                        ui.allocate_painter(egui::vec2(20.0, 8.0), egui::Sense::hover());
                    let swatch = response.rect;
                    painter.line_segment(
                        [swatch.left_center(), swatch.right_center()],
                        Stroke::new(4.0, LANE_COLOR),
                    );
                    ui.label("Bike lanes");
                });
            });
        });
}

/// Render the help overlay
pub fn help_overlay(ctx: &egui::Context, show: &mut bool) {
    egui::Window::new("Help")
        .open(show)
        .collapsible(false)
        .resizable(true)
        .default_width(400.0)
        .show(ctx, |ui| {
            ui.heading("Bike Accident Map");
            ui.separator();

            ui.label("An interactive map of bicycle accidents and the bike-lane network.");
            ui.add_space(8.0);

            ui.label(RichText::new("🖱 Map Controls").strong());
            ui.label("• Left drag: Pan the map");
            ui.label("• Mouse wheel: Zoom in/out");
            ui.label("• Click a marker: Inspect one accident");
            ui.add_space(8.0);

            ui.label(RichText::new("🎨 Coloring").strong());
            ui.label("• Pick a variable to color the markers");
            ui.label("• Bike Lane: green on-lane, red off-lane");
            ui.label("• Accident Type: red fatal, yellow injury, green none");
            ui.add_space(8.0);

            ui.label(RichText::new("📊 Breakdown").strong());
            ui.label("• Press Compute for the category percentages");
            ui.label("• Percentages cover all loaded accidents");
            ui.add_space(8.0);

            ui.separator();
            ui.label(
                RichText::new("Press F1 to toggle this help")
                    .small()
                    .italics(),
            );
        });
}
