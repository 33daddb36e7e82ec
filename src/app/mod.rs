//! Application module
//!
//! Main application structure:
//! - Full-screen map view with the lane network drawn below accident markers
//! - Sidebar with the variable menu, breakdown results and dataset status
//! - One-shot startup load of the two GeoJSON datasets on a background task
//! - Bike-lane legend and help overlays

mod plugin;
pub(crate) mod settings;
mod state;
mod ui_panels;

use crate::app::plugin::{AccidentPlugin, LanePlugin, RenderStats};
use crate::app::settings::Settings;
use crate::app::state::{AppState, TilesProvider};
use eframe::egui;
use std::sync::{Arc, RwLock};
use walkers::{
    HttpTiles, Map, MapMemory, TileId,
    sources::{Attribution, OpenStreetMap, TileSource},
};

/// Custom OpenTopoMap tile source
pub struct OpenTopoMap;

impl TileSource for OpenTopoMap {
    fn tile_url(&self, tile_id: TileId) -> String {
        format!(
            "https://tile.opentopomap.org/{}/{}/{}.png",
            tile_id.zoom, tile_id.x, tile_id.y
        )
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: "© OpenTopoMap (CC-BY-SA)",
            url: "https://opentopomap.org/",
            logo_light: None,
            logo_dark: None,
        }
    }

    fn max_zoom(&self) -> u8 {
        17 // OpenTopoMap has max zoom of 17
    }
}

/// Main application structure
pub struct BikeAccidentMapApp {
    /// Application state (datasets, selection, UI settings)
    state: AppState,

    /// Initial map position from the CLI settings
    home: walkers::Position,

    /// Map tiles provider (OpenStreetMap)
    tiles_osm: HttpTiles,

    /// Map tiles provider (OpenTopoMap)
    tiles_otm: HttpTiles,

    /// Map state (camera position, zoom, etc.)
    map_memory: MapMemory,

    /// Show help overlay
    show_help: bool,

    /// Shared render statistics (updated by the accident plugin each frame)
    render_stats: Arc<RwLock<RenderStats>>,
}

impl BikeAccidentMapApp {
    pub fn new(settings: Settings, cc: &eframe::CreationContext<'_>) -> Self {
        let state = AppState::new(&settings);

        let tiles_osm = HttpTiles::new(OpenStreetMap, cc.egui_ctx.clone());
        let tiles_otm = HttpTiles::new(OpenTopoMap, cc.egui_ctx.clone());

        let mut map_memory = MapMemory::default();
        let _ = map_memory.set_zoom(settings.zoom);

        tracing::info!(
            "Initialized at ({}, {}), zoom {}",
            settings.center_lat,
            settings.center_lon,
            settings.zoom
        );

        Self {
            state,
            home: walkers::lat_lon(settings.center_lat, settings.center_lon),
            tiles_osm,
            tiles_otm,
            map_memory,
            show_help: false,
            render_stats: Arc::new(RwLock::new(RenderStats::default())),
        }
    }

    /// Fit the map view to the bounding box of the loaded accidents.
    fn fit_to_bounds(&mut self) {
        let Some(bbox) = self
            .state
            .accidents
            .as_ref()
            .and_then(|collection| collection.bounding_box())
        else {
            return;
        };

        let center_lat = (bbox.min().y + bbox.max().y) / 2.0;
        let center_lon = (bbox.min().x + bbox.max().x) / 2.0;
        let max_span = bbox.height().abs().max(bbox.width().abs());

        let zoom = if max_span > 0.0 {
            let zoom_estimate = (4.0 * 360.0 / max_span).log2() as f32;
            (zoom_estimate - 0.5).clamp(1.0, 18.0)
        } else {
            12.0
        };

        self.map_memory
            .center_at(walkers::lat_lon(center_lat, center_lon));
        let _ = self.map_memory.set_zoom(zoom as f64);

        tracing::trace!(
            "Auto-zoomed to bounds: ({:.4}, {:.4}) - ({:.4}, {:.4}), zoom: {:.1}",
            bbox.min().y,
            bbox.min().x,
            bbox.max().y,
            bbox.max().x,
            zoom
        );
    }
}

#[profiling::all_functions]
impl eframe::App for BikeAccidentMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Handle keyboard shortcuts
        ctx.input(|i| {
            if i.key_pressed(egui::Key::F1) {
                self.show_help = !self.show_help;
            }
        });

        // Kick off the one-shot dataset load and poll for its result
        self.state.start_load();
        if self.state.poll_load() || self.state.loader.is_loading() {
            ctx.request_repaint();
        }

        // Auto-zoom to the accident bounding box once loaded
        if self.state.pending_fit_bounds {
            self.state.pending_fit_bounds = false;
            self.fit_to_bounds();
        }

        // Show help overlay if enabled
        if self.show_help {
            ui_panels::help_overlay(ctx, &mut self.show_help);
        }

        // Render the sidebar
        ui_panels::render_sidebar(ctx, &mut self.state);

        // Capture values we need before the closure
        let accidents = self.state.accidents.clone();
        let lanes = self.state.lanes.clone();
        let variable = self.state.selected_variable;
        let marker_radius = self.state.ui_settings.marker_radius;
        let selected_accident = self.state.selected_accident.clone();
        let render_stats = self.render_stats.clone();
        let tiles_provider = self.state.ui_settings.tiles_provider;
        let attribution_text = tiles_provider.attribution();
        let show_legend = self.state.ui_settings.show_legend;

        // Central panel: Map view (full screen)
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                profiling::scope!("map_panel");

                let render_start = std::time::Instant::now();

                let tiles: &mut HttpTiles = match tiles_provider {
                    TilesProvider::OpenStreetMap => &mut self.tiles_osm,
                    TilesProvider::OpenTopoMap => &mut self.tiles_otm,
                };

                // Lanes first so markers draw on top
                let mut map = Map::new(Some(tiles), &mut self.map_memory, self.home);
                if let Some(lanes) = lanes {
                    map = map.with_plugin(LanePlugin::new(lanes));
                }
                if let Some(accidents) = accidents {
                    map = map.with_plugin(AccidentPlugin::new(
                        accidents,
                        variable,
                        marker_radius,
                        selected_accident,
                        render_stats,
                    ));
                }

                ui.add(map);

                self.state.stats.last_render_ms =
                    render_start.elapsed().as_secs_f64() * 1000.0;
                {
                    // Use try_read for non-blocking UI polling.
                    if let Ok(render_stats) = self.render_stats.try_read() {
                        self.state.stats.markers_rendered = render_stats.markers_rendered;
                    }
                }

                ui_panels::sidebar_toggle_button(ui, &mut self.state);

                if show_legend {
                    ui_panels::legend_overlay(ui);
                }

                let painter = ui.painter();
                let screen_rect = ui.max_rect();
                painter.text(
                    screen_rect.center_bottom() + egui::vec2(0.0, -5.0),
                    egui::Align2::CENTER_BOTTOM,
                    attribution_text,
                    egui::FontId::proportional(10.0),
                    egui::Color32::from_black_alpha(180),
                );
            });
    }
}
