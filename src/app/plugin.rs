//! Walkers plugins for rendering the accident and lane overlays
//!
//! Two plugins draw on top of the map: [`LanePlugin`] renders the bike-lane
//! network as uniform polylines, and [`AccidentPlugin`] renders one circle
//! marker per accident, filled per the selected variable, with a
//! click-to-inspect popup. The plugins only read shared immutable data; the
//! popup selection is the single piece of state they write.

use crate::data::{
    AccidentCollection, AccidentType, LaneFlag, LaneNetwork, Variable, lighting_label,
    weather_label,
};
use egui::{Color32, RichText, Stroke};
use std::sync::{Arc, RwLock};
use walkers::{Plugin, Projector};

/// Lane network line style (also used by the legend overlay)
pub(crate) const LANE_COLOR: Color32 = Color32::from_rgb(0x00, 0x33, 0x66);
const LANE_WIDTH: f32 = 2.0;

/// Marker border and no-selection fill
const MARKER_BORDER: Color32 = Color32::from_rgb(0x33, 0x33, 0x33);
const NO_VARIABLE_FILL: Color32 = Color32::from_rgb(0x66, 0x66, 0x66);
const MARKER_FILL_OPACITY: f32 = 0.9;

/// Extra pixels around a marker that still count as a hit
const CLICK_SLOP: f32 = 2.0;

/// Shared render statistics (updated by the accident plugin each frame)
#[derive(Default)]
pub struct RenderStats {
    /// Markers drawn after viewport culling
    pub markers_rendered: usize,
}

/// Plugin rendering the bike-lane network below the accident markers
pub struct LanePlugin {
    network: Arc<LaneNetwork>,
}

impl LanePlugin {
    pub fn new(network: Arc<LaneNetwork>) -> Self {
        Self { network }
    }
}

impl Plugin for LanePlugin {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        response: &egui::Response,
        projector: &Projector,
        _map_memory: &walkers::MapMemory,
    ) {
        profiling::scope!("LanePlugin::run");

        let painter = ui.painter();
        let viewport = response.rect;
        let stroke = Stroke::new(LANE_WIDTH, LANE_COLOR);

        for path in self.network.paths() {
            let mut screen_points = Vec::with_capacity(path.len());
            let mut bbox = egui::Rect::NOTHING;

            for point in path {
                let position = walkers::lat_lon(point.y(), point.x());
                let screen_vec = projector.project(position);
                let pos = egui::Pos2::new(screen_vec.x, screen_vec.y);
                bbox.extend_with(pos);
                screen_points.push(pos);
            }

            if screen_points.len() < 2 || !viewport.intersects(bbox) {
                continue;
            }

            painter.add(egui::Shape::line(screen_points, stroke));
        }
    }
}

/// Plugin rendering accident circle markers and the inspect popup
pub struct AccidentPlugin {
    collection: Arc<AccidentCollection>,
    variable: Option<Variable>,
    radius: f32,
    /// Index of the accident whose popup is open; shared with the app state
    selected: Arc<RwLock<Option<usize>>>,
    render_stats: Arc<RwLock<RenderStats>>,
}

impl AccidentPlugin {
    pub fn new(
        collection: Arc<AccidentCollection>,
        variable: Option<Variable>,
        radius: f32,
        selected: Arc<RwLock<Option<usize>>>,
        render_stats: Arc<RwLock<RenderStats>>,
    ) -> Self {
        Self {
            collection,
            variable,
            radius,
            selected,
            render_stats,
        }
    }

    fn marker_fill(&self, feature: &crate::data::AccidentFeature) -> Color32 {
        match self.variable {
            Some(variable) => variable.color_for(feature),
            None => NO_VARIABLE_FILL,
        }
    }

    /// Draw the popup card above the selected marker.
    fn show_popup(&self, ui: &egui::Ui, projector: &Projector, index: usize) {
        let Some(feature) = self.collection.features().get(index) else {
            return;
        };

        let point = feature.position();
        let screen_vec = projector.project(walkers::lat_lon(point.y(), point.x()));
        let anchor = egui::Pos2::new(screen_vec.x, screen_vec.y - self.radius - 4.0);

        egui::Area::new(egui::Id::new("accident_popup"))
            .pivot(egui::Align2::CENTER_BOTTOM)
            .fixed_pos(anchor)
            .show(ui.ctx(), |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    popup_row(ui, "ID", &feature.id_text());
                    popup_row(
                        ui,
                        "Accident type",
                        AccidentType::classify(feature.severity()).label(),
                    );
                    popup_row(ui, "Weather", weather_label(feature.weather()));
                    popup_row(ui, "Lighting", lighting_label(feature.lighting()));
                    let on_lane = LaneFlag::from_raw(feature.lane_flag()).is_on();
                    popup_row(ui, "Bike Lane", if on_lane { "Yes" } else { "No" });
                });
            });
    }
}

fn popup_row(ui: &mut egui::Ui, key: &str, value: &str) {
    ui.horizontal(|ui| {
        ui.label(RichText::new(format!("{key}:")).strong());
        ui.label(value);
    });
}

impl Plugin for AccidentPlugin {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        response: &egui::Response,
        projector: &Projector,
        _map_memory: &walkers::MapMemory,
    ) {
        profiling::scope!("AccidentPlugin::run");

        let painter = ui.painter();
        let viewport = response.rect.expand(self.radius);
        let click_pos = response
            .clicked()
            .then(|| response.interact_pointer_pos())
            .flatten();

        let mut hit: Option<(usize, f32)> = None;
        let mut markers_rendered = 0;

        for (index, feature) in self.collection.features().iter().enumerate() {
            let point = feature.position();
            let position = walkers::lat_lon(point.y(), point.x());
            let screen_vec = projector.project(position);
            let screen_pos = egui::Pos2::new(screen_vec.x, screen_vec.y);

            if !viewport.contains(screen_pos) {
                continue;
            }

            let fill = self.marker_fill(feature).gamma_multiply(MARKER_FILL_OPACITY);
            painter.circle(
                screen_pos,
                self.radius,
                fill,
                Stroke::new(1.0, MARKER_BORDER),
            );
            markers_rendered += 1;

            if let Some(click_pos) = click_pos {
                let distance = click_pos.distance(screen_pos);
                if distance <= self.radius + CLICK_SLOP
                    && hit.is_none_or(|(_, best)| distance < best)
                {
                    hit = Some((index, distance));
                }
            }
        }

        // A click selects the nearest marker under the pointer, or clears the
        // selection when it lands on empty map.
        if click_pos.is_some() {
            *self.selected.write().unwrap() = hit.map(|(index, _)| index);
        }

        let selected = *self.selected.read().unwrap();
        if let Some(index) = selected {
            self.show_popup(ui, projector, index);
        }

        if let Ok(mut stats) = self.render_stats.try_write() {
            stats.markers_rendered = markers_rendered;
        }
    }
}
