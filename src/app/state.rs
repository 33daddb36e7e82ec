//! Application state management
//!
//! This module owns the application state: the loaded datasets, the selected
//! variable, the dataset loader, and UI settings. The state struct is passed
//! explicitly to the panels and map plugins; there are no globals.

use crate::app::settings::Settings;
use crate::data::{
    AccidentCollection, AggregateError, Breakdown, LaneNetwork, Variable, aggregate,
};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Fixed message shown when no accident candidate file could be loaded.
pub const ACCIDENTS_LOAD_ERROR: &str = "Could not load accident data.";

/// Fixed message shown when the lane network file could not be loaded.
pub const LANES_LOAD_ERROR: &str = "Could not load bike lane network.";

/// Main application state
pub struct AppState {
    /// Loaded accident points; `None` until the load finishes (or forever on
    /// failure). Immutable once set, shared with the map plugin.
    pub accidents: Option<Arc<AccidentCollection>>,

    /// Loaded bike-lane network, same lifecycle as `accidents`.
    pub lanes: Option<Arc<LaneNetwork>>,

    /// The variable currently driving marker colors and the breakdown.
    pub selected_variable: Option<Variable>,

    /// Index of the accident whose popup is open; written by the map plugin
    /// on click.
    pub selected_accident: Arc<RwLock<Option<usize>>>,

    /// Result of the last compute trigger.
    pub last_breakdown: Option<Result<Breakdown, AggregateError>>,

    /// Startup dataset loading state
    pub loader: DatasetLoader,

    /// Current UI settings
    pub ui_settings: UiSettings,

    /// Statistics about loaded data and rendering
    pub stats: Stats,

    /// Fit the viewport to the accident bounding box on the next frame
    pub pending_fit_bounds: bool,
}

/// UI-specific settings that can be adjusted at runtime
#[derive(Clone)]
pub struct UiSettings {
    /// Accident marker radius in pixels
    pub marker_radius: f32,

    /// Map tiles provider
    pub tiles_provider: TilesProvider,

    /// Show the bike-lane legend overlay
    pub show_legend: bool,

    /// Whether the sidebar is open
    pub sidebar_open: bool,
}

/// Available map tile providers
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TilesProvider {
    OpenStreetMap,
    OpenTopoMap,
}

impl TilesProvider {
    pub fn attribution(&self) -> &'static str {
        match self {
            Self::OpenStreetMap => "© OpenStreetMap contributors",
            Self::OpenTopoMap => "© OpenTopoMap (CC-BY-SA)",
        }
    }

    pub fn all() -> &'static [Self] {
        &[Self::OpenStreetMap, Self::OpenTopoMap]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenStreetMap => "OpenStreetMap",
            Self::OpenTopoMap => "OpenTopoMap",
        }
    }
}

/// Result of the one-shot startup load, produced on a background task and
/// consumed on the UI thread.
struct LoadOutcome {
    accidents: crate::data::Result<(AccidentCollection, PathBuf)>,
    lanes: crate::data::Result<LaneNetwork>,
}

/// Startup dataset loading state. Loads run once and are never retried;
/// failure of either dataset is terminal for the session.
pub struct DatasetLoader {
    accidents_file: PathBuf,
    accidents_fallback_file: PathBuf,
    lanes_file: PathBuf,

    /// Slot filled by the background load task.
    outcome: Arc<RwLock<Option<LoadOutcome>>>,

    started: bool,
    finished: bool,

    /// Files that were actually loaded (shown in the sidebar).
    pub loaded_files: Vec<PathBuf>,

    /// Terminal load error message, if any.
    pub error: Option<&'static str>,
}

impl DatasetLoader {
    fn new(settings: &Settings) -> Self {
        Self {
            accidents_file: settings.accidents_file.clone(),
            accidents_fallback_file: settings.accidents_fallback_file.clone(),
            lanes_file: settings.lanes_file.clone(),
            outcome: Arc::new(RwLock::new(None)),
            started: false,
            finished: false,
            loaded_files: Vec::new(),
            error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.started && !self.finished
    }
}

/// Statistics about loaded data and rendering
#[derive(Default)]
pub struct Stats {
    /// Number of accident points loaded
    pub accident_count: usize,

    /// Number of lane polylines loaded
    pub lane_path_count: usize,

    /// Last frame's map render time in milliseconds
    pub last_render_ms: f64,

    /// Markers drawn in the last frame (after viewport culling)
    pub markers_rendered: usize,
}

impl AppState {
    /// Create new application state from CLI settings
    pub fn new(settings: &Settings) -> Self {
        let ui_settings = UiSettings {
            marker_radius: settings.marker_radius,
            tiles_provider: TilesProvider::OpenStreetMap,
            show_legend: true,
            sidebar_open: true,
        };

        Self {
            accidents: None,
            lanes: None,
            selected_variable: None,
            selected_accident: Arc::new(RwLock::new(None)),
            last_breakdown: None,
            loader: DatasetLoader::new(settings),
            ui_settings,
            stats: Stats::default(),
            pending_fit_bounds: false,
        }
    }

    /// Start the one-shot dataset load on a background blocking task. The
    /// two collections are loaded in sequence, off the UI thread.
    pub fn start_load(&mut self) {
        if self.loader.started {
            return;
        }
        self.loader.started = true;

        let primary = self.loader.accidents_file.clone();
        let fallback = self.loader.accidents_fallback_file.clone();
        let lanes_file = self.loader.lanes_file.clone();
        let slot = self.loader.outcome.clone();

        let _ = tokio::task::spawn_blocking(move || {
            profiling::scope!("load_datasets");
            let outcome = LoadOutcome {
                accidents: AccidentCollection::load_with_fallback(&primary, &fallback),
                lanes: LaneNetwork::load(&lanes_file),
            };
            *slot.write().unwrap() = Some(outcome);
        });
    }

    /// Consume the load outcome if the background task has finished.
    /// Returns true when state changed and the UI should repaint.
    pub fn poll_load(&mut self) -> bool {
        if !self.loader.is_loading() {
            return false;
        }

        let outcome = {
            // try_write keeps the UI thread from blocking on the loader.
            let Ok(mut slot) = self.loader.outcome.try_write() else {
                return false;
            };
            match slot.take() {
                Some(outcome) => outcome,
                None => return false,
            }
        };

        self.loader.finished = true;

        match outcome.accidents {
            Ok((collection, used_path)) => {
                tracing::info!(
                    "Loaded {} accident points from {}",
                    collection.len(),
                    used_path.display()
                );
                self.stats.accident_count = collection.len();
                self.accidents = Some(Arc::new(collection));
                self.loader.loaded_files.push(used_path);
                self.pending_fit_bounds = true;
            }
            Err(err) => {
                tracing::error!("Accident data unavailable: {err}");
                self.loader.error = Some(ACCIDENTS_LOAD_ERROR);
            }
        }

        match outcome.lanes {
            Ok(network) => {
                tracing::info!(
                    "Loaded {} lane paths from {}",
                    network.len(),
                    self.loader.lanes_file.display()
                );
                self.stats.lane_path_count = network.len();
                self.lanes = Some(Arc::new(network));
                let lanes_file = self.loader.lanes_file.clone();
                self.loader.loaded_files.push(lanes_file);
            }
            Err(err) => {
                tracing::error!("Bike lane network unavailable: {err}");
                // The accident error message takes priority when both fail.
                if self.loader.error.is_none() {
                    self.loader.error = Some(LANES_LOAD_ERROR);
                }
            }
        }

        true
    }

    /// Whether both datasets loaded and computation is allowed.
    pub fn data_ready(&self) -> bool {
        self.accidents.is_some() && self.lanes.is_some()
    }

    /// Select the variable driving marker colors and the breakdown.
    pub fn select_variable(&mut self, variable: Variable) {
        self.selected_variable = Some(variable);
    }

    /// Run the percentage aggregation for the current selection.
    pub fn compute_breakdown(&mut self) {
        let features = self
            .accidents
            .as_ref()
            .map(|collection| collection.features())
            .unwrap_or(&[]);
        self.last_breakdown = Some(aggregate(features, self.selected_variable));
    }
}
