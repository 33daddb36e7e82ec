use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Bike Accident Map - An interactive map of bicycle accidents and the
/// bike-lane network, with per-variable coloring and percentage breakdowns
pub struct Settings {
    /// Accident collection annotated with bike-lane flags (tried first)
    #[clap(long, value_name = "FILE", default_value = "bikes_with_lane_flag.geojson")]
    pub accidents_file: PathBuf,

    /// Plain accident collection, used when the annotated file is unavailable
    #[clap(long, value_name = "FILE", default_value = "bikes.geojson")]
    pub accidents_fallback_file: PathBuf,

    /// Bike-lane network collection
    #[clap(long, value_name = "FILE", default_value = "reseau_cyclable.json")]
    pub lanes_file: PathBuf,

    /// Accident marker radius in pixels
    #[clap(long, default_value = "4.0")]
    pub marker_radius: f32,

    /// Initial map center latitude
    #[clap(long, default_value = "45.508888")]
    pub center_lat: f64,

    /// Initial map center longitude
    #[clap(long, default_value = "-73.561668")]
    pub center_lon: f64,

    /// Initial map zoom level
    #[clap(long, default_value = "12.0")]
    pub zoom: f64,
}

impl Settings {
    /// Parse settings from the command line, exiting with usage on error.
    pub fn from_cli() -> Self {
        match Self::try_parse() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }
}
