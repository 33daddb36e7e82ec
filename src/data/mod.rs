//! Accident & Lane Data Module
//!
//! This module holds everything that is not map plumbing: loading the two
//! GeoJSON feature collections, normalizing raw categorical codes, classifying
//! them into labels and colors, and aggregating percentage breakdowns.
//!
//! # Overview
//!
//! Data flows one direction and is never mutated after loading:
//!
//! - Raw feature properties are kept as [`serde_json::Value`]s on each
//!   [`AccidentFeature`] (the source data is inconsistently typed: codes may
//!   arrive as numbers, as text, as text with a trailing `.0`, or be missing).
//! - [`CanonicalCode::normalize`] collapses all spellings of the same logical
//!   code into one canonical key.
//! - The classifiers in [`codes`] map canonical keys to human-readable labels
//!   and display colors. They are total: malformed input degrades to sentinel
//!   outputs instead of failing, so rendering never stops because of one bad
//!   record.
//! - [`aggregate`] tallies the selected variable across all accidents and
//!   reports per-category percentages.
//!
//! Classification and aggregation are pure and synchronous; only file loading
//! can fail, via [`DataError`].

mod aggregate;
mod codes;
mod feature;

// Public API exports
pub use aggregate::{AggregateError, Breakdown, BreakdownEntry, Variable, aggregate};
pub use codes::{
    AccidentType, CanonicalCode, LaneFlag, UNDEFINED_LABEL, lighting_color, lighting_label,
    weather_color, weather_label,
};
pub use feature::{AccidentCollection, AccidentFeature, LaneNetwork};

/// Error types for the data module
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("GeoJSON parsing error: {0}")]
    GeoJsonParse(#[from] geojson::Error),

    #[error("expected a FeatureCollection, got {0}")]
    UnexpectedRoot(&'static str),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DataError>;
