//! Bike Accident Map - Application Library
//!
//! An interactive map of bicycle accidents and the bike-lane network. The
//! [`data`] module holds the domain logic (code normalization,
//! classification, aggregation) and is UI-free; the [`app`] module renders it
//! with eframe/egui and walkers.

pub mod app;
pub mod data;
pub mod entrypoints;

pub use app::BikeAccidentMapApp;
