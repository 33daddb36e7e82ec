//! GeoJSON feature loading
//!
//! Parses the two input feature collections: accident points (with their raw
//! categorical properties) and the bike-lane network (line geometry only).
//! Both are immutable once loaded; features with unusable geometry are
//! skipped with a warning rather than failing the whole load.

use crate::data::{DataError, Result};
use geo::{Point, Rect};
use geojson::GeoJson;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Property keys in the accident collection.
pub const PROP_ID: &str = "NO_SEQ_COLL";
pub const PROP_SEVERITY: &str = "GRAVITE";
pub const PROP_WEATHER: &str = "CD_COND_METEO";
pub const PROP_LIGHTING: &str = "CD_ECLRM";
pub const PROP_LANE_FLAG: &str = "ON_BIKELANE";

/// One accident point record with its raw property values of interest.
///
/// Property values stay as raw JSON values because the source data is
/// inconsistently typed; normalization happens at classification time.
#[derive(Clone, Debug)]
pub struct AccidentFeature {
    position: Point<f64>,
    id: Option<Value>,
    severity: Option<Value>,
    weather: Option<Value>,
    lighting: Option<Value>,
    lane_flag: Option<Value>,
}

impl AccidentFeature {
    pub fn new(
        position: Point<f64>,
        id: Option<Value>,
        severity: Option<Value>,
        weather: Option<Value>,
        lighting: Option<Value>,
        lane_flag: Option<Value>,
    ) -> Self {
        Self {
            position,
            id,
            severity,
            weather,
            lighting,
            lane_flag,
        }
    }

    /// Position in WGS84 (x = longitude, y = latitude).
    pub fn position(&self) -> Point<f64> {
        self.position
    }

    pub fn severity(&self) -> Option<&Value> {
        self.severity.as_ref()
    }

    pub fn weather(&self) -> Option<&Value> {
        self.weather.as_ref()
    }

    pub fn lighting(&self) -> Option<&Value> {
        self.lighting.as_ref()
    }

    pub fn lane_flag(&self) -> Option<&Value> {
        self.lane_flag.as_ref()
    }

    /// Identifier rendered in the marker popup; empty when missing.
    pub fn id_text(&self) -> String {
        match &self.id {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// All loaded accident points plus their precomputed bounding box.
#[derive(Clone, Debug, Default)]
pub struct AccidentCollection {
    features: Vec<AccidentFeature>,
    bounding_box: Option<Rect<f64>>,
}

impl AccidentCollection {
    /// Load an accident collection from a GeoJSON file.
    pub fn load(path: &Path) -> Result<Self> {
        profiling::scope!("load_accidents");
        let contents = std::fs::read_to_string(path)?;
        Self::from_geojson(contents.parse::<GeoJson>()?)
    }

    /// Load the first of two candidate accident files to succeed, returning
    /// the collection and the path that was actually used.
    ///
    /// The lane-annotated variant is tried first; a plain variant without the
    /// bike-lane flag is the fallback.
    pub fn load_with_fallback(primary: &Path, fallback: &Path) -> Result<(Self, PathBuf)> {
        match Self::load(primary) {
            Ok(collection) => Ok((collection, primary.to_path_buf())),
            Err(err) => {
                tracing::warn!(
                    "Failed to load {}: {err}; trying {}",
                    primary.display(),
                    fallback.display()
                );
                Self::load(fallback).map(|collection| (collection, fallback.to_path_buf()))
            }
        }
    }

    /// Build a collection from parsed GeoJSON. Features without a usable
    /// point geometry are skipped with a warning.
    pub fn from_geojson(geojson: GeoJson) -> Result<Self> {
        let GeoJson::FeatureCollection(collection) = geojson else {
            return Err(DataError::UnexpectedRoot(geojson_root_name(&geojson)));
        };

        let mut features = Vec::with_capacity(collection.features.len());
        for feature in &collection.features {
            let Some(position) = point_of(feature) else {
                tracing::warn!("Skipping accident feature without point geometry");
                continue;
            };

            features.push(AccidentFeature::new(
                position,
                feature.property(PROP_ID).cloned(),
                feature.property(PROP_SEVERITY).cloned(),
                feature.property(PROP_WEATHER).cloned(),
                feature.property(PROP_LIGHTING).cloned(),
                feature.property(PROP_LANE_FLAG).cloned(),
            ));
        }

        let bounding_box = compute_bounding_box(features.iter().map(AccidentFeature::position));

        Ok(Self {
            features,
            bounding_box,
        })
    }

    pub fn features(&self) -> &[AccidentFeature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Bounding box in WGS84 (x = longitude, y = latitude), if any feature
    /// was loaded.
    pub fn bounding_box(&self) -> Option<Rect<f64>> {
        self.bounding_box
    }
}

/// The bike-lane network: plain polylines, rendered uniformly and never
/// classified.
#[derive(Clone, Debug, Default)]
pub struct LaneNetwork {
    paths: Vec<Vec<Point<f64>>>,
}

impl LaneNetwork {
    /// Load the lane network from a GeoJSON file.
    pub fn load(path: &Path) -> Result<Self> {
        profiling::scope!("load_lanes");
        let contents = std::fs::read_to_string(path)?;
        Self::from_geojson(contents.parse::<GeoJson>()?)
    }

    /// Build the network from parsed GeoJSON. Each LineString contributes one
    /// path and each MultiLineString one path per line; other geometry is
    /// skipped.
    pub fn from_geojson(geojson: GeoJson) -> Result<Self> {
        let GeoJson::FeatureCollection(collection) = geojson else {
            return Err(DataError::UnexpectedRoot(geojson_root_name(&geojson)));
        };

        let mut paths = Vec::new();
        for feature in &collection.features {
            let Some(geometry) = &feature.geometry else {
                continue;
            };
            match &geometry.value {
                geojson::Value::LineString(line) => paths.push(line_to_points(line)),
                geojson::Value::MultiLineString(lines) => {
                    paths.extend(lines.iter().map(|line| line_to_points(line)));
                }
                _ => {
                    tracing::trace!("Skipping non-line lane geometry");
                }
            }
        }

        Ok(Self { paths })
    }

    pub fn paths(&self) -> &[Vec<Point<f64>>] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Extract a feature's point position (lon, lat), if it has one.
fn point_of(feature: &geojson::Feature) -> Option<Point<f64>> {
    let geometry = feature.geometry.as_ref()?;
    match &geometry.value {
        geojson::Value::Point(coords) if coords.len() >= 2 => {
            Some(Point::new(coords[0], coords[1]))
        }
        _ => None,
    }
}

fn line_to_points(line: &[Vec<f64>]) -> Vec<Point<f64>> {
    line.iter()
        .filter(|position| position.len() >= 2)
        .map(|position| Point::new(position[0], position[1]))
        .collect()
}

/// Compute the bounding box of a set of positions, if non-empty.
fn compute_bounding_box(positions: impl Iterator<Item = Point<f64>>) -> Option<Rect<f64>> {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    let mut found = false;

    for point in positions {
        min_x = min_x.min(point.x());
        min_y = min_y.min(point.y());
        max_x = max_x.max(point.x());
        max_y = max_y.max(point.y());
        found = true;
    }

    found.then(|| {
        Rect::new(
            geo::Coord { x: min_x, y: min_y },
            geo::Coord { x: max_x, y: max_y },
        )
    })
}

fn geojson_root_name(geojson: &GeoJson) -> &'static str {
    match geojson {
        GeoJson::Geometry(_) => "Geometry",
        GeoJson::Feature(_) => "Feature",
        GeoJson::FeatureCollection(_) => "FeatureCollection",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn accidents_fixture() -> GeoJson {
        r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [-73.56, 45.51] },
                    "properties": {
                        "NO_SEQ_COLL": "A-001",
                        "GRAVITE": "Léger",
                        "CD_COND_METEO": "11.0",
                        "CD_ECLRM": 2,
                        "ON_BIKELANE": 1
                    }
                },
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [-73.60, 45.52] },
                    "properties": { "GRAVITE": "Mortel ou grave" }
                },
                {
                    "type": "Feature",
                    "geometry": null,
                    "properties": { "GRAVITE": "Léger" }
                }
            ]
        }"#
        .parse()
        .unwrap()
    }

    #[test]
    fn test_accident_parsing_skips_bad_geometry() {
        let collection = AccidentCollection::from_geojson(accidents_fixture()).unwrap();
        assert_eq!(collection.len(), 2);

        let first = &collection.features()[0];
        assert_eq!(first.position(), Point::new(-73.56, 45.51));
        assert_eq!(first.id_text(), "A-001");
        assert_eq!(first.weather(), Some(&json!("11.0")));
        assert_eq!(first.lighting(), Some(&json!(2)));

        let second = &collection.features()[1];
        assert_eq!(second.id_text(), "");
        assert!(second.lane_flag().is_none());
    }

    #[test]
    fn test_accident_bounding_box() {
        let collection = AccidentCollection::from_geojson(accidents_fixture()).unwrap();
        let bbox = collection.bounding_box().unwrap();
        assert_eq!(bbox.min().x, -73.60);
        assert_eq!(bbox.max().x, -73.56);
        assert_eq!(bbox.min().y, 45.51);
        assert_eq!(bbox.max().y, 45.52);
    }

    #[test]
    fn test_empty_collection_has_no_bounding_box() {
        let geojson: GeoJson = r#"{ "type": "FeatureCollection", "features": [] }"#
            .parse()
            .unwrap();
        let collection = AccidentCollection::from_geojson(geojson).unwrap();
        assert!(collection.is_empty());
        assert!(collection.bounding_box().is_none());
    }

    #[test]
    fn test_non_collection_root_is_rejected() {
        let geojson: GeoJson = r#"{ "type": "Point", "coordinates": [0.0, 0.0] }"#
            .parse()
            .unwrap();
        assert!(AccidentCollection::from_geojson(geojson).is_err());
    }

    #[test]
    fn test_lane_network_parsing() {
        let geojson: GeoJson = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": {
                        "type": "LineString",
                        "coordinates": [[-73.56, 45.51], [-73.57, 45.52]]
                    },
                    "properties": {}
                },
                {
                    "type": "Feature",
                    "geometry": {
                        "type": "MultiLineString",
                        "coordinates": [
                            [[-73.58, 45.50], [-73.59, 45.51]],
                            [[-73.60, 45.52], [-73.61, 45.53], [-73.62, 45.54]]
                        ]
                    },
                    "properties": {}
                },
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [-73.56, 45.51] },
                    "properties": {}
                }
            ]
        }"#
        .parse()
        .unwrap();

        let network = LaneNetwork::from_geojson(geojson).unwrap();
        assert_eq!(network.len(), 3);
        assert_eq!(network.paths()[0].len(), 2);
        assert_eq!(network.paths()[2].len(), 3);
    }

    #[test]
    fn test_load_with_fallback_uses_second_candidate() {
        let dir = std::env::temp_dir().join("bike-accident-map-tests");
        std::fs::create_dir_all(&dir).unwrap();
        let missing = dir.join("does_not_exist.geojson");
        let fallback = dir.join("fallback.geojson");
        std::fs::write(
            &fallback,
            r#"{
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [-73.56, 45.51] },
                    "properties": { "GRAVITE": "Léger" }
                }]
            }"#,
        )
        .unwrap();

        let (collection, used) =
            AccidentCollection::load_with_fallback(&missing, &fallback).unwrap();
        assert_eq!(collection.len(), 1);
        assert_eq!(used, fallback);
    }

    #[test]
    fn test_load_fails_when_both_candidates_missing() {
        let dir = std::env::temp_dir().join("bike-accident-map-tests");
        let a = dir.join("missing_a.geojson");
        let b = dir.join("missing_b.geojson");
        assert!(AccidentCollection::load_with_fallback(&a, &b).is_err());
    }
}
