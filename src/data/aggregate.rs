//! Variable selection and percentage aggregation
//!
//! A [`Variable`] names one categorical property of the accident data and
//! dispatches to the matching classifier for labels and marker colors.
//! [`aggregate`] tallies the selected variable across all accidents and
//! reports per-category percentages in first-occurrence order.

use crate::data::codes::{AccidentType, LaneFlag, lighting_color, lighting_label, weather_color, weather_label};
use crate::data::feature::AccidentFeature;
use egui::Color32;

/// The categorical variable driving marker colors and the breakdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variable {
    BikeLane,
    Severity,
    Weather,
    Lighting,
}

impl Variable {
    pub fn all() -> &'static [Self] {
        &[Self::BikeLane, Self::Severity, Self::Weather, Self::Lighting]
    }

    /// Property key of this variable in the accident collection.
    pub fn key(&self) -> &'static str {
        match self {
            Self::BikeLane => super::feature::PROP_LANE_FLAG,
            Self::Severity => super::feature::PROP_SEVERITY,
            Self::Weather => super::feature::PROP_WEATHER,
            Self::Lighting => super::feature::PROP_LIGHTING,
        }
    }

    /// Display name shown in the variable menu.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BikeLane => "Bike Lane",
            Self::Severity => "Accident Type",
            Self::Weather => "Weather",
            Self::Lighting => "Lighting",
        }
    }

    /// Category label of one accident under this variable.
    pub fn label_for(&self, feature: &AccidentFeature) -> &'static str {
        match self {
            Self::BikeLane => LaneFlag::from_raw(feature.lane_flag()).label(),
            Self::Severity => AccidentType::classify(feature.severity()).label(),
            Self::Weather => weather_label(feature.weather()),
            Self::Lighting => lighting_label(feature.lighting()),
        }
    }

    /// Marker fill color of one accident under this variable.
    pub fn color_for(&self, feature: &AccidentFeature) -> Color32 {
        match self {
            Self::BikeLane => LaneFlag::from_raw(feature.lane_flag()).color(),
            Self::Severity => AccidentType::classify(feature.severity()).color(),
            Self::Weather => weather_color(feature.weather()),
            Self::Lighting => lighting_color(feature.lighting()),
        }
    }
}

/// The "not ready" signal: aggregation needs both a selection and data.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AggregateError {
    #[error("no variable selected")]
    NoVariableSelected,

    #[error("no accident data loaded")]
    NoData,
}

/// One category of the breakdown.
#[derive(Clone, Debug, PartialEq)]
pub struct BreakdownEntry {
    pub label: &'static str,
    pub count: usize,
    /// Percentage of all accidents, rounded to one decimal place.
    pub percent: f64,
}

/// Percentage breakdown of the selected variable over all accidents, in
/// first-occurrence order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Breakdown {
    entries: Vec<BreakdownEntry>,
}

impl Breakdown {
    pub fn entries(&self) -> &[BreakdownEntry] {
        &self.entries
    }
}

/// Tally the selected variable's category labels over all accidents and
/// convert each tally to a percentage of the total feature count.
pub fn aggregate(
    features: &[AccidentFeature],
    selected: Option<Variable>,
) -> Result<Breakdown, AggregateError> {
    profiling::scope!("aggregate");

    let variable = selected.ok_or(AggregateError::NoVariableSelected)?;
    if features.is_empty() {
        return Err(AggregateError::NoData);
    }

    // Insertion-ordered tally; the category count is tiny, so a linear scan
    // beats a map here.
    let mut tallies: Vec<(&'static str, usize)> = Vec::new();
    for feature in features {
        let label = variable.label_for(feature);
        match tallies.iter_mut().find(|(seen, _)| *seen == label) {
            Some((_, count)) => *count += 1,
            None => tallies.push((label, 1)),
        }
    }

    let total = features.len();
    let entries = tallies
        .into_iter()
        .map(|(label, count)| BreakdownEntry {
            label,
            count,
            percent: round_to_tenth(100.0 * count as f64 / total as f64),
        })
        .collect();

    Ok(Breakdown { entries })
}

fn round_to_tenth(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;
    use serde_json::{Value, json};

    fn feature(severity: Option<Value>, weather: Option<Value>) -> AccidentFeature {
        AccidentFeature::new(Point::new(-73.56, 45.51), None, severity, weather, None, None)
    }

    #[test]
    fn test_severity_breakdown_percentages() {
        let features = vec![
            feature(Some(json!("Mortel ou grave")), None),
            feature(Some(json!("Léger")), None),
            feature(Some(json!("Dommages matériels")), None),
            feature(None, None),
        ];

        let breakdown = aggregate(&features, Some(Variable::Severity)).unwrap();
        let entries = breakdown.entries();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].label, "Fatal/Hospitalization");
        assert_eq!(entries[0].percent, 25.0);
        assert_eq!(entries[1].label, "Injury");
        assert_eq!(entries[1].percent, 25.0);
        assert_eq!(entries[2].label, "No Injury");
        assert_eq!(entries[2].percent, 50.0);

        let total: f64 = entries.iter().map(|e| e.percent).sum();
        assert_eq!(total, 100.0);
    }

    #[test]
    fn test_breakdown_keeps_first_occurrence_order() {
        let features = vec![
            feature(None, Some(json!("14"))),
            feature(None, Some(json!("11"))),
            feature(None, Some(json!("14"))),
        ];

        let breakdown = aggregate(&features, Some(Variable::Weather)).unwrap();
        let labels: Vec<_> = breakdown.entries().iter().map(|e| e.label).collect();
        assert_eq!(labels, vec!["Rain", "Clear"]);
    }

    #[test]
    fn test_percentages_round_to_one_decimal() {
        let features = vec![
            feature(Some(json!("Léger")), None),
            feature(None, None),
            feature(None, None),
        ];

        let breakdown = aggregate(&features, Some(Variable::Severity)).unwrap();
        // 1/3 and 2/3 round to 33.3 and 66.7.
        assert_eq!(breakdown.entries()[0].percent, 33.3);
        assert_eq!(breakdown.entries()[1].percent, 66.7);
    }

    #[test]
    fn test_not_ready_without_selection() {
        let features = vec![feature(None, None)];
        assert_eq!(
            aggregate(&features, None),
            Err(AggregateError::NoVariableSelected)
        );
    }

    #[test]
    fn test_not_ready_without_data() {
        assert_eq!(
            aggregate(&[], Some(Variable::Weather)),
            Err(AggregateError::NoData)
        );
    }

    #[test]
    fn test_variable_keys_match_source_properties() {
        assert_eq!(Variable::BikeLane.key(), "ON_BIKELANE");
        assert_eq!(Variable::Severity.key(), "GRAVITE");
        assert_eq!(Variable::Weather.key(), "CD_COND_METEO");
        assert_eq!(Variable::Lighting.key(), "CD_ECLRM");
    }

    #[test]
    fn test_color_for_matches_classifier() {
        let f = feature(Some(json!("Léger")), Some(json!("14")));
        assert_eq!(
            Variable::Severity.color_for(&f),
            crate::data::AccidentType::Injury.color()
        );
        assert_eq!(
            Variable::Weather.color_for(&f),
            weather_color(Some(&json!("14")))
        );
    }
}
