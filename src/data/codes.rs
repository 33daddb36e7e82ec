//! Code normalization and classification
//!
//! The accident dataset encodes its categorical variables inconsistently: the
//! same weather code can arrive as the number `11`, the string `"11"`, the
//! string `"11.0"` (a float round-trip artifact), or be missing entirely.
//! [`CanonicalCode::normalize`] collapses all of these into one canonical key,
//! and the classifiers below map canonical keys to labels and display colors.
//!
//! Every function in this module is pure and total: unknown or malformed
//! input degrades to a sentinel ("Undefined" label, wrapped palette color,
//! empty code) instead of failing.

use egui::Color32;
use serde_json::Value;

/// Sentinel label for codes not present in a lookup table.
pub const UNDEFINED_LABEL: &str = "Undefined";

/// Canonical string form of a categorical code, stable under the numeric/text
/// formatting differences of the source data.
///
/// Missing and unparseable values normalize to the empty code, which is
/// distinct from every valid code.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CanonicalCode(String);

impl CanonicalCode {
    /// The empty code, produced for missing/unparseable input.
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Normalize a raw property value into a canonical code.
    ///
    /// Absent/null values and the case-insensitive trimmed tokens `"nan"`,
    /// `"none"` and `""` yield the empty code. Anything else is trimmed,
    /// lowercased, and its leading integer portion parsed (so a fractional
    /// suffix like `.0` is discarded); `11`, `"11"`, `"11.0"` and `" 11 "`
    /// all normalize to `"11"`.
    pub fn normalize(raw: Option<&Value>) -> Self {
        let text = match raw {
            None | Some(Value::Null) => return Self::empty(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };

        let token = text.trim().to_lowercase();
        if token.is_empty() || token == "nan" || token == "none" {
            return Self::empty();
        }

        match parse_leading_int(&token) {
            Some(n) => Self(n.to_string()),
            None => Self::empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Integer value of the code; the empty code reads as 0.
    pub fn value(&self) -> i64 {
        self.0.parse().unwrap_or(0)
    }
}

/// Parse the leading (optionally signed) decimal integer of a token, if any.
fn parse_leading_int(token: &str) -> Option<i64> {
    let mut end = 0;
    for (i, c) in token.char_indices() {
        if c.is_ascii_digit() || (i == 0 && (c == '+' || c == '-')) {
            end = i + c.len_utf8();
        } else {
            break;
        }
    }
    token[..end].parse().ok()
}

/// Weather condition codes from the Quebec collision reports.
static WEATHER_LABELS: &[(&str, &str)] = &[
    ("11", "Clear"),
    ("12", "Partly cloudy"),
    ("13", "Cloudy"),
    ("14", "Rain"),
    ("15", "Snow"),
    ("16", "Freezing rain"),
    ("17", "Fog"),
    ("18", "High winds"),
    ("19", "Other precip"),
    ("99", "Other / Unspecified"),
];

static WEATHER_PALETTE: [Color32; 10] = [
    Color32::from_rgb(0x00, 0xff, 0x00),
    Color32::from_rgb(0x66, 0xff, 0x66),
    Color32::from_rgb(0xcc, 0xff, 0x66),
    Color32::from_rgb(0xff, 0xff, 0x66),
    Color32::from_rgb(0xff, 0xcc, 0x66),
    Color32::from_rgb(0xff, 0x99, 0x66),
    Color32::from_rgb(0xff, 0x66, 0x66),
    Color32::from_rgb(0xcc, 0x66, 0xff),
    Color32::from_rgb(0x99, 0x66, 0xff),
    Color32::from_rgb(0x66, 0x66, 0xff),
];

/// Lighting condition codes from the Quebec collision reports.
static LIGHTING_LABELS: &[(&str, &str)] = &[
    ("1", "Daytime – bright"),
    ("2", "Daytime – semi-obscure"),
    ("3", "Night – lit"),
    ("4", "Night – unlit"),
];

static LIGHTING_PALETTE: [Color32; 4] = [
    Color32::from_rgb(0xff, 0xff, 0x66),
    Color32::from_rgb(0xff, 0xcc, 0x66),
    Color32::from_rgb(0xff, 0x99, 0x66),
    Color32::from_rgb(0xff, 0x66, 0x66),
];

/// Human-readable weather label, or [`UNDEFINED_LABEL`] for unknown codes.
pub fn weather_label(raw: Option<&Value>) -> &'static str {
    lookup_label(WEATHER_LABELS, raw)
}

/// Marker color for a weather code.
pub fn weather_color(raw: Option<&Value>) -> Color32 {
    palette_color(&WEATHER_PALETTE, raw)
}

/// Human-readable lighting label, or [`UNDEFINED_LABEL`] for unknown codes.
pub fn lighting_label(raw: Option<&Value>) -> &'static str {
    lookup_label(LIGHTING_LABELS, raw)
}

/// Marker color for a lighting code.
pub fn lighting_color(raw: Option<&Value>) -> Color32 {
    palette_color(&LIGHTING_PALETTE, raw)
}

fn lookup_label(table: &'static [(&str, &str)], raw: Option<&Value>) -> &'static str {
    let code = CanonicalCode::normalize(raw);
    table
        .iter()
        .find(|(key, _)| *key == code.as_str())
        .map(|(_, label)| *label)
        .unwrap_or(UNDEFINED_LABEL)
}

/// Select a palette color by wrapping the code value around the palette
/// length. Codes beyond the palette size wrap indefinitely so that coloring
/// is total over an unbounded code range; the empty code reads as 0.
fn palette_color(palette: &[Color32], raw: Option<&Value>) -> Color32 {
    let value = CanonicalCode::normalize(raw).value();
    palette[value.rem_euclid(palette.len() as i64) as usize]
}

/// Accident severity category, classified from free-text severity values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccidentType {
    FatalOrHospitalization,
    Injury,
    NoInjury,
}

impl AccidentType {
    /// Classify a raw severity text by case-insensitive substring match.
    ///
    /// The source texts are French ("Mortel ou grave", "Léger", ...). The
    /// fatal check runs first so a text naming both a fatal and an injury
    /// indicator still classifies as fatal. Absent input defaults to
    /// [`AccidentType::NoInjury`].
    pub fn classify(raw: Option<&Value>) -> Self {
        let text = match raw {
            None | Some(Value::Null) => return Self::NoInjury,
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        let text = text.to_lowercase();

        if text.contains("mortel") || text.contains("grave") {
            Self::FatalOrHospitalization
        } else if text.contains("léger") {
            Self::Injury
        } else {
            Self::NoInjury
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::FatalOrHospitalization => "Fatal/Hospitalization",
            Self::Injury => "Injury",
            Self::NoInjury => "No Injury",
        }
    }

    pub fn color(&self) -> Color32 {
        match self {
            Self::FatalOrHospitalization => Color32::RED,
            Self::Injury => Color32::YELLOW,
            Self::NoInjury => Color32::GREEN,
        }
    }
}

/// Three-way bike-lane flag: present-and-true, present-and-false, or absent.
///
/// The source flag is a dynamically typed "truthy" value; `Absent` collapses
/// to off-lane everywhere it is consumed, but the distinction is kept so a
/// known off-lane record can be told apart from an unknown one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaneFlag {
    On,
    Off,
    Absent,
}

impl LaneFlag {
    pub fn from_raw(raw: Option<&Value>) -> Self {
        match raw {
            None | Some(Value::Null) => Self::Absent,
            Some(value) => {
                if is_truthy(value) {
                    Self::On
                } else {
                    Self::Off
                }
            }
        }
    }

    /// Whether the accident happened on a bike lane; `Absent` reads as off.
    pub fn is_on(&self) -> bool {
        matches!(self, Self::On)
    }

    pub fn label(&self) -> &'static str {
        if self.is_on() { "On Bike Lane" } else { "Off Bike Lane" }
    }

    pub fn color(&self) -> Color32 {
        if self.is_on() { Color32::GREEN } else { Color32::RED }
    }
}

/// Truthiness of a JSON value under the source data's dynamic coercion rules:
/// false, 0, NaN and "" are falsy; any other present value is truthy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(value: Value) -> CanonicalCode {
        CanonicalCode::normalize(Some(&value))
    }

    #[test]
    fn test_normalize_equivalent_spellings() {
        let expected = normalize(json!(11));
        assert_eq!(expected.as_str(), "11");
        assert_eq!(normalize(json!("11")), expected);
        assert_eq!(normalize(json!("11.0")), expected);
        assert_eq!(normalize(json!(" 11 ")), expected);
        assert_eq!(normalize(json!(11.0)), expected);
    }

    #[test]
    fn test_normalize_missing_values() {
        assert!(CanonicalCode::normalize(None).is_empty());
        assert!(normalize(Value::Null).is_empty());
        assert!(normalize(json!("")).is_empty());
        assert!(normalize(json!("nan")).is_empty());
        assert!(normalize(json!("NaN")).is_empty());
        assert!(normalize(json!("None")).is_empty());
    }

    #[test]
    fn test_normalize_unparseable_is_empty() {
        assert!(normalize(json!("clear")).is_empty());
        assert!(normalize(json!(true)).is_empty());
    }

    #[test]
    fn test_empty_code_reads_as_zero() {
        assert_eq!(CanonicalCode::empty().value(), 0);
        assert_eq!(normalize(json!("14")).value(), 14);
    }

    #[test]
    fn test_weather_labels() {
        assert_eq!(weather_label(Some(&json!("14"))), "Rain");
        assert_eq!(weather_label(Some(&json!(14.0))), "Rain");
        assert_eq!(weather_label(Some(&json!("42"))), UNDEFINED_LABEL);
        assert_eq!(weather_label(None), UNDEFINED_LABEL);
    }

    #[test]
    fn test_lighting_labels() {
        assert_eq!(lighting_label(Some(&json!("2.0"))), "Daytime – semi-obscure");
        assert_eq!(lighting_label(Some(&json!(4))), "Night – unlit");
        assert_eq!(lighting_label(Some(&json!("7"))), UNDEFINED_LABEL);
    }

    #[test]
    fn test_weather_color_wraps_at_palette_length() {
        assert_eq!(
            weather_color(Some(&json!(10))),
            weather_color(Some(&json!(0)))
        );
        // The empty code reads as 0, so missing values get the first color too.
        assert_eq!(weather_color(None), weather_color(Some(&json!(0))));
    }

    #[test]
    fn test_lighting_color_wraps_at_palette_length() {
        assert_eq!(
            lighting_color(Some(&json!(4))),
            lighting_color(Some(&json!(0)))
        );
        assert_ne!(
            lighting_color(Some(&json!(1))),
            lighting_color(Some(&json!(2)))
        );
    }

    #[test]
    fn test_accident_type_classification() {
        assert_eq!(
            AccidentType::classify(Some(&json!("Léger"))),
            AccidentType::Injury
        );
        assert_eq!(
            AccidentType::classify(Some(&json!("Mortel ou grave"))),
            AccidentType::FatalOrHospitalization
        );
        assert_eq!(AccidentType::classify(None), AccidentType::NoInjury);
        assert_eq!(
            AccidentType::classify(Some(&json!("Dommages matériels"))),
            AccidentType::NoInjury
        );
    }

    #[test]
    fn test_fatal_takes_precedence_over_injury() {
        assert_eq!(
            AccidentType::classify(Some(&json!("Grave avec blessé léger"))),
            AccidentType::FatalOrHospitalization
        );
    }

    #[test]
    fn test_accident_type_colors() {
        assert_eq!(
            AccidentType::FatalOrHospitalization.color(),
            Color32::RED
        );
        assert_eq!(AccidentType::Injury.color(), Color32::YELLOW);
        assert_eq!(AccidentType::NoInjury.color(), Color32::GREEN);
    }

    #[test]
    fn test_lane_flag_falsy_values() {
        assert!(!LaneFlag::from_raw(Some(&json!(0))).is_on());
        assert!(!LaneFlag::from_raw(Some(&json!(false))).is_on());
        assert!(!LaneFlag::from_raw(None).is_on());
        assert!(!LaneFlag::from_raw(Some(&json!(""))).is_on());
    }

    #[test]
    fn test_lane_flag_truthy_values() {
        assert!(LaneFlag::from_raw(Some(&json!(1))).is_on());
        assert!(LaneFlag::from_raw(Some(&json!("true"))).is_on());
        assert!(LaneFlag::from_raw(Some(&json!(true))).is_on());
    }

    #[test]
    fn test_lane_flag_keeps_absent_distinct() {
        assert_eq!(LaneFlag::from_raw(None), LaneFlag::Absent);
        assert_eq!(LaneFlag::from_raw(Some(&json!(false))), LaneFlag::Off);
        assert_eq!(LaneFlag::from_raw(Some(&Value::Null)), LaneFlag::Absent);
    }

    #[test]
    fn test_lane_flag_labels() {
        assert_eq!(LaneFlag::On.label(), "On Bike Lane");
        assert_eq!(LaneFlag::Off.label(), "Off Bike Lane");
        assert_eq!(LaneFlag::Absent.label(), "Off Bike Lane");
    }
}
