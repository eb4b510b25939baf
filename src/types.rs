//! Core value types shared by the builder and the writer.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BuildError;

/// A typed literal operand of a comparison or range predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    Date(DateTime<Utc>),
}

impl Literal {
    /// Returns true for the integral and floating point variants.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Literal::Short(_)
                | Literal::Int(_)
                | Literal::Long(_)
                | Literal::Float(_)
                | Literal::Double(_)
        )
    }

    /// Literal text without any quoting.
    ///
    /// Floating point values always carry a decimal point, integral values
    /// never do, dates are ISO-8601 in UTC with millisecond precision.
    pub fn text(&self) -> String {
        match self {
            Literal::Str(s) => s.clone(),
            Literal::Short(v) => v.to_string(),
            Literal::Int(v) => v.to_string(),
            Literal::Long(v) => v.to_string(),
            Literal::Float(v) => decimal_text(f64::from(*v), v.to_string()),
            Literal::Double(v) => decimal_text(*v, v.to_string()),
            Literal::Bool(v) => v.to_string(),
            Literal::Date(d) => format_timestamp(d),
        }
    }
}

// `f32 -> f64` widening adds noise digits (1.1f32 is 1.100000023841858f64), so
// the shortest representation of the source type is passed in.
fn decimal_text(value: f64, shortest: String) -> String {
    if value.is_finite() && !shortest.contains(['.', 'e', 'E']) {
        format!("{}.0", shortest)
    } else {
        shortest
    }
}

/// Format a floating point number so that it always shows a decimal point.
pub fn format_decimal(value: f64) -> String {
    decimal_text(value, value.to_string())
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Str(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Str(value)
    }
}

impl From<i16> for Literal {
    fn from(value: i16) -> Self {
        Literal::Short(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Int(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Long(value)
    }
}

impl From<f32> for Literal {
    fn from(value: f32) -> Self {
        Literal::Float(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Double(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<DateTime<Utc>> for Literal {
    fn from(value: DateTime<Utc>) -> Self {
        Literal::Date(value)
    }
}

/// 0000-01-01T00:00:00.000Z
const EARLIEST_RENDERED_MILLIS: i64 = -62_167_219_200_000;
/// 9999-12-31T23:59:59.999Z
const LATEST_RENDERED_MILLIS: i64 = 253_402_300_799_999;

/// Render a timestamp as `yyyy-MM-ddTHH:mm:ss.SSSZ`.
///
/// Instants outside years 0000 to 9999 are clamped to the nearest bound so
/// the year always has four digits.
pub fn format_timestamp(date: &DateTime<Utc>) -> String {
    let millis = date
        .timestamp_millis()
        .clamp(EARLIEST_RENDERED_MILLIS, LATEST_RENDERED_MILLIS);
    DateTime::from_timestamp_millis(millis)
        .unwrap_or(*date)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Coerce textual date input to a UTC timestamp.
///
/// Accepts RFC 3339, naive `yyyy-MM-ddTHH:mm:ss[.fff]` (taken as UTC) and
/// `yyyy-MM-dd` (midnight UTC). Digit-only text such as `"2013"` is not a
/// date; epoch milliseconds travel as numbers ([`DateInput::EpochMillis`]).
///
/// # Errors
///
/// Returns `BuildError::LiteralCoercion` if no format matches.
pub fn parse_date(input: &str) -> Result<DateTime<Utc>, BuildError> {
    let trimmed = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    Err(BuildError::LiteralCoercion {
        input: input.to_string(),
        message: "expected RFC 3339 or yyyy-MM-dd".to_string(),
    })
}

/// Timestamp from milliseconds since the Unix epoch.
pub fn from_epoch_millis(millis: i64) -> Result<DateTime<Utc>, BuildError> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| BuildError::LiteralCoercion {
            input: millis.to_string(),
            message: "epoch milliseconds out of range".to_string(),
        })
}

/// A date as it arrives in a query document.
///
/// A JSON number is epoch milliseconds; a JSON string goes through
/// [`parse_date`], so `"2013"` is rejected rather than read as 2013 ms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    EpochMillis(i64),
    Text(String),
}

impl DateInput {
    pub fn to_datetime(&self) -> Result<DateTime<Utc>, BuildError> {
        match self {
            DateInput::EpochMillis(millis) => from_epoch_millis(*millis),
            DateInput::Text(text) => parse_date(text),
        }
    }
}

impl From<&str> for DateInput {
    fn from(value: &str) -> Self {
        DateInput::Text(value.to_string())
    }
}

impl From<i64> for DateInput {
    fn from(value: i64) -> Self {
        DateInput::EpochMillis(value)
    }
}

/// Coordinate ordering of geometry input supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AxisOrder {
    /// Longitude first (x, y); swapped once when building.
    LonLat,
    /// Latitude first; stored unchanged.
    #[default]
    LatLon,
}

/// Unit token appended to `BEYOND` / `DWITHIN` distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DistanceUnit {
    #[default]
    #[serde(rename = "meters")]
    Meters,
    #[serde(rename = "kilometers")]
    Kilometers,
    #[serde(rename = "feet")]
    Feet,
    #[serde(rename = "statute miles")]
    StatuteMiles,
    #[serde(rename = "nautical miles")]
    NauticalMiles,
}

impl DistanceUnit {
    /// Token written after the distance value.
    pub fn token(&self) -> &'static str {
        match self {
            DistanceUnit::Meters => "meters",
            DistanceUnit::Kilometers => "kilometers",
            DistanceUnit::Feet => "feet",
            DistanceUnit::StatuteMiles => "statute miles",
            DistanceUnit::NauticalMiles => "nautical miles",
        }
    }

    /// Number of meters in one of this unit.
    pub fn meters_per_unit(&self) -> f64 {
        match self {
            DistanceUnit::Meters => 1.0,
            DistanceUnit::Kilometers => 1000.0,
            DistanceUnit::Feet => 0.3048,
            DistanceUnit::StatuteMiles => 1609.344,
            DistanceUnit::NauticalMiles => 1852.0,
        }
    }

    /// Parse a unit token.
    ///
    /// Returns `None` for unknown values (caller should error).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "meters" | "m" => Some(DistanceUnit::Meters),
            "kilometers" | "km" => Some(DistanceUnit::Kilometers),
            "feet" | "ft" => Some(DistanceUnit::Feet),
            "statute miles" | "mi" => Some(DistanceUnit::StatuteMiles),
            "nautical miles" | "nm" => Some(DistanceUnit::NauticalMiles),
            _ => None,
        }
    }
}

/// A distance with its unit, converted to meters at the builder boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distance {
    pub value: f64,
    pub unit: DistanceUnit,
}

impl Distance {
    pub fn new(value: f64, unit: DistanceUnit) -> Self {
        Self { value, unit }
    }

    pub fn meters(&self) -> f64 {
        self.value * self.unit.meters_per_unit()
    }
}
