#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Database row types and query parameter definitions.
//!
//! These types represent the shapes of data as stored in and retrieved from
//! the `locations` and `incidents` tables of the read-only `SQLite` store.
//! Rows are decoded into them at the store boundary so downstream code never
//! deals with loosely typed records.

use std::fmt;

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// System ceiling for every listing operation's `limit`.
pub const MAX_LIMIT: u32 = 1000;

/// Category of a location.
///
/// `intersection` is the only point category; everything else is an area
/// described by a `POLYGON` or `MULTIPOLYGON`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LocationCategory {
    /// A street intersection (point geometry).
    Intersection,
    /// A city ward.
    Ward,
    /// A community area or neighborhood.
    Neighborhood,
    /// Any other area category found in the data.
    Other(String),
}

impl LocationCategory {
    /// Returns the category as stored in the `category` column.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Intersection => "intersection",
            Self::Ward => "ward",
            Self::Neighborhood => "neighborhood",
            Self::Other(other) => other,
        }
    }

    /// Returns `true` for the point category.
    #[must_use]
    pub const fn is_point(&self) -> bool {
        matches!(self, Self::Intersection)
    }

    /// Returns `true` for every area category.
    #[must_use]
    pub const fn is_shape(&self) -> bool {
        !self.is_point()
    }
}

impl From<&str> for LocationCategory {
    fn from(value: &str) -> Self {
        match value {
            "intersection" => Self::Intersection,
            "ward" => Self::Ward,
            "neighborhood" => Self::Neighborhood,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for LocationCategory {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<LocationCategory> for String {
    fn from(value: LocationCategory) -> Self {
        match value {
            LocationCategory::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for LocationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the `locations` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRow {
    /// Stable unique key.
    pub id: String,
    /// Display name, e.g. `"STATE ST & MADISON ST"`.
    pub name: String,
    /// Location category.
    pub category: LocationCategory,
    /// Latitude (WGS84); only meaningful for intersections.
    pub latitude: Option<f64>,
    /// Longitude (WGS84); only meaningful for intersections.
    pub longitude: Option<f64>,
    /// WKT geometry: `POINT` for intersections, `POLYGON`/`MULTIPOLYGON`
    /// otherwise.
    pub the_geom: Option<String>,
}

impl LocationRow {
    /// Returns `true` if this location is a point (an intersection).
    #[must_use]
    pub const fn is_point(&self) -> bool {
        self.category.is_point()
    }

    /// Returns `true` if this location is an area.
    #[must_use]
    pub const fn is_shape(&self) -> bool {
        self.category.is_shape()
    }

    /// Returns `(latitude, longitude)` when both are present.
    #[must_use]
    pub const fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    /// Returns the WKT geometry text, or `""` when absent.
    #[must_use]
    pub fn geometry_text(&self) -> &str {
        self.the_geom.as_deref().unwrap_or_default()
    }
}

/// Descriptive incident columns that the spatial engine never reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentDetails {
    /// Number of fatal injuries.
    pub injuries_fatal: Option<i64>,
    /// Crash type, e.g. `"REAR END"`.
    pub crash_type: Option<String>,
    /// Street number.
    pub street_no: Option<String>,
    /// Street direction prefix (`N`, `S`, `E`, `W`).
    pub street_direction: Option<String>,
    /// Street name.
    pub street_name: Option<String>,
    /// Primary contributory cause.
    pub prim_contributory_cause: Option<String>,
}

/// A row of the `incidents` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRow {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// ISO-8601 date or date-time text.
    pub crash_date: String,
    /// Distance in feet from the query point; only set by distance queries.
    pub distance: Option<f64>,
    /// Descriptive columns.
    #[serde(flatten)]
    pub details: IncidentDetails,
}

impl IncidentRow {
    /// Creates a row with no descriptive fields.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, crash_date: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            crash_date: crash_date.into(),
            distance: None,
            details: IncidentDetails::default(),
        }
    }

    /// Parses `crash_date`, or `None` if it is not a recognized format.
    #[must_use]
    pub fn occurred_at(&self) -> Option<NaiveDateTime> {
        parse_crash_date(&self.crash_date)
    }

    /// Calendar date of the incident.
    #[must_use]
    pub fn occurred_on(&self) -> Option<NaiveDate> {
        self.occurred_at().map(|dt| dt.date())
    }

    /// Distance rounded to whole feet.
    #[must_use]
    pub fn rounded_distance(&self) -> Option<f64> {
        self.distance.map(f64::round)
    }

    /// Display title composed from the descriptive fields.
    #[must_use]
    pub fn title(&self) -> String {
        let d = &self.details;
        let fatal = d
            .injuries_fatal
            .map_or_else(|| "Unknown".to_string(), |n| n.to_string());
        format!(
            "{fatal} fatalities in {} on {} {} {}",
            d.crash_type.as_deref().unwrap_or("Unknown"),
            d.street_no.as_deref().unwrap_or_default(),
            d.street_direction.as_deref().unwrap_or_default(),
            d.street_name.as_deref().unwrap_or("Unknown Street"),
        )
    }

    /// Borrows the row as its display shape.
    #[must_use]
    pub fn view(&self) -> IncidentView<'_> {
        IncidentView {
            title: self.title(),
            cause: self.cause(),
            crash_date: &self.crash_date,
            latitude: self.latitude,
            longitude: self.longitude,
            distance: self.rounded_distance(),
            details: &self.details,
        }
    }

    /// Primary contributory cause, defaulting to `"Unknown Category"`.
    #[must_use]
    pub fn cause(&self) -> &str {
        self.details
            .prim_contributory_cause
            .as_deref()
            .unwrap_or("Unknown Category")
    }
}

/// Display shape of an incident row.
///
/// Carries the composed title and cause, and rounds `distance` to whole
/// feet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentView<'a> {
    /// See [`IncidentRow::title`].
    pub title: String,
    /// See [`IncidentRow::cause`].
    pub cause: &'a str,
    /// ISO-8601 date or date-time text.
    pub crash_date: &'a str,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Distance in whole feet, when the query computed one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// Descriptive columns.
    #[serde(flatten)]
    pub details: &'a IncidentDetails,
}

/// Parses the crash date formats found in the store.
///
/// Accepts RFC 3339 (converted to UTC), `YYYY-MM-DDTHH:MM:SS[.fff]`,
/// `YYYY-MM-DD HH:MM:SS[.fff]` and a bare `YYYY-MM-DD` (midnight).
#[must_use]
pub fn parse_crash_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// A symmetric calendar-date window around a reference date.
///
/// Queries keep incidents whose date falls in
/// `[reference - days, reference + days]`, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    /// Center of the window.
    pub reference: NaiveDate,
    /// Days on either side of the reference.
    pub days: u32,
}

impl DateWindow {
    /// Creates a window around `reference`.
    #[must_use]
    pub const fn new(reference: NaiveDate, days: u32) -> Self {
        Self { reference, days }
    }

    /// Creates a window around today's UTC date.
    #[must_use]
    pub fn around_today(days: u32) -> Self {
        Self::new(Utc::now().date_naive(), days)
    }

    /// First date of the window.
    #[must_use]
    pub fn start(&self) -> NaiveDate {
        self.reference
            .checked_sub_days(Days::new(u64::from(self.days)))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Last date of the window.
    #[must_use]
    pub fn end(&self) -> NaiveDate {
        self.reference
            .checked_add_days(Days::new(u64::from(self.days)))
            .unwrap_or(NaiveDate::MAX)
    }
}

/// Caller-configurable defaults for listing queries.
///
/// Deserialized from TOML; every field falls back to its built-in default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryDefaults {
    /// Ceiling applied to every `limit`.
    pub max_limit: u32,
    /// Default result count for name search.
    pub name_search_limit: u32,
    /// Default radius for dated "near this location" listings.
    pub near_distance_feet: f64,
    /// Default radius for the undated nearest listing.
    pub nearest_distance_feet: f64,
    /// Default half-width of the date window.
    pub window_days: u32,
    /// Category aggregated by region statistics.
    pub region_category: String,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            max_limit: MAX_LIMIT,
            name_search_limit: 25,
            near_distance_feet: 5280.0,
            nearest_distance_feet: 5280.0,
            window_days: 90,
            region_category: "neighborhood".to_string(),
        }
    }
}

impl QueryDefaults {
    /// Clamps a requested limit to `max_limit`, which itself never exceeds
    /// [`MAX_LIMIT`].
    #[must_use]
    pub fn clamp_limit(&self, limit: u32) -> u32 {
        limit.min(self.max_limit).min(MAX_LIMIT)
    }
}

/// Row count for one table, as reported by the store summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    /// Human-readable table label (`"Locations"`, `"Incidents"`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Number of rows.
    pub count: u64,
}
