#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result types for the crash map spatial join analytics.
//!
//! All types serialize with `camelCase` field names and dates as
//! `YYYY-MM-DD`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Incident totals for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionStat {
    /// Region location id.
    pub id: String,
    /// Region display name.
    pub name: String,
    /// Incidents assigned to this region.
    pub total_incidents: u64,
    /// Latest incident date, if any incident had a parseable date.
    pub most_recent: Option<NaiveDate>,
    /// `total_incidents / (year span + 1)`, where the year span is the
    /// difference between the calendar years of the earliest and latest
    /// incident. Zero for regions without incidents.
    pub avg_per_year: f64,
}

/// Incident count within a fixed radius of an intersection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntersectionCount {
    /// Intersection location id.
    pub id: String,
    /// Intersection display name.
    pub name: String,
    /// Incidents within the radius.
    pub count: u64,
}

/// An intersection matched to one of the most recent incidents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntersectionRecency {
    /// Intersection location id.
    pub id: String,
    /// Intersection display name.
    pub name: String,
    /// Date of the incident that selected this intersection.
    pub most_recent_date: NaiveDate,
    /// Distance from the incident to the intersection, rounded to whole
    /// feet.
    #[serde(rename = "distance")]
    pub distance_feet: i64,
}
