//! Batch spatial joins between locations and incidents.
//!
//! These run in memory over rows already read from the store. Region
//! geometries are parsed once per call and reused for every incident, which
//! the per-row `ST_CONTAINS` path cannot do when regions alternate.

use std::collections::BTreeSet;

use chrono::{Datelike as _, NaiveDateTime};
use crash_map_analytics_models::{IntersectionCount, IntersectionRecency, RegionStat};
use crash_map_database_models::{IncidentRow, LocationRow};
use crash_map_geometry::{Geometry, codec, containment, distance_feet};
use geo::Rect;

/// Radius for counting incidents around an intersection.
pub const COUNT_RADIUS_FEET: f64 = 500.0;

/// Radius for matching a recent incident to its nearest intersection.
pub const RECENCY_RADIUS_FEET: f64 = 200.0;

/// Most recent incidents considered for recency ranking.
pub const RECENT_CANDIDATES: u32 = 50;

/// Result size of both intersection rankings.
pub const TOP_N: usize = 10;

struct Region<'a> {
    row: &'a LocationRow,
    geometry: Option<Geometry>,
    bounds: Option<Rect<f64>>,
    count: u64,
    earliest: Option<NaiveDateTime>,
    latest: Option<NaiveDateTime>,
}

impl<'a> Region<'a> {
    fn new(row: &'a LocationRow) -> Self {
        let geometry = match codec::parse(row.geometry_text()) {
            Ok(geometry) => Some(geometry),
            Err(e) => {
                log::warn!("Failed to parse geometry for {}: {e}", row.name);
                None
            }
        };
        let bounds = geometry.as_ref().and_then(Geometry::bounding_rect);

        Self {
            row,
            geometry,
            bounds,
            count: 0,
            earliest: None,
            latest: None,
        }
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        let Some(geometry) = &self.geometry else {
            return false;
        };
        if let Some(bounds) = &self.bounds
            && !within(bounds, x, y)
        {
            return false;
        }
        containment::geometry_contains(geometry, x, y)
    }

    fn record(&mut self, occurred_at: Option<NaiveDateTime>) {
        self.count += 1;
        if let Some(at) = occurred_at {
            self.earliest = Some(self.earliest.map_or(at, |e| e.min(at)));
            self.latest = Some(self.latest.map_or(at, |l| l.max(at)));
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn into_stat(self) -> RegionStat {
        let avg_per_year = match (self.earliest, self.latest) {
            (Some(earliest), Some(latest)) => {
                let span = f64::from(latest.year() - earliest.year());
                self.count as f64 / (span + 1.0)
            }
            _ if self.count > 0 => self.count as f64,
            _ => 0.0,
        };

        RegionStat {
            id: self.row.id.clone(),
            name: self.row.name.clone(),
            total_incidents: self.count,
            most_recent: self.latest.map(|at| at.date()),
            avg_per_year,
        }
    }
}

fn within(rect: &Rect<f64>, x: f64, y: f64) -> bool {
    let (min, max) = (rect.min(), rect.max());
    x >= min.x && x <= max.x && y >= min.y && y <= max.y
}

/// Assigns each incident to the first region containing it and aggregates
/// per-region totals.
///
/// Regions are tested in slice order and the first match wins, so
/// overlapping regions under-count. Regions whose geometry fails to parse
/// keep a zero total. Incidents with unparseable dates still count toward
/// the total but not toward `most_recent` or the year span; a region whose
/// incidents all lack dates reports its total as the yearly average.
#[must_use]
pub fn region_incident_stats(regions: &[LocationRow], incidents: &[IncidentRow]) -> Vec<RegionStat> {
    let mut prepared: Vec<Region<'_>> = regions.iter().map(Region::new).collect();

    for incident in incidents {
        let (x, y) = (incident.longitude, incident.latitude);
        if let Some(region) = prepared.iter_mut().find(|region| region.contains(x, y)) {
            region.record(incident.occurred_at());
        }
    }

    prepared.into_iter().map(Region::into_stat).collect()
}

/// Counts incidents within `radius_feet` (inclusive) of a point.
pub(crate) fn count_incidents_within(
    latitude: f64,
    longitude: f64,
    incidents: &[IncidentRow],
    radius_feet: f64,
) -> u64 {
    incidents
        .iter()
        .filter(|incident| {
            distance_feet(latitude, longitude, incident.latitude, incident.longitude)
                <= radius_feet
        })
        .count() as u64
}

/// Ranks intersections by the number of incidents within
/// [`COUNT_RADIUS_FEET`] and returns the top [`TOP_N`].
///
/// Ties keep input order. Intersections without coordinates count zero.
#[must_use]
pub fn top_intersections_by_incident_count(
    intersections: &[LocationRow],
    incidents: &[IncidentRow],
) -> Vec<IntersectionCount> {
    let mut counts: Vec<IntersectionCount> = intersections
        .iter()
        .map(|intersection| IntersectionCount {
            id: intersection.id.clone(),
            name: intersection.name.clone(),
            count: intersection
                .coordinates()
                .map_or(0, |(latitude, longitude)| {
                    count_incidents_within(latitude, longitude, incidents, COUNT_RADIUS_FEET)
                }),
        })
        .collect();

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(TOP_N);
    counts
}

/// Matches the most recent incidents to their nearest intersection within
/// [`RECENCY_RADIUS_FEET`].
///
/// `incidents` must be ordered most recent first; only the first
/// [`RECENT_CANDIDATES`] are considered. An intersection already matched by
/// a more recent incident is skipped. Stops after [`TOP_N`] matches.
/// Incidents without a parseable date are ignored.
#[must_use]
pub fn top_intersections_by_recent_incidents(
    intersections: &[LocationRow],
    incidents: &[IncidentRow],
) -> Vec<IntersectionRecency> {
    let located: Vec<(&LocationRow, f64, f64)> = intersections
        .iter()
        .filter_map(|row| row.coordinates().map(|(lat, lon)| (row, lat, lon)))
        .collect();

    let mut results = Vec::new();
    let mut seen = BTreeSet::new();

    for incident in incidents.iter().take(RECENT_CANDIDATES as usize) {
        if results.len() >= TOP_N {
            break;
        }

        let Some(occurred_on) = incident.occurred_on() else {
            log::debug!("Skipping incident with unparseable date {}", incident.crash_date);
            continue;
        };

        let mut nearest: Option<&LocationRow> = None;
        let mut min_distance = f64::INFINITY;

        for &(row, latitude, longitude) in &located {
            let d = distance_feet(incident.latitude, incident.longitude, latitude, longitude);
            if d < min_distance && d <= RECENCY_RADIUS_FEET {
                min_distance = d;
                nearest = Some(row);
            }
        }

        if let Some(row) = nearest
            && seen.insert(row.id.as_str())
        {
            results.push(IntersectionRecency {
                id: row.id.clone(),
                name: row.name.clone(),
                most_recent_date: occurred_on,
                distance_feet: round_feet(min_distance),
            });
        }
    }

    results
}

#[allow(clippy::cast_possible_truncation)]
fn round_feet(feet: f64) -> i64 {
    feet.round() as i64
}
