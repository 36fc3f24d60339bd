#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial join analytics for the crash map.
//!
//! [`spatial_join`] holds the pure joins over decoded rows. The functions in
//! this module read the full extents they need from a [`Store`] once per
//! call and hand them to those joins.

pub mod spatial_join;

use crash_map_analytics_models::{IntersectionCount, IntersectionRecency, RegionStat};
use crash_map_database::{Store, StoreError, queries};
use crash_map_database_models::LocationCategory;
use thiserror::Error;

/// Errors that can occur during analytics operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Reading locations or incidents failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Per-region incident totals for every location of `category`.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the store cannot be read.
pub fn region_stats(
    store: &Store,
    category: &LocationCategory,
) -> Result<Vec<RegionStat>, AnalyticsError> {
    let regions = queries::locations_by_category(store, category)?;
    let incidents = queries::all_incidents(store)?;

    log::info!(
        "Joining {} incidents against {} {category} regions",
        incidents.len(),
        regions.len()
    );

    Ok(spatial_join::region_incident_stats(&regions, &incidents))
}

/// Intersections ranked by incidents within
/// [`spatial_join::COUNT_RADIUS_FEET`].
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the store cannot be read.
pub fn top_intersections_by_count(store: &Store) -> Result<Vec<IntersectionCount>, AnalyticsError> {
    let intersections = queries::locations_by_category(store, &LocationCategory::Intersection)?;
    let incidents = queries::all_incidents(store)?;

    log::info!(
        "Counting {} incidents around {} intersections",
        incidents.len(),
        intersections.len()
    );

    Ok(spatial_join::top_intersections_by_incident_count(
        &intersections,
        &incidents,
    ))
}

/// Intersections nearest to the most recent incidents.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the store cannot be read.
pub fn top_intersections_by_recency(
    store: &Store,
) -> Result<Vec<IntersectionRecency>, AnalyticsError> {
    let incidents = queries::most_recent_incidents(store, spatial_join::RECENT_CANDIDATES)?;
    let intersections = queries::locations_by_category(store, &LocationCategory::Intersection)?;

    log::debug!(
        "Matching {} recent incidents to {} intersections",
        incidents.len(),
        intersections.len()
    );

    Ok(spatial_join::top_intersections_by_recent_incidents(
        &intersections,
        &incidents,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crash_map_database::schema;
    use crash_map_database_models::{IncidentRow, LocationRow};

    fn location(id: &str, category: LocationCategory) -> LocationRow {
        LocationRow {
            id: id.to_string(),
            name: id.to_uppercase(),
            category,
            latitude: None,
            longitude: None,
            the_geom: None,
        }
    }

    fn fixture() -> Store {
        let store = Store::open_in_memory().unwrap();
        let conn = store.connection().unwrap();

        let mut neighborhood = location("n1", LocationCategory::Neighborhood);
        neighborhood.the_geom = Some("POLYGON((0 0,0 10,10 10,10 0,0 0))".to_string());
        schema::insert_location(conn, &neighborhood).unwrap();

        let mut corner = location("i1", LocationCategory::Intersection);
        corner.latitude = Some(5.0);
        corner.longitude = Some(5.0);
        schema::insert_location(conn, &corner).unwrap();

        for (lat, lon, date) in [
            (5.0, 5.0, "2023-01-01"),
            (5.0, 5.0, "2024-06-01"),
            (50.0, 50.0, "2024-01-01"),
        ] {
            schema::insert_incident(conn, &IncidentRow::new(lat, lon, date)).unwrap();
        }

        store
    }

    #[test]
    fn region_stats_reads_store() {
        let stats = region_stats(&fixture(), &LocationCategory::Neighborhood).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].id, "n1");
        assert_eq!(stats[0].total_incidents, 2);
        assert_eq!(stats[0].most_recent, NaiveDate::from_ymd_opt(2024, 6, 1));
        assert!((stats[0].avg_per_year - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn count_ranking_reads_store() {
        let ranked = top_intersections_by_count(&fixture()).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].count, 2);
    }

    #[test]
    fn recency_ranking_uses_latest_incident() {
        let ranked = top_intersections_by_recency(&fixture()).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, "i1");
        assert_eq!(
            ranked[0].most_recent_date,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
        assert_eq!(ranked[0].distance_feet, 0);
    }

    #[test]
    fn unavailable_store_yields_empty_results() {
        let store = Store::unavailable();
        assert!(
            region_stats(&store, &LocationCategory::Neighborhood)
                .unwrap()
                .is_empty()
        );
        assert!(top_intersections_by_count(&store).unwrap().is_empty());
        assert!(top_intersections_by_recency(&store).unwrap().is_empty());
    }
}
