//! Location and incident queries.
//!
//! Distance and containment filters run inside `SQLite` through the scalar
//! functions in [`crate::functions`], so they combine with date windows,
//! `ORDER BY` and `LIMIT` in a single statement. Rows are decoded by column
//! name into the typed records of `crash_map_database_models`.
//!
//! Every listing returns an empty result on an unavailable store.

#![allow(clippy::module_name_repetitions)]

use crash_map_database_models::{
    DateWindow, IncidentDetails, IncidentRow, LocationCategory, LocationRow, MAX_LIMIT,
};
use rusqlite::{
    Connection, OptionalExtension as _, Row, Statement, ToSql, named_params, types::ValueRef,
};

use crate::{LookupError, Store, StoreError};

const LOCATION_COLUMNS: &str = "id, name, category, latitude, longitude, the_geom";

/// Sort key substituted for the `intersection` category so intersections
/// list after every other category.
const INTERSECTION_SORT_KEY: &str = "zzzz";

/// Spatial reference id passed to `MAKE_POINT`.
const WGS84_SRID: i64 = 4326;

fn clamp(limit: u32) -> i64 {
    i64::from(limit.min(MAX_LIMIT))
}

/// Finds locations whose name contains every search token.
///
/// Non-intersection categories sort first, alphabetically by category, then
/// intersections; ties break on name. A blank or all-stopword query returns
/// nothing.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails.
pub fn locations_by_name(
    store: &Store,
    query: &str,
    limit: u32,
) -> Result<Vec<LocationRow>, StoreError> {
    let Some(conn) = store.connection() else {
        return Ok(Vec::new());
    };
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }

    let tokens = crash_map_search::tokenize(query);
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let patterns = crash_map_search::like_patterns(&tokens);
    let names: Vec<String> = (0..patterns.len()).map(|i| format!(":token{i}")).collect();

    let predicates = names
        .iter()
        .map(|name| format!("name LIKE {name}"))
        .collect::<Vec<_>>()
        .join(" AND ");
    let sql = format!(
        "SELECT {LOCATION_COLUMNS} FROM locations
         WHERE {predicates}
         ORDER BY CASE WHEN category = 'intersection' THEN '{INTERSECTION_SORT_KEY}' ELSE category END ASC,
                  name ASC
         LIMIT :limit"
    );

    let limit = clamp(limit);
    let mut params: Vec<(&str, &dyn ToSql)> = names
        .iter()
        .zip(&patterns)
        .map(|(name, pattern)| (name.as_str(), pattern as &dyn ToSql))
        .collect();
    params.push((":limit", &limit));

    log::debug!("Searching locations for {tokens:?}");

    query_locations(conn, &sql, params.as_slice())
}

/// Looks up a single location by id.
///
/// # Errors
///
/// Returns [`LookupError::Unavailable`] without a connection,
/// [`LookupError::NotFound`] if no row matches, or
/// [`LookupError::Store`] if the query fails.
pub fn location_by_id(store: &Store, id: &str) -> Result<LocationRow, LookupError> {
    let conn = store.connection().ok_or(LookupError::Unavailable)?;

    conn.query_row(
        &format!("SELECT {LOCATION_COLUMNS} FROM locations WHERE id = :id LIMIT 1"),
        named_params! { ":id": id },
        location_from_row,
    )
    .optional()?
    .ok_or_else(|| LookupError::NotFound { id: id.to_string() })
}

/// Lists every location of a category, ordered by name.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails.
pub fn locations_by_category(
    store: &Store,
    category: &LocationCategory,
) -> Result<Vec<LocationRow>, StoreError> {
    let Some(conn) = store.connection() else {
        return Ok(Vec::new());
    };

    query_locations(
        conn,
        &format!(
            "SELECT {LOCATION_COLUMNS} FROM locations WHERE category = :category ORDER BY name ASC"
        ),
        named_params! { ":category": category.as_str() },
    )
}

/// Incidents inside a location's geometry within the date window, most
/// recent first.
///
/// Point locations, and locations with no or malformed geometry, contain
/// nothing.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails.
pub fn incidents_inside_location(
    store: &Store,
    location: &LocationRow,
    window: &DateWindow,
    limit: u32,
) -> Result<Vec<IncidentRow>, StoreError> {
    let Some(conn) = store.connection() else {
        return Ok(Vec::new());
    };

    let (start, end) = window_bounds(window);
    let limit = clamp(limit);

    query_incidents(
        conn,
        "SELECT *, NULL AS distance FROM incidents
         WHERE substr(crash_date, 1, 10) BETWEEN :start AND :end
           AND ST_CONTAINS(:geom, MAKE_POINT(longitude, latitude, :srid)) = 1
         ORDER BY crash_date DESC
         LIMIT :limit",
        named_params! {
            ":start": start,
            ":end": end,
            ":geom": location.geometry_text(),
            ":srid": WGS84_SRID,
            ":limit": limit,
        },
    )
}

/// Incidents within `max_distance_feet` of a location's coordinates and
/// inside the date window, most recent first, with `distance` populated.
///
/// A location without coordinates yields nothing.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails.
pub fn incidents_near_location(
    store: &Store,
    location: &LocationRow,
    max_distance_feet: f64,
    window: &DateWindow,
    limit: u32,
) -> Result<Vec<IncidentRow>, StoreError> {
    let Some(conn) = store.connection() else {
        return Ok(Vec::new());
    };
    let Some((latitude, longitude)) = location.coordinates() else {
        log::debug!("Location {} has no coordinates", location.id);
        return Ok(Vec::new());
    };

    let (start, end) = window_bounds(window);
    let limit = clamp(limit);

    query_incidents(
        conn,
        "SELECT *, HAVERSINE_DISTANCE(latitude, longitude, :lat, :lon) AS distance
         FROM incidents
         WHERE substr(crash_date, 1, 10) BETWEEN :start AND :end
           AND HAVERSINE_DISTANCE(latitude, longitude, :lat, :lon) <= :max_distance
         ORDER BY crash_date DESC
         LIMIT :limit",
        named_params! {
            ":lat": latitude,
            ":lon": longitude,
            ":start": start,
            ":end": end,
            ":max_distance": max_distance_feet,
            ":limit": limit,
        },
    )
}

/// Incidents within `max_distance_feet` of a location's coordinates, most
/// recent first, with no date window.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails.
pub fn incidents_nearest_to_location(
    store: &Store,
    location: &LocationRow,
    max_distance_feet: f64,
    limit: u32,
) -> Result<Vec<IncidentRow>, StoreError> {
    let Some(conn) = store.connection() else {
        return Ok(Vec::new());
    };
    let Some((latitude, longitude)) = location.coordinates() else {
        log::debug!("Location {} has no coordinates", location.id);
        return Ok(Vec::new());
    };

    let limit = clamp(limit);

    query_incidents(
        conn,
        "SELECT *, HAVERSINE_DISTANCE(latitude, longitude, :lat, :lon) AS distance
         FROM incidents
         WHERE HAVERSINE_DISTANCE(latitude, longitude, :lat, :lon) <= :max_distance
         ORDER BY crash_date DESC
         LIMIT :limit",
        named_params! {
            ":lat": latitude,
            ":lon": longitude,
            ":max_distance": max_distance_feet,
            ":limit": limit,
        },
    )
}

/// Every incident with coordinates and a date, in storage order.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails.
pub fn all_incidents(store: &Store) -> Result<Vec<IncidentRow>, StoreError> {
    let Some(conn) = store.connection() else {
        return Ok(Vec::new());
    };

    query_incidents(conn, "SELECT * FROM incidents", &[])
}

/// The `count` most recent incidents by `crash_date`.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails.
pub fn most_recent_incidents(store: &Store, count: u32) -> Result<Vec<IncidentRow>, StoreError> {
    let Some(conn) = store.connection() else {
        return Ok(Vec::new());
    };

    let limit = clamp(count);

    query_incidents(
        conn,
        "SELECT * FROM incidents ORDER BY crash_date DESC LIMIT :limit",
        named_params! { ":limit": limit },
    )
}

fn window_bounds(window: &DateWindow) -> (String, String) {
    (
        window.start().format("%Y-%m-%d").to_string(),
        window.end().format("%Y-%m-%d").to_string(),
    )
}

fn query_locations(
    conn: &Connection,
    sql: &str,
    params: &[(&str, &dyn ToSql)],
) -> Result<Vec<LocationRow>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, location_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn query_incidents(
    conn: &Connection,
    sql: &str,
    params: &[(&str, &dyn ToSql)],
) -> Result<Vec<IncidentRow>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let columns = IncidentColumns::resolve(&stmt)?;

    let mut rows = stmt.query(params)?;
    let mut incidents = Vec::new();
    let mut skipped = 0_usize;

    while let Some(row) = rows.next()? {
        match columns.decode(row)? {
            Some(incident) => incidents.push(incident),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        log::trace!("Skipped {skipped} incident rows without coordinates or date");
    }

    Ok(incidents)
}

fn location_from_row(row: &Row<'_>) -> rusqlite::Result<LocationRow> {
    Ok(LocationRow {
        id: text_value(row.get_ref("id")?).unwrap_or_default(),
        name: text_value(row.get_ref("name")?).unwrap_or_default(),
        category: LocationCategory::from(text_value(row.get_ref("category")?).unwrap_or_default()),
        latitude: real_value(row.get_ref("latitude")?),
        longitude: real_value(row.get_ref("longitude")?),
        the_geom: text_value(row.get_ref("the_geom")?),
    })
}

/// Column positions for an incident statement, resolved once before
/// stepping through rows.
struct IncidentColumns {
    latitude: usize,
    longitude: usize,
    crash_date: usize,
    distance: Option<usize>,
    injuries_fatal: Option<usize>,
    crash_type: Option<usize>,
    street_no: Option<usize>,
    street_direction: Option<usize>,
    street_name: Option<usize>,
    prim_contributory_cause: Option<usize>,
}

impl IncidentColumns {
    fn resolve(stmt: &Statement<'_>) -> Result<Self, StoreError> {
        let required = |column: &'static str| {
            stmt.column_index(column)
                .map_err(|_| StoreError::MissingColumn {
                    table: "incidents",
                    column,
                })
        };
        let optional = |column: &str| stmt.column_index(column).ok();

        Ok(Self {
            latitude: required("latitude")?,
            longitude: required("longitude")?,
            crash_date: required("crash_date")?,
            distance: optional("distance"),
            injuries_fatal: optional("injuries_fatal"),
            crash_type: optional("crash_type"),
            street_no: optional("street_no"),
            street_direction: optional("street_direction"),
            street_name: optional("street_name"),
            prim_contributory_cause: optional("prim_contributory_cause"),
        })
    }

    fn decode(&self, row: &Row<'_>) -> rusqlite::Result<Option<IncidentRow>> {
        let (Some(latitude), Some(longitude), Some(crash_date)) = (
            real_value(row.get_ref(self.latitude)?),
            real_value(row.get_ref(self.longitude)?),
            text_value(row.get_ref(self.crash_date)?),
        ) else {
            return Ok(None);
        };

        let text = |idx: Option<usize>| -> rusqlite::Result<Option<String>> {
            Ok(match idx {
                Some(idx) => text_value(row.get_ref(idx)?),
                None => None,
            })
        };

        let distance = match self.distance {
            Some(idx) => real_value(row.get_ref(idx)?),
            None => None,
        };
        let injuries_fatal = match self.injuries_fatal {
            Some(idx) => integer_value(row.get_ref(idx)?),
            None => None,
        };

        Ok(Some(IncidentRow {
            latitude,
            longitude,
            crash_date,
            distance,
            details: IncidentDetails {
                injuries_fatal,
                crash_type: text(self.crash_type)?,
                street_no: text(self.street_no)?,
                street_direction: text(self.street_direction)?,
                street_name: text(self.street_name)?,
                prim_contributory_cause: text(self.prim_contributory_cause)?,
            },
        }))
    }
}

fn text_value(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
    }
}

#[allow(clippy::cast_precision_loss)]
fn real_value(value: ValueRef<'_>) -> Option<f64> {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => None,
        ValueRef::Integer(i) => Some(i as f64),
        ValueRef::Real(f) => Some(f),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes).ok()?.trim().parse().ok(),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn integer_value(value: ValueRef<'_>) -> Option<i64> {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => None,
        ValueRef::Integer(i) => Some(i),
        ValueRef::Real(f) => Some(f as i64),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes).ok()?.trim().parse().ok(),
    }
}
