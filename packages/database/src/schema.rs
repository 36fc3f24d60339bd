//! Table definitions for the crash store.
//!
//! Geometry is stored as WKT text; dates as ISO-8601 text whose first ten
//! characters are `YYYY-MM-DD`.

use crash_map_database_models::{IncidentRow, LocationRow};
use rusqlite::{Connection, named_params};

use crate::StoreError;

/// Creates the `locations` and `incidents` tables and their indexes if they
/// do not already exist.
///
/// # Errors
///
/// Returns [`StoreError`] if a statement fails.
pub fn create_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS locations (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            latitude REAL,
            longitude REAL,
            the_geom TEXT
        );

        CREATE TABLE IF NOT EXISTS incidents (
            crash_date TEXT NOT NULL,
            latitude REAL,
            longitude REAL,
            injuries_fatal INTEGER,
            crash_type TEXT,
            street_no TEXT,
            street_direction TEXT,
            street_name TEXT,
            prim_contributory_cause TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_locations_category ON locations (category);
        CREATE INDEX IF NOT EXISTS idx_locations_name ON locations (name);
        CREATE INDEX IF NOT EXISTS idx_incidents_crash_date ON incidents (crash_date);",
    )?;

    Ok(())
}

/// Inserts or replaces a location row.
///
/// # Errors
///
/// Returns [`StoreError`] if the insert fails.
pub fn insert_location(conn: &Connection, location: &LocationRow) -> Result<(), StoreError> {
    conn.execute(
        "INSERT OR REPLACE INTO locations (id, name, category, latitude, longitude, the_geom)
         VALUES (:id, :name, :category, :latitude, :longitude, :the_geom)",
        named_params! {
            ":id": location.id,
            ":name": location.name,
            ":category": location.category.as_str(),
            ":latitude": location.latitude,
            ":longitude": location.longitude,
            ":the_geom": location.the_geom,
        },
    )?;

    Ok(())
}

/// Appends an incident row. The `distance` field is query output and is not
/// stored.
///
/// # Errors
///
/// Returns [`StoreError`] if the insert fails.
pub fn insert_incident(conn: &Connection, incident: &IncidentRow) -> Result<(), StoreError> {
    let details = &incident.details;

    conn.execute(
        "INSERT INTO incidents (
            crash_date, latitude, longitude, injuries_fatal, crash_type,
            street_no, street_direction, street_name, prim_contributory_cause
         ) VALUES (
            :crash_date, :latitude, :longitude, :injuries_fatal, :crash_type,
            :street_no, :street_direction, :street_name, :cause
         )",
        named_params! {
            ":crash_date": incident.crash_date,
            ":latitude": incident.latitude,
            ":longitude": incident.longitude,
            ":injuries_fatal": details.injuries_fatal,
            ":crash_type": details.crash_type,
            ":street_no": details.street_no,
            ":street_direction": details.street_direction,
            ":street_name": details.street_name,
            ":cause": details.prim_contributory_cause,
        },
    )?;

    Ok(())
}
