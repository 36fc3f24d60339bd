#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `SQLite` store, geospatial scalar functions, and queries for the crash map.
//!
//! The store holds two tables, `locations` and `incidents`, and is opened
//! read-only. On open, [`functions::register`] installs
//! `HAVERSINE_DISTANCE`, `MAKE_POINT` and `ST_CONTAINS` so relational filters
//! can combine distance and containment with ordinary column predicates.
//! [`queries`] decodes result rows into the typed records of
//! `crash_map_database_models` at the boundary.
//!
//! A [`Store`] may also be unavailable (no backing connection). Listing
//! operations then return empty results, and lookups by id report
//! [`LookupError::Unavailable`].

pub mod db;
pub mod functions;
pub mod paths;
pub mod queries;
pub mod schema;

use std::path::Path;

use crash_map_database_models::TableSummary;
use rusqlite::{Connection, OpenFlags};

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// `SQLite` error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A query result lacks a column the decoder requires.
    #[error("Missing column '{column}' in {table} result")]
    MissingColumn {
        /// Table the query reads.
        table: &'static str,
        /// Name of the missing column.
        column: &'static str,
    },

    /// Filesystem error while preparing the database location.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from lookups by identifier.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// The store has no backing connection.
    #[error("Database not initialized")]
    Unavailable,

    /// No row has the requested id.
    #[error("Location with ID '{id}' not found")]
    NotFound {
        /// The requested id.
        id: String,
    },

    /// The lookup query failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<rusqlite::Error> for LookupError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Store(StoreError::Database(e))
    }
}

/// Handle to the `locations`/`incidents` store.
///
/// Every connection gets its own scalar function registration, and with it
/// its own `ST_CONTAINS` geometry cache.
pub struct Store {
    conn: Option<Connection>,
}

impl Store {
    /// Opens an existing database file read-only.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be opened or the scalar
    /// functions cannot be registered.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        functions::register(&conn)?;

        log::info!("Opened crash database at {}", path.display());

        Ok(Self { conn: Some(conn) })
    }

    /// Opens (or creates) a writable database file and ensures the schema
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the parent directory, connection, schema, or
    /// function registration fails.
    pub fn create(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            paths::ensure_dir(parent)?;
        }

        let conn = Connection::open(path)?;
        schema::create_schema(&conn)?;
        functions::register(&conn)?;

        log::info!("Initialized crash database at {}", path.display());

        Ok(Self { conn: Some(conn) })
    }

    /// Opens a writable in-memory database with the schema in place.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if schema creation or function registration
    /// fails.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        schema::create_schema(&conn)?;
        functions::register(&conn)?;
        Ok(Self { conn: Some(conn) })
    }

    /// A store with no backing connection.
    #[must_use]
    pub const fn unavailable() -> Self {
        Self { conn: None }
    }

    /// Returns `true` if a connection is present.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.conn.is_some()
    }

    /// Returns the underlying connection, if any.
    #[must_use]
    pub const fn connection(&self) -> Option<&Connection> {
        self.conn.as_ref()
    }

    /// Row counts for the `locations` and `incidents` tables.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the count query fails.
    pub fn summary(&self) -> Result<Vec<TableSummary>, StoreError> {
        let Some(conn) = self.connection() else {
            return Ok(Vec::new());
        };

        let mut stmt = conn.prepare(
            "SELECT 'Locations' AS type, COUNT(1) AS count FROM locations
             UNION ALL
             SELECT 'Incidents' AS type, COUNT(1) AS count FROM incidents",
        )?;

        let rows = stmt.query_map([], |row| {
            let kind: String = row.get("type")?;
            let count: i64 = row.get("count")?;
            Ok(TableSummary {
                kind,
                count: u64::try_from(count).unwrap_or_default(),
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("available", &self.is_available())
            .finish()
    }
}
