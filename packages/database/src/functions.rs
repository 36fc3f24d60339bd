//! Geospatial scalar functions registered on every connection.
//!
//! | Name                 | Arity | Result                                  |
//! |----------------------|-------|-----------------------------------------|
//! | `HAVERSINE_DISTANCE` | 4     | distance in feet, `NULL` on `NULL` input |
//! | `MAKE_POINT`         | 3     | `POINT (x y)` text, `NULL` on `NULL` x/y |
//! | `MakePoint`          | 3     | alias of `MAKE_POINT`                   |
//! | `ST_CONTAINS`        | 2     | `1` if contained, otherwise `0`         |
//!
//! None of these raise from malformed input. `ST_CONTAINS` owns a
//! [`ContainmentEngine`] per connection, so its geometry cache never crosses
//! connection boundaries.

use crash_map_geometry::{ContainmentEngine, codec, distance_feet};
use rusqlite::{Connection, functions::Context, functions::FunctionFlags};

/// Great-circle distance in feet.
pub const HAVERSINE_DISTANCE: &str = "HAVERSINE_DISTANCE";
/// Builds point text from `(x, y, srid)`.
pub const MAKE_POINT: &str = "MAKE_POINT";
/// Alternate spelling of [`MAKE_POINT`].
pub const MAKE_POINT_ALIAS: &str = "MakePoint";
/// Point-in-polygon test over WKT arguments.
pub const ST_CONTAINS: &str = "ST_CONTAINS";

/// Registers every scalar function on `conn`.
///
/// # Errors
///
/// Returns an error if `SQLite` rejects a registration.
pub fn register(conn: &Connection) -> rusqlite::Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    conn.create_scalar_function(HAVERSINE_DISTANCE, 4, flags, |ctx| Ok(haversine(ctx)))?;

    for name in [MAKE_POINT, MAKE_POINT_ALIAS] {
        conn.create_scalar_function(name, 3, flags, |ctx| Ok(make_point(ctx)))?;
    }

    let mut engine = ContainmentEngine::new();
    conn.create_scalar_function(ST_CONTAINS, 2, flags, move |ctx| {
        Ok(i64::from(engine.contains(text_arg(ctx, 0), text_arg(ctx, 1))))
    })?;

    log::trace!("Registered geospatial scalar functions");

    Ok(())
}

fn real_arg(ctx: &Context<'_>, idx: usize) -> Option<f64> {
    ctx.get::<Option<f64>>(idx).ok().flatten()
}

fn text_arg<'a>(ctx: &'a Context<'_>, idx: usize) -> &'a str {
    ctx.get_raw(idx).as_str().unwrap_or_default()
}

fn haversine(ctx: &Context<'_>) -> Option<f64> {
    Some(distance_feet(
        real_arg(ctx, 0)?,
        real_arg(ctx, 1)?,
        real_arg(ctx, 2)?,
        real_arg(ctx, 3)?,
    ))
}

fn make_point(ctx: &Context<'_>) -> Option<String> {
    let srid = ctx.get::<Option<i64>>(2).ok().flatten().unwrap_or_default();
    Some(codec::build_point_text(
        real_arg(ctx, 0)?,
        real_arg(ctx, 1)?,
        srid,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        register(&conn).unwrap();
        conn
    }

    #[test]
    fn haversine_distance_in_feet() {
        let feet: f64 = conn()
            .query_row("SELECT HAVERSINE_DISTANCE(0.0, 0.0, 1.0, 0.0)", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert!(feet > 364_000.0 && feet < 365_000.0, "{feet}");
    }

    #[test]
    fn haversine_accepts_integer_arguments() {
        let feet: f64 = conn()
            .query_row("SELECT HAVERSINE_DISTANCE(41, -87, 41, -87)", [], |r| r.get(0))
            .unwrap();
        assert!(feet.abs() < 1e-9);
    }

    #[test]
    fn haversine_null_input_yields_null() {
        let feet: Option<f64> = conn()
            .query_row("SELECT HAVERSINE_DISTANCE(NULL, 0, 1, 0)", [], |r| r.get(0))
            .unwrap();
        assert_eq!(feet, None);
    }

    #[test]
    fn make_point_and_alias_build_point_text() {
        let conn = conn();
        let text: String = conn
            .query_row("SELECT MAKE_POINT(-87.6, 41.8, 4326)", [], |r| r.get(0))
            .unwrap();
        assert_eq!(text, "POINT (-87.6 41.8)");

        let alias: String = conn
            .query_row("SELECT MakePoint(1.5, 2, 4326)", [], |r| r.get(0))
            .unwrap();
        assert_eq!(alias, "POINT (1.5 2)");
    }

    #[test]
    fn make_point_null_coordinate_yields_null() {
        let text: Option<String> = conn()
            .query_row("SELECT MAKE_POINT(NULL, 1, 4326)", [], |r| r.get(0))
            .unwrap();
        assert_eq!(text, None);
    }

    #[test]
    fn st_contains_composes_with_make_point() {
        let conn = conn();
        let inside: i64 = conn
            .query_row(
                "SELECT ST_CONTAINS('POLYGON ((0 0, 4 0, 4 4, 0 4, 0 0))', MAKE_POINT(2, 2, 4326))",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(inside, 1);

        let outside: i64 = conn
            .query_row(
                "SELECT ST_CONTAINS('POLYGON ((0 0, 4 0, 4 4, 0 4, 0 0))', MAKE_POINT(9, 9, 4326))",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(outside, 0);
    }

    #[test]
    fn st_contains_never_raises() {
        let conn = conn();
        for sql in [
            "SELECT ST_CONTAINS('not wkt', 'POINT (1 1)')",
            "SELECT ST_CONTAINS(NULL, 'POINT (1 1)')",
            "SELECT ST_CONTAINS('POLYGON ((0 0, 4 0, 4 4, 0 4, 0 0))', NULL)",
            "SELECT ST_CONTAINS(42, 'POINT (1 1)')",
            "SELECT ST_CONTAINS('', '')",
        ] {
            let result: i64 = conn.query_row(sql, [], |r| r.get(0)).unwrap();
            assert_eq!(result, 0, "{sql}");
        }
    }

    #[test]
    fn st_contains_filters_rows() {
        let conn = conn();
        conn.execute_batch(
            "CREATE TABLE pts (x REAL, y REAL);
             INSERT INTO pts VALUES (1, 1), (5, 5), (3, 3), (NULL, 2);",
        )
        .unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM pts
                 WHERE ST_CONTAINS('POLYGON ((0 0, 4 0, 4 4, 0 4, 0 0))', MAKE_POINT(x, y, 4326)) = 1",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);
    }
}
