//! Restricted Well-Known Text codec.
//!
//! Only `POINT`, `POLYGON` and `MULTIPOLYGON` are accepted. Coordinates are
//! `x y` pairs in longitude-then-latitude order, and no SRID other than
//! WGS84 is honored. Parsing is delegated to the `wkt` crate, which yields
//! `geo` types; anything that is not one of the three supported kinds is
//! rejected with [`GeometryParseError::UnsupportedKind`].

use std::sync::LazyLock;

use geo::{BoundingRect as _, MultiPolygon, Point, Polygon, Rect};
use regex::Regex;
use wkt::TryFromWkt as _;

/// Lightweight pattern for `POINT (x y)` text, used on the hot path of
/// containment tests instead of the general parser.
static POINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)POINT\s*\(\s*([-\d.]+)\s+([-\d.]+)\s*\)").expect("valid regex")
});

/// Leading `SRID=<n>;` of extended WKT.
static SRID_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^SRID\s*=\s*\d+\s*;\s*").expect("valid regex"));

/// Errors produced when WKT text cannot be turned into a [`Geometry`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryParseError {
    /// The input was empty or whitespace only.
    #[error("Empty geometry text")]
    Empty,

    /// The text is not valid WKT.
    #[error("Malformed WKT: {message}")]
    Malformed {
        /// Parser message.
        message: String,
    },

    /// Valid WKT of a kind this codec does not support.
    #[error("Unsupported geometry kind: {kind}")]
    UnsupportedKind {
        /// The WKT keyword of the rejected geometry.
        kind: &'static str,
    },
}

/// Errors produced by the lightweight `POINT (x y)` matcher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PointParseError {
    /// The input was empty.
    #[error("Empty point text")]
    Empty,

    /// The text does not look like `POINT (x y)`.
    #[error("Not a POINT: {text}")]
    Mismatch {
        /// The rejected text.
        text: String,
    },

    /// The pattern matched but a coordinate is not a number.
    #[error("Invalid coordinate '{value}'")]
    InvalidCoordinate {
        /// The rejected coordinate text.
        value: String,
    },
}

/// A parsed geometry of one of the supported kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// A single position.
    Point(Point<f64>),
    /// One shell ring followed by zero or more hole rings.
    Polygon(Polygon<f64>),
    /// An ordered sequence of polygons.
    MultiPolygon(MultiPolygon<f64>),
}

impl Geometry {
    /// Returns the WKT keyword for this geometry.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Point(_) => "POINT",
            Self::Polygon(_) => "POLYGON",
            Self::MultiPolygon(_) => "MULTIPOLYGON",
        }
    }

    /// Returns `true` for the area kinds (`POLYGON`, `MULTIPOLYGON`).
    #[must_use]
    pub const fn is_area(&self) -> bool {
        matches!(self, Self::Polygon(_) | Self::MultiPolygon(_))
    }

    /// Returns the bounding rectangle, or `None` for an empty geometry.
    #[must_use]
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        match self {
            Self::Point(point) => Some(point.bounding_rect()),
            Self::Polygon(polygon) => polygon.bounding_rect(),
            Self::MultiPolygon(multi) => multi.bounding_rect(),
        }
    }
}

/// Parses WKT text into a [`Geometry`].
///
/// An extended-WKT `SRID=<n>;` prefix is stripped and its value ignored.
///
/// # Errors
///
/// Returns [`GeometryParseError`] if the text is empty, malformed, or of an
/// unsupported kind.
pub fn parse(text: &str) -> Result<Geometry, GeometryParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GeometryParseError::Empty);
    }

    let body = SRID_PREFIX_RE
        .find(trimmed)
        .map_or(trimmed, |prefix| &trimmed[prefix.end()..]);
    if body.is_empty() {
        return Err(GeometryParseError::Empty);
    }

    let parsed = geo::Geometry::<f64>::try_from_wkt_str(body).map_err(|e| {
        GeometryParseError::Malformed {
            message: e.to_string(),
        }
    })?;

    match parsed {
        geo::Geometry::Point(point) => Ok(Geometry::Point(point)),
        geo::Geometry::Polygon(polygon) => Ok(Geometry::Polygon(polygon)),
        geo::Geometry::MultiPolygon(multi) => Ok(Geometry::MultiPolygon(multi)),
        other => Err(GeometryParseError::UnsupportedKind {
            kind: unsupported_kind(&other),
        }),
    }
}

fn unsupported_kind(geometry: &geo::Geometry<f64>) -> &'static str {
    match geometry {
        geo::Geometry::Line(_) => "LINE",
        geo::Geometry::LineString(_) => "LINESTRING",
        geo::Geometry::MultiPoint(_) => "MULTIPOINT",
        geo::Geometry::MultiLineString(_) => "MULTILINESTRING",
        geo::Geometry::GeometryCollection(_) => "GEOMETRYCOLLECTION",
        geo::Geometry::Rect(_) => "RECT",
        geo::Geometry::Triangle(_) => "TRIANGLE",
        geo::Geometry::Point(_) => "POINT",
        geo::Geometry::Polygon(_) => "POLYGON",
        geo::Geometry::MultiPolygon(_) => "MULTIPOLYGON",
    }
}

/// Extracts `(x, y)` from `POINT (x y)` text without the general parser.
///
/// The match is unanchored and case-insensitive, so surrounding text is
/// tolerated.
///
/// # Errors
///
/// Returns [`PointParseError`] if the text is empty, does not contain a
/// `POINT (x y)` form, or a coordinate fails to parse as a number.
pub fn parse_point_text(text: &str) -> Result<(f64, f64), PointParseError> {
    if text.is_empty() {
        return Err(PointParseError::Empty);
    }

    let captures = POINT_RE
        .captures(text)
        .ok_or_else(|| PointParseError::Mismatch {
            text: text.to_string(),
        })?;

    let coordinate = |idx: usize| -> Result<f64, PointParseError> {
        let value = captures.get(idx).map_or("", |m| m.as_str());
        value
            .parse::<f64>()
            .map_err(|_| PointParseError::InvalidCoordinate {
                value: value.to_string(),
            })
    };

    Ok((coordinate(1)?, coordinate(2)?))
}

/// Formats `POINT (x y)` text.
///
/// The spatial reference id is accepted for signature compatibility with
/// `MakePoint(x, y, srid)` and ignored; output is always unprojected.
#[must_use]
pub fn build_point_text(x: f64, y: f64, _srid: i64) -> String {
    format!("POINT ({x} {y})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_point() {
        let geometry = parse("POINT (-87.6298 41.8781)").unwrap();
        assert_eq!(geometry, Geometry::Point(Point::new(-87.6298, 41.8781)));
        assert!(!geometry.is_area());
    }

    #[test]
    fn parses_polygon_with_hole() {
        let geometry =
            parse("POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0), (4 4, 6 4, 6 6, 4 6, 4 4))").unwrap();
        let Geometry::Polygon(polygon) = geometry else {
            panic!("expected polygon");
        };
        assert_eq!(polygon.interiors().len(), 1);
        assert_eq!(polygon.exterior().0.len(), 5);
    }

    #[test]
    fn parses_polygon_without_spaces() {
        let geometry = parse("POLYGON((0 0,0 10,10 10,10 0,0 0))").unwrap();
        assert_eq!(geometry.kind(), "POLYGON");
    }

    #[test]
    fn parses_multipolygon() {
        let geometry =
            parse("MULTIPOLYGON (((0 0, 1 0, 1 1, 0 1, 0 0)), ((5 5, 6 5, 6 6, 5 6, 5 5)))")
                .unwrap();
        let Geometry::MultiPolygon(multi) = geometry else {
            panic!("expected multipolygon");
        };
        assert_eq!(multi.0.len(), 2);
    }

    #[test]
    fn strips_extended_wkt_srid_prefix() {
        let plain = parse("POLYGON((0 0,4 0,4 4,0 4,0 0))").unwrap();
        assert_eq!(parse("SRID=4326;POLYGON((0 0,4 0,4 4,0 4,0 0))"), Ok(plain.clone()));
        assert_eq!(parse("srid=3857; POLYGON((0 0,4 0,4 4,0 4,0 0))"), Ok(plain));
        assert_eq!(parse("SRID=4326;"), Err(GeometryParseError::Empty));
    }

    #[test]
    fn rejects_empty_text() {
        assert_eq!(parse("   "), Err(GeometryParseError::Empty));
    }

    #[test]
    fn rejects_malformed_text() {
        assert!(matches!(
            parse("POLYGON ((0 0, 1 0"),
            Err(GeometryParseError::Malformed { .. })
        ));
        assert!(matches!(
            parse("not geometry at all"),
            Err(GeometryParseError::Malformed { .. })
        ));
    }

    #[test]
    fn rejects_unsupported_kind() {
        assert_eq!(
            parse("LINESTRING (0 0, 1 1)"),
            Err(GeometryParseError::UnsupportedKind { kind: "LINESTRING" })
        );
    }

    #[test]
    fn bounding_rect_of_polygon() {
        let rect = parse("POLYGON ((1 2, 5 2, 5 7, 1 7, 1 2))")
            .unwrap()
            .bounding_rect()
            .unwrap();
        assert!((rect.min().x - 1.0).abs() < f64::EPSILON);
        assert!((rect.max().y - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn point_text_round_trips_through_fast_matcher() {
        let text = build_point_text(-87.6298, 41.8781, 4326);
        assert_eq!(text, "POINT (-87.6298 41.8781)");
        assert_eq!(parse_point_text(&text), Ok((-87.6298, 41.8781)));
    }

    #[test]
    fn point_text_ignores_srid() {
        assert_eq!(build_point_text(1.0, 2.0, 0), build_point_text(1.0, 2.0, 3857));
        assert_eq!(build_point_text(5.0, 5.0, 4326), "POINT (5 5)");
    }

    #[test]
    fn fast_matcher_is_case_insensitive() {
        assert_eq!(parse_point_text("point(1.5 -2)"), Ok((1.5, -2.0)));
    }

    #[test]
    fn fast_matcher_rejects_non_points() {
        assert_eq!(parse_point_text(""), Err(PointParseError::Empty));
        assert!(matches!(
            parse_point_text("POLYGON ((0 0, 1 1, 0 1, 0 0))"),
            Err(PointParseError::Mismatch { .. })
        ));
        assert!(matches!(
            parse_point_text("POINT (1.2.3 4)"),
            Err(PointParseError::InvalidCoordinate { .. })
        ));
    }
}
