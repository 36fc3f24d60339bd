//! Point-in-polygon containment by ray casting.
//!
//! A ring is tested by walking its edges `(v[j], v[i])` with
//! `j = i - 1 mod n` and toggling an inside flag whenever the edge crosses
//! the horizontal ray through the point:
//!
//! ```text
//! (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi
//! ```
//!
//! Boundary handling follows from that rule and is kept as-is: for an
//! axis-aligned ring, points on the left or bottom edge count as inside and
//! points on the right or top edge count as outside. Polygons are the shell
//! minus every hole; multipolygons contain a point if any member does.
//!
//! [`ContainmentEngine`] keeps one cached parse keyed by the last polygon
//! text it saw. Repeating the same polygon across many points parses once;
//! alternating between polygons reparses on every call but never changes
//! the answer.

use geo::{LineString, MultiPolygon, Polygon};

use crate::codec::{self, Geometry, GeometryParseError, PointParseError};

/// Outcome of a containment test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    /// The point is inside the shell and outside every hole.
    Contained,
    /// Anything else.
    NotContained,
}

impl Containment {
    /// Returns `true` for [`Containment::Contained`].
    #[must_use]
    pub const fn is_contained(self) -> bool {
        matches!(self, Self::Contained)
    }
}

impl From<bool> for Containment {
    fn from(contained: bool) -> Self {
        if contained {
            Self::Contained
        } else {
            Self::NotContained
        }
    }
}

/// Why a containment test could not be evaluated.
///
/// Only observable through [`ContainmentEngine::evaluate`]; the public
/// [`ContainmentEngine::contains`] collapses every error to "not contained".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContainmentError {
    /// The polygon text failed to parse.
    #[error("Invalid polygon geometry: {0}")]
    Geometry(#[from] GeometryParseError),

    /// The point text failed to match `POINT (x y)`.
    #[error("Invalid point: {0}")]
    Point(#[from] PointParseError),
}

/// Hit/miss counters for the geometry cache slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Calls that reused the cached parse.
    pub hits: u64,
    /// Calls that parsed (or re-parsed) polygon text.
    pub misses: u64,
}

#[derive(Debug)]
struct CacheSlot {
    wkt: String,
    parsed: Result<Geometry, GeometryParseError>,
}

impl CacheSlot {
    fn parse(wkt: &str) -> Self {
        Self {
            wkt: wkt.to_string(),
            parsed: codec::parse(wkt),
        }
    }
}

/// Containment tester owning a single-slot geometry cache.
///
/// Not meant to be shared between threads; give each session or
/// connection its own engine.
#[derive(Debug, Default)]
pub struct ContainmentEngine {
    slot: Option<CacheSlot>,
    stats: CacheStats,
}

impl ContainmentEngine {
    /// Creates an engine with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tests whether `point_wkt` lies inside `polygon_wkt`.
    ///
    /// Empty input, unparseable text and non-area geometries all answer
    /// `false`; this never fails.
    pub fn contains(&mut self, polygon_wkt: &str, point_wkt: &str) -> bool {
        self.evaluate(polygon_wkt, point_wkt)
            .unwrap_or(Containment::NotContained)
            .is_contained()
    }

    /// Tests containment, surfacing parse failures instead of collapsing
    /// them.
    ///
    /// Empty input on either side is [`Containment::NotContained`], not an
    /// error. A polygon text that failed to parse stays cached as a failure
    /// until different text arrives.
    ///
    /// # Errors
    ///
    /// Returns [`ContainmentError`] if the point or polygon text is invalid.
    pub fn evaluate(
        &mut self,
        polygon_wkt: &str,
        point_wkt: &str,
    ) -> Result<Containment, ContainmentError> {
        if polygon_wkt.is_empty() || point_wkt.is_empty() {
            return Ok(Containment::NotContained);
        }

        let (x, y) = codec::parse_point_text(point_wkt)?;
        let geometry = self.geometry_for(polygon_wkt)?;

        Ok(geometry_contains(geometry, x, y).into())
    }

    /// Returns the cache counters accumulated so far.
    #[must_use]
    pub const fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Drops the cached geometry.
    pub fn clear(&mut self) {
        self.slot = None;
    }

    fn geometry_for(&mut self, polygon_wkt: &str) -> Result<&Geometry, GeometryParseError> {
        if matches!(&self.slot, Some(slot) if slot.wkt == polygon_wkt) {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
            log::trace!(
                "Geometry cache miss, parsing {} bytes of WKT",
                polygon_wkt.len()
            );
            self.slot = Some(CacheSlot::parse(polygon_wkt));
        }

        let slot = self
            .slot
            .get_or_insert_with(|| CacheSlot::parse(polygon_wkt));

        slot.parsed.as_ref().map_err(Clone::clone)
    }
}

/// Ray-casting test of `(x, y)` against a single ring.
///
/// The ring may be open or closed; a repeated closing vertex contributes a
/// zero-length edge that never toggles the result.
#[must_use]
pub fn ring_contains(ring: &LineString<f64>, x: f64, y: f64) -> bool {
    let Some(mut previous) = ring.0.last().copied() else {
        return false;
    };

    let mut inside = false;
    for current in &ring.0 {
        let (xi, yi) = (current.x, current.y);
        let (xj, yj) = (previous.x, previous.y);

        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }

        previous = *current;
    }

    inside
}

/// Shell-minus-holes test for a single polygon.
#[must_use]
pub fn polygon_contains(polygon: &Polygon<f64>, x: f64, y: f64) -> bool {
    if !ring_contains(polygon.exterior(), x, y) {
        return false;
    }

    !polygon
        .interiors()
        .iter()
        .any(|hole| ring_contains(hole, x, y))
}

/// Returns `true` if any member polygon contains the point.
#[must_use]
pub fn multipolygon_contains(multi: &MultiPolygon<f64>, x: f64, y: f64) -> bool {
    multi
        .0
        .iter()
        .any(|polygon| polygon_contains(polygon, x, y))
}

/// Dispatches on geometry kind. Points never contain anything.
#[must_use]
pub fn geometry_contains(geometry: &Geometry, x: f64, y: f64) -> bool {
    match geometry {
        Geometry::Polygon(polygon) => polygon_contains(polygon, x, y),
        Geometry::MultiPolygon(multi) => multipolygon_contains(multi, x, y),
        Geometry::Point(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = "POLYGON ((0 0, 4 0, 4 4, 0 4, 0 0))";
    const DONUT: &str = "POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0), (4 4, 6 4, 6 6, 4 6, 4 4))";
    const ISLANDS: &str =
        "MULTIPOLYGON (((0 0, 2 0, 2 2, 0 2, 0 0)), ((10 10, 12 10, 12 12, 10 12, 10 10)))";

    #[test]
    fn square_contains_center_but_not_outside_point() {
        let mut engine = ContainmentEngine::new();
        assert!(engine.contains(SQUARE, "POINT (2 2)"));
        assert!(!engine.contains(SQUARE, "POINT (5 5)"));
    }

    #[test]
    fn open_ring_behaves_like_closed_ring() {
        let open = LineString::from(vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        assert!(ring_contains(&open, 2.0, 2.0));
        assert!(!ring_contains(&open, 5.0, 5.0));
    }

    #[test]
    fn holes_carve_out_area() {
        let mut engine = ContainmentEngine::new();
        assert!(!engine.contains(DONUT, "POINT (5 5)"));
        assert!(engine.contains(DONUT, "POINT (1 1)"));
    }

    #[test]
    fn multipolygon_contains_point_in_any_member() {
        let mut engine = ContainmentEngine::new();
        assert!(engine.contains(ISLANDS, "POINT (1 1)"));
        assert!(engine.contains(ISLANDS, "POINT (11 11)"));
        assert!(!engine.contains(ISLANDS, "POINT (5 5)"));
    }

    #[test]
    fn boundary_points_follow_half_open_rule() {
        let mut engine = ContainmentEngine::new();
        assert!(engine.contains(SQUARE, "POINT (0 2)"), "left edge");
        assert!(engine.contains(SQUARE, "POINT (2 0)"), "bottom edge");
        assert!(!engine.contains(SQUARE, "POINT (4 2)"), "right edge");
        assert!(!engine.contains(SQUARE, "POINT (2 4)"), "top edge");
    }

    #[test]
    fn empty_input_is_not_contained_and_not_an_error() {
        let mut engine = ContainmentEngine::new();
        assert_eq!(engine.evaluate("", "POINT (1 1)"), Ok(Containment::NotContained));
        assert_eq!(engine.evaluate(SQUARE, ""), Ok(Containment::NotContained));
        assert_eq!(engine.stats(), CacheStats::default());
    }

    #[test]
    fn point_geometry_contains_nothing() {
        let mut engine = ContainmentEngine::new();
        assert_eq!(
            engine.evaluate("POINT (1 1)", "POINT (1 1)"),
            Ok(Containment::NotContained)
        );
    }

    #[test]
    fn extended_wkt_polygon_is_tested_like_plain_wkt() {
        let mut engine = ContainmentEngine::new();
        assert_eq!(
            engine.evaluate("SRID=4326;POLYGON((0 0,4 0,4 4,0 4,0 0))", "POINT (2 2)"),
            Ok(Containment::Contained)
        );
        assert!(!engine.contains("SRID=4326;POLYGON((0 0,4 0,4 4,0 4,0 0))", "POINT (5 5)"));
    }

    #[test]
    fn parse_failures_surface_from_evaluate_but_not_contains() {
        let mut engine = ContainmentEngine::new();
        assert!(matches!(
            engine.evaluate("POLYGON ((0 0, 1", "POINT (1 1)"),
            Err(ContainmentError::Geometry(GeometryParseError::Malformed { .. }))
        ));
        assert!(matches!(
            engine.evaluate(SQUARE, "CIRCLE (1 1)"),
            Err(ContainmentError::Point(PointParseError::Mismatch { .. }))
        ));
        assert!(!engine.contains("POLYGON ((0 0, 1", "POINT (1 1)"));
    }

    #[test]
    fn failed_parse_is_cached_until_key_changes() {
        let mut engine = ContainmentEngine::new();
        for _ in 0..3 {
            assert!(!engine.contains("garbage", "POINT (1 1)"));
        }
        assert_eq!(engine.stats(), CacheStats { hits: 2, misses: 1 });

        assert!(engine.contains(SQUARE, "POINT (1 1)"));
        assert_eq!(engine.stats().misses, 2);
    }

    #[test]
    fn repeated_polygon_parses_once() {
        let mut engine = ContainmentEngine::new();
        for i in 0..100_i32 {
            let point = format!("POINT ({} 1)", f64::from(i) / 50.0);
            engine.contains(DONUT, &point);
        }
        assert_eq!(engine.stats(), CacheStats { hits: 99, misses: 1 });
    }

    #[test]
    fn alternating_polygons_match_cold_engine() {
        let mut warm = ContainmentEngine::new();
        let points = ["POINT (1 1)", "POINT (5 5)", "POINT (11 11)", "POINT (3 3)"];

        for round in 0..4 {
            for point in points {
                for polygon in [SQUARE, DONUT, ISLANDS] {
                    let cold = ContainmentEngine::new().contains(polygon, point);
                    assert_eq!(
                        warm.contains(polygon, point),
                        cold,
                        "round {round}: {polygon} / {point}"
                    );
                }
            }
        }
        assert_eq!(warm.stats().hits, 0);
    }

    #[test]
    fn clear_forces_reparse() {
        let mut engine = ContainmentEngine::new();
        engine.contains(SQUARE, "POINT (1 1)");
        engine.clear();
        engine.contains(SQUARE, "POINT (1 1)");
        assert_eq!(engine.stats(), CacheStats { hits: 0, misses: 2 });
    }
}
