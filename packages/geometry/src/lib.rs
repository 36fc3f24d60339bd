#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geospatial primitives for the crash map query engine.
//!
//! Provides great-circle distance in feet ([`distance`]), a restricted WKT
//! codec for `POINT`, `POLYGON` and `MULTIPOLYGON` text ([`codec`]), and a
//! ray-casting point-in-polygon test with a single-slot geometry cache
//! ([`containment`]). Everything here is synchronous and free of I/O so it
//! can run inside `SQLite` scalar functions as well as batch joins.

pub mod codec;
pub mod containment;
pub mod distance;

pub use codec::{Geometry, GeometryParseError, PointParseError};
pub use containment::{Containment, ContainmentEngine, ContainmentError};
pub use distance::distance_feet;
