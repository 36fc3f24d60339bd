//! Great-circle distance on a spherical Earth.

use std::f64::consts::PI;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Feet per meter.
pub const FEET_PER_METER: f64 = 3.280_84;

const fn to_radians(degrees: f64) -> f64 {
    (degrees * PI) / 180.0
}

/// Returns the haversine distance in feet between two WGS84 points.
///
/// Out-of-range coordinates are accepted as-is; identical points yield `0`.
#[must_use]
pub fn distance_feet(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let radius_feet = FEET_PER_METER * EARTH_RADIUS_METERS;

    let phi1 = to_radians(lat1);
    let phi2 = to_radians(lat2);
    let delta_phi = to_radians(lat2 - lat1);
    let delta_lambda = to_radians(lon2 - lon1);

    let a = (delta_phi / 2.0).sin() * (delta_phi / 2.0).sin()
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin() * (delta_lambda / 2.0).sin();
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    radius_feet * c
}
