//! Geodesic distance
//!
//! Haversine great-circle distance between consecutive fixes. Accurate to
//! well under a meter at fix-to-fix scales, which is all the trip distance
//! accumulator needs.

use crate::types::LocationFix;

/// Mean Earth radius in meters (IUGG)
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two coordinate pairs.
///
/// Always non-negative; identical coordinates yield exactly 0.
pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Distance in meters between two location fixes
pub fn fix_distance_m(from: &LocationFix, to: &LocationFix) -> f32 {
    haversine_distance_m(from.latitude, from.longitude, to.latitude, to.longitude) as f32
}
