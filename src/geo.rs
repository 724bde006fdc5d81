//! Spherical geometry: great-circle distance, bearing, and destination point.
//!
//! Grounded on `IsochroneRouter::calculate_bearing` / `calculate_distance` /
//! `calculate_destination` in the teacher engine, generalized into pure,
//! validated free functions operating on nautical miles instead of meters.

use crate::error::GeoError;
use crate::model::Coordinate;

/// Mean Earth radius in nautical miles.
pub const EARTH_RADIUS_NM: f64 = 3440.065;

fn validate(c: Coordinate) -> Result<(), GeoError> {
    if !(-90.0..=90.0).contains(&c.lat) {
        return Err(GeoError::LatitudeOutOfRange(c.lat));
    }
    if !(-180.0..=180.0).contains(&c.lng) {
        return Err(GeoError::LongitudeOutOfRange(c.lng));
    }
    Ok(())
}

/// Normalizes an angle in degrees to `[0, 360)`.
pub fn normalize_deg(deg: f64) -> f64 {
    ((deg % 360.0) + 360.0) % 360.0
}

/// Smallest angular difference between two bearings, wrapped to `[0, 180]`.
pub fn angular_diff(a: f64, b: f64) -> f64 {
    let d = (normalize_deg(a) - normalize_deg(b)).abs();
    if d > 180.0 { 360.0 - d } else { d }
}

/// Signed wrap of `deg` into `(-180, 180]`, used for TWA-style symmetric angles.
pub fn wrap_to_180(deg: f64) -> f64 {
    let mut d = deg % 360.0;
    if d > 180.0 {
        d -= 360.0;
    } else if d <= -180.0 {
        d += 360.0;
    }
    d
}

/// Great-circle distance between two points, in nautical miles (haversine).
pub fn distance(a: Coordinate, b: Coordinate) -> Result<f64, GeoError> {
    validate(a)?;
    validate(b)?;
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    Ok(EARTH_RADIUS_NM * c)
}

/// Forward azimuth from `a` to `b`, in degrees, normalized to `[0, 360)`.
pub fn bearing(a: Coordinate, b: Coordinate) -> Result<f64, GeoError> {
    validate(a)?;
    validate(b)?;
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let y = dlng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlng.cos();
    Ok(normalize_deg(y.atan2(x).to_degrees()))
}

/// Destination point reached from `origin` by travelling `distance_nm`
/// nautical miles along initial `bearing_deg`.
pub fn destination(origin: Coordinate, bearing_deg: f64, distance_nm: f64) -> Result<Coordinate, GeoError> {
    validate(origin)?;
    let angular_dist = distance_nm / EARTH_RADIUS_NM;
    let bearing_rad = bearing_deg.to_radians();
    let lat1 = origin.lat.to_radians();
    let lng1 = origin.lng.to_radians();

    let lat2 = (lat1.sin() * angular_dist.cos() + lat1.cos() * angular_dist.sin() * bearing_rad.cos()).asin();
    let lng2 = lng1
        + (bearing_rad.sin() * angular_dist.sin() * lat1.cos())
            .atan2(angular_dist.cos() - lat1.sin() * lat2.sin());

    Ok(Coordinate::new(lat2.to_degrees(), normalize_lng(lng2.to_degrees())))
}

fn normalize_lng(lng: f64) -> f64 {
    let mut l = lng;
    while l > 180.0 {
        l -= 360.0;
    }
    while l < -180.0 {
        l += 360.0;
    }
    l
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_deg_wraps() {
        assert_eq!(normalize_deg(370.0), 10.0);
        assert_eq!(normalize_deg(-10.0), 350.0);
        assert_eq!(normalize_deg(0.0), 0.0);
    }

    #[test]
    fn angular_diff_wraps_to_180() {
        assert_eq!(angular_diff(350.0, 10.0), 20.0);
        assert_eq!(angular_diff(0.0, 180.0), 180.0);
        assert_eq!(angular_diff(10.0, 10.0), 0.0);
    }

    #[test]
    fn rejects_out_of_domain_coordinates() {
        let bad = Coordinate::new(95.0, 0.0);
        let ok = Coordinate::new(0.0, 0.0);
        assert!(matches!(distance(bad, ok), Err(GeoError::LatitudeOutOfRange(_))));
    }

    #[test]
    fn bearing_cardinal_directions() {
        let london = Coordinate::new(51.5, 0.0);
        let north = Coordinate::new(52.5, 0.0);
        let b = bearing(london, north).unwrap();
        assert!(b.abs() < 1.0, "expected ~0 deg north, got {b}");

        let east = Coordinate::new(51.5, 1.0);
        let b = bearing(london, east).unwrap();
        assert!((b - 90.0).abs() < 1.0, "expected ~90 deg east, got {b}");
    }

    #[test]
    fn destination_round_trips_within_half_nm() {
        let a = Coordinate::new(50.89, -1.39);
        let b = Coordinate::new(49.63, -1.62);
        let d = distance(a, b).unwrap();
        let brg = bearing(a, b).unwrap();
        let round_tripped = destination(a, brg, d).unwrap();
        let err = distance(round_tripped, b).unwrap();
        assert!(err < 0.5, "round-trip error {err} nm exceeds 0.5 nm");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinate::new(10.0, 20.0);
        let b = Coordinate::new(-5.0, 30.0);
        assert!((distance(a, b).unwrap() - distance(b, a).unwrap()).abs() < 1e-9);
    }
}
