//! Canonical cache keys for geospatial queries.
//!
//! Two queries that mean the same thing must produce the same key:
//! coordinates are rounded to 5 decimal places (~1.1 m) so sub-meter
//! jitter collapses to one entry, and free-text queries are lowercased,
//! trimmed, whitespace-collapsed, and MD5-hashed to bound key length.
//! Collision resistance is not a security requirement here — MD5 is used
//! purely as a fast content hash.

use waypoint_models::{Coordinate, TravelMode};

/// Decimal places coordinates are rounded to before key construction.
const COORD_DECIMALS: i32 = 5;

/// Rounds a coordinate component to [`COORD_DECIMALS`] places.
fn round(value: f64) -> f64 {
    let scale = 10f64.powi(COORD_DECIMALS);
    (value * scale).round() / scale
}

/// Canonical `lat,lng` fragment for a single coordinate.
fn coord_fragment(coord: &Coordinate) -> String {
    format!("{:.5},{:.5}", round(coord.latitude), round(coord.longitude))
}

/// Canonical hash fragment for a list of coordinates.
fn coords_fragment(coords: &[Coordinate]) -> String {
    let joined = coords
        .iter()
        .map(coord_fragment)
        .collect::<Vec<_>>()
        .join(";");
    format!("{:x}", md5::compute(joined.as_bytes()))
}

/// Canonical hash fragment for a free-text query.
fn text_fragment(text: &str) -> String {
    let normalized = text
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    format!("{:x}", md5::compute(normalized.as_bytes()))
}

/// Key for a forward-geocode (text search) query.
#[must_use]
pub fn geocode(query: &str, limit: usize) -> String {
    format!("geocode:{}:{limit}", text_fragment(query))
}

/// Key for a reverse-geocode query.
#[must_use]
pub fn reverse(coord: &Coordinate) -> String {
    format!("reverse:{}", coord_fragment(coord))
}

/// Key for a point-to-point route query.
#[must_use]
pub fn route(origin: &Coordinate, destination: &Coordinate, mode: TravelMode) -> String {
    format!(
        "route:{mode}:{}:{}",
        coord_fragment(origin),
        coord_fragment(destination)
    )
}

/// Key for a distance-matrix query.
#[must_use]
pub fn matrix(origins: &[Coordinate], destinations: &[Coordinate], mode: TravelMode) -> String {
    format!(
        "matrix:{mode}:{}:{}",
        coords_fragment(origins),
        coords_fragment(destinations)
    )
}

/// Key for an ETA query.
#[must_use]
pub fn eta(origin: &Coordinate, destination: &Coordinate, mode: TravelMode) -> String {
    format!(
        "eta:{mode}:{}:{}",
        coord_fragment(origin),
        coord_fragment(destination)
    )
}

/// Key for a snap-to-road query.
#[must_use]
pub fn snap(path: &[Coordinate], radius_m: f64) -> String {
    format!("snap:{}:{}", coords_fragment(path), radius_m.round())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_meter_jitter_collapses_to_one_key() {
        let a = Coordinate::new(12.971_600_0, 77.594_600_0);
        let b = Coordinate::new(12.971_600_4, 77.594_599_6);
        assert_eq!(reverse(&a), reverse(&b));
    }

    #[test]
    fn distinct_coordinates_get_distinct_keys() {
        let a = Coordinate::new(12.9716, 77.5946);
        let b = Coordinate::new(12.9717, 77.5946);
        assert_ne!(reverse(&a), reverse(&b));
    }

    #[test]
    fn text_keys_ignore_case_and_whitespace() {
        assert_eq!(
            geocode("  MG Road,   Bangalore ", 5),
            geocode("mg road, bangalore", 5)
        );
        assert_ne!(geocode("mg road", 5), geocode("brigade road", 5));
        assert_ne!(geocode("mg road", 5), geocode("mg road", 10));
    }

    #[test]
    fn route_keys_are_mode_and_direction_sensitive() {
        let a = Coordinate::new(12.9716, 77.5946);
        let b = Coordinate::new(13.0, 77.6);
        assert_ne!(
            route(&a, &b, TravelMode::Driving),
            route(&a, &b, TravelMode::Walking)
        );
        assert_ne!(
            route(&a, &b, TravelMode::Driving),
            route(&b, &a, TravelMode::Driving)
        );
    }

    #[test]
    fn matrix_key_depends_on_element_order() {
        let a = Coordinate::new(12.9716, 77.5946);
        let b = Coordinate::new(13.0, 77.6);
        assert_ne!(
            matrix(&[a, b], &[a], TravelMode::Driving),
            matrix(&[b, a], &[a], TravelMode::Driving)
        );
    }
}
