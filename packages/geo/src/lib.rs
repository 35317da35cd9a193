#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Great-circle geometry primitives.
//!
//! Stateless functions over coordinate pairs on a spherical Earth model
//! (radius 6,371,000 m): distance, bearing, destination projection,
//! bounding boxes, point-in-polygon containment, and distance to a
//! polygon boundary. Also provides locale-agnostic formatting helpers
//! for distances and durations.
//!
//! Polygon boundary distances use a planar-degree approximation converted
//! to meters at the query point's latitude. That is accurate enough for
//! city-scale service areas but is not geodesically exact for polygons
//! spanning large latitude ranges.

use waypoint_models::{BoundingBox, Coordinate};

/// Mean Earth radius in meters (spherical model).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude at the equator, used for planar
/// degree-space conversions.
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Haversine great-circle distance between two coordinates, in meters.
///
/// Symmetric: `distance(a, b) == distance(b, a)`. Returns `0.0` when
/// either coordinate is invalid, so callers that failed validation
/// upstream degrade to a harmless zero rather than a nonsense value.
#[must_use]
pub fn distance(a: &Coordinate, b: &Coordinate) -> f64 {
    if !a.is_valid() || !b.is_valid() {
        return 0.0;
    }

    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Initial bearing from `from` toward `to`, in degrees `[0, 360)`.
#[must_use]
pub fn bearing(from: &Coordinate, to: &Coordinate) -> f64 {
    let lat_a = from.latitude.to_radians();
    let lat_b = to.latitude.to_radians();
    let d_lng = (to.longitude - from.longitude).to_radians();

    let y = d_lng.sin() * lat_b.cos();
    let x = lat_a.cos() * lat_b.sin() - lat_a.sin() * lat_b.cos() * d_lng.cos();

    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Projects a point `distance_m` meters from `start` along `bearing_deg`.
///
/// Direct geodesic on the spherical model; the inverse of
/// [`bearing`] + [`distance`].
#[must_use]
pub fn destination_point(start: &Coordinate, bearing_deg: f64, distance_m: f64) -> Coordinate {
    let angular = distance_m / EARTH_RADIUS_M;
    let brg = bearing_deg.to_radians();
    let lat1 = start.latitude.to_radians();
    let lng1 = start.longitude.to_radians();

    let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * brg.cos()).asin();
    let lng2 = lng1
        + (brg.sin() * angular.sin() * lat1.cos())
            .atan2(angular.cos() - lat1.sin() * lat2.sin());

    Coordinate::new(
        lat2.to_degrees(),
        // Normalize to [-180, 180].
        (lng2.to_degrees() + 540.0) % 360.0 - 180.0,
    )
}

/// Bounding box extending `radius_m` meters from `center` in each
/// cardinal direction.
#[must_use]
pub fn bounding_box(center: &Coordinate, radius_m: f64) -> BoundingBox {
    let north = destination_point(center, 0.0, radius_m);
    let east = destination_point(center, 90.0, radius_m);
    let south = destination_point(center, 180.0, radius_m);
    let west = destination_point(center, 270.0, radius_m);

    BoundingBox {
        south: south.latitude,
        west: west.longitude,
        north: north.latitude,
        east: east.longitude,
    }
}

/// Ray-casting point-in-polygon test.
///
/// The polygon is treated as an implicitly closed ring (the last vertex
/// connects back to the first). Returns `false` for polygons with fewer
/// than 3 vertices or an invalid query point.
#[must_use]
pub fn is_point_in_polygon(point: &Coordinate, polygon: &[Coordinate]) -> bool {
    if polygon.len() < 3 || !point.is_valid() {
        return false;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;

    for i in 0..polygon.len() {
        let (vi, vj) = (&polygon[i], &polygon[j]);
        let crosses = (vi.latitude > point.latitude) != (vj.latitude > point.latitude)
            && point.longitude
                < (vj.longitude - vi.longitude) * (point.latitude - vi.latitude)
                    / (vj.latitude - vi.latitude)
                    + vi.longitude;
        if crosses {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Shortest distance from `point` to the polygon's boundary edges, in
/// meters.
///
/// Computed in planar degree space and converted using
/// `111,320 × cos(latitude)` meters per degree at the query point. Returns
/// `f64::INFINITY` for degenerate polygons (fewer than 2 vertices).
#[must_use]
pub fn distance_to_polygon_boundary(point: &Coordinate, polygon: &[Coordinate]) -> f64 {
    if polygon.len() < 2 || !point.is_valid() {
        return f64::INFINITY;
    }

    let mut min_deg = f64::INFINITY;
    let mut j = polygon.len() - 1;

    for i in 0..polygon.len() {
        let d = point_to_segment_degrees(point, &polygon[j], &polygon[i]);
        if d < min_deg {
            min_deg = d;
        }
        j = i;
    }

    let meters_per_degree = METERS_PER_DEGREE * point.latitude.to_radians().cos();
    min_deg * meters_per_degree
}

/// Perpendicular distance from `p` to segment `a`–`b` in degree space.
fn point_to_segment_degrees(p: &Coordinate, a: &Coordinate, b: &Coordinate) -> f64 {
    let (px, py) = (p.longitude, p.latitude);
    let (ax, ay) = (a.longitude, a.latitude);
    let (bx, by) = (b.longitude, b.latitude);

    let (dx, dy) = (bx - ax, by - ay);
    let len_sq = dx * dx + dy * dy;

    // Degenerate segment: both endpoints coincide.
    if len_sq == 0.0 {
        return ((px - ax).powi(2) + (py - ay).powi(2)).sqrt();
    }

    let t = (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0);
    let (cx, cy) = (ax + t * dx, ay + t * dy);

    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

/// Formats a distance in meters as a human-readable string.
///
/// Meters below 1 km (rounded, e.g. "500 m"), kilometers with one decimal
/// place below 100 km (e.g. "1.5 km"), whole kilometers above.
#[must_use]
pub fn format_distance(meters: f64) -> String {
    if meters < 1_000.0 {
        format!("{} m", meters.round())
    } else if meters < 100_000.0 {
        format!("{:.1} km", meters / 1_000.0)
    } else {
        format!("{} km", (meters / 1_000.0).round())
    }
}

/// Formats a duration in seconds as a human-readable string.
///
/// "45 sec" below a minute, "12 min" below an hour, "1 hr 30 min" above
/// (the minutes component is omitted when zero).
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.round().max(0.0);

    if total < 60.0 {
        return format!("{total} sec");
    }

    let minutes = (total / 60.0).floor();
    if minutes < 60.0 {
        return format!("{minutes} min");
    }

    let hours = (minutes / 60.0).floor();
    let rem_minutes = minutes % 60.0;
    if rem_minutes == 0.0 {
        format!("{hours} hr")
    } else {
        format!("{hours} hr {rem_minutes} min")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blr() -> Coordinate {
        Coordinate::new(12.9716, 77.5946)
    }

    fn bom() -> Coordinate {
        Coordinate::new(19.0760, 72.8777)
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let (a, b) = (blr(), bom());
        let ab = distance(&a, &b);
        let ba = distance(&b, &a);
        assert!((ab - ba).abs() < 1e-9);
        assert!(distance(&a, &a).abs() < 1e-9);
    }

    #[test]
    fn bangalore_to_mumbai_is_roughly_840_km() {
        let d = distance(&blr(), &bom());
        assert!(d > 800_000.0 && d < 900_000.0, "got {d}");
    }

    #[test]
    fn invalid_coordinate_yields_zero_distance() {
        let bad = Coordinate::new(95.0, 77.0);
        assert!(distance(&bad, &blr()).abs() < f64::EPSILON);
    }

    #[test]
    fn bearing_due_north_and_east() {
        let origin = Coordinate::new(0.0, 0.0);
        let north = Coordinate::new(1.0, 0.0);
        let east = Coordinate::new(0.0, 1.0);
        assert!(bearing(&origin, &north).abs() < 0.01);
        assert!((bearing(&origin, &east) - 90.0).abs() < 0.01);
    }

    #[test]
    fn destination_point_inverts_bearing_and_distance() {
        let start = blr();
        let end = destination_point(&start, 45.0, 10_000.0);
        let d = distance(&start, &end);
        let b = bearing(&start, &end);
        assert!((d - 10_000.0).abs() < 1.0, "distance {d}");
        assert!((b - 45.0).abs() < 0.1, "bearing {b}");
    }

    #[test]
    fn bounding_box_surrounds_center() {
        let center = blr();
        let bbox = bounding_box(&center, 1_000.0);
        assert!(bbox.south < center.latitude && center.latitude < bbox.north);
        assert!(bbox.west < center.longitude && center.longitude < bbox.east);
        // 1 km at this latitude is about 0.009 degrees.
        assert!((bbox.north - bbox.south - 0.018).abs() < 0.001);
    }

    fn square() -> Vec<Coordinate> {
        vec![
            Coordinate::new(12.95, 77.55),
            Coordinate::new(12.95, 77.65),
            Coordinate::new(13.05, 77.65),
            Coordinate::new(13.05, 77.55),
        ]
    }

    #[test]
    fn point_in_square_polygon() {
        assert!(is_point_in_polygon(&Coordinate::new(13.0, 77.6), &square()));
        // Bangalore city center falls inside this square too.
        assert!(is_point_in_polygon(&blr(), &square()));
        // South-west of the square on both axes.
        assert!(!is_point_in_polygon(
            &Coordinate::new(12.90, 77.50),
            &square()
        ));
    }

    #[test]
    fn degenerate_polygon_contains_nothing() {
        let line = vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0)];
        assert!(!is_point_in_polygon(&Coordinate::new(0.5, 0.5), &line));
    }

    #[test]
    fn boundary_distance_is_positive_either_side() {
        // Inside the square, ~0.02 degrees north of the southern edge.
        let d = distance_to_polygon_boundary(&blr(), &square());
        assert!(d > 1_000.0 && d < 4_000.0, "got {d}");

        // Outside, closest to the south-west corner (~7.8 km away).
        let d = distance_to_polygon_boundary(&Coordinate::new(12.90, 77.50), &square());
        assert!(d > 5_000.0 && d < 10_000.0, "got {d}");
    }

    #[test]
    fn formats_distances() {
        assert_eq!(format_distance(500.0), "500 m");
        assert_eq!(format_distance(1_500.0), "1.5 km");
        assert_eq!(format_distance(250_000.0), "250 km");
    }

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(45.0), "45 sec");
        assert_eq!(format_duration(720.0), "12 min");
        assert_eq!(format_duration(5_400.0), "1 hr 30 min");
        assert_eq!(format_duration(7_200.0), "2 hr");
    }
}
