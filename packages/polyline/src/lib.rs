#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Google polyline codec and path helpers.
//!
//! Implements the standard encoded-polyline algorithm at 1e-5 degree
//! precision: per-axis deltas, zig-zag signed varints in 5-bit groups,
//! offset by 63 into printable ASCII. Round-trips reproduce the input
//! within 1e-5 degrees.
//!
//! Also provides Douglas-Peucker line simplification, total path length,
//! and path midpoint interpolation.

use waypoint_models::Coordinate;

/// Fixed-point scale of the polyline encoding (1e-5 degrees).
const PRECISION: f64 = 1e5;

/// Meters per degree used by [`simplify`]'s planar tolerance conversion.
const SIMPLIFY_METERS_PER_DEGREE: f64 = 111_000.0;

/// Encodes a coordinate sequence into a polyline string.
#[must_use]
pub fn encode(coords: &[Coordinate]) -> String {
    let mut out = String::with_capacity(coords.len() * 6);
    let mut prev_lat = 0i64;
    let mut prev_lng = 0i64;

    for coord in coords {
        #[allow(clippy::cast_possible_truncation)]
        let lat = (coord.latitude * PRECISION).round() as i64;
        #[allow(clippy::cast_possible_truncation)]
        let lng = (coord.longitude * PRECISION).round() as i64;

        encode_value(lat - prev_lat, &mut out);
        encode_value(lng - prev_lng, &mut out);

        prev_lat = lat;
        prev_lng = lng;
    }

    out
}

/// Encodes a single signed delta as a zig-zag varint in 5-bit groups.
fn encode_value(value: i64, out: &mut String) {
    // Zig-zag: left shift, invert when negative.
    let shifted = value << 1;
    #[allow(clippy::cast_sign_loss)]
    let mut v = (if value < 0 { !shifted } else { shifted }) as u64;

    while v >= 0x20 {
        #[allow(clippy::cast_possible_truncation)]
        out.push((((0x20 | (v & 0x1f)) + 63) as u8) as char);
        v >>= 5;
    }
    #[allow(clippy::cast_possible_truncation)]
    out.push(((v + 63) as u8) as char);
}

/// Decodes a polyline string back into coordinates.
///
/// Trailing garbage or a truncated final group yields a short result
/// rather than an error; every fully decoded point is returned.
#[must_use]
pub fn decode(encoded: &str) -> Vec<Coordinate> {
    let bytes = encoded.as_bytes();
    let mut coords = Vec::new();
    let mut index = 0;
    let mut lat = 0i64;
    let mut lng = 0i64;

    while index < bytes.len() {
        let Some((d_lat, next)) = decode_value(bytes, index) else {
            break;
        };
        let Some((d_lng, next)) = decode_value(bytes, next) else {
            break;
        };

        lat += d_lat;
        lng += d_lng;
        index = next;

        #[allow(clippy::cast_precision_loss)]
        coords.push(Coordinate::new(
            lat as f64 / PRECISION,
            lng as f64 / PRECISION,
        ));
    }

    coords
}

/// Decodes one zig-zag varint starting at `index`.
///
/// Returns the decoded value and the index of the next group, or `None`
/// if the input ends mid-group.
fn decode_value(bytes: &[u8], mut index: usize) -> Option<(i64, usize)> {
    let mut result = 0u64;
    let mut shift = 0u32;

    loop {
        let byte = *bytes.get(index)?;
        let chunk = u64::from(byte.checked_sub(63)?);
        index += 1;

        result |= (chunk & 0x1f) << shift;
        shift += 5;

        if chunk < 0x20 {
            break;
        }
    }

    #[allow(clippy::cast_possible_wrap)]
    let signed = if result & 1 == 1 {
        !((result >> 1) as i64)
    } else {
        (result >> 1) as i64
    };

    Some((signed, index))
}

/// Douglas-Peucker line simplification.
///
/// `tolerance_m` is the maximum perpendicular deviation a removed point
/// may have from the simplified line, converted to degree space with a
/// fixed 111,000 m/degree factor. The first and last points of every
/// retained segment are kept, so inputs of 2+ points always yield at
/// least 2 points.
#[must_use]
pub fn simplify(coords: &[Coordinate], tolerance_m: f64) -> Vec<Coordinate> {
    if coords.len() <= 2 {
        return coords.to_vec();
    }

    let tolerance_deg = tolerance_m / SIMPLIFY_METERS_PER_DEGREE;
    let mut keep = vec![false; coords.len()];
    keep[0] = true;
    keep[coords.len() - 1] = true;

    simplify_segment(coords, 0, coords.len() - 1, tolerance_deg, &mut keep);

    coords
        .iter()
        .zip(&keep)
        .filter_map(|(c, &k)| k.then_some(*c))
        .collect()
}

/// Recursive half of [`simplify`]: marks the farthest point of the span
/// for keeping when it deviates beyond tolerance, then recurses into the
/// two sub-spans it creates.
fn simplify_segment(
    coords: &[Coordinate],
    first: usize,
    last: usize,
    tolerance_deg: f64,
    keep: &mut [bool],
) {
    if last <= first + 1 {
        return;
    }

    let mut max_dist = 0.0;
    let mut max_index = first;

    for i in (first + 1)..last {
        let d = perpendicular_degrees(&coords[i], &coords[first], &coords[last]);
        if d > max_dist {
            max_dist = d;
            max_index = i;
        }
    }

    if max_dist > tolerance_deg {
        keep[max_index] = true;
        simplify_segment(coords, first, max_index, tolerance_deg, keep);
        simplify_segment(coords, max_index, last, tolerance_deg, keep);
    }
}

/// Perpendicular distance from `p` to the line through `a` and `b`, in
/// degree space.
fn perpendicular_degrees(p: &Coordinate, a: &Coordinate, b: &Coordinate) -> f64 {
    let (dx, dy) = (b.longitude - a.longitude, b.latitude - a.latitude);
    let len = (dx * dx + dy * dy).sqrt();

    if len == 0.0 {
        let (ex, ey) = (p.longitude - a.longitude, p.latitude - a.latitude);
        return (ex * ex + ey * ey).sqrt();
    }

    ((p.longitude - a.longitude) * dy - (p.latitude - a.latitude) * dx).abs() / len
}

/// Total path length: the running sum of pairwise great-circle distances,
/// in meters.
#[must_use]
pub fn path_distance(coords: &[Coordinate]) -> f64 {
    coords
        .windows(2)
        .map(|pair| waypoint_geo::distance(&pair[0], &pair[1]))
        .sum()
}

/// Point halfway along the path by traveled distance.
///
/// Walks the path accumulating segment lengths until half the total is
/// reached, then interpolates linearly between the bracketing pair.
/// Returns `None` for an empty path.
#[must_use]
pub fn path_midpoint(coords: &[Coordinate]) -> Option<Coordinate> {
    match coords {
        [] => return None,
        [only] => return Some(*only),
        _ => {}
    }

    let half = path_distance(coords) / 2.0;
    if half == 0.0 {
        return Some(coords[0]);
    }

    let mut walked = 0.0;
    for pair in coords.windows(2) {
        let seg = waypoint_geo::distance(&pair[0], &pair[1]);
        if walked + seg >= half {
            let t = if seg == 0.0 { 0.0 } else { (half - walked) / seg };
            return Some(Coordinate::new(
                pair[0].latitude + t * (pair[1].latitude - pair[0].latitude),
                pair[0].longitude + t * (pair[1].longitude - pair[0].longitude),
            ));
        }
        walked += seg;
    }

    coords.last().copied()
}
