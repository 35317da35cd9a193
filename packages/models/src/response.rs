//! Response types for routing, matrix, ETA, and snap-to-road operations.
//!
//! Each operation family has its own status enum because their terminal
//! states differ (e.g. `TOO_FAR` only applies to point-to-point routing).
//! `NoResult`-style outcomes are expressed as status values rather than
//! errors so callers can branch without error handling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Coordinate, TravelMode};

/// Terminal status of a directions request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteStatus {
    /// A route was found.
    Ok,
    /// One of the endpoints could not be matched to the road network.
    NotFound,
    /// No route exists between the endpoints.
    ZeroResults,
    /// The endpoints are farther apart than the backend supports.
    TooFar,
    /// The request was malformed or failed validation.
    InvalidRequest,
    /// The backend rejected the request for quota reasons.
    OverQueryLimit,
    /// The backend was unreachable or failed.
    ServiceUnavailable,
    /// Anything else.
    UnknownError,
}

/// A single turn-by-turn instruction within a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStep {
    /// Human-readable instruction (e.g. "Turn left onto MG Road").
    pub instruction: String,
    /// Road name for this step, if known.
    pub road_name: Option<String>,
    /// Step distance in meters.
    pub distance_m: f64,
    /// Step duration in seconds.
    pub duration_s: f64,
    /// Maneuver type tag from the backend (e.g. "turn", "depart").
    pub maneuver: Option<String>,
}

/// Result of a directions request.
///
/// Steps, geometry, and the polyline are only populated when
/// `status == RouteStatus::Ok`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponse {
    /// Terminal status.
    pub status: RouteStatus,
    /// Requested origin.
    pub origin: Coordinate,
    /// Requested destination.
    pub destination: Coordinate,
    /// Travel mode used.
    pub mode: TravelMode,
    /// Total distance in meters.
    pub distance_m: f64,
    /// Total duration in seconds.
    pub duration_s: f64,
    /// Human-readable distance (e.g. "12.4 km").
    pub distance_text: String,
    /// Human-readable duration (e.g. "25 min").
    pub duration_text: String,
    /// Encoded polyline of the route geometry.
    pub polyline: Option<String>,
    /// Decoded geometry, populated only when the caller asked for it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Vec<Coordinate>>,
    /// Turn-by-turn steps, empty when not requested.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<RouteStep>,
    /// Alternative routes, when requested and available.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<AlternativeRoute>,
    /// Intermediate waypoints the route passed through, in order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waypoints: Option<Vec<Coordinate>>,
}

impl RouteResponse {
    /// Builds a non-OK response carrying only the request echo.
    #[must_use]
    pub fn failed(
        status: RouteStatus,
        origin: Coordinate,
        destination: Coordinate,
        mode: TravelMode,
    ) -> Self {
        Self {
            status,
            origin,
            destination,
            mode,
            distance_m: 0.0,
            duration_s: 0.0,
            distance_text: String::new(),
            duration_text: String::new(),
            polyline: None,
            geometry: None,
            steps: Vec::new(),
            alternatives: Vec::new(),
            waypoints: None,
        }
    }
}

/// A secondary route option returned alongside the primary route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeRoute {
    /// Total distance in meters.
    pub distance_m: f64,
    /// Total duration in seconds.
    pub duration_s: f64,
    /// Encoded polyline of the alternative geometry.
    pub polyline: Option<String>,
}

/// Terminal status of a distance-matrix request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatrixStatus {
    /// The matrix was computed (individual elements may still be unknown).
    Ok,
    /// The request was malformed or exceeded size limits.
    InvalidRequest,
    /// The backend rejected the request for quota reasons.
    OverQueryLimit,
    /// The backend was unreachable or failed.
    ServiceUnavailable,
    /// Anything else.
    UnknownError,
}

/// Status of a single origin/destination pair within a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatrixElementStatus {
    /// Both distance and duration are known.
    Ok,
    /// No route exists for this pair.
    NoRoute,
}

/// Result of a distance/duration matrix request.
///
/// Matrices are row-major: `distances[i][j]` is origin `i` → destination
/// `j`. A `None` cell means the backend could not route that pair. When
/// `status == MatrixStatus::Ok` both matrices are exactly
/// `origins.len() × destinations.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixResponse {
    /// Terminal status.
    pub status: MatrixStatus,
    /// Requested origins.
    pub origins: Vec<Coordinate>,
    /// Requested destinations.
    pub destinations: Vec<Coordinate>,
    /// Travel mode used.
    pub mode: TravelMode,
    /// Distance matrix in meters.
    pub distances_m: Vec<Vec<Option<f64>>>,
    /// Duration matrix in seconds.
    pub durations_s: Vec<Vec<Option<f64>>>,
    /// Human-readable distance matrix (empty string for unknown cells).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub distance_texts: Vec<Vec<String>>,
    /// Human-readable duration matrix (empty string for unknown cells).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duration_texts: Vec<Vec<String>>,
    /// Per-element status matrix.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub element_statuses: Vec<Vec<MatrixElementStatus>>,
}

impl MatrixResponse {
    /// Builds a non-OK response carrying only the request echo.
    #[must_use]
    pub fn failed(
        status: MatrixStatus,
        origins: Vec<Coordinate>,
        destinations: Vec<Coordinate>,
        mode: TravelMode,
    ) -> Self {
        Self {
            status,
            origins,
            destinations,
            mode,
            distances_m: Vec::new(),
            durations_s: Vec::new(),
            distance_texts: Vec::new(),
            duration_texts: Vec::new(),
            element_statuses: Vec::new(),
        }
    }
}

/// Terminal status of an ETA request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EtaStatus {
    /// An ETA was computed.
    Ok,
    /// No route exists between the endpoints.
    ZeroResults,
    /// The request was malformed or failed validation.
    InvalidRequest,
    /// The backend was unreachable and no fallback was possible.
    ServiceUnavailable,
    /// Anything else.
    UnknownError,
}

/// Coarse traffic classification applied to an ETA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficCondition {
    /// Free-flowing traffic.
    Light,
    /// Shoulder-hour traffic.
    Moderate,
    /// Peak-hour traffic.
    Heavy,
}

/// Result of an ETA request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtaResponse {
    /// Terminal status.
    pub status: EtaStatus,
    /// Requested origin.
    pub origin: Coordinate,
    /// Requested destination.
    pub destination: Coordinate,
    /// Travel mode used.
    pub mode: TravelMode,
    /// Traffic-adjusted travel duration in seconds.
    pub duration_s: f64,
    /// Optimistic ETA bound in seconds.
    pub eta_min_s: f64,
    /// Pessimistic ETA bound in seconds.
    pub eta_max_s: f64,
    /// Departure time the estimate was computed for.
    pub departure_time: DateTime<Utc>,
    /// Estimated arrival (`departure_time + duration`).
    pub estimated_arrival: DateTime<Utc>,
    /// Traffic classification at the departure time.
    pub traffic: TrafficCondition,
    /// Estimate confidence in `[0, 1]`; straight-line fallback estimates
    /// report strictly lower confidence than route-based ones.
    pub confidence: f64,
    /// Extra pickup/handover time included for delivery legs, in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_time_s: Option<f64>,
}

/// Terminal status of a snap-to-road request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SnapStatus {
    /// At least one point was snapped.
    Ok,
    /// No point could be matched to the road network.
    ZeroResults,
    /// The request was malformed or failed validation.
    InvalidRequest,
    /// The backend was unreachable or failed.
    ServiceUnavailable,
    /// Anything else.
    UnknownError,
}

/// A single GPS point matched to the road network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnappedPoint {
    /// The raw input coordinate.
    pub original: Coordinate,
    /// The matched on-road coordinate, when the point snapped.
    pub snapped: Option<Coordinate>,
    /// Distance from the input to the matched point, in meters.
    pub snap_distance_m: f64,
    /// Whether the point was matched at all.
    pub is_snapped: bool,
    /// Name of the matched road, if known.
    pub street_name: Option<String>,
    /// Heading along the matched road segment, degrees `[0, 360)`.
    pub bearing: Option<f64>,
    /// Match confidence in `[0, 1]`.
    pub confidence: f64,
}

impl SnappedPoint {
    /// Builds an unmatched point (no road within the search radius).
    #[must_use]
    pub const fn unmatched(original: Coordinate) -> Self {
        Self {
            original,
            snapped: None,
            snap_distance_m: 0.0,
            is_snapped: false,
            street_name: None,
            bearing: None,
            confidence: 0.0,
        }
    }
}

/// Result of a snap-to-road request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapToRoadResponse {
    /// Terminal status.
    pub status: SnapStatus,
    /// One entry per input point, in input order.
    pub points: Vec<SnappedPoint>,
    /// Encoded polyline of the matched path, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polyline: Option<String>,
}

impl SnapToRoadResponse {
    /// Builds a non-OK response with no points.
    #[must_use]
    pub const fn failed(status: SnapStatus) -> Self {
        Self {
            status,
            points: Vec::new(),
            polyline: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_serialize_screaming_snake() {
        assert_eq!(
            serde_json::to_value(RouteStatus::ZeroResults).unwrap(),
            "ZERO_RESULTS"
        );
        assert_eq!(
            serde_json::to_value(MatrixStatus::ServiceUnavailable).unwrap(),
            "SERVICE_UNAVAILABLE"
        );
        assert_eq!(serde_json::to_value(SnapStatus::Ok).unwrap(), "OK");
    }

    #[test]
    fn failed_route_has_no_geometry() {
        let resp = RouteResponse::failed(
            RouteStatus::ZeroResults,
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 1.0),
            TravelMode::Driving,
        );
        assert!(resp.polyline.is_none());
        assert!(resp.steps.is_empty());
        assert!(resp.geometry.is_none());
    }
}
