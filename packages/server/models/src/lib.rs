#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the waypoint server.
//!
//! The domain response types in `waypoint_models` already serialize to
//! the wire shape, so this crate mostly defines request envelopes plus
//! the handful of responses with no domain counterpart (health, errors,
//! serviceability verdicts).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use waypoint_models::Coordinate;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Always `true` when the process is serving.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Error envelope returned on every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable description of the failure.
    pub error: String,
}

/// Query parameters for the forward-geocode endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchQueryParams {
    /// Free-text query.
    pub q: String,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

/// Query parameters for the reverse-geocode endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ReverseQueryParams {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

/// Query parameters for the quick distance endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceQueryParams {
    /// Origin latitude.
    pub from_lat: f64,
    /// Origin longitude.
    pub from_lng: f64,
    /// Destination latitude.
    pub to_lat: f64,
    /// Destination longitude.
    pub to_lng: f64,
    /// Travel mode name; defaults to driving.
    pub mode: Option<String>,
}

/// Request body for the directions endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionsRequest {
    /// Route origin.
    pub origin: Coordinate,
    /// Route destination.
    pub destination: Coordinate,
    /// Travel mode name; defaults to driving.
    pub mode: Option<String>,
    /// Include decoded geometry on the response.
    #[serde(default)]
    pub include_geometry: bool,
    /// Include turn-by-turn steps.
    #[serde(default)]
    pub include_steps: bool,
    /// Request alternative routes.
    #[serde(default)]
    pub alternatives: bool,
    /// Intermediate stops, visited in order.
    #[serde(default)]
    pub waypoints: Vec<Coordinate>,
}

/// Request body for the matrix endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixRequest {
    /// Matrix origins.
    pub origins: Vec<Coordinate>,
    /// Matrix destinations.
    pub destinations: Vec<Coordinate>,
    /// Travel mode name; defaults to driving.
    pub mode: Option<String>,
}

/// Request body for the ETA endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtaRequest {
    /// Trip origin.
    pub origin: Coordinate,
    /// Trip destination.
    pub destination: Coordinate,
    /// Travel mode name; defaults to driving.
    pub mode: Option<String>,
    /// Explicit departure time; defaults to now.
    pub departure_time: Option<DateTime<Utc>>,
}

/// Request body for the snap-to-road endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapRequest {
    /// GPS trace, in recorded order.
    pub path: Vec<Coordinate>,
    /// Search radius around each point, in meters.
    pub radius_m: Option<f64>,
}

/// Request body for the serviceability check endpoint.
///
/// The service area is either a polygon ring or a circle; exactly one of
/// the two shapes must be supplied.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceabilityRequest {
    /// Points to test.
    pub points: Vec<Coordinate>,
    /// Service-area polygon ring (at least 3 vertices).
    pub area: Option<Vec<Coordinate>>,
    /// Center of a circular service area.
    pub center: Option<Coordinate>,
    /// Radius of the circular service area, in meters.
    pub radius_m: Option<f64>,
}

/// Response for the serviceability check endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceabilityResponse {
    /// One verdict per input point, in input order.
    pub results: Vec<bool>,
    /// Number of serviceable points.
    pub serviceable_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directions_request_defaults_optional_flags() {
        let req: DirectionsRequest = serde_json::from_value(serde_json::json!({
            "origin": {"lat": 12.9716, "lng": 77.5946},
            "destination": {"lat": 12.9352, "lng": 77.6245},
        }))
        .unwrap();
        assert!(!req.include_geometry);
        assert!(!req.include_steps);
        assert!(!req.alternatives);
        assert!(req.waypoints.is_empty());
        assert!(req.mode.is_none());
    }

    #[test]
    fn serviceability_response_is_camel_case() {
        let json = serde_json::to_value(ServiceabilityResponse {
            results: vec![true, false],
            serviceable_count: 1,
        })
        .unwrap();
        assert_eq!(json["serviceableCount"], 1);
    }
}
