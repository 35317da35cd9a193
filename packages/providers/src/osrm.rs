//! OSRM routing engine client.
//!
//! Implements the [`Router`] capability over OSRM's `route`, `table`, and
//! `match` services, including snap-to-road via map matching. OSRM
//! reports domain outcomes (`NoRoute`, `NoMatch`, ...) in a `code` field,
//! sometimes inside an HTTP 400 body — those are mapped to domain status
//! values, never surfaced as errors.
//!
//! See <https://project-osrm.org/docs/v5.24.0/api/>

use std::time::Duration;

use async_trait::async_trait;
use waypoint_models::{
    AlternativeRoute, Coordinate, MatrixResponse, MatrixStatus, RouteResponse, RouteStatus,
    RouteStep, SnapStatus, SnapToRoadResponse, SnappedPoint, TravelMode,
};

use crate::{ProviderError, RouteOptions, Router, retry};

/// OSRM client configuration.
#[derive(Debug, Clone)]
pub struct OsrmConfig {
    /// Base URL of the OSRM server (e.g. `https://router.project-osrm.org`).
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
}

/// OSRM routing client.
pub struct OsrmClient {
    client: reqwest::Client,
    config: OsrmConfig,
}

impl OsrmClient {
    /// Builds a client with its own connection pool and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: OsrmConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("waypoint/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }
}

/// Formats coordinates as OSRM's `lng,lat;lng,lat` path segment.
fn coords_path(coords: &[Coordinate]) -> String {
    coords
        .iter()
        .map(|c| format!("{:.6},{:.6}", c.longitude, c.latitude))
        .collect::<Vec<_>>()
        .join(";")
}

/// Maps an OSRM `code` value onto a route status.
fn route_status(code: &str) -> RouteStatus {
    match code {
        "Ok" => RouteStatus::Ok,
        "NoRoute" | "NoMatch" => RouteStatus::ZeroResults,
        "NoSegment" => RouteStatus::NotFound,
        "TooBig" => RouteStatus::TooFar,
        "InvalidUrl" | "InvalidValue" | "InvalidQuery" | "InvalidOptions" => {
            RouteStatus::InvalidRequest
        }
        _ => RouteStatus::UnknownError,
    }
}

/// Extracts the OSRM `code` from a response body or 4xx error.
///
/// OSRM signals domain outcomes through HTTP 400 bodies; anything else
/// propagates as the original error.
fn code_from_error(err: ProviderError) -> Result<String, ProviderError> {
    match err {
        ProviderError::Status {
            status: 400..=499,
            body: Some(body),
        } => body["code"]
            .as_str()
            .map(String::from)
            .ok_or(ProviderError::Status {
                status: 400,
                body: Some(body),
            }),
        other => Err(other),
    }
}

#[async_trait]
impl Router for OsrmClient {
    fn id(&self) -> &str {
        "osrm"
    }

    async fn route(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
        mode: TravelMode,
        options: &RouteOptions,
    ) -> Result<RouteResponse, ProviderError> {
        let url = format!(
            "{}/route/v1/{}/{}",
            self.config.base_url,
            mode.osrm_profile(),
            coords_path(&[*origin, *destination])
        );
        let steps = if options.include_steps { "true" } else { "false" };
        let alternatives = if options.alternatives { "true" } else { "false" };

        let result = retry::send_json(|| {
            self.client.get(&url).query(&[
                ("overview", "full"),
                ("geometries", "polyline"),
                ("steps", steps),
                ("alternatives", alternatives),
                ("annotations", "distance,duration"),
            ])
        })
        .await;

        let body = match result {
            Ok(body) => body,
            Err(err) => {
                let code = code_from_error(err)?;
                return Ok(RouteResponse::failed(
                    route_status(&code),
                    *origin,
                    *destination,
                    mode,
                ));
            }
        };

        let code = body["code"].as_str().unwrap_or("UnknownError");
        if code != "Ok" {
            return Ok(RouteResponse::failed(
                route_status(code),
                *origin,
                *destination,
                mode,
            ));
        }

        let routes = body["routes"].as_array().ok_or_else(|| ProviderError::Parse {
            message: "OSRM response missing routes array".to_string(),
        })?;
        let Some(primary) = routes.first() else {
            return Ok(RouteResponse::failed(
                RouteStatus::ZeroResults,
                *origin,
                *destination,
                mode,
            ));
        };

        let distance_m = primary["distance"].as_f64().unwrap_or(0.0);
        let duration_s = primary["duration"].as_f64().unwrap_or(0.0);
        let polyline = primary["geometry"].as_str().map(String::from);

        let steps = if options.include_steps {
            parse_steps(primary)
        } else {
            Vec::new()
        };

        let alternatives = routes
            .iter()
            .skip(1)
            .map(|route| AlternativeRoute {
                distance_m: route["distance"].as_f64().unwrap_or(0.0),
                duration_s: route["duration"].as_f64().unwrap_or(0.0),
                polyline: route["geometry"].as_str().map(String::from),
            })
            .collect();

        Ok(RouteResponse {
            status: RouteStatus::Ok,
            origin: *origin,
            destination: *destination,
            mode,
            distance_m,
            duration_s,
            distance_text: waypoint_geo::format_distance(distance_m),
            duration_text: waypoint_geo::format_duration(duration_s),
            polyline,
            geometry: None,
            steps,
            alternatives,
            waypoints: None,
        })
    }

    async fn matrix(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
        mode: TravelMode,
    ) -> Result<MatrixResponse, ProviderError> {
        let all: Vec<Coordinate> = origins.iter().chain(destinations).copied().collect();
        let url = format!(
            "{}/table/v1/{}/{}",
            self.config.base_url,
            mode.osrm_profile(),
            coords_path(&all)
        );

        let sources = indices(0, origins.len());
        let dests = indices(origins.len(), destinations.len());

        let result = retry::send_json(|| {
            self.client.get(&url).query(&[
                ("sources", sources.as_str()),
                ("destinations", dests.as_str()),
                ("annotations", "distance,duration"),
            ])
        })
        .await;

        let body = match result {
            Ok(body) => body,
            Err(err) => {
                let code = code_from_error(err)?;
                let status = match route_status(&code) {
                    RouteStatus::InvalidRequest => MatrixStatus::InvalidRequest,
                    RouteStatus::OverQueryLimit => MatrixStatus::OverQueryLimit,
                    _ => MatrixStatus::UnknownError,
                };
                return Ok(MatrixResponse::failed(
                    status,
                    origins.to_vec(),
                    destinations.to_vec(),
                    mode,
                ));
            }
        };

        let code = body["code"].as_str().unwrap_or("UnknownError");
        if code != "Ok" {
            return Ok(MatrixResponse::failed(
                MatrixStatus::UnknownError,
                origins.to_vec(),
                destinations.to_vec(),
                mode,
            ));
        }

        let distances_m = parse_matrix(&body["distances"], origins.len(), destinations.len())?;
        let durations_s = parse_matrix(&body["durations"], origins.len(), destinations.len())?;

        Ok(MatrixResponse {
            status: MatrixStatus::Ok,
            origins: origins.to_vec(),
            destinations: destinations.to_vec(),
            mode,
            distances_m,
            durations_s,
            distance_texts: Vec::new(),
            duration_texts: Vec::new(),
            element_statuses: Vec::new(),
        })
    }

    fn supports_snap(&self) -> bool {
        true
    }

    async fn snap(
        &self,
        path: &[Coordinate],
        radius_m: f64,
    ) -> Result<SnapToRoadResponse, ProviderError> {
        let url = format!(
            "{}/match/v1/driving/{}",
            self.config.base_url,
            coords_path(path)
        );
        let radiuses = vec![format!("{}", radius_m.round()); path.len()].join(";");

        let result = retry::send_json(|| {
            self.client.get(&url).query(&[
                ("geometries", "polyline"),
                ("radiuses", radiuses.as_str()),
                ("gaps", "split"),
                ("tidy", "true"),
                ("overview", "full"),
            ])
        })
        .await;

        let body = match result {
            Ok(body) => body,
            Err(err) => {
                let code = code_from_error(err)?;
                let status = match route_status(&code) {
                    RouteStatus::ZeroResults | RouteStatus::NotFound => SnapStatus::ZeroResults,
                    RouteStatus::InvalidRequest => SnapStatus::InvalidRequest,
                    _ => SnapStatus::UnknownError,
                };
                return Ok(SnapToRoadResponse::failed(status));
            }
        };

        let code = body["code"].as_str().unwrap_or("UnknownError");
        if code != "Ok" {
            let status = match route_status(code) {
                RouteStatus::ZeroResults => SnapStatus::ZeroResults,
                _ => SnapStatus::UnknownError,
            };
            return Ok(SnapToRoadResponse::failed(status));
        }

        Ok(parse_match(&body, path))
    }
}

/// Builds an OSRM index list like `"0;1;2"` for `count` entries from
/// `start`.
fn indices(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(";")
}

/// Parses OSRM turn-by-turn steps across all legs of a route.
fn parse_steps(route: &serde_json::Value) -> Vec<RouteStep> {
    let Some(legs) = route["legs"].as_array() else {
        return Vec::new();
    };

    legs.iter()
        .filter_map(|leg| leg["steps"].as_array())
        .flatten()
        .map(|step| {
            let name = step["name"].as_str().unwrap_or_default();
            let maneuver_type = step["maneuver"]["type"].as_str().unwrap_or_default();
            let modifier = step["maneuver"]["modifier"].as_str();

            let mut instruction = match modifier {
                Some(m) => format!("{maneuver_type} {m}"),
                None => maneuver_type.to_string(),
            };
            if !name.is_empty() {
                instruction.push_str(" onto ");
                instruction.push_str(name);
            }

            RouteStep {
                instruction,
                road_name: (!name.is_empty()).then(|| name.to_string()),
                distance_m: step["distance"].as_f64().unwrap_or(0.0),
                duration_s: step["duration"].as_f64().unwrap_or(0.0),
                maneuver: Some(maneuver_type.to_string()),
            }
        })
        .collect()
}

/// Parses an OSRM table into a row-major `Option<f64>` matrix, verifying
/// its dimensions.
fn parse_matrix(
    value: &serde_json::Value,
    rows: usize,
    cols: usize,
) -> Result<Vec<Vec<Option<f64>>>, ProviderError> {
    let outer = value.as_array().ok_or_else(|| ProviderError::Parse {
        message: "OSRM table response missing matrix".to_string(),
    })?;
    if outer.len() != rows {
        return Err(ProviderError::Parse {
            message: format!("OSRM matrix has {} rows, expected {rows}", outer.len()),
        });
    }

    outer
        .iter()
        .map(|row| {
            let cells = row.as_array().ok_or_else(|| ProviderError::Parse {
                message: "OSRM matrix row is not an array".to_string(),
            })?;
            if cells.len() != cols {
                return Err(ProviderError::Parse {
                    message: format!("OSRM matrix row has {} cells, expected {cols}", cells.len()),
                });
            }
            Ok(cells.iter().map(serde_json::Value::as_f64).collect())
        })
        .collect()
}

/// Parses an OSRM map-matching response into snapped points.
fn parse_match(body: &serde_json::Value, path: &[Coordinate]) -> SnapToRoadResponse {
    let empty = Vec::new();
    let tracepoints = body["tracepoints"].as_array().unwrap_or(&empty);
    let matchings = body["matchings"].as_array().unwrap_or(&empty);

    let mut points: Vec<SnappedPoint> = path
        .iter()
        .enumerate()
        .map(|(i, original)| {
            let Some(tp) = tracepoints.get(i).filter(|tp| !tp.is_null()) else {
                return SnappedPoint::unmatched(*original);
            };

            let snapped = tp["location"].as_array().and_then(|loc| {
                let lng = loc.first()?.as_f64()?;
                let lat = loc.get(1)?.as_f64()?;
                Some(Coordinate::new(lat, lng))
            });
            let Some(snapped) = snapped else {
                return SnappedPoint::unmatched(*original);
            };

            let confidence = tp["matchings_index"]
                .as_u64()
                .and_then(|mi| usize::try_from(mi).ok())
                .and_then(|mi| matchings.get(mi))
                .and_then(|m| m["confidence"].as_f64())
                .unwrap_or(0.0);

            SnappedPoint {
                original: *original,
                snapped: Some(snapped),
                snap_distance_m: waypoint_geo::distance(original, &snapped),
                is_snapped: true,
                street_name: tp["name"].as_str().filter(|s| !s.is_empty()).map(String::from),
                bearing: None,
                confidence,
            }
        })
        .collect();

    // Bearing along the matched path: from each snapped point toward the
    // next snapped one.
    let snapped_coords: Vec<(usize, Coordinate)> = points
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.snapped.map(|c| (i, c)))
        .collect();
    for window in snapped_coords.windows(2) {
        let (i, from) = window[0];
        let (_, to) = window[1];
        points[i].bearing = Some(waypoint_geo::bearing(&from, &to));
    }

    let polyline = combine_matching_geometry(matchings);
    let status = if points.iter().any(|p| p.is_snapped) {
        SnapStatus::Ok
    } else {
        SnapStatus::ZeroResults
    };

    SnapToRoadResponse {
        status,
        points,
        polyline,
    }
}

/// Concatenates the geometries of all matchings into one polyline.
fn combine_matching_geometry(matchings: &[serde_json::Value]) -> Option<String> {
    let mut combined: Vec<Coordinate> = Vec::new();
    for matching in matchings {
        if let Some(geometry) = matching["geometry"].as_str() {
            combined.extend(waypoint_polyline::decode(geometry));
        }
    }
    if combined.is_empty() {
        None
    } else {
        Some(waypoint_polyline::encode(&combined))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coords_path_is_lng_lat_ordered() {
        let path = coords_path(&[Coordinate::new(12.9716, 77.5946)]);
        assert_eq!(path, "77.594600,12.971600");
    }

    #[test]
    fn maps_osrm_codes_to_statuses() {
        assert_eq!(route_status("Ok"), RouteStatus::Ok);
        assert_eq!(route_status("NoRoute"), RouteStatus::ZeroResults);
        assert_eq!(route_status("NoSegment"), RouteStatus::NotFound);
        assert_eq!(route_status("TooBig"), RouteStatus::TooFar);
        assert_eq!(route_status("InvalidQuery"), RouteStatus::InvalidRequest);
        assert_eq!(route_status("Banana"), RouteStatus::UnknownError);
    }

    #[test]
    fn parse_matrix_rejects_wrong_shape() {
        let value = serde_json::json!([[1.0, 2.0], [3.0, 4.0]]);
        assert!(parse_matrix(&value, 2, 2).is_ok());
        assert!(parse_matrix(&value, 3, 2).is_err());
        assert!(parse_matrix(&value, 2, 3).is_err());
    }

    #[test]
    fn parse_matrix_keeps_null_cells_unknown() {
        let value = serde_json::json!([[1.0, null]]);
        let matrix = parse_matrix(&value, 1, 2).unwrap();
        assert_eq!(matrix[0][0], Some(1.0));
        assert_eq!(matrix[0][1], None);
    }

    #[test]
    fn parse_match_handles_unmatched_tracepoints() {
        let path = [Coordinate::new(12.0, 77.0), Coordinate::new(12.001, 77.001)];
        let body = serde_json::json!({
            "code": "Ok",
            "tracepoints": [
                null,
                {
                    "location": [77.00105, 12.00102],
                    "name": "MG Road",
                    "matchings_index": 0,
                    "waypoint_index": 0
                }
            ],
            "matchings": [
                {"confidence": 0.9, "geometry": "_p~iF~ps|U_ulLnnqC"}
            ]
        });

        let resp = parse_match(&body, &path);
        assert_eq!(resp.status, SnapStatus::Ok);
        assert!(!resp.points[0].is_snapped);
        assert!(resp.points[1].is_snapped);
        assert_eq!(resp.points[1].street_name.as_deref(), Some("MG Road"));
        assert!((resp.points[1].confidence - 0.9).abs() < 1e-9);
        assert!(resp.points[1].snap_distance_m > 0.0);
        assert!(resp.polyline.is_some());
    }

    #[test]
    fn parse_steps_builds_instructions() {
        let route = serde_json::json!({
            "legs": [{
                "steps": [
                    {
                        "name": "MG Road",
                        "distance": 120.0,
                        "duration": 30.0,
                        "maneuver": {"type": "turn", "modifier": "left"}
                    },
                    {
                        "name": "",
                        "distance": 10.0,
                        "duration": 5.0,
                        "maneuver": {"type": "arrive"}
                    }
                ]
            }]
        });

        let steps = parse_steps(&route);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].instruction, "turn left onto MG Road");
        assert_eq!(steps[0].road_name.as_deref(), Some("MG Road"));
        assert_eq!(steps[1].instruction, "arrive");
        assert!(steps[1].road_name.is_none());
    }
}
