//! GraphHopper routing engine client.
//!
//! Alternate routing backend implementing [`Router`] over the
//! GraphHopper `route` and `matrix` endpoints. GraphHopper has no
//! map-matching endpoint in this integration, so the snap capability is
//! left at its unsupported default.
//!
//! See <https://docs.graphhopper.com/#tag/Routing-API>

use std::time::Duration;

use async_trait::async_trait;
use waypoint_models::{
    AlternativeRoute, Coordinate, MatrixResponse, MatrixStatus, RouteResponse, RouteStatus,
    RouteStep, TravelMode,
};

use crate::{ProviderError, RouteOptions, Router, retry};

/// GraphHopper client configuration.
#[derive(Debug, Clone)]
pub struct GraphHopperConfig {
    /// API base URL (e.g. `https://graphhopper.com/api/1`).
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
    /// API key, when the instance requires one.
    pub api_key: Option<String>,
}

/// GraphHopper routing client.
pub struct GraphHopperClient {
    client: reqwest::Client,
    config: GraphHopperConfig,
}

impl GraphHopperClient {
    /// Builds a client with its own connection pool and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: GraphHopperConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("waypoint/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    /// Appends the API key to a query parameter list when configured.
    fn keyed<'a>(&'a self, mut params: Vec<(&'a str, String)>) -> Vec<(&'a str, String)> {
        if let Some(key) = &self.config.api_key {
            params.push(("key", key.clone()));
        }
        params
    }
}

/// Formats a coordinate as GraphHopper's `lat,lng` point parameter.
fn point_param(coord: &Coordinate) -> String {
    format!("{:.6},{:.6}", coord.latitude, coord.longitude)
}

/// Classifies a GraphHopper error body.
///
/// GraphHopper reports "no route" as an HTTP 400 whose message mentions
/// the connection between points.
fn route_status_from_body(body: &serde_json::Value) -> RouteStatus {
    let message = body["message"].as_str().unwrap_or_default().to_lowercase();
    if message.contains("connection between locations not found")
        || message.contains("cannot find route")
    {
        RouteStatus::ZeroResults
    } else if message.contains("cannot find point") || message.contains("point_not_found") {
        RouteStatus::NotFound
    } else if message.contains("api limit") {
        RouteStatus::OverQueryLimit
    } else {
        RouteStatus::InvalidRequest
    }
}

#[async_trait]
impl Router for GraphHopperClient {
    fn id(&self) -> &str {
        "graphhopper"
    }

    async fn route(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
        mode: TravelMode,
        options: &RouteOptions,
    ) -> Result<RouteResponse, ProviderError> {
        let url = format!("{}/route", self.config.base_url);
        let params = self.keyed(vec![
            ("point", point_param(origin)),
            ("point", point_param(destination)),
            ("profile", mode.graphhopper_profile().to_string()),
            ("calc_points", "true".to_string()),
            ("instructions", options.include_steps.to_string()),
            ("points_encoded", "true".to_string()),
            (
                "algorithm",
                if options.alternatives {
                    "alternative_route".to_string()
                } else {
                    String::new()
                },
            ),
        ]);
        let params: Vec<_> = params.into_iter().filter(|(_, v)| !v.is_empty()).collect();

        let result = retry::send_json(|| self.client.get(&url).query(&params)).await;

        let body = match result {
            Ok(body) => body,
            Err(ProviderError::Status {
                status: 400..=499,
                body: Some(err_body),
            }) => {
                return Ok(RouteResponse::failed(
                    route_status_from_body(&err_body),
                    *origin,
                    *destination,
                    mode,
                ));
            }
            Err(other) => return Err(other),
        };

        let paths = body["paths"].as_array().ok_or_else(|| ProviderError::Parse {
            message: "GraphHopper response missing paths array".to_string(),
        })?;
        let Some(primary) = paths.first() else {
            return Ok(RouteResponse::failed(
                RouteStatus::ZeroResults,
                *origin,
                *destination,
                mode,
            ));
        };

        let distance_m = primary["distance"].as_f64().unwrap_or(0.0);
        // GraphHopper reports time in milliseconds.
        let duration_s = primary["time"].as_f64().unwrap_or(0.0) / 1_000.0;
        let polyline = primary["points"].as_str().map(String::from);

        let steps = if options.include_steps {
            parse_instructions(primary)
        } else {
            Vec::new()
        };

        let alternatives = paths
            .iter()
            .skip(1)
            .map(|path| AlternativeRoute {
                distance_m: path["distance"].as_f64().unwrap_or(0.0),
                duration_s: path["time"].as_f64().unwrap_or(0.0) / 1_000.0,
                polyline: path["points"].as_str().map(String::from),
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
        let url = format!("{}/matrix", self.config.base_url);
        let mut params = vec![("profile", mode.graphhopper_profile().to_string())];
        for origin in origins {
            params.push(("from_point", point_param(origin)));
        }
        for destination in destinations {
            params.push(("to_point", point_param(destination)));
        }
        params.push(("out_array", "distances".to_string()));
        params.push(("out_array", "times".to_string()));
        let params = self.keyed(params);

        let result = retry::send_json(|| self.client.get(&url).query(&params)).await;

        let body = match result {
            Ok(body) => body,
            Err(ProviderError::Status {
                status: 400..=499,
                body: Some(_),
            }) => {
                return Ok(MatrixResponse::failed(
                    MatrixStatus::InvalidRequest,
                    origins.to_vec(),
                    destinations.to_vec(),
                    mode,
                ));
            }
            Err(other) => return Err(other),
        };

        let distances_m = parse_matrix(&body["distances"], origins.len(), destinations.len())?;
        let durations_s = parse_matrix(&body["times"], origins.len(), destinations.len())?;

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
}

/// Parses GraphHopper instructions into route steps.
fn parse_instructions(path: &serde_json::Value) -> Vec<RouteStep> {
    let Some(instructions) = path["instructions"].as_array() else {
        return Vec::new();
    };

    instructions
        .iter()
        .map(|ins| {
            let street = ins["street_name"].as_str().unwrap_or_default();
            RouteStep {
                instruction: ins["text"].as_str().unwrap_or_default().to_string(),
                road_name: (!street.is_empty()).then(|| street.to_string()),
                distance_m: ins["distance"].as_f64().unwrap_or(0.0),
                duration_s: ins["time"].as_f64().unwrap_or(0.0) / 1_000.0,
                maneuver: ins["sign"].as_i64().map(|s| s.to_string()),
            }
        })
        .collect()
}

/// Parses a GraphHopper matrix array, verifying its dimensions.
fn parse_matrix(
    value: &serde_json::Value,
    rows: usize,
    cols: usize,
) -> Result<Vec<Vec<Option<f64>>>, ProviderError> {
    let outer = value.as_array().ok_or_else(|| ProviderError::Parse {
        message: "GraphHopper matrix response missing array".to_string(),
    })?;
    if outer.len() != rows {
        return Err(ProviderError::Parse {
            message: format!("GraphHopper matrix has {} rows, expected {rows}", outer.len()),
        });
    }

    outer
        .iter()
        .map(|row| {
            let cells = row.as_array().ok_or_else(|| ProviderError::Parse {
                message: "GraphHopper matrix row is not an array".to_string(),
            })?;
            if cells.len() != cols {
                return Err(ProviderError::Parse {
                    message: format!(
                        "GraphHopper matrix row has {} cells, expected {cols}",
                        cells.len()
                    ),
                });
            }
            Ok(cells.iter().map(serde_json::Value::as_f64).collect())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_param_is_lat_lng_ordered() {
        assert_eq!(
            point_param(&Coordinate::new(12.9716, 77.5946)),
            "12.971600,77.594600"
        );
    }

    #[test]
    fn no_connection_maps_to_zero_results() {
        let body = serde_json::json!({
            "message": "Connection between locations not found"
        });
        assert_eq!(route_status_from_body(&body), RouteStatus::ZeroResults);
    }

    #[test]
    fn unknown_client_error_maps_to_invalid_request() {
        let body = serde_json::json!({"message": "Bad parameter: profile"});
        assert_eq!(route_status_from_body(&body), RouteStatus::InvalidRequest);
    }

    #[test]
    fn parses_instructions_with_millisecond_times() {
        let path = serde_json::json!({
            "instructions": [
                {
                    "text": "Turn right onto Brigade Road",
                    "street_name": "Brigade Road",
                    "distance": 250.0,
                    "time": 45000,
                    "sign": 2
                }
            ]
        });
        let steps = parse_instructions(&path);
        assert_eq!(steps.len(), 1);
        assert!((steps[0].duration_s - 45.0).abs() < 1e-9);
        assert_eq!(steps[0].road_name.as_deref(), Some("Brigade Road"));
    }
}
