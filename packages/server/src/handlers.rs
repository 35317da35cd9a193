//! HTTP handler functions for the waypoint API.

use actix_web::{HttpResponse, web};
use waypoint_models::{Coordinate, TravelMode};
use waypoint_server_models::{
    ApiError, ApiHealth, DirectionsRequest, DistanceQueryParams, EtaRequest, MatrixRequest,
    ReverseQueryParams, SearchQueryParams, ServiceabilityRequest, ServiceabilityResponse,
    SnapRequest,
};
use waypoint_services::{DirectionsOptions, ServiceError};

use crate::AppState;

/// Maps a service error onto its HTTP status and error envelope.
fn error_response(err: &ServiceError) -> HttpResponse {
    let envelope = ApiError {
        error: err.to_string(),
    };
    match err {
        ServiceError::Validation { .. } => HttpResponse::BadRequest().json(envelope),
        ServiceError::RateLimited => HttpResponse::TooManyRequests().json(envelope),
        ServiceError::Upstream(_) => HttpResponse::ServiceUnavailable().json(envelope),
        ServiceError::Internal { .. } => {
            // Detail was already logged where the failure happened.
            HttpResponse::InternalServerError().json(ApiError {
                error: "Internal error".to_string(),
            })
        }
    }
}

/// Parses an optional travel-mode name, defaulting to driving.
fn parse_mode(mode: Option<&str>) -> Result<TravelMode, HttpResponse> {
    match mode {
        None => Ok(TravelMode::default()),
        Some(name) => name.parse().map_err(|_| {
            HttpResponse::BadRequest().json(ApiError {
                error: format!("Unknown travel mode: {name}"),
            })
        }),
    }
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/geocode/search`
///
/// Forward-geocodes a free-text query.
pub async fn geocode_search(
    state: web::Data<AppState>,
    params: web::Query<SearchQueryParams>,
) -> HttpResponse {
    match state.geocoding.search(&params.q, params.limit).await {
        Ok(results) => HttpResponse::Ok().json(results),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/geocode/reverse`
///
/// Reverse-geocodes a coordinate; `null` body when nothing is there.
pub async fn geocode_reverse(
    state: web::Data<AppState>,
    params: web::Query<ReverseQueryParams>,
) -> HttpResponse {
    let coord = Coordinate::new(params.lat, params.lng);
    match state.geocoding.reverse(&coord).await {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/distance`
///
/// Road distance and duration between two points, no steps or geometry.
pub async fn distance(
    state: web::Data<AppState>,
    params: web::Query<DistanceQueryParams>,
) -> HttpResponse {
    let mode = match parse_mode(params.mode.as_deref()) {
        Ok(mode) => mode,
        Err(resp) => return resp,
    };
    let origin = Coordinate::new(params.from_lat, params.from_lng);
    let destination = Coordinate::new(params.to_lat, params.to_lng);

    match state.routing.distance(&origin, &destination, mode).await {
        Ok(resp) => HttpResponse::Ok().json(resp),
        Err(e) => error_response(&e),
    }
}

/// `POST /api/directions`
pub async fn directions(
    state: web::Data<AppState>,
    body: web::Json<DirectionsRequest>,
) -> HttpResponse {
    let body = body.into_inner();
    let mode = match parse_mode(body.mode.as_deref()) {
        Ok(mode) => mode,
        Err(resp) => return resp,
    };
    let options = DirectionsOptions {
        include_geometry: body.include_geometry,
        include_steps: body.include_steps,
        alternatives: body.alternatives,
        waypoints: body.waypoints,
    };

    match state
        .routing
        .directions(&body.origin, &body.destination, mode, &options)
        .await
    {
        Ok(resp) => HttpResponse::Ok().json(resp),
        Err(e) => error_response(&e),
    }
}

/// `POST /api/matrix`
pub async fn matrix(state: web::Data<AppState>, body: web::Json<MatrixRequest>) -> HttpResponse {
    let body = body.into_inner();
    let mode = match parse_mode(body.mode.as_deref()) {
        Ok(mode) => mode,
        Err(resp) => return resp,
    };

    match state
        .matrix
        .matrix(&body.origins, &body.destinations, mode)
        .await
    {
        Ok(resp) => HttpResponse::Ok().json(resp),
        Err(e) => error_response(&e),
    }
}

/// `POST /api/eta`
pub async fn eta(state: web::Data<AppState>, body: web::Json<EtaRequest>) -> HttpResponse {
    let body = body.into_inner();
    let mode = match parse_mode(body.mode.as_deref()) {
        Ok(mode) => mode,
        Err(resp) => return resp,
    };

    let result = match body.departure_time {
        Some(departure) => {
            state
                .eta
                .eta_at(&body.origin, &body.destination, mode, departure)
                .await
        }
        None => state.eta.eta(&body.origin, &body.destination, mode).await,
    };

    match result {
        Ok(resp) => HttpResponse::Ok().json(resp),
        Err(e) => error_response(&e),
    }
}

/// `POST /api/snap`
pub async fn snap(state: web::Data<AppState>, body: web::Json<SnapRequest>) -> HttpResponse {
    match state.snap.snap_path(&body.path, body.radius_m).await {
        Ok(resp) => HttpResponse::Ok().json(resp),
        Err(e) => error_response(&e),
    }
}

/// `POST /api/serviceability/check`
///
/// Batch point-in-area check against a polygon or a circle; an invalid
/// point yields `false` rather than failing the batch.
pub async fn serviceability_check(
    state: web::Data<AppState>,
    body: web::Json<ServiceabilityRequest>,
) -> HttpResponse {
    let checked = match (&body.area, &body.center, body.radius_m) {
        (Some(area), None, None) => state.serviceability.check_points(&body.points, area),
        (None, Some(center), Some(radius_m)) => {
            state
                .serviceability
                .check_points_in_radius(&body.points, center, radius_m)
        }
        _ => {
            return HttpResponse::BadRequest().json(ApiError {
                error: "Provide either area or center plus radiusM".to_string(),
            });
        }
    };

    match checked {
        Ok(results) => {
            let serviceable_count = results.iter().filter(|inside| **inside).count();
            HttpResponse::Ok().json(ServiceabilityResponse {
                results,
                serviceable_count,
            })
        }
        Err(e) => error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parsing_defaults_and_rejects() {
        assert_eq!(parse_mode(None).unwrap(), TravelMode::Driving);
        assert_eq!(parse_mode(Some("delivery")).unwrap(), TravelMode::Delivery);
        assert!(parse_mode(Some("rocket")).is_err());
    }
}
