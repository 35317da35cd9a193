//! Point-to-point and multi-waypoint directions.
//!
//! Wraps the active routing backend with validation, a read-through
//! cache, and response post-processing: the backend is always asked for
//! the full route (steps included) so the cached entry can serve any
//! caller, and steps/geometry are stripped or decoded per request
//! afterwards.

use std::sync::Arc;

use waypoint_cache::{CacheTtls, TtlCache, key};
use waypoint_models::{Coordinate, RouteResponse, RouteStatus, TravelMode};
use waypoint_providers::{RouteOptions, Router};

use crate::{ServiceError, require_valid};

/// Caller-facing options for a directions request.
#[derive(Debug, Clone, Default)]
pub struct DirectionsOptions {
    /// Decode the polyline into explicit geometry on the response.
    pub include_geometry: bool,
    /// Include turn-by-turn steps.
    pub include_steps: bool,
    /// Request alternative routes (bypasses the cache).
    pub alternatives: bool,
    /// Intermediate stops, visited in order between origin and
    /// destination. Routed as sequential point-to-point segments — no
    /// joint optimization.
    pub waypoints: Vec<Coordinate>,
}

/// Directions service over the active routing backend.
pub struct RoutingService {
    router: Arc<dyn Router>,
    cache: TtlCache<RouteResponse>,
    ttls: CacheTtls,
}

impl RoutingService {
    /// Creates the service around a routing backend.
    #[must_use]
    pub fn new(router: Arc<dyn Router>, ttls: CacheTtls) -> Self {
        Self {
            router,
            cache: TtlCache::new(),
            ttls,
        }
    }

    /// Computes directions between two points, optionally via waypoints.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for invalid endpoints or
    /// waypoints, or an upstream error class when the backend fails.
    /// "No route" is a status on the response, not an error.
    pub async fn directions(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
        mode: TravelMode,
        options: &DirectionsOptions,
    ) -> Result<RouteResponse, ServiceError> {
        require_valid(origin, "origin")?;
        require_valid(destination, "destination")?;
        for (i, waypoint) in options.waypoints.iter().enumerate() {
            require_valid(waypoint, &format!("waypoint[{i}]"))?;
        }

        let raw = if options.waypoints.is_empty() {
            self.single_leg(origin, destination, mode, options.alternatives)
                .await?
        } else {
            self.multi_leg(origin, destination, mode, &options.waypoints)
                .await?
        };

        Ok(Self::post_process(raw, options))
    }

    /// Distance/duration between two points without steps or geometry.
    ///
    /// # Errors
    ///
    /// Same error classes as [`Self::directions`].
    pub async fn distance(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
        mode: TravelMode,
    ) -> Result<RouteResponse, ServiceError> {
        self.directions(origin, destination, mode, &DirectionsOptions::default())
            .await
    }

    /// Fetches a single leg, read-through cached.
    ///
    /// The backend is asked for steps unconditionally so the cache entry
    /// can serve both step-ful and step-less callers; alternatives vary
    /// the provider response shape, so those requests bypass the cache.
    async fn single_leg(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
        mode: TravelMode,
        alternatives: bool,
    ) -> Result<RouteResponse, ServiceError> {
        let provider_options = RouteOptions {
            include_geometry: false,
            include_steps: true,
            alternatives,
        };

        if alternatives {
            return Ok(self
                .router
                .route(origin, destination, mode, &provider_options)
                .await?);
        }

        let cache_key = key::route(origin, destination, mode);
        if let Some(hit) = self.cache.get(&cache_key).await {
            log::debug!("route cache hit: {cache_key}");
            return Ok(hit);
        }

        let response = self
            .router
            .route(origin, destination, mode, &provider_options)
            .await?;

        if response.status == RouteStatus::Ok {
            self.cache
                .put(cache_key, response.clone(), self.ttls.route)
                .await;
        }
        Ok(response)
    }

    /// Naive multi-waypoint routing: sums sequential point-to-point legs.
    async fn multi_leg(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
        mode: TravelMode,
        waypoints: &[Coordinate],
    ) -> Result<RouteResponse, ServiceError> {
        let mut stops: Vec<Coordinate> = Vec::with_capacity(waypoints.len() + 2);
        stops.push(*origin);
        stops.extend_from_slice(waypoints);
        stops.push(*destination);

        let mut total_distance = 0.0;
        let mut total_duration = 0.0;
        let mut combined_geometry: Vec<Coordinate> = Vec::new();
        let mut combined_steps = Vec::new();

        // Legs are independent; they are issued sequentially because no
        // leg needs a sibling's result.
        for leg in stops.windows(2) {
            let response = self.single_leg(&leg[0], &leg[1], mode, false).await?;
            if response.status != RouteStatus::Ok {
                return Ok(RouteResponse::failed(
                    response.status,
                    *origin,
                    *destination,
                    mode,
                ));
            }

            total_distance += response.distance_m;
            total_duration += response.duration_s;
            combined_steps.extend(response.steps);

            if let Some(polyline) = &response.polyline {
                let mut coords = waypoint_polyline::decode(polyline);
                // Drop the duplicated join point between legs.
                if !combined_geometry.is_empty() && !coords.is_empty() {
                    coords.remove(0);
                }
                combined_geometry.extend(coords);
            }
        }

        let polyline = if combined_geometry.is_empty() {
            None
        } else {
            Some(waypoint_polyline::encode(&combined_geometry))
        };

        Ok(RouteResponse {
            status: RouteStatus::Ok,
            origin: *origin,
            destination: *destination,
            mode,
            distance_m: total_distance,
            duration_s: total_duration,
            distance_text: waypoint_geo::format_distance(total_distance),
            duration_text: waypoint_geo::format_duration(total_duration),
            polyline,
            geometry: None,
            steps: combined_steps,
            alternatives: Vec::new(),
            waypoints: Some(waypoints.to_vec()),
        })
    }

    /// Shapes a raw (cached or fresh) response to the caller's options.
    fn post_process(mut response: RouteResponse, options: &DirectionsOptions) -> RouteResponse {
        if !options.include_steps {
            response.steps = Vec::new();
        }
        if options.include_geometry {
            response.geometry = response
                .polyline
                .as_deref()
                .map(waypoint_polyline::decode);
        } else {
            response.geometry = None;
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use waypoint_models::{MatrixResponse, RouteStep};
    use waypoint_providers::ProviderError;

    struct FakeRouter {
        calls: AtomicUsize,
        status: RouteStatus,
    }

    impl FakeRouter {
        fn ok() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                status: RouteStatus::Ok,
            }
        }

        fn no_route() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                status: RouteStatus::ZeroResults,
            }
        }
    }

    #[async_trait]
    impl Router for FakeRouter {
        fn id(&self) -> &str {
            "fake"
        }

        async fn route(
            &self,
            origin: &Coordinate,
            destination: &Coordinate,
            mode: TravelMode,
            _options: &RouteOptions,
        ) -> Result<RouteResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.status != RouteStatus::Ok {
                return Ok(RouteResponse::failed(
                    self.status,
                    *origin,
                    *destination,
                    mode,
                ));
            }
            Ok(RouteResponse {
                status: RouteStatus::Ok,
                origin: *origin,
                destination: *destination,
                mode,
                distance_m: 1_000.0,
                duration_s: 120.0,
                distance_text: "1.0 km".to_string(),
                duration_text: "2 min".to_string(),
                polyline: Some(waypoint_polyline::encode(&[*origin, *destination])),
                geometry: None,
                steps: vec![RouteStep {
                    instruction: "depart".to_string(),
                    road_name: None,
                    distance_m: 1_000.0,
                    duration_s: 120.0,
                    maneuver: Some("depart".to_string()),
                }],
                alternatives: Vec::new(),
                waypoints: None,
            })
        }

        async fn matrix(
            &self,
            _origins: &[Coordinate],
            _destinations: &[Coordinate],
            _mode: TravelMode,
        ) -> Result<MatrixResponse, ProviderError> {
            unimplemented!("not used in routing tests")
        }
    }

    fn a() -> Coordinate {
        Coordinate::new(12.9716, 77.5946)
    }

    fn b() -> Coordinate {
        Coordinate::new(12.9352, 77.6245)
    }

    fn c() -> Coordinate {
        Coordinate::new(12.9500, 77.6000)
    }

    #[tokio::test]
    async fn rejects_invalid_origin() {
        let svc = RoutingService::new(Arc::new(FakeRouter::ok()), CacheTtls::default());
        let bad = Coordinate::new(100.0, 0.0);
        assert!(matches!(
            svc.directions(&bad, &b(), TravelMode::Driving, &DirectionsOptions::default())
                .await,
            Err(ServiceError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn strips_steps_unless_requested() {
        let svc = RoutingService::new(Arc::new(FakeRouter::ok()), CacheTtls::default());

        let bare = svc
            .directions(&a(), &b(), TravelMode::Driving, &DirectionsOptions::default())
            .await
            .unwrap();
        assert!(bare.steps.is_empty());
        assert!(bare.geometry.is_none());

        let full = svc
            .directions(
                &a(),
                &b(),
                TravelMode::Driving,
                &DirectionsOptions {
                    include_steps: true,
                    include_geometry: true,
                    ..DirectionsOptions::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(full.steps.len(), 1);
        assert!(full.geometry.is_some());
    }

    #[tokio::test]
    async fn caches_repeat_requests() {
        let router = Arc::new(FakeRouter::ok());
        let svc = RoutingService::new(router.clone(), CacheTtls::default());

        svc.distance(&a(), &b(), TravelMode::Driving).await.unwrap();
        svc.distance(&a(), &b(), TravelMode::Driving).await.unwrap();

        assert_eq!(router.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_route_responses_are_not_cached() {
        let router = Arc::new(FakeRouter::no_route());
        let svc = RoutingService::new(router.clone(), CacheTtls::default());

        let resp = svc.distance(&a(), &b(), TravelMode::Driving).await.unwrap();
        assert_eq!(resp.status, RouteStatus::ZeroResults);
        svc.distance(&a(), &b(), TravelMode::Driving).await.unwrap();

        assert_eq!(router.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn sums_waypoint_legs() {
        let router = Arc::new(FakeRouter::ok());
        let svc = RoutingService::new(router.clone(), CacheTtls::default());

        let resp = svc
            .directions(
                &a(),
                &b(),
                TravelMode::Driving,
                &DirectionsOptions {
                    waypoints: vec![c()],
                    ..DirectionsOptions::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(resp.status, RouteStatus::Ok);
        // Two legs of 1 km / 120 s each.
        assert!((resp.distance_m - 2_000.0).abs() < 1e-9);
        assert!((resp.duration_s - 240.0).abs() < 1e-9);
        assert_eq!(resp.waypoints.as_deref(), Some(&[c()][..]));
        assert!(resp.polyline.is_some());
        assert_eq!(router.calls.load(Ordering::SeqCst), 2);
    }
}
