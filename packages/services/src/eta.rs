//! Estimated time of arrival with coarse traffic adjustment.
//!
//! ETAs are route durations widened by a per-mode traffic buffer and a
//! time-of-day multiplier. When the routing backend is unavailable the
//! service degrades to a straight-line quick estimate instead of failing,
//! at a strictly lower reported confidence.

use std::sync::Arc;

use chrono::{DateTime, Timelike, Utc};
use waypoint_cache::{CacheTtls, TtlCache, key};
use waypoint_models::{
    Coordinate, EtaResponse, EtaStatus, RouteStatus, TrafficCondition, TravelMode,
};
use waypoint_providers::{ProviderError, RouteOptions, Router};

use crate::{ServiceError, require_valid};

/// Extra pickup/handover time added to delivery-mode ETAs, in seconds.
const DEFAULT_PICKUP_TIME_S: f64 = 300.0;

/// Detour factor applied to straight-line distance in the fallback path.
const FALLBACK_DETOUR_FACTOR: f64 = 1.4;

/// Confidence reported for route-based estimates.
const ROUTE_CONFIDENCE: f64 = 0.85;

/// Confidence reported for straight-line fallback estimates.
const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Optimistic bound factor applied to the unadjusted duration.
const ETA_MIN_FACTOR: f64 = 0.9;

/// Pessimistic bound factor applied to the traffic-adjusted duration.
const ETA_MAX_FACTOR: f64 = 1.2;

/// ETA service over the active routing backend.
pub struct EtaService {
    router: Arc<dyn Router>,
    cache: TtlCache<EtaResponse>,
    ttls: CacheTtls,
    pickup_time_s: f64,
}

impl EtaService {
    /// Creates the service with the default delivery pickup time.
    #[must_use]
    pub fn new(router: Arc<dyn Router>, ttls: CacheTtls) -> Self {
        Self {
            router,
            cache: TtlCache::new(),
            ttls,
            pickup_time_s: DEFAULT_PICKUP_TIME_S,
        }
    }

    /// Overrides the pickup time added to delivery-mode estimates.
    #[must_use]
    pub const fn with_pickup_time(mut self, pickup_time_s: f64) -> Self {
        self.pickup_time_s = pickup_time_s;
        self
    }

    /// Estimates arrival for a departure now.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for invalid endpoints. Backend
    /// unavailability does not error — it triggers the straight-line
    /// fallback.
    pub async fn eta(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
        mode: TravelMode,
    ) -> Result<EtaResponse, ServiceError> {
        require_valid(origin, "origin")?;
        require_valid(destination, "destination")?;

        let cache_key = key::eta(origin, destination, mode);
        if let Some(hit) = self.cache.get(&cache_key).await {
            log::debug!("eta cache hit: {cache_key}");
            return Ok(Self::reanchor(hit, Utc::now()));
        }

        let response = self
            .compute(origin, destination, mode, Utc::now())
            .await?;
        if response.status == EtaStatus::Ok && response.confidence >= ROUTE_CONFIDENCE {
            self.cache
                .put(cache_key, response.clone(), self.ttls.eta)
                .await;
        }
        Ok(response)
    }

    /// Estimates arrival for an explicit future departure.
    ///
    /// Departure-specific estimates bypass the cache — the traffic window
    /// depends on the requested hour, not the current one.
    ///
    /// # Errors
    ///
    /// Same error classes as [`Self::eta`].
    pub async fn eta_at(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
        mode: TravelMode,
        departure: DateTime<Utc>,
    ) -> Result<EtaResponse, ServiceError> {
        require_valid(origin, "origin")?;
        require_valid(destination, "destination")?;
        self.compute(origin, destination, mode, departure).await
    }

    /// Straight-line estimate: Haversine distance widened by a detour
    /// factor, divided by the mode's average speed. Used directly by
    /// callers that prefer speed over accuracy, and as the fallback when
    /// routing is down.
    #[must_use]
    pub fn quick_estimate(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
        mode: TravelMode,
        departure: DateTime<Utc>,
    ) -> EtaResponse {
        let distance = waypoint_geo::distance(origin, destination) * FALLBACK_DETOUR_FACTOR;
        let base = distance / mode.average_speed_ms();
        self.build(
            *origin,
            *destination,
            mode,
            base,
            departure,
            FALLBACK_CONFIDENCE,
        )
    }

    async fn compute(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
        mode: TravelMode,
        departure: DateTime<Utc>,
    ) -> Result<EtaResponse, ServiceError> {
        let options = RouteOptions::default();
        match self.router.route(origin, destination, mode, &options).await {
            Ok(route) if route.status == RouteStatus::Ok => Ok(self.build(
                *origin,
                *destination,
                mode,
                route.duration_s,
                departure,
                ROUTE_CONFIDENCE,
            )),
            Ok(route) => Ok(Self::not_ok(
                route_status_to_eta(route.status),
                *origin,
                *destination,
                mode,
                departure,
            )),
            Err(err) if is_fallback_worthy(&err) => {
                log::warn!("routing backend unavailable, using straight-line eta: {err}");
                Ok(self.quick_estimate(origin, destination, mode, departure))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Assembles a response from a base (unadjusted) duration.
    #[allow(clippy::cast_possible_truncation)]
    fn build(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        mode: TravelMode,
        base_duration_s: f64,
        departure: DateTime<Utc>,
        confidence: f64,
    ) -> EtaResponse {
        let traffic = classify_traffic(&departure);
        let mut adjusted =
            base_duration_s * mode.traffic_buffer() * traffic_multiplier(traffic);

        let pickup_time_s = if mode == TravelMode::Delivery {
            adjusted += self.pickup_time_s;
            Some(self.pickup_time_s)
        } else {
            None
        };

        EtaResponse {
            status: EtaStatus::Ok,
            origin,
            destination,
            mode,
            duration_s: adjusted,
            eta_min_s: base_duration_s * ETA_MIN_FACTOR,
            eta_max_s: adjusted * ETA_MAX_FACTOR,
            departure_time: departure,
            estimated_arrival: departure + chrono::Duration::seconds(adjusted as i64),
            traffic,
            confidence,
            pickup_time_s,
        }
    }

    fn not_ok(
        status: EtaStatus,
        origin: Coordinate,
        destination: Coordinate,
        mode: TravelMode,
        departure: DateTime<Utc>,
    ) -> EtaResponse {
        EtaResponse {
            status,
            origin,
            destination,
            mode,
            duration_s: 0.0,
            eta_min_s: 0.0,
            eta_max_s: 0.0,
            departure_time: departure,
            estimated_arrival: departure,
            traffic: classify_traffic(&departure),
            confidence: 0.0,
            pickup_time_s: None,
        }
    }

    /// Re-bases a cached estimate's clock fields on the current time.
    #[allow(clippy::cast_possible_truncation)]
    fn reanchor(mut response: EtaResponse, now: DateTime<Utc>) -> EtaResponse {
        response.departure_time = now;
        response.estimated_arrival = now + chrono::Duration::seconds(response.duration_s as i64);
        response
    }
}

/// Classifies traffic from the departure hour (UTC).
///
/// Peak windows 08:00–10:59 and 17:00–20:59 are heavy; the shoulders
/// around them are moderate; everything else is light.
fn classify_traffic(departure: &DateTime<Utc>) -> TrafficCondition {
    match departure.hour() {
        8..=10 | 17..=20 => TrafficCondition::Heavy,
        7 | 11..=16 | 21 => TrafficCondition::Moderate,
        _ => TrafficCondition::Light,
    }
}

const fn traffic_multiplier(traffic: TrafficCondition) -> f64 {
    match traffic {
        TrafficCondition::Light => 1.0,
        TrafficCondition::Moderate => 1.2,
        TrafficCondition::Heavy => 1.5,
    }
}

const fn route_status_to_eta(status: RouteStatus) -> EtaStatus {
    match status {
        RouteStatus::ZeroResults | RouteStatus::NotFound | RouteStatus::TooFar => {
            EtaStatus::ZeroResults
        }
        RouteStatus::InvalidRequest => EtaStatus::InvalidRequest,
        RouteStatus::ServiceUnavailable | RouteStatus::OverQueryLimit => {
            EtaStatus::ServiceUnavailable
        }
        RouteStatus::Ok | RouteStatus::UnknownError => EtaStatus::UnknownError,
    }
}

/// Unavailability and rate limiting degrade to the fallback; everything
/// else (parse failures, hard rejections) propagates.
fn is_fallback_worthy(err: &ProviderError) -> bool {
    matches!(err, ProviderError::RateLimited) || err.is_unavailable()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use waypoint_models::{MatrixResponse, RouteResponse};

    struct FakeRouter {
        duration_s: f64,
        unavailable: bool,
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
            if self.unavailable {
                return Err(ProviderError::Status {
                    status: 503,
                    body: None,
                });
            }
            Ok(RouteResponse {
                duration_s: self.duration_s,
                distance_m: self.duration_s * 10.0,
                ..RouteResponse::failed(RouteStatus::Ok, *origin, *destination, mode)
            })
        }

        async fn matrix(
            &self,
            _origins: &[Coordinate],
            _destinations: &[Coordinate],
            _mode: TravelMode,
        ) -> Result<MatrixResponse, ProviderError> {
            unimplemented!("not used in eta tests")
        }
    }

    fn service(duration_s: f64) -> EtaService {
        EtaService::new(
            Arc::new(FakeRouter {
                duration_s,
                unavailable: false,
            }),
            CacheTtls::default(),
        )
    }

    fn down_service() -> EtaService {
        EtaService::new(
            Arc::new(FakeRouter {
                duration_s: 0.0,
                unavailable: true,
            }),
            CacheTtls::default(),
        )
    }

    fn a() -> Coordinate {
        Coordinate::new(12.9716, 77.5946)
    }

    fn b() -> Coordinate {
        Coordinate::new(12.9352, 77.6245)
    }

    fn at_hour(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, hour, 30, 0).unwrap()
    }

    #[tokio::test]
    async fn off_peak_driving_applies_mode_buffer_only() {
        let svc = service(600.0);
        let resp = svc
            .eta_at(&a(), &b(), TravelMode::Driving, at_hour(3))
            .await
            .unwrap();

        assert_eq!(resp.status, EtaStatus::Ok);
        assert_eq!(resp.traffic, TrafficCondition::Light);
        // 600 s × 1.2 driving buffer × 1.0 light traffic.
        assert!((resp.duration_s - 720.0).abs() < 1e-9);
        assert!((resp.eta_min_s - 540.0).abs() < 1e-9);
        assert!((resp.eta_max_s - 864.0).abs() < 1e-9);
        assert!((resp.confidence - 0.85).abs() < 1e-9);
        assert_eq!(resp.pickup_time_s, None);
    }

    #[tokio::test]
    async fn peak_hours_are_heavy() {
        let svc = service(600.0);
        let morning = svc
            .eta_at(&a(), &b(), TravelMode::Driving, at_hour(9))
            .await
            .unwrap();
        assert_eq!(morning.traffic, TrafficCondition::Heavy);
        // 600 × 1.2 × 1.5.
        assert!((morning.duration_s - 1_080.0).abs() < 1e-9);

        let evening = svc
            .eta_at(&a(), &b(), TravelMode::Driving, at_hour(18))
            .await
            .unwrap();
        assert_eq!(evening.traffic, TrafficCondition::Heavy);
    }

    #[tokio::test]
    async fn shoulder_hours_are_moderate() {
        let svc = service(600.0);
        for hour in [7, 13, 21] {
            let resp = svc
                .eta_at(&a(), &b(), TravelMode::Driving, at_hour(hour))
                .await
                .unwrap();
            assert_eq!(resp.traffic, TrafficCondition::Moderate, "hour {hour}");
        }
    }

    #[tokio::test]
    async fn delivery_mode_adds_pickup_time() {
        let svc = service(600.0);
        let resp = svc
            .eta_at(&a(), &b(), TravelMode::Delivery, at_hour(3))
            .await
            .unwrap();

        // 600 × 1.3 delivery buffer × 1.0 + 300 s pickup.
        assert!((resp.duration_s - 1_080.0).abs() < 1e-9);
        assert_eq!(resp.pickup_time_s, Some(300.0));
    }

    #[tokio::test]
    async fn walking_buffer_is_neutral() {
        let svc = service(600.0);
        let resp = svc
            .eta_at(&a(), &b(), TravelMode::Walking, at_hour(9))
            .await
            .unwrap();
        // Walking buffer is 1.0; only the heavy multiplier applies:
        // 600 × 1.0 × 1.5.
        assert!((resp.duration_s - 900.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn backend_outage_falls_back_with_lower_confidence() {
        let routed = service(600.0)
            .eta_at(&a(), &b(), TravelMode::Driving, at_hour(3))
            .await
            .unwrap();
        let fallback = down_service()
            .eta_at(&a(), &b(), TravelMode::Driving, at_hour(3))
            .await
            .unwrap();

        assert_eq!(fallback.status, EtaStatus::Ok);
        assert!(fallback.confidence < routed.confidence);
        assert!(fallback.duration_s > 0.0);
    }

    #[tokio::test]
    async fn arrival_is_departure_plus_duration() {
        let svc = service(600.0);
        let departure = at_hour(3);
        let resp = svc
            .eta_at(&a(), &b(), TravelMode::Driving, departure)
            .await
            .unwrap();
        let elapsed = (resp.estimated_arrival - resp.departure_time).num_seconds();
        assert_eq!(elapsed, 720);
    }

    #[tokio::test]
    async fn rejects_invalid_coordinates() {
        let svc = service(600.0);
        let bad = Coordinate::new(91.0, 0.0);
        assert!(matches!(
            svc.eta(&bad, &b(), TravelMode::Driving).await,
            Err(ServiceError::Validation { .. })
        ));
    }
}
