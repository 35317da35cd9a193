//! Snap-to-road: matching GPS traces to the road network.
//!
//! Thin orchestration over the backend's map-matching capability, plus
//! single-point conveniences (`is_on_road`, `distance_to_road`,
//! `street_name_at`) built on the same path call. Backends without
//! map matching yield a `SERVICE_UNAVAILABLE` response rather than an
//! error, so callers can branch on status uniformly.

use std::sync::Arc;

use waypoint_cache::{CacheTtls, TtlCache, key};
use waypoint_models::{Coordinate, SnapStatus, SnapToRoadResponse, SnappedPoint};
use waypoint_providers::{ProviderError, Router};

use crate::{ServiceError, require_valid};

/// Search radius around each input point when the caller gives none.
const DEFAULT_RADIUS_M: f64 = 25.0;

/// Upper bound on points per request.
const MAX_PATH_POINTS: usize = 100;

/// Snap-to-road service over the active routing backend.
pub struct SnapToRoadService {
    router: Arc<dyn Router>,
    cache: TtlCache<SnapToRoadResponse>,
    ttls: CacheTtls,
}

impl SnapToRoadService {
    /// Creates the service around a routing backend.
    #[must_use]
    pub fn new(router: Arc<dyn Router>, ttls: CacheTtls) -> Self {
        Self {
            router,
            cache: TtlCache::new(),
            ttls,
        }
    }

    /// Matches a GPS path to the road network.
    ///
    /// Output has one entry per input point, in input order; points with
    /// no road within the radius come back unmatched rather than being
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for an empty or oversized
    /// path, an invalid point, or a non-positive radius, or an upstream
    /// error class when the backend fails.
    pub async fn snap_path(
        &self,
        path: &[Coordinate],
        radius_m: Option<f64>,
    ) -> Result<SnapToRoadResponse, ServiceError> {
        if path.is_empty() {
            return Err(ServiceError::validation("path must not be empty"));
        }
        if path.len() > MAX_PATH_POINTS {
            return Err(ServiceError::validation(format!(
                "too many points: {} (max {MAX_PATH_POINTS})",
                path.len()
            )));
        }
        for (i, point) in path.iter().enumerate() {
            require_valid(point, &format!("path[{i}]"))?;
        }
        let radius_m = radius_m.unwrap_or(DEFAULT_RADIUS_M);
        if radius_m <= 0.0 {
            return Err(ServiceError::validation("radius must be positive"));
        }

        if !self.router.supports_snap() {
            log::warn!(
                "routing backend {} has no snap-to-road capability",
                self.router.id()
            );
            return Ok(SnapToRoadResponse::failed(SnapStatus::ServiceUnavailable));
        }

        let cache_key = key::snap(path, radius_m);
        if let Some(hit) = self.cache.get(&cache_key).await {
            log::debug!("snap cache hit: {cache_key}");
            return Ok(hit);
        }

        // Map matching needs at least two coordinates; a single probe
        // point goes out twice and collapses back to one entry below.
        let doubled = [path[0], path[0]];
        let backend_path = if path.len() == 1 { &doubled[..] } else { path };

        let mut response = match self.router.snap(backend_path, radius_m).await {
            Ok(response) => response,
            Err(ProviderError::SnapUnsupported) => {
                SnapToRoadResponse::failed(SnapStatus::ServiceUnavailable)
            }
            Err(err) => return Err(err.into()),
        };
        response.points.truncate(path.len());

        if response.status == SnapStatus::Ok {
            self.cache
                .put(cache_key, response.clone(), self.ttls.snap)
                .await;
        }
        Ok(response)
    }

    /// Matches a single point to the nearest road.
    ///
    /// # Errors
    ///
    /// Same error classes as [`Self::snap_path`].
    pub async fn snap_point(
        &self,
        coord: &Coordinate,
        radius_m: Option<f64>,
    ) -> Result<SnappedPoint, ServiceError> {
        let response = self.snap_path(&[*coord], radius_m).await?;
        Ok(response
            .points
            .into_iter()
            .next()
            .unwrap_or_else(|| SnappedPoint::unmatched(*coord)))
    }

    /// Whether a point lies on (or within the radius of) a road.
    ///
    /// # Errors
    ///
    /// Same error classes as [`Self::snap_path`].
    pub async fn is_on_road(
        &self,
        coord: &Coordinate,
        radius_m: Option<f64>,
    ) -> Result<bool, ServiceError> {
        let point = self.snap_point(coord, radius_m).await?;
        Ok(point.is_snapped)
    }

    /// Distance from a point to the nearest road, in meters. `None` when
    /// no road lies within the search radius.
    ///
    /// # Errors
    ///
    /// Same error classes as [`Self::snap_path`].
    pub async fn distance_to_road(
        &self,
        coord: &Coordinate,
        radius_m: Option<f64>,
    ) -> Result<Option<f64>, ServiceError> {
        let point = self.snap_point(coord, radius_m).await?;
        Ok(point.is_snapped.then_some(point.snap_distance_m))
    }

    /// Name of the road nearest a point, when the backend knows it.
    ///
    /// # Errors
    ///
    /// Same error classes as [`Self::snap_path`].
    pub async fn street_name_at(
        &self,
        coord: &Coordinate,
    ) -> Result<Option<String>, ServiceError> {
        let point = self.snap_point(coord, None).await?;
        Ok(point.street_name)
    }
}
