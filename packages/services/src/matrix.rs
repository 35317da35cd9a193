//! Distance/duration matrices and closest-destination queries.
//!
//! Validates list sizes against configured maxima before anything leaves
//! the process — matrix requests are the most expensive thing we can do
//! to a routing backend — and derives the formatted-text and per-element
//! status matrices from the numeric ones after the call.

use std::sync::Arc;

use waypoint_cache::{CacheTtls, TtlCache, key};
use waypoint_models::{
    Coordinate, MatrixElementStatus, MatrixResponse, MatrixStatus, TravelMode,
};
use waypoint_providers::Router;

use crate::{ServiceError, require_valid};

/// Default ceiling on origins and destinations per request.
const DEFAULT_MAX_DIMENSION: usize = 50;

/// Matrix service over the active routing backend.
pub struct MatrixService {
    router: Arc<dyn Router>,
    cache: TtlCache<MatrixResponse>,
    ttls: CacheTtls,
    max_origins: usize,
    max_destinations: usize,
}

impl MatrixService {
    /// Creates the service with the default 50×50 size ceiling.
    #[must_use]
    pub fn new(router: Arc<dyn Router>, ttls: CacheTtls) -> Self {
        Self::with_limits(router, ttls, DEFAULT_MAX_DIMENSION, DEFAULT_MAX_DIMENSION)
    }

    /// Creates the service with explicit size ceilings.
    #[must_use]
    pub fn with_limits(
        router: Arc<dyn Router>,
        ttls: CacheTtls,
        max_origins: usize,
        max_destinations: usize,
    ) -> Self {
        Self {
            router,
            cache: TtlCache::new(),
            ttls,
            max_origins,
            max_destinations,
        }
    }

    /// Computes an origins × destinations matrix.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for empty or oversized lists
    /// or any invalid element, or an upstream error class when the
    /// backend fails.
    pub async fn matrix(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
        mode: TravelMode,
    ) -> Result<MatrixResponse, ServiceError> {
        self.validate(origins, destinations)?;

        let cache_key = key::matrix(origins, destinations, mode);
        if let Some(hit) = self.cache.get(&cache_key).await {
            log::debug!("matrix cache hit: {cache_key}");
            return Ok(hit);
        }

        let mut response = self.router.matrix(origins, destinations, mode).await?;
        if response.status == MatrixStatus::Ok {
            derive_display_matrices(&mut response);
            self.cache
                .put(cache_key, response.clone(), self.ttls.matrix)
                .await;
        }
        Ok(response)
    }

    /// Index of the destination with the smallest distance from `origin`,
    /// first-seen on ties. `None` when no destination is routable.
    ///
    /// # Errors
    ///
    /// Same error classes as [`Self::matrix`].
    pub async fn closest_destination(
        &self,
        origin: &Coordinate,
        destinations: &[Coordinate],
        mode: TravelMode,
    ) -> Result<Option<usize>, ServiceError> {
        let response = self.matrix(&[*origin], destinations, mode).await?;
        Ok(argmin_row(response.distances_m.first()))
    }

    /// Index of the destination with the smallest duration from `origin`,
    /// first-seen on ties. `None` when no destination is routable.
    ///
    /// # Errors
    ///
    /// Same error classes as [`Self::matrix`].
    pub async fn fastest_destination(
        &self,
        origin: &Coordinate,
        destinations: &[Coordinate],
        mode: TravelMode,
    ) -> Result<Option<usize>, ServiceError> {
        let response = self.matrix(&[*origin], destinations, mode).await?;
        Ok(argmin_row(response.durations_s.first()))
    }

    fn validate(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<(), ServiceError> {
        if origins.is_empty() || destinations.is_empty() {
            return Err(ServiceError::validation(
                "origins and destinations must not be empty",
            ));
        }
        if origins.len() > self.max_origins {
            return Err(ServiceError::validation(format!(
                "too many origins: {} (max {})",
                origins.len(),
                self.max_origins
            )));
        }
        if destinations.len() > self.max_destinations {
            return Err(ServiceError::validation(format!(
                "too many destinations: {} (max {})",
                destinations.len(),
                self.max_destinations
            )));
        }
        for (i, origin) in origins.iter().enumerate() {
            require_valid(origin, &format!("origins[{i}]"))?;
        }
        for (i, destination) in destinations.iter().enumerate() {
            require_valid(destination, &format!("destinations[{i}]"))?;
        }
        Ok(())
    }
}

/// Fills in the formatted-text and per-element status matrices from the
/// numeric ones.
fn derive_display_matrices(response: &mut MatrixResponse) {
    response.distance_texts = response
        .distances_m
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| cell.map(waypoint_geo::format_distance).unwrap_or_default())
                .collect()
        })
        .collect();

    response.duration_texts = response
        .durations_s
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| cell.map(waypoint_geo::format_duration).unwrap_or_default())
                .collect()
        })
        .collect();

    response.element_statuses = response
        .distances_m
        .iter()
        .zip(&response.durations_s)
        .map(|(d_row, t_row)| {
            d_row
                .iter()
                .zip(t_row)
                .map(|(d, t)| {
                    if d.is_some() && t.is_some() {
                        MatrixElementStatus::Ok
                    } else {
                        MatrixElementStatus::NoRoute
                    }
                })
                .collect()
        })
        .collect();
}

/// Index of the smallest known cell in a row, first-seen on ties.
fn argmin_row(row: Option<&Vec<Option<f64>>>) -> Option<usize> {
    let row = row?;
    let mut best: Option<(usize, f64)> = None;
    for (i, cell) in row.iter().enumerate() {
        if let Some(value) = cell {
            match best {
                Some((_, current)) if *value >= current => {}
                _ => best = Some((i, *value)),
            }
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use waypoint_models::RouteResponse;
    use waypoint_providers::{ProviderError, RouteOptions};

    struct FakeMatrixRouter {
        distances: Vec<Vec<Option<f64>>>,
        durations: Vec<Vec<Option<f64>>>,
    }

    #[async_trait]
    impl Router for FakeMatrixRouter {
        fn id(&self) -> &str {
            "fake"
        }

        async fn route(
            &self,
            _origin: &Coordinate,
            _destination: &Coordinate,
            _mode: TravelMode,
            _options: &RouteOptions,
        ) -> Result<RouteResponse, ProviderError> {
            unimplemented!("not used in matrix tests")
        }

        async fn matrix(
            &self,
            origins: &[Coordinate],
            destinations: &[Coordinate],
            mode: TravelMode,
        ) -> Result<MatrixResponse, ProviderError> {
            Ok(MatrixResponse {
                status: MatrixStatus::Ok,
                origins: origins.to_vec(),
                destinations: destinations.to_vec(),
                mode,
                distances_m: self.distances.clone(),
                durations_s: self.durations.clone(),
                distance_texts: Vec::new(),
                duration_texts: Vec::new(),
                element_statuses: Vec::new(),
            })
        }
    }

    fn coords(n: usize) -> Vec<Coordinate> {
        (0..n)
            .map(|i| {
                let offset = f64::from(u32::try_from(i).unwrap()) * 0.01;
                Coordinate::new(12.9 + offset, 77.5 + offset)
            })
            .collect()
    }

    fn service(distances: Vec<Vec<Option<f64>>>, durations: Vec<Vec<Option<f64>>>) -> MatrixService {
        MatrixService::new(
            Arc::new(FakeMatrixRouter {
                distances,
                durations,
            }),
            CacheTtls::default(),
        )
    }

    #[tokio::test]
    async fn matrix_shape_matches_inputs() {
        let svc = service(
            vec![vec![Some(1.0), Some(2.0)], vec![Some(3.0), Some(4.0)]],
            vec![vec![Some(10.0), Some(20.0)], vec![Some(30.0), Some(40.0)]],
        );
        let origins = coords(2);
        let destinations = coords(2);

        let resp = svc
            .matrix(&origins, &destinations, TravelMode::Driving)
            .await
            .unwrap();
        assert_eq!(resp.status, MatrixStatus::Ok);
        assert_eq!(resp.distances_m.len(), 2);
        assert_eq!(resp.distances_m[0].len(), 2);
        assert_eq!(resp.durations_s.len(), 2);
        assert_eq!(resp.element_statuses[1][1], MatrixElementStatus::Ok);
        assert_eq!(resp.distance_texts[0][1], "2 m");
    }

    #[tokio::test]
    async fn rejects_oversized_requests() {
        let svc = service(vec![], vec![]);
        let too_many = coords(51);
        let one = coords(1);

        assert!(matches!(
            svc.matrix(&too_many, &one, TravelMode::Driving).await,
            Err(ServiceError::Validation { .. })
        ));
        assert!(matches!(
            svc.matrix(&one, &too_many, TravelMode::Driving).await,
            Err(ServiceError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn rejects_invalid_elements() {
        let svc = service(vec![], vec![]);
        let origins = vec![Coordinate::new(99.0, 0.0)];
        let destinations = coords(1);

        assert!(matches!(
            svc.matrix(&origins, &destinations, TravelMode::Driving).await,
            Err(ServiceError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_cells_get_no_route_status() {
        let svc = service(
            vec![vec![Some(1.0), None]],
            vec![vec![Some(10.0), None]],
        );
        let resp = svc
            .matrix(&coords(1), &coords(2), TravelMode::Driving)
            .await
            .unwrap();
        assert_eq!(resp.element_statuses[0][0], MatrixElementStatus::Ok);
        assert_eq!(resp.element_statuses[0][1], MatrixElementStatus::NoRoute);
        assert_eq!(resp.distance_texts[0][1], "");
    }

    #[tokio::test]
    async fn closest_and_fastest_use_first_seen_tie_break() {
        let svc = service(
            vec![vec![Some(5.0), Some(2.0), Some(2.0)]],
            vec![vec![Some(9.0), Some(9.0), Some(1.0)]],
        );
        let origin = coords(1)[0];
        let destinations = coords(3);

        let closest = svc
            .closest_destination(&origin, &destinations, TravelMode::Driving)
            .await
            .unwrap();
        assert_eq!(closest, Some(1));

        let fastest = svc
            .fastest_destination(&origin, &destinations, TravelMode::Driving)
            .await
            .unwrap();
        assert_eq!(fastest, Some(2));
    }

    #[tokio::test]
    async fn all_unroutable_yields_none() {
        let svc = service(vec![vec![None, None]], vec![vec![None, None]]);
        let closest = svc
            .closest_destination(&coords(1)[0], &coords(2), TravelMode::Driving)
            .await
            .unwrap();
        assert_eq!(closest, None);
    }
}
