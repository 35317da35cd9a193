//! Forward and reverse geocoding.
//!
//! Wraps the configured [`Geocoder`] backend with validation and a
//! read-through cache. Geocode results are stable, so they get the
//! longest TTL of any operation category.

use std::sync::Arc;

use waypoint_cache::{CacheTtls, TtlCache, key};
use waypoint_models::{Coordinate, NormalizedLocation};
use waypoint_providers::Geocoder;

use crate::{ServiceError, require_valid};

/// Default result limit when the caller's is missing or out of range.
const DEFAULT_LIMIT: usize = 5;

/// Upper bound on the number of results a caller may request.
const MAX_LIMIT: usize = 50;

/// Forward/reverse geocoding service.
pub struct GeocodingService {
    geocoder: Arc<dyn Geocoder>,
    search_cache: TtlCache<Vec<NormalizedLocation>>,
    reverse_cache: TtlCache<Option<NormalizedLocation>>,
    ttls: CacheTtls,
}

impl GeocodingService {
    /// Creates the service around a geocoding backend.
    #[must_use]
    pub fn new(geocoder: Arc<dyn Geocoder>, ttls: CacheTtls) -> Self {
        Self {
            geocoder,
            search_cache: TtlCache::new(),
            reverse_cache: TtlCache::new(),
            ttls,
        }
    }

    /// Repairs an out-of-range limit instead of failing the request.
    fn clamp_limit(limit: Option<usize>) -> usize {
        match limit {
            Some(l) if (1..=MAX_LIMIT).contains(&l) => l,
            _ => DEFAULT_LIMIT,
        }
    }

    /// Forward-geocodes a free-text query, best match first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for an empty query, or an
    /// upstream error class when the backend fails.
    pub async fn search(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<NormalizedLocation>, ServiceError> {
        if query.trim().is_empty() {
            return Err(ServiceError::validation("query must not be empty"));
        }
        let limit = Self::clamp_limit(limit);

        let cache_key = key::geocode(query, limit);
        if let Some(hit) = self.search_cache.get(&cache_key).await {
            log::debug!("geocode cache hit: {cache_key}");
            return Ok(hit);
        }

        let results = self.geocoder.search(query, limit).await?;
        self.search_cache
            .put(cache_key, results.clone(), self.ttls.geocode)
            .await;
        Ok(results)
    }

    /// Reverse-geocodes a coordinate into the closest known address.
    ///
    /// Returns `Ok(None)` when the backend has nothing at that location —
    /// an answer, not an error, and cached like any other.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for an invalid coordinate, or
    /// an upstream error class when the backend fails.
    pub async fn reverse(
        &self,
        coord: &Coordinate,
    ) -> Result<Option<NormalizedLocation>, ServiceError> {
        require_valid(coord, "coordinate")?;

        let cache_key = key::reverse(coord);
        if let Some(hit) = self.reverse_cache.get(&cache_key).await {
            log::debug!("reverse-geocode cache hit: {cache_key}");
            return Ok(hit);
        }

        let result = self.geocoder.reverse(coord).await?;
        self.reverse_cache
            .put(cache_key, result.clone(), self.ttls.geocode)
            .await;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use waypoint_models::{AddressComponents, LocationClassification};
    use waypoint_providers::ProviderError;

    struct FakeGeocoder {
        calls: AtomicUsize,
        fail: bool,
    }

    impl FakeGeocoder {
        fn ok() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }
    }

    fn location(name: &str) -> NormalizedLocation {
        NormalizedLocation {
            place_id: None,
            display_name: name.to_string(),
            coordinate: Coordinate::new(12.9716, 77.5946),
            components: AddressComponents::default(),
            classification: LocationClassification::Other,
            bounding_box: None,
            confidence: 0.8,
        }
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn search(
            &self,
            query: &str,
            _limit: usize,
        ) -> Result<Vec<NormalizedLocation>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ProviderError::Status {
                    status: 503,
                    body: None,
                });
            }
            Ok(vec![location(query)])
        }

        async fn reverse(
            &self,
            _coord: &Coordinate,
        ) -> Result<Option<NormalizedLocation>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(location("reverse")))
        }
    }

    fn service(geocoder: FakeGeocoder) -> (Arc<FakeGeocoder>, GeocodingService) {
        let geocoder = Arc::new(geocoder);
        let svc = GeocodingService::new(geocoder.clone(), CacheTtls::default());
        (geocoder, svc)
    }

    #[tokio::test]
    async fn rejects_empty_query() {
        let (_, svc) = service(FakeGeocoder::ok());
        assert!(matches!(
            svc.search("   ", None).await,
            Err(ServiceError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn clamps_out_of_range_limits() {
        assert_eq!(GeocodingService::clamp_limit(None), 5);
        assert_eq!(GeocodingService::clamp_limit(Some(0)), 5);
        assert_eq!(GeocodingService::clamp_limit(Some(500)), 5);
        assert_eq!(GeocodingService::clamp_limit(Some(10)), 10);
    }

    #[tokio::test]
    async fn caches_search_results() {
        let (geocoder, svc) = service(FakeGeocoder::ok());

        let first = svc.search("mg road", None).await.unwrap();
        let second = svc.search("MG   Road", None).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let (geocoder, svc) = service(FakeGeocoder::failing());

        assert!(svc.search("mg road", None).await.is_err());
        assert!(svc.search("mg road", None).await.is_err());
        // Both calls reached the backend — nothing was cached.
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn rejects_invalid_reverse_coordinate() {
        let (_, svc) = service(FakeGeocoder::ok());
        let bad = Coordinate::new(200.0, 0.0);
        assert!(matches!(
            svc.reverse(&bad).await,
            Err(ServiceError::Validation { .. })
        ));
    }
}
