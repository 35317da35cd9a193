#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the waypoint geospatial engine.
//!
//! Thin request/response mapping over the domain services: handlers
//! parse the wire shapes, delegate to a service, and translate
//! [`ServiceError`](waypoint_services::ServiceError) variants onto HTTP
//! status codes. No domain logic lives here.

pub mod handlers;

use std::sync::Arc;

use waypoint_cache::CacheTtls;
use waypoint_providers::{ProviderError, ProviderRegistry};
use waypoint_services::{
    EtaService, GeocodingService, MatrixService, RoutingService, ServiceabilityService,
    SnapToRoadService,
};

/// Shared application state: one instance of each domain service.
pub struct AppState {
    /// Forward/reverse geocoding.
    pub geocoding: GeocodingService,
    /// Point-to-point directions.
    pub routing: RoutingService,
    /// Distance/duration matrices.
    pub matrix: MatrixService,
    /// Arrival estimation.
    pub eta: EtaService,
    /// GPS trace matching.
    pub snap: SnapToRoadService,
    /// Service-area checks.
    pub serviceability: ServiceabilityService,
}

impl AppState {
    /// Builds all services over the embedded provider registry.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NoBackendEnabled`] when the registry has
    /// no enabled geocoding or routing backend, or an HTTP error if a
    /// client cannot be constructed.
    pub fn from_registry() -> Result<Self, ProviderError> {
        let registry = ProviderRegistry::from_embedded()?;
        let geocoder = registry.geocoder();
        let router = registry.active_router();
        let ttls = CacheTtls::default();

        Ok(Self {
            geocoding: GeocodingService::new(geocoder, ttls),
            routing: RoutingService::new(Arc::clone(&router), ttls),
            matrix: MatrixService::new(Arc::clone(&router), ttls),
            eta: EtaService::new(Arc::clone(&router), ttls),
            snap: SnapToRoadService::new(router, ttls),
            serviceability: ServiceabilityService::new(),
        })
    }
}
