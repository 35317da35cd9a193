#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! External geocoding and routing backend clients.
//!
//! One adapter per backend, each implementing a common capability trait:
//!
//! - [`nominatim`] — Nominatim / OpenStreetMap geocoding (search, reverse).
//! - [`osrm`] — OSRM routing (route, table, map matching).
//! - [`graphhopper`] — GraphHopper routing (route, matrix; no snap).
//!
//! Backends are described by TOML files embedded at compile time and
//! resolved through the [`registry`] — the active routing backend is the
//! lowest-priority-number enabled entry, and exactly one backend serves
//! any given request (a failing call surfaces to the domain service
//! rather than falling through to the next backend).
//!
//! All adapters map "no route found" style outcomes into domain status
//! values instead of errors, so [`ProviderError`] only covers transport,
//! parse, rate-limit, and configuration failures.

pub mod graphhopper;
pub mod nominatim;
pub mod osrm;
pub mod registry;
pub mod retry;

pub use registry::ProviderRegistry;

use async_trait::async_trait;
use thiserror::Error;
use waypoint_models::{
    Coordinate, MatrixResponse, NormalizedLocation, RouteResponse, SnapToRoadResponse, TravelMode,
};

/// Errors from provider calls.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed after all retries.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limit exceeded (HTTP 429 after all retries).
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Non-retryable HTTP status, with the parsed body when available.
    ///
    /// Clients inspect the body before giving up — several backends put
    /// domain outcomes (e.g. OSRM's `NoRoute`) in 4xx responses.
    #[error("HTTP status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Parsed JSON body, when the response carried one.
        body: Option<serde_json::Value>,
    },

    /// The selected routing backend has no snap-to-road capability.
    #[error("Backend does not support snap-to-road")]
    SnapUnsupported,

    /// No routing backend is enabled in the registry.
    #[error("No routing backend enabled")]
    NoBackendEnabled,
}

impl ProviderError {
    /// Returns `true` when the failure is an availability problem
    /// (network, timeout, 5xx) rather than a caller mistake.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        match self {
            Self::Http(_) | Self::NoBackendEnabled => true,
            Self::Status { status, .. } => *status >= 500,
            Self::RateLimited | Self::Parse { .. } | Self::SnapUnsupported => false,
        }
    }
}

/// Options controlling what a directions request asks the backend for.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteOptions {
    /// Decode the route polyline into explicit geometry on the response.
    pub include_geometry: bool,
    /// Request turn-by-turn steps.
    pub include_steps: bool,
    /// Request alternative routes.
    pub alternatives: bool,
}

/// Geocoding backend capability.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Forward-geocodes a free-text query into up to `limit` candidates,
    /// best match first.
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<NormalizedLocation>, ProviderError>;

    /// Reverse-geocodes a coordinate into the closest address, or `None`
    /// when the backend knows nothing about the location.
    async fn reverse(&self, coord: &Coordinate)
        -> Result<Option<NormalizedLocation>, ProviderError>;
}

/// Routing backend capability.
///
/// Snap-to-road is backend-specific; adapters without it keep the default
/// implementations (`supports_snap` false, `snap` erroring).
#[async_trait]
pub trait Router: Send + Sync {
    /// Stable identifier of the backend (registry id).
    fn id(&self) -> &str;

    /// Computes a point-to-point route.
    async fn route(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
        mode: TravelMode,
        options: &RouteOptions,
    ) -> Result<RouteResponse, ProviderError>;

    /// Computes an origins × destinations distance/duration matrix.
    async fn matrix(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
        mode: TravelMode,
    ) -> Result<MatrixResponse, ProviderError>;

    /// Whether this backend can snap GPS traces to the road network.
    fn supports_snap(&self) -> bool {
        false
    }

    /// Matches a GPS path to the road network.
    async fn snap(
        &self,
        path: &[Coordinate],
        radius_m: f64,
    ) -> Result<SnapToRoadResponse, ProviderError> {
        let _ = (path, radius_m);
        Err(ProviderError::SnapUnsupported)
    }
}
