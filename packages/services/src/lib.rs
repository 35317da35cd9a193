#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Domain services for the waypoint geospatial engine.
//!
//! Each service follows the same linear flow:
//!
//! ```text
//! validate → cache lookup → (hit: return) → provider call
//!          → post-process → cache store → return
//! ```
//!
//! Services hold no mutable instance state, so concurrent invocations are
//! independent. Provider failures surface as typed [`ServiceError`]s —
//! except in [`eta::EtaService`], which falls back to a straight-line
//! quick estimate when the routing backend is unavailable. "No result"
//! outcomes are status values on the responses, never errors. Failed
//! calls are never cached.

pub mod eta;
pub mod geocoding;
pub mod matrix;
pub mod routing;
pub mod serviceability;
pub mod snap;

pub use eta::EtaService;
pub use geocoding::GeocodingService;
pub use matrix::MatrixService;
pub use routing::{DirectionsOptions, RoutingService};
pub use serviceability::ServiceabilityService;
pub use snap::SnapToRoadService;

use thiserror::Error;
use waypoint_providers::ProviderError;

/// Errors surfaced by domain services.
///
/// The variants map 1:1 onto API-boundary signal classes: validation
/// failures are 400s, rate limiting 429, upstream unavailability 503,
/// and anything unanticipated a generic 500 with no internal detail
/// leaked.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Bad or missing input; never retried.
    #[error("Validation error: {message}")]
    Validation {
        /// What was wrong with the input.
        message: String,
    },

    /// A provider was unreachable or failed after bounded retries.
    #[error("Upstream provider unavailable: {0}")]
    Upstream(#[source] ProviderError),

    /// The upstream provider rate-limited us; callers should back off.
    #[error("Rate limited by upstream provider")]
    RateLimited,

    /// Any unanticipated failure.
    #[error("Internal error")]
    Internal {
        /// Logged detail; not exposed at the API boundary.
        message: String,
    },
}

impl ServiceError {
    fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<ProviderError> for ServiceError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::RateLimited => Self::RateLimited,
            ProviderError::Parse { message } => {
                log::error!("provider response parse failure: {message}");
                Self::Internal { message }
            }
            other if other.is_unavailable() => Self::Upstream(other),
            other => {
                log::error!("unexpected provider failure: {other}");
                Self::Internal {
                    message: other.to_string(),
                }
            }
        }
    }
}

/// Validates a coordinate, naming the parameter in the error.
fn require_valid(coord: &waypoint_models::Coordinate, name: &str) -> Result<(), ServiceError> {
    if coord.is_valid() {
        Ok(())
    } else {
        Err(ServiceError::validation(format!(
            "{name} must be a valid coordinate (lat in [-90,90], lng in [-180,180])"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_map_to_service_classes() {
        assert!(matches!(
            ServiceError::from(ProviderError::RateLimited),
            ServiceError::RateLimited
        ));
        assert!(matches!(
            ServiceError::from(ProviderError::Status {
                status: 503,
                body: None
            }),
            ServiceError::Upstream(_)
        ));
        assert!(matches!(
            ServiceError::from(ProviderError::Parse {
                message: "bad".to_string()
            }),
            ServiceError::Internal { .. }
        ));
    }
}
