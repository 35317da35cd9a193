//! Compile-time registry of provider backend configurations.
//!
//! Each backend is defined in a TOML file under `services/` and embedded
//! at compile time. Routing backends carry an `enabled` flag and a
//! `priority` — the active router is the lowest-priority-number enabled
//! entry, resolved once per invocation. There is no cross-backend
//! fallback within a single request: a failed call surfaces to the
//! domain service.

use std::sync::Arc;

use serde::Deserialize;

use crate::graphhopper::{GraphHopperClient, GraphHopperConfig};
use crate::nominatim::{NominatimClient, NominatimConfig};
use crate::osrm::{OsrmClient, OsrmConfig};
use crate::{Geocoder, ProviderError, Router};

const fn default_true() -> bool {
    true
}

const fn default_timeout() -> u64 {
    10
}

/// A provider backend configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Unique identifier (e.g. `"osrm"`, `"graphhopper"`, `"nominatim"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether this backend may be selected.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Selection order — lower values win.
    pub priority: u32,
    /// Backend-specific configuration.
    pub provider: ProviderConfig,
}

/// Backend-specific configuration, tagged by `type` in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Nominatim / OpenStreetMap geocoder.
    Nominatim {
        /// API base URL.
        base_url: String,
        /// Minimum delay between requests in milliseconds.
        rate_limit_ms: u64,
        /// Per-request timeout in seconds.
        #[serde(default = "default_timeout")]
        timeout_seconds: u64,
        /// Comma-separated ISO country codes to bias results.
        #[serde(default)]
        country_codes: Option<String>,
        /// `accept-language` value.
        #[serde(default = "default_language")]
        language: String,
    },
    /// OSRM routing engine.
    Osrm {
        /// API base URL.
        base_url: String,
        /// Per-request timeout in seconds.
        #[serde(default = "default_timeout")]
        timeout_seconds: u64,
    },
    /// GraphHopper routing engine.
    Graphhopper {
        /// API base URL.
        base_url: String,
        /// Per-request timeout in seconds.
        #[serde(default = "default_timeout")]
        timeout_seconds: u64,
        /// Environment variable holding the API key, if any.
        #[serde(default)]
        api_key_env: Option<String>,
    },
}

fn default_language() -> String {
    "en".to_string()
}

// ── Compile-time embedded TOML files ────────────────────────────────

const BACKEND_TOMLS: &[(&str, &str)] = &[
    ("nominatim", include_str!("../services/nominatim.toml")),
    ("osrm", include_str!("../services/osrm.toml")),
    ("graphhopper", include_str!("../services/graphhopper.toml")),
];

#[cfg(test)]
const EXPECTED_BACKEND_COUNT: usize = 3;

/// Returns all backend configurations (enabled and disabled).
///
/// # Panics
///
/// Panics if any TOML config is malformed (a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_backends() -> Vec<BackendConfig> {
    BACKEND_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse provider backend '{name}': {e}"))
        })
        .collect()
}

/// Returns only enabled backends, sorted by priority (ascending).
#[must_use]
pub fn enabled_backends() -> Vec<BackendConfig> {
    let mut backends: Vec<BackendConfig> =
        all_backends().into_iter().filter(|b| b.enabled).collect();
    backends.sort_by_key(|b| b.priority);
    backends
}

/// Resolves routing and geocoding clients from the embedded registry.
///
/// Constructed once at startup and shared; selection itself is cheap
/// (the active router is fixed for the process lifetime unless the
/// registry is rebuilt).
pub struct ProviderRegistry {
    geocoder: Arc<dyn Geocoder>,
    routers: Vec<Arc<dyn Router>>,
}

impl ProviderRegistry {
    /// Builds clients for every enabled backend in the embedded registry.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NoBackendEnabled`] when no geocoding or
    /// no routing backend is enabled, or an HTTP error if a client
    /// cannot be constructed.
    pub fn from_embedded() -> Result<Self, ProviderError> {
        let mut geocoder: Option<Arc<dyn Geocoder>> = None;
        let mut routers: Vec<Arc<dyn Router>> = Vec::new();

        for backend in enabled_backends() {
            match backend.provider {
                ProviderConfig::Nominatim {
                    base_url,
                    rate_limit_ms,
                    timeout_seconds,
                    country_codes,
                    language,
                } => {
                    if geocoder.is_none() {
                        log::info!("Using geocoding backend: {}", backend.name);
                        geocoder = Some(Arc::new(NominatimClient::new(NominatimConfig {
                            base_url,
                            rate_limit_ms,
                            timeout_seconds,
                            country_codes,
                            language,
                        })?));
                    }
                }
                ProviderConfig::Osrm {
                    base_url,
                    timeout_seconds,
                } => {
                    log::info!("Routing backend available: {} (priority {})", backend.name, backend.priority);
                    routers.push(Arc::new(OsrmClient::new(OsrmConfig {
                        base_url,
                        timeout_seconds,
                    })?));
                }
                ProviderConfig::Graphhopper {
                    base_url,
                    timeout_seconds,
                    api_key_env,
                } => {
                    log::info!("Routing backend available: {} (priority {})", backend.name, backend.priority);
                    let api_key = api_key_env
                        .as_deref()
                        .and_then(|var| std::env::var(var).ok())
                        .filter(|key| !key.is_empty());
                    routers.push(Arc::new(GraphHopperClient::new(GraphHopperConfig {
                        base_url,
                        timeout_seconds,
                        api_key,
                    })?));
                }
            }
        }

        let geocoder = geocoder.ok_or(ProviderError::NoBackendEnabled)?;
        if routers.is_empty() {
            return Err(ProviderError::NoBackendEnabled);
        }

        Ok(Self { geocoder, routers })
    }

    /// The configured geocoding backend.
    #[must_use]
    pub fn geocoder(&self) -> Arc<dyn Geocoder> {
        Arc::clone(&self.geocoder)
    }

    /// Resolves the active routing backend (highest preference among
    /// enabled).
    #[must_use]
    pub fn active_router(&self) -> Arc<dyn Router> {
        Arc::clone(&self.routers[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_backends() {
        let backends = all_backends();
        assert_eq!(backends.len(), EXPECTED_BACKEND_COUNT);
    }

    #[test]
    fn backend_ids_are_unique() {
        let backends = all_backends();
        let mut seen = BTreeSet::new();
        for backend in &backends {
            assert!(seen.insert(&backend.id), "Duplicate backend ID: {}", backend.id);
        }
    }

    #[test]
    fn enabled_backends_sorted_by_priority() {
        let backends = enabled_backends();
        for window in backends.windows(2) {
            assert!(
                window[0].priority <= window[1].priority,
                "Backends not sorted by priority: {} ({}) > {} ({})",
                window[0].id,
                window[0].priority,
                window[1].id,
                window[1].priority
            );
        }
    }

    #[test]
    fn default_registry_prefers_osrm() {
        let routing: Vec<_> = enabled_backends()
            .into_iter()
            .filter(|b| !matches!(b.provider, ProviderConfig::Nominatim { .. }))
            .collect();
        assert!(!routing.is_empty());
        assert_eq!(routing[0].id, "osrm");
    }
}
