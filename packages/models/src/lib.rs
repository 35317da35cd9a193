#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Domain value types for the waypoint geospatial engine.
//!
//! These are provider-agnostic: clients for Nominatim, OSRM, GraphHopper
//! etc. all normalize their responses into the types defined here before
//! anything downstream sees them. Everything is immutable-by-convention —
//! responses are built once by a domain service and never patched.

pub mod response;

pub use response::{
    AlternativeRoute, EtaResponse, EtaStatus, MatrixElementStatus, MatrixResponse, MatrixStatus,
    RouteResponse, RouteStatus, RouteStep, SnapStatus, SnapToRoadResponse, SnappedPoint,
    TrafficCondition,
};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A WGS84 coordinate pair.
///
/// Serialized as `{lat, lng}` on every API surface. An invalid coordinate
/// (out-of-range or non-finite) must never reach a provider call; services
/// gate on [`Coordinate::is_valid`] before dispatching.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, `[-90, 90]`.
    #[serde(rename = "lat")]
    pub latitude: f64,
    /// Longitude in degrees, `[-180, 180]`.
    #[serde(rename = "lng")]
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate without validating it.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns `true` if both components are finite and within WGS84 range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A geographic bounding box (south/west/north/east edges, degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    /// Southern latitude edge.
    pub south: f64,
    /// Western longitude edge.
    pub west: f64,
    /// Northern latitude edge.
    pub north: f64,
    /// Eastern longitude edge.
    pub east: f64,
}

impl BoundingBox {
    /// Returns `true` if the coordinate lies within the box (inclusive).
    #[must_use]
    pub fn contains(&self, point: &Coordinate) -> bool {
        point.latitude >= self.south
            && point.latitude <= self.north
            && point.longitude >= self.west
            && point.longitude <= self.east
    }
}

/// Structured address components of a normalized location.
///
/// All fields are optional — geocoders return whatever granularity they
/// have for the match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressComponents {
    /// House or building number.
    pub house_number: Option<String>,
    /// Street / road name.
    pub street: Option<String>,
    /// Neighbourhood or suburb.
    pub locality: Option<String>,
    /// City, town, or village.
    pub city: Option<String>,
    /// District / county.
    pub district: Option<String>,
    /// State or province.
    pub state: Option<String>,
    /// Postal code.
    pub postal_code: Option<String>,
    /// Country name.
    pub country: Option<String>,
    /// ISO 3166-1 alpha-2 country code, lowercase.
    pub country_code: Option<String>,
}

/// Category of a geocoded place, derived from provider class/type tags.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LocationClassification {
    /// Houses, apartment buildings, residential areas.
    Residential,
    /// Shops, offices, commercial buildings.
    Commercial,
    /// Roads and highways.
    Road,
    /// Bus stops, railway stations, airports.
    Transit,
    /// Restaurants, hospitals, schools, and other amenities.
    Amenity,
    /// Named landmarks and tourist attractions.
    Landmark,
    /// Administrative areas (cities, districts, states).
    Area,
    /// Anything else.
    #[default]
    Other,
}

/// A provider-agnostic geocoded address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedLocation {
    /// Provider place identifier (opaque).
    pub place_id: Option<String>,
    /// Formatted display name (e.g. full address line).
    pub display_name: String,
    /// Resolved coordinate.
    pub coordinate: Coordinate,
    /// Structured address components.
    pub components: AddressComponents,
    /// Place category.
    pub classification: LocationClassification,
    /// Bounding box of the matched feature, when the provider supplies one.
    pub bounding_box: Option<BoundingBox>,
    /// Match confidence in `[0, 1]`.
    pub confidence: f64,
}

/// Travel mode for routing, matrix, ETA, and snap operations.
///
/// Each mode carries the profile name used by each routing backend, a
/// nominal average speed for provider-independent estimation, and a
/// traffic-buffer multiplier applied on top of raw route durations.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TravelMode {
    /// Private car.
    #[default]
    Driving,
    /// On foot.
    Walking,
    /// Bicycle.
    Bike,
    /// Two-wheeler delivery rider (slower than a car, buffered for stops).
    Delivery,
}

impl TravelMode {
    /// OSRM profile segment for this mode.
    #[must_use]
    pub const fn osrm_profile(self) -> &'static str {
        match self {
            Self::Driving | Self::Delivery => "driving",
            Self::Walking => "walking",
            Self::Bike => "cycling",
        }
    }

    /// GraphHopper profile name for this mode.
    #[must_use]
    pub const fn graphhopper_profile(self) -> &'static str {
        match self {
            Self::Driving => "car",
            Self::Walking => "foot",
            Self::Bike => "bike",
            Self::Delivery => "scooter",
        }
    }

    /// Nominal average speed in m/s, used for quick straight-line estimates.
    #[must_use]
    pub const fn average_speed_ms(self) -> f64 {
        match self {
            Self::Driving => 11.1, // ~40 km/h urban
            Self::Walking => 1.4,
            Self::Bike => 4.2,
            Self::Delivery => 8.3, // ~30 km/h two-wheeler
        }
    }

    /// Traffic-buffer multiplier applied to raw route durations.
    #[must_use]
    pub const fn traffic_buffer(self) -> f64 {
        match self {
            Self::Driving => 1.2,
            Self::Walking => 1.0,
            Self::Bike => 1.1,
            Self::Delivery => 1.3,
        }
    }
}
