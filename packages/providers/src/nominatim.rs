//! Nominatim / OpenStreetMap geocoder client.
//!
//! Implements the [`Geocoder`] capability over the `jsonv2` search and
//! reverse endpoints. Nominatim's public instance has strict usage
//! limits: **1 request per second** maximum, enforced here by an
//! inter-request throttle so no caller can exceed it by accident.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use waypoint_models::{
    AddressComponents, BoundingBox, Coordinate, LocationClassification, NormalizedLocation,
};

use crate::{Geocoder, ProviderError, retry};

/// Nominatim client configuration.
#[derive(Debug, Clone)]
pub struct NominatimConfig {
    /// API base URL (e.g. `https://nominatim.openstreetmap.org`).
    pub base_url: String,
    /// Minimum delay between requests in milliseconds.
    pub rate_limit_ms: u64,
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
    /// Comma-separated ISO country codes to bias results, if any.
    pub country_codes: Option<String>,
    /// `accept-language` value sent with every request.
    pub language: String,
}

/// Nominatim geocoding client.
pub struct NominatimClient {
    client: reqwest::Client,
    config: NominatimConfig,
    last_request: Mutex<Option<Instant>>,
}

impl NominatimClient {
    /// Builds a client with its own connection pool and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: NominatimConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("waypoint/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            config,
            last_request: Mutex::new(None),
        })
    }

    /// Blocks until the configured inter-request interval has elapsed.
    async fn throttle(&self) {
        let interval = Duration::from_millis(self.config.rate_limit_ms);
        let mut last = self.last_request.lock().await;

        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < interval {
                tokio::time::sleep(interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<NormalizedLocation>, ProviderError> {
        self.throttle().await;

        let url = format!("{}/search", self.config.base_url);
        let limit_str = limit.to_string();

        let body = retry::send_json(|| {
            let mut req = self.client.get(&url).query(&[
                ("q", query),
                ("format", "jsonv2"),
                ("addressdetails", "1"),
                ("limit", limit_str.as_str()),
                ("accept-language", self.config.language.as_str()),
            ]);
            if let Some(codes) = &self.config.country_codes {
                req = req.query(&[("countrycodes", codes.as_str())]);
            }
            req
        })
        .await?;

        let results = body.as_array().ok_or_else(|| ProviderError::Parse {
            message: "Nominatim search response is not an array".to_string(),
        })?;

        Ok(results.iter().filter_map(parse_place).collect())
    }

    async fn reverse(
        &self,
        coord: &Coordinate,
    ) -> Result<Option<NormalizedLocation>, ProviderError> {
        self.throttle().await;

        let url = format!("{}/reverse", self.config.base_url);
        let lat = coord.latitude.to_string();
        let lon = coord.longitude.to_string();

        let body = retry::send_json(|| {
            self.client.get(&url).query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("format", "jsonv2"),
                ("addressdetails", "1"),
                ("zoom", "18"),
                ("accept-language", self.config.language.as_str()),
            ])
        })
        .await?;

        // Nominatim reports "nothing here" as {"error": "Unable to geocode"}.
        if body.get("error").is_some() {
            return Ok(None);
        }

        Ok(parse_place(&body))
    }
}

/// Parses a single Nominatim place object into a [`NormalizedLocation`].
///
/// Returns `None` when the object lacks usable coordinates.
fn parse_place(place: &serde_json::Value) -> Option<NormalizedLocation> {
    let lat = number_field(place, "lat")?;
    let lng = number_field(place, "lon")?;
    let coordinate = Coordinate::new(lat, lng);
    if !coordinate.is_valid() {
        return None;
    }

    let address = &place["address"];
    let components = AddressComponents {
        house_number: string_field(address, "house_number"),
        street: string_field(address, "road"),
        locality: string_field(address, "neighbourhood").or_else(|| string_field(address, "suburb")),
        city: string_field(address, "city")
            .or_else(|| string_field(address, "town"))
            .or_else(|| string_field(address, "village")),
        district: string_field(address, "state_district")
            .or_else(|| string_field(address, "county")),
        state: string_field(address, "state"),
        postal_code: string_field(address, "postcode"),
        country: string_field(address, "country"),
        country_code: string_field(address, "country_code"),
    };

    let confidence = place["importance"]
        .as_f64()
        .map_or(0.5, |v| v.clamp(0.0, 1.0));

    Some(NormalizedLocation {
        place_id: place["place_id"]
            .as_i64()
            .map(|v| v.to_string())
            .or_else(|| string_field(place, "place_id")),
        display_name: string_field(place, "display_name").unwrap_or_default(),
        coordinate,
        components,
        classification: classify(
            place["class"].as_str().unwrap_or_default(),
            place["type"].as_str().unwrap_or_default(),
        ),
        bounding_box: parse_bounding_box(&place["boundingbox"]),
        confidence,
    })
}

/// Maps Nominatim `class`/`type` tags into a [`LocationClassification`].
fn classify(class: &str, osm_type: &str) -> LocationClassification {
    match class {
        "building" if osm_type == "commercial" || osm_type == "retail" => {
            LocationClassification::Commercial
        }
        "building" | "residential" => LocationClassification::Residential,
        "place" if osm_type == "house" => LocationClassification::Residential,
        "shop" | "office" | "craft" => LocationClassification::Commercial,
        "highway" => LocationClassification::Road,
        "railway" | "aeroway" | "aerialway" => LocationClassification::Transit,
        "amenity" if osm_type == "bus_station" => LocationClassification::Transit,
        "amenity" | "leisure" | "healthcare" => LocationClassification::Amenity,
        "tourism" | "historic" => LocationClassification::Landmark,
        "boundary" | "place" => LocationClassification::Area,
        _ => LocationClassification::Other,
    }
}

/// Nominatim bounding boxes arrive as `[south, north, west, east]` strings.
fn parse_bounding_box(value: &serde_json::Value) -> Option<BoundingBox> {
    let arr = value.as_array()?;
    if arr.len() != 4 {
        return None;
    }
    let parse = |v: &serde_json::Value| {
        v.as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .or_else(|| v.as_f64())
    };
    Some(BoundingBox {
        south: parse(&arr[0])?,
        north: parse(&arr[1])?,
        west: parse(&arr[2])?,
        east: parse(&arr[3])?,
    })
}

/// Reads a numeric field that Nominatim may encode as string or number.
fn number_field(value: &serde_json::Value, key: &str) -> Option<f64> {
    value[key]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .or_else(|| value[key].as_f64())
}

fn string_field(value: &serde_json::Value, key: &str) -> Option<String> {
    value[key].as_str().map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_place() -> serde_json::Value {
        serde_json::json!({
            "place_id": 123456,
            "lat": "12.9762",
            "lon": "77.6033",
            "display_name": "MG Road, Bengaluru, Karnataka, 560001, India",
            "class": "highway",
            "type": "primary",
            "importance": 0.72,
            "boundingbox": ["12.9750", "12.9774", "77.6000", "77.6060"],
            "address": {
                "road": "MG Road",
                "city": "Bengaluru",
                "state": "Karnataka",
                "postcode": "560001",
                "country": "India",
                "country_code": "in"
            }
        })
    }

    #[test]
    fn parses_a_search_result() {
        let place = parse_place(&sample_place()).unwrap();
        assert_eq!(place.place_id.as_deref(), Some("123456"));
        assert!((place.coordinate.latitude - 12.9762).abs() < 1e-9);
        assert_eq!(place.components.street.as_deref(), Some("MG Road"));
        assert_eq!(place.components.country_code.as_deref(), Some("in"));
        assert_eq!(place.classification, LocationClassification::Road);
        assert!((place.confidence - 0.72).abs() < 1e-9);

        let bbox = place.bounding_box.unwrap();
        assert!((bbox.south - 12.975).abs() < 1e-9);
        assert!((bbox.east - 77.606).abs() < 1e-9);
    }

    #[test]
    fn missing_coordinates_yield_none() {
        let place = serde_json::json!({"display_name": "nowhere"});
        assert!(parse_place(&place).is_none());
    }

    #[test]
    fn missing_importance_defaults_to_half() {
        let mut place = sample_place();
        place.as_object_mut().unwrap().remove("importance");
        let parsed = parse_place(&place).unwrap();
        assert!((parsed.confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn classification_covers_common_tags() {
        assert_eq!(classify("shop", "bakery"), LocationClassification::Commercial);
        assert_eq!(classify("railway", "station"), LocationClassification::Transit);
        assert_eq!(classify("tourism", "museum"), LocationClassification::Landmark);
        assert_eq!(classify("place", "city"), LocationClassification::Area);
        assert_eq!(classify("natural", "peak"), LocationClassification::Other);
    }
}
